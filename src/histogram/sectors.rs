//! Sectored histogram set and the smeared fill.

use super::histogram2d::{BinIndex, HoughHistogram};
use crate::diagnostics::FillStats;

/// Smear response of one projection variant.
///
/// The butterfly writes a fraction of the weight into the two diagonal
/// neighbors of the primary bin; the optional negative companions subtract
/// the same fraction on the anti-diagonal, which sharpens the response and
/// cancels the duplicate contribution of wrapped writes at the periodic
/// angle boundary. Cross-sector duplication re-fills the primary position in
/// both angularly adjacent sectors at a reduced, variant-specific fraction.
#[derive(Clone, Copy, Debug)]
pub struct SmearSpec {
    /// Butterfly fraction of the primary weight (typically 0.5).
    pub fraction: f64,
    /// Enables the negative-weight companions.
    pub negative: bool,
    /// Fraction written into each adjacent sector.
    pub sector_fraction: f64,
    /// Enables cross-sector duplication (requires ≥ 3 sectors).
    pub cross_sector: bool,
}

impl Default for SmearSpec {
    fn default() -> Self {
        Self {
            fraction: 0.5,
            negative: false,
            sector_fraction: 1.0 / 3.0,
            cross_sector: true,
        }
    }
}

/// A maximum returned by [`SectorHistograms::global_maxima`].
#[derive(Clone, Copy, Debug)]
pub struct Maximum {
    pub sector: usize,
    pub bin: BinIndex,
    /// Center value of the maximum's coord bin.
    pub coord: f64,
    /// Center value of the maximum's angle bin.
    pub angle: f64,
    /// 3×3 area mass at the maximum.
    pub mass: f64,
}

/// One histogram per angular sector.
#[derive(Clone, Debug)]
pub struct SectorHistograms {
    sectors: Vec<HoughHistogram>,
}

impl SectorHistograms {
    pub fn new(sectors: usize, template: HoughHistogram) -> Self {
        let sectors = sectors.max(1);
        Self {
            sectors: vec![template; sectors],
        }
    }

    #[inline]
    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    #[inline]
    pub fn sector(&self, index: usize) -> &HoughHistogram {
        &self.sectors[index]
    }

    /// Adjacent sector with wraparound.
    #[inline]
    pub fn neighbor_sector(&self, sector: usize, delta: isize) -> usize {
        let n = self.sectors.len() as isize;
        (sector as isize + delta).rem_euclid(n) as usize
    }

    pub fn reset(&mut self) {
        for histo in &mut self.sectors {
            histo.reset();
        }
    }

    /// The smeared fill: primary bin gets exactly `weight`; butterfly
    /// diagonals, optional negative companions, and cross-sector copies get
    /// the fractions described on [`SmearSpec`]. Near the periodic angle
    /// boundary the outward diagonal wraps to the opposite axis end and the
    /// matching negative companion lands on the wrapped bin so that the net
    /// write across the boundary, beyond the primary, is zero.
    ///
    /// Returns the primary bin.
    pub fn fill_smeared(
        &mut self,
        coord: f64,
        angle: f64,
        weight: f64,
        sector: usize,
        spec: &SmearSpec,
        stats: &mut FillStats,
    ) -> BinIndex {
        let sector = sector.min(self.sectors.len() - 1);
        let primary = self.butterfly_fill(sector, coord, angle, weight, spec, stats);

        if spec.cross_sector && self.sectors.len() >= 3 {
            let shared = spec.sector_fraction * weight;
            for delta in [-1isize, 1] {
                let neighbor = self.neighbor_sector(sector, delta);
                self.butterfly_fill(neighbor, coord, angle, shared, spec, stats);
            }
        }
        primary
    }

    fn butterfly_fill(
        &mut self,
        sector: usize,
        coord: f64,
        angle: f64,
        weight: f64,
        spec: &SmearSpec,
        stats: &mut FillStats,
    ) -> BinIndex {
        let histo = &mut self.sectors[sector];
        let primary = histo.fill(coord, angle, weight);
        stats.record(weight);

        let side = spec.fraction * weight;
        let c_lo = histo.offset_coord(primary.coord, -1);
        let c_hi = histo.offset_coord(primary.coord, 1);
        let a_lo = histo.wrap_angle(primary.angle as isize - 1);
        let a_hi = histo.wrap_angle(primary.angle as isize + 1);

        // Butterfly diagonals; angle neighbors wrap at the periodic
        // boundary. With negative companions on, the (+, −) pair landing on
        // the wrapped row cancels exactly, so a hit straddling the boundary
        // is not double counted.
        histo.add(
            BinIndex {
                coord: c_lo,
                angle: a_lo,
            },
            side,
        );
        histo.add(
            BinIndex {
                coord: c_hi,
                angle: a_hi,
            },
            side,
        );
        stats.record(side);
        stats.record(side);

        if spec.negative {
            histo.add(
                BinIndex {
                    coord: c_hi,
                    angle: a_lo,
                },
                -side,
            );
            histo.add(
                BinIndex {
                    coord: c_lo,
                    angle: a_hi,
                },
                -side,
            );
            stats.record(-side);
            stats.record(-side);
        }

        primary
    }

    /// Up to `k` maxima, at most one per sector, in descending 3×3 mass.
    /// Ties keep the lower sector (first found).
    pub fn global_maxima(&self, k: usize) -> Vec<Maximum> {
        let mut found: Vec<Maximum> = Vec::new();
        for (sector, histo) in self.sectors.iter().enumerate() {
            if let Some((bin, mass)) = histo.maximum() {
                found.push(Maximum {
                    sector,
                    bin,
                    coord: histo.coord_center(bin.coord),
                    angle: histo.angle_center(bin.angle),
                    mass,
                });
            }
        }
        found.sort_by(|a, b| {
            b.mass
                .partial_cmp(&a.mass)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.sector.cmp(&b.sector))
        });
        found.truncate(k);
        found
    }
}
