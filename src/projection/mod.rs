//! The projection family: hit → parameter-space mappings.
//!
//! Overview
//! - Each projection owns one 2D parameter space over (coord, angle) and
//!   knows how to trace a hit's locus into it, how to slice the detector
//!   into angular sectors, and how to associate hits back to a histogram
//!   maximum with a residual test.
//! - The five variants form a closed enum dispatched by exhaustive match:
//!   two planar spaces (perpendicular signed distance vs line azimuth), two
//!   longitudinal ones (rz offset vs polar angle, with a cosmic twin), and
//!   the curved-at-cylinder space (inverse-curvature table vs implied polar
//!   angle at the origin).
//!
//! The variants differ in their smear constants (see `SmearSpec`); those are
//! calibration carried per variant, not unified on purpose.

mod curved;
mod longitudinal;
mod planar;

use crate::angle::CircularSum;
use crate::finder::params::FinderParams;
use crate::histogram::{HoughHistogram, Maximum, SectorHistograms, SmearSpec};
use crate::hit::{EventHits, Hit, HitState, PatternId};
use crate::pattern::Pattern;
use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Closed set of projection variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    PlanarXY,
    PlanarYZ,
    LongitudinalRZ,
    LongitudinalRZCosmic,
    CurvedCylinder,
}

impl ProjectionKind {
    pub fn label(self) -> &'static str {
        match self {
            ProjectionKind::PlanarXY => "planar-xy",
            ProjectionKind::PlanarYZ => "planar-yz",
            ProjectionKind::LongitudinalRZ => "longitudinal-rz",
            ProjectionKind::LongitudinalRZCosmic => "longitudinal-rz-cosmic",
            ProjectionKind::CurvedCylinder => "curved-cylinder",
        }
    }

    /// True for the transverse (phi) logical axis.
    pub fn is_transverse(self) -> bool {
        matches!(self, ProjectionKind::PlanarXY | ProjectionKind::PlanarYZ)
    }
}

/// Resolved configuration of one projection's parameter space.
#[derive(Clone, Debug)]
pub(crate) struct ProjectionConfig {
    pub kind: ProjectionKind,
    pub n_coord: usize,
    pub n_angle: usize,
    pub coord_range: (f64, f64),
    pub angle_range: (f64, f64),
    pub sectors: usize,
    pub histogram_threshold: f64,
    pub pattern_threshold: usize,
    pub smear: SmearSpec,
    pub residual_mm: f64,
    pub residual_angle: f64,
    pub use_angular_residual: bool,
    pub ip_constrained: bool,
    pub radius_weight_scale: Option<f64>,
    /// Inverse-curvature scan table (curved variant only).
    pub curvature_table: Vec<f64>,
    pub cylinder_radius: f64,
}

/// One projection variant bound to its resolved configuration.
#[derive(Clone, Debug)]
pub struct Projection {
    cfg: ProjectionConfig,
}

impl Projection {
    pub fn new(kind: ProjectionKind, params: &FinderParams) -> Self {
        let cosmic = params.cosmic_mode;
        let negative = params.use_negative_weights;
        let cfg = match kind {
            ProjectionKind::PlanarXY | ProjectionKind::PlanarYZ => {
                let p = &params.transverse;
                let half = if cosmic {
                    p.half_range_cosmic_mm
                } else {
                    p.half_range_mm
                };
                let step = if cosmic {
                    p.coord_step_cosmic_mm
                } else {
                    p.coord_step_mm
                };
                ProjectionConfig {
                    kind,
                    n_coord: bins(2.0 * half, step),
                    n_angle: bins(TAU, p.angle_step_rad),
                    coord_range: (-half, half),
                    angle_range: (0.0, TAU),
                    sectors: if cosmic { 1 } else { p.sectors },
                    histogram_threshold: p.histogram_threshold,
                    pattern_threshold: p.pattern_threshold,
                    smear: SmearSpec {
                        fraction: p.smear_fraction,
                        negative,
                        sector_fraction: p.sector_fraction,
                        cross_sector: params.cross_sector_duplication && !cosmic,
                    },
                    residual_mm: if cosmic {
                        p.residual_cosmic_mm
                    } else {
                        p.residual_mm
                    },
                    residual_angle: 0.0,
                    use_angular_residual: false,
                    ip_constrained: !cosmic,
                    radius_weight_scale: p.radius_weight_scale_mm,
                    curvature_table: Vec::new(),
                    cylinder_radius: 0.0,
                }
            }
            ProjectionKind::LongitudinalRZ | ProjectionKind::LongitudinalRZCosmic => {
                let p = &params.longitudinal;
                let cosmic_variant = kind == ProjectionKind::LongitudinalRZCosmic;
                let step = if cosmic_variant {
                    p.coord_step_cosmic_mm
                } else {
                    p.coord_step_mm
                };
                let angle_step = if cosmic_variant {
                    p.angle_step_cosmic_rad
                } else {
                    p.angle_step_rad
                };
                ProjectionConfig {
                    kind,
                    n_coord: bins(2.0 * p.half_range_mm, step),
                    n_angle: bins(PI, angle_step),
                    coord_range: (-p.half_range_mm, p.half_range_mm),
                    angle_range: (0.0, PI),
                    sectors: if cosmic { 1 } else { p.sectors },
                    histogram_threshold: p.histogram_threshold,
                    pattern_threshold: p.pattern_threshold,
                    smear: SmearSpec {
                        fraction: p.smear_fraction,
                        // the longitudinal family keeps a symmetric response
                        negative: false,
                        sector_fraction: if cosmic_variant {
                            p.sector_fraction_cosmic
                        } else {
                            p.sector_fraction
                        },
                        cross_sector: params.cross_sector_duplication && !cosmic,
                    },
                    residual_mm: if cosmic_variant {
                        p.residual_cosmic_mm
                    } else {
                        p.residual_mm
                    },
                    residual_angle: p.residual_angle_rad,
                    use_angular_residual: p.use_angular_residual,
                    ip_constrained: !cosmic_variant,
                    radius_weight_scale: p.radius_weight_scale_mm,
                    curvature_table: Vec::new(),
                    cylinder_radius: 0.0,
                }
            }
            ProjectionKind::CurvedCylinder => {
                let p = &params.curved;
                ProjectionConfig {
                    kind,
                    n_coord: p.curvature_bins.max(2),
                    n_angle: bins(PI, p.angle_step_rad),
                    coord_range: (0.0, p.curvature_bins.max(2) as f64),
                    angle_range: (0.0, PI),
                    sectors: p.sectors,
                    histogram_threshold: p.histogram_threshold,
                    pattern_threshold: p.pattern_threshold,
                    smear: SmearSpec {
                        fraction: p.smear_fraction,
                        negative,
                        sector_fraction: p.sector_fraction,
                        cross_sector: params.cross_sector_duplication,
                    },
                    residual_mm: p.residual_mm,
                    residual_angle: 0.0,
                    use_angular_residual: false,
                    ip_constrained: true,
                    radius_weight_scale: None,
                    curvature_table: curved::curvature_table(
                        p.curvature_bins.max(2),
                        p.max_inv_curvature,
                    ),
                    cylinder_radius: p.cylinder_radius_mm,
                }
            }
        };
        Self { cfg }
    }

    #[inline]
    pub fn kind(&self) -> ProjectionKind {
        self.cfg.kind
    }

    #[cfg(test)]
    pub(crate) fn config(&self) -> &ProjectionConfig {
        &self.cfg
    }

    #[inline]
    pub fn sectors(&self) -> usize {
        self.cfg.sectors
    }

    /// Minimum pattern size that triggers another level.
    #[inline]
    pub fn pattern_threshold(&self) -> usize {
        self.cfg.pattern_threshold
    }

    pub fn make_histograms(&self) -> SectorHistograms {
        let template = HoughHistogram::new(
            self.cfg.n_coord,
            self.cfg.n_angle,
            self.cfg.coord_range,
            self.cfg.angle_range,
            self.cfg.histogram_threshold,
        );
        SectorHistograms::new(self.cfg.sectors, template)
    }

    /// Technology/flag eligibility of a hit for this parameter space. The
    /// same filter governs filling and association; association additionally
    /// skips already-associated hits.
    pub fn accepts(&self, hit: &Hit) -> bool {
        match self.cfg.kind {
            ProjectionKind::PlanarXY => hit.measures_transverse(),
            ProjectionKind::PlanarYZ => true,
            ProjectionKind::LongitudinalRZ
            | ProjectionKind::LongitudinalRZCosmic
            | ProjectionKind::CurvedCylinder => !hit.measures_transverse(),
        }
    }

    /// Sector of a hit: azimuth slices for the planar variants, polar-angle
    /// slices for the longitudinal and curved ones. A hit falling exactly on
    /// the upper boundary clamps into the last sector.
    pub fn sector(&self, hit: &Hit) -> usize {
        let n = self.cfg.sectors;
        if n <= 1 {
            return 0;
        }
        let frac = match self.cfg.kind {
            ProjectionKind::PlanarXY => hit.azimuth() / TAU,
            ProjectionKind::PlanarYZ => planar::yz_azimuth(hit) / TAU,
            ProjectionKind::LongitudinalRZ
            | ProjectionKind::LongitudinalRZCosmic
            | ProjectionKind::CurvedCylinder => hit.polar() / PI,
        };
        ((frac * n as f64) as usize).min(n - 1)
    }

    /// Radius-dependent down-weighting favouring patterns close to the
    /// origin. Identity when disabled or outside IP mode.
    pub fn weight_of(&self, r0: f64) -> f64 {
        match self.cfg.radius_weight_scale {
            Some(scale) if self.cfg.ip_constrained && scale > 0.0 => {
                1.0 / (1.0 + r0.abs() / scale)
            }
            _ => 1.0,
        }
    }

    /// Traces the locus of parameter-space points consistent with `hit`.
    pub fn fill_hit(
        &self,
        hit: &Hit,
        weight: f64,
        histos: &mut SectorHistograms,
        stats: &mut crate::diagnostics::FillStats,
    ) {
        if weight <= 0.0 {
            return;
        }
        let sector = self.sector(hit);
        match self.cfg.kind {
            ProjectionKind::PlanarXY | ProjectionKind::PlanarYZ => {
                planar::fill_hit(&self.cfg, self, hit, weight, sector, histos, stats)
            }
            ProjectionKind::LongitudinalRZ | ProjectionKind::LongitudinalRZCosmic => {
                longitudinal::fill_hit(&self.cfg, self, hit, weight, sector, histos, stats)
            }
            ProjectionKind::CurvedCylinder => {
                curved::fill_hit(&self.cfg, hit, weight, sector, histos, stats)
            }
        }
    }

    /// Builds the candidate pattern for one histogram maximum: scans the
    /// eligible, not-yet-associated hits of the maximum's sector and its two
    /// angular neighbors, applies the residual test, and aggregates the
    /// accepted hits' angles circularly. Never fails; sparse input yields an
    /// empty pattern.
    pub fn associate(
        &self,
        event: &EventHits,
        state: &mut HitState,
        maximum: &Maximum,
        id: PatternId,
    ) -> Pattern {
        let mut pattern = Pattern::new(self.cfg.kind);
        pattern.maximum = maximum.mass;

        let mut phi_sum = CircularSum::new();
        let mut theta_sum = CircularSum::new();

        for (idx, hit) in event.iter() {
            if !self.accepts(hit) || state.is_associated(idx) {
                continue;
            }
            if !self.sector_in_reach(self.sector(hit), maximum.sector) {
                continue;
            }
            let accepted = match self.cfg.kind {
                ProjectionKind::PlanarXY | ProjectionKind::PlanarYZ => {
                    planar::residual(&self.cfg, hit, maximum).abs() <= self.cfg.residual_mm
                }
                ProjectionKind::LongitudinalRZ | ProjectionKind::LongitudinalRZCosmic => {
                    longitudinal::accepts_residual(&self.cfg, hit, maximum)
                }
                ProjectionKind::CurvedCylinder => {
                    curved::residual(&self.cfg, hit, maximum).abs() <= self.cfg.residual_mm
                }
            };
            if !accepted {
                continue;
            }
            pattern.push_hit(idx);
            state.associate(idx, id);
            phi_sum.add(hit.azimuth());
            theta_sum.add(hit.polar());
        }

        pattern.e_phi = phi_sum.mean().unwrap_or(0.0);
        match self.cfg.kind {
            ProjectionKind::PlanarXY | ProjectionKind::PlanarYZ => {
                pattern.e_theta = theta_sum.mean().unwrap_or(FRAC_PI_2);
                pattern.r0_xy = maximum.coord;
                if phi_sum.is_empty() {
                    pattern.e_phi = maximum.angle;
                }
            }
            ProjectionKind::LongitudinalRZ | ProjectionKind::LongitudinalRZCosmic => {
                pattern.e_theta = theta_sum.mean().unwrap_or(maximum.angle);
                pattern.r0_rz = maximum.coord;
                pattern.r0_xy = self.transverse_offset(event, &pattern);
            }
            ProjectionKind::CurvedCylinder => {
                // the maximum's angle is the implied polar angle at the
                // origin, before bending
                pattern.e_theta = maximum.angle;
                let slot = maximum
                    .bin
                    .coord
                    .saturating_sub(1)
                    .min(self.cfg.curvature_table.len() - 1);
                pattern.inv_curvature = self.cfg.curvature_table[slot];
                pattern.r0_xy = if self.cfg.ip_constrained { 1e-3 } else { 0.0 };
            }
        }
        pattern
    }

    fn sector_in_reach(&self, hit_sector: usize, max_sector: usize) -> bool {
        let n = self.cfg.sectors as isize;
        if n <= 2 {
            return true;
        }
        let diff = (hit_sector as isize - max_sector as isize).rem_euclid(n);
        diff == 0 || diff == 1 || diff == n - 1
    }

    /// Transverse impact estimate for longitudinal patterns: IP mode pins it
    /// near the origin, cosmic mode derives it from the members' mean
    /// azimuth.
    fn transverse_offset(&self, event: &EventHits, pattern: &Pattern) -> f64 {
        if self.cfg.ip_constrained {
            return 1e-3;
        }
        if pattern.is_empty() {
            return 0.0;
        }
        let phi = pattern.e_phi;
        let mut sum = 0.0;
        for &idx in pattern.hits() {
            let hit = event.get(idx);
            sum += hit.x() * phi.sin() - hit.y() * phi.cos();
        }
        sum / pattern.len() as f64
    }
}

fn bins(span: f64, step: f64) -> usize {
    ((span / step.max(1e-9)).round() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::Technology;

    fn ip_params() -> FinderParams {
        FinderParams::default()
    }

    #[test]
    fn sector_boundaries_clamp() {
        let params = ip_params();
        let projection = Projection::new(ProjectionKind::LongitudinalRZ, &params);
        // polar angle exactly π lands in the last sector, not sector N
        let backward = Hit::new([0.0, 1e-9, -5000.0], Technology::DriftTube, false, 1.0);
        assert_eq!(projection.sector(&backward), projection.sectors() - 1);
        let forward = Hit::new([0.0, 1e-9, 5000.0], Technology::DriftTube, false, 1.0);
        assert_eq!(projection.sector(&forward), 0);
    }

    #[test]
    fn acceptance_follows_measurement_flag() {
        let params = ip_params();
        let xy = Projection::new(ProjectionKind::PlanarXY, &params);
        let rz = Projection::new(ProjectionKind::LongitudinalRZ, &params);
        let transverse = Hit::new([1.0, 2.0, 3.0], Technology::StripTrigger, true, 1.0);
        let longitudinal = Hit::new([1.0, 2.0, 3.0], Technology::DriftTube, false, 1.0);
        assert!(xy.accepts(&transverse));
        assert!(!xy.accepts(&longitudinal));
        assert!(rz.accepts(&longitudinal));
        assert!(!rz.accepts(&transverse));
    }

    #[test]
    fn radius_weighting_favours_small_offsets() {
        let params = ip_params();
        let xy = Projection::new(ProjectionKind::PlanarXY, &params);
        assert!(xy.weight_of(0.0) > xy.weight_of(4000.0));
        assert!((xy.weight_of(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sector_reach_wraps() {
        let params = ip_params();
        let xy = Projection::new(ProjectionKind::PlanarXY, &params);
        let n = xy.sectors();
        assert!(xy.sector_in_reach(0, 0));
        assert!(xy.sector_in_reach(n - 1, 0));
        assert!(xy.sector_in_reach(1, 0));
        assert!(!xy.sector_in_reach(2, 0));
    }
}
