//! Per-projection level loop and the pattern grid.

use crate::diagnostics::{FillStats, LevelDiagnostics, ProjectionDiagnostics};
use crate::finder::params::FinderParams;
use crate::finder::weights;
use crate::hit::{EventHits, HitState, PatternId};
use crate::pattern::Pattern;
use crate::projection::{Projection, ProjectionKind};
use log::{debug, trace};
use std::time::Instant;

/// Grid of candidate patterns indexed by (level, maximum slot).
#[derive(Clone, Debug)]
pub struct PatternGrid {
    kind: ProjectionKind,
    levels: usize,
    maxima: usize,
    slots: Vec<Option<Pattern>>,
}

impl PatternGrid {
    pub fn new(kind: ProjectionKind, levels: usize, maxima: usize) -> Self {
        Self {
            kind,
            levels,
            maxima,
            slots: vec![None; levels * maxima],
        }
    }

    #[inline]
    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    #[inline]
    fn flat(&self, level: usize, slot: usize) -> usize {
        debug_assert!(level < self.levels && slot < self.maxima);
        level * self.maxima + slot
    }

    pub fn get(&self, level: usize, slot: usize) -> Option<&Pattern> {
        self.slots[self.flat(level, slot)].as_ref()
    }

    pub fn set(&mut self, level: usize, slot: usize, pattern: Pattern) {
        let idx = self.flat(level, slot);
        self.slots[idx] = Some(pattern);
    }

    /// Non-empty patterns in (level, slot) order.
    pub fn iter_nonempty(&self) -> impl Iterator<Item = (PatternId, &Pattern)> {
        self.slots.iter().enumerate().filter_map(move |(i, slot)| {
            slot.as_ref().filter(|p| !p.is_empty()).map(|p| {
                (
                    PatternId {
                        level: i / self.maxima,
                        slot: i % self.maxima,
                    },
                    p,
                )
            })
        })
    }

    pub fn is_all_empty(&self) -> bool {
        self.iter_nonempty().next().is_none()
    }
}

/// Drives one projection through the iterative fill→extract→associate
/// levels.
pub struct PatternBuilder<'a> {
    projection: &'a Projection,
    params: &'a FinderParams,
}

impl<'a> PatternBuilder<'a> {
    pub fn new(projection: &'a Projection, params: &'a FinderParams) -> Self {
        Self { projection, params }
    }

    /// Runs the level loop against a fresh association state. `cut` is the
    /// per-event drift-tube cut from [`weights::event_cut`].
    ///
    /// Each level fills the histograms from the eligible, not-yet-associated
    /// hits under the level's rescaled weights, extracts up to `max_maxima`
    /// maxima, and associates hits to each maximum. The loop continues only
    /// while the level produced a pattern at least `pattern_threshold` hits
    /// large and unassociated eligible hits remain; it is bounded by
    /// `max_level` regardless.
    pub fn run(&self, event: &EventHits, cut: f64) -> (PatternGrid, ProjectionDiagnostics) {
        let t0 = Instant::now();
        let kind = self.projection.kind();
        let max_level = self.params.max_level.max(1);
        let max_maxima = self.params.max_maxima.max(1);

        let mut state = HitState::new(event);
        weights::recalibrate_probabilities(event, &mut state, cut, &self.params.weight_cut);

        let mut histos = self.projection.make_histograms();
        let mut grid = PatternGrid::new(kind, max_level, max_maxima);
        let mut fill_stats = FillStats::default();
        let mut levels = Vec::new();

        for level in 0..max_level {
            histos.reset();
            weights::apply_level_scale(event, &mut state, kind, level, max_level);

            let mut hits_filled = 0usize;
            for (idx, hit) in event.iter() {
                if !self.projection.accepts(hit) || state.is_associated(idx) {
                    continue;
                }
                if !weights::passes_cut(hit, state.probabilities[idx], cut, &self.params.weight_cut)
                {
                    continue;
                }
                let weight = state.weights[idx];
                if weight <= 0.0 {
                    continue;
                }
                self.projection
                    .fill_hit(hit, weight, &mut histos, &mut fill_stats);
                hits_filled += 1;
            }

            let maxima = histos.global_maxima(max_maxima);
            let mut largest = 0usize;
            let mut stored = 0usize;
            for (slot, maximum) in maxima.iter().enumerate() {
                let id = PatternId { level, slot };
                let pattern = self.projection.associate(event, &mut state, maximum, id);
                trace!(
                    "PatternBuilder: maximum sector {} coord {:.1} angle {:.3} mass {:.2} \
                     -> {} hits",
                    maximum.sector,
                    maximum.coord,
                    maximum.angle,
                    maximum.mass,
                    pattern.len(),
                );
                largest = largest.max(pattern.len());
                if !pattern.is_empty() {
                    stored += 1;
                }
                grid.set(level, slot, pattern);
            }

            debug!(
                "PatternBuilder: {} level {level} filled {hits_filled} maxima {} largest {largest}",
                kind.label(),
                maxima.len(),
            );
            levels.push(LevelDiagnostics {
                level,
                hits_filled,
                maxima_found: maxima.len(),
                patterns_stored: stored,
                largest_pattern: largest,
            });

            let proceed = largest >= self.projection.pattern_threshold()
                && level + 1 < max_level
                && self.eligible_hits_left(event, &state);
            if !proceed {
                break;
            }
        }

        let diagnostics = ProjectionDiagnostics {
            projection: kind.label(),
            sectors: self.projection.sectors(),
            levels,
            fill: fill_stats,
            elapsed_ms: t0.elapsed().as_secs_f64() * 1000.0,
        };
        (grid, diagnostics)
    }

    fn eligible_hits_left(&self, event: &EventHits, state: &HitState) -> bool {
        event
            .iter()
            .any(|(idx, hit)| self.projection.accepts(hit) && !state.is_associated(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::{Hit, Technology};

    fn small_params() -> FinderParams {
        let mut params = FinderParams::default();
        params.max_level = 3;
        params.max_maxima = 2;
        params.transverse.sectors = 4;
        params.transverse.coord_step_mm = 300.0;
        params.transverse.angle_step_rad = std::f64::consts::TAU / 90.0;
        params
    }

    fn line_event(phi: f64, n: usize) -> EventHits {
        let mut event = EventHits::new();
        for i in 0..n {
            let t = 3000.0 + 700.0 * i as f64;
            event.add_hit(Hit::new(
                [t * phi.cos(), t * phi.sin(), 200.0],
                Technology::StripTrigger,
                true,
                1.0,
            ));
        }
        event
    }

    #[test]
    fn empty_event_yields_empty_grid() {
        let params = small_params();
        let projection = Projection::new(ProjectionKind::PlanarXY, &params);
        let builder = PatternBuilder::new(&projection, &params);
        let (grid, diag) = builder.run(&EventHits::new(), 0.0);
        assert!(grid.is_all_empty());
        assert_eq!(diag.levels.len(), 1);
        assert_eq!(diag.levels[0].maxima_found, 0);
    }

    #[test]
    fn single_track_is_found_at_level_zero() {
        let params = small_params();
        let projection = Projection::new(ProjectionKind::PlanarXY, &params);
        let builder = PatternBuilder::new(&projection, &params);
        let event = line_event(0.9, 8);
        let (grid, _) = builder.run(&event, 0.0);
        let found: Vec<_> = grid.iter_nonempty().collect();
        assert_eq!(found.len(), 1);
        let (id, pattern) = &found[0];
        assert_eq!(id.level, 0);
        assert_eq!(pattern.len(), 8);
    }

    #[test]
    fn terminates_within_max_level() {
        let params = small_params();
        let projection = Projection::new(ProjectionKind::PlanarXY, &params);
        let builder = PatternBuilder::new(&projection, &params);
        // two separated tracks: more levels than patterns can fill
        let mut event = line_event(0.4, 6);
        for (_, hit) in line_event(2.6, 6).iter() {
            event.add_hit(*hit);
        }
        let (_, diag) = builder.run(&event, 0.0);
        assert!(diag.levels.len() <= params.max_level);
    }
}
