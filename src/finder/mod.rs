//! The pattern finder orchestrating the per-projection level loops and the
//! merging stage.
//!
//! Typical usage:
//! ```no_run
//! use track_hough::{EventHits, FinderParams, PatternFinder};
//!
//! # fn example(event: EventHits) {
//! let finder = PatternFinder::new(FinderParams::default());
//! let report = finder.run(&event);
//! println!(
//!     "phi {} eta {} curved {}",
//!     report.patterns.phi.len(),
//!     report.patterns.eta.len(),
//!     report.patterns.curved.len()
//! );
//! # }
//! ```
//!
//! Stages
//! - Weighting: per-event drift-tube cut and probability recalibration.
//! - Build: each enabled projection runs its fill→extract→associate loop
//!   against a private association state; projections are independent and
//!   run in parallel.
//! - Merge: the planar-xy grid feeds the transverse collection, the
//!   configured longitudinal grid feeds the eta collection, and the curved
//!   grid is additionally lifted unmerged.

pub mod builder;
pub mod params;
pub mod weights;

use crate::diagnostics::{FinderDiagnostics, ProjectionDiagnostics};
use crate::hit::EventHits;
use crate::merger::PatternMerger;
use crate::pattern::TrackPattern;
use crate::projection::{Projection, ProjectionKind};
use builder::{PatternBuilder, PatternGrid};
use log::debug;
use params::FinderParams;
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;

/// Flat per-axis output collections. Order within a collection carries no
/// meaning.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PatternSets {
    /// Transverse axis (from the planar-xy projection).
    pub phi: Vec<TrackPattern>,
    /// Longitudinal axis (rz, rz-cosmic, or curved, per configuration).
    pub eta: Vec<TrackPattern>,
    /// Unmerged curved candidates, present when the curved projection runs.
    pub curved: Vec<TrackPattern>,
}

/// Result of one finder run.
#[derive(Clone, Debug, Serialize)]
pub struct FinderReport {
    pub patterns: PatternSets,
    pub diagnostics: FinderDiagnostics,
    pub latency_ms: f64,
}

/// Reusable pattern finder. Holds read-only configuration; all per-event
/// state is scoped to [`PatternFinder::run`].
pub struct PatternFinder {
    params: FinderParams,
    projections: Vec<Projection>,
}

impl PatternFinder {
    pub fn new(params: FinderParams) -> Self {
        let mut kinds = vec![ProjectionKind::PlanarXY];
        if params.enable_planar_yz {
            kinds.push(ProjectionKind::PlanarYZ);
        }
        if params.cosmic_mode {
            kinds.push(ProjectionKind::LongitudinalRZCosmic);
        } else if params.enable_curved {
            kinds.push(ProjectionKind::CurvedCylinder);
        } else {
            kinds.push(ProjectionKind::LongitudinalRZ);
        }
        debug!(
            "PatternFinder: projections {:?} max_level {} max_maxima {}",
            kinds.iter().map(|k| k.label()).collect::<Vec<_>>(),
            params.max_level,
            params.max_maxima,
        );
        let projections = kinds
            .into_iter()
            .map(|kind| Projection::new(kind, &params))
            .collect();
        Self {
            params,
            projections,
        }
    }

    #[inline]
    pub fn params(&self) -> &FinderParams {
        &self.params
    }

    /// Runs the full engine over one event.
    pub fn run(&self, event: &EventHits) -> FinderReport {
        let t0 = Instant::now();
        let mut diagnostics = FinderDiagnostics {
            hit_count: event.len(),
            ..Default::default()
        };

        // cosmic events drowning in transverse hits are not reconstructed
        if self.params.cosmic_mode {
            if let Some(limit) = self.params.max_transverse_hits {
                let transverse = event.transverse_count();
                if transverse > limit {
                    debug!(
                        "PatternFinder: cosmic event with {transverse} transverse hits \
                         skipped (limit {limit})"
                    );
                    diagnostics.skipped = true;
                    return FinderReport {
                        patterns: PatternSets::default(),
                        diagnostics,
                        latency_ms: t0.elapsed().as_secs_f64() * 1000.0,
                    };
                }
            }
        }

        let cut = weights::event_cut(event, self.params.cosmic_mode);
        diagnostics.drift_tube_cut = cut;
        debug!(
            "PatternFinder: {} hits, drift-tube cut {:.3}",
            event.len(),
            cut
        );

        let results: Vec<(PatternGrid, ProjectionDiagnostics)> = self
            .projections
            .par_iter()
            .map(|projection| PatternBuilder::new(projection, &self.params).run(event, cut))
            .collect();

        let merger = PatternMerger::new(event, &self.params);
        let mut patterns = PatternSets::default();
        for (grid, diag) in results {
            match grid.kind() {
                ProjectionKind::PlanarXY => {
                    let (phi, merge_diag) = merger.merge_transverse(&grid);
                    patterns.phi = phi;
                    diagnostics.transverse_merge = merge_diag;
                }
                ProjectionKind::PlanarYZ => {
                    // auxiliary space: kept for its diagnostics only
                }
                ProjectionKind::LongitudinalRZ | ProjectionKind::LongitudinalRZCosmic => {
                    let (eta, merge_diag) = merger.merge_longitudinal(&grid);
                    patterns.eta = eta;
                    diagnostics.longitudinal_merge = merge_diag;
                }
                ProjectionKind::CurvedCylinder => {
                    let (eta, merge_diag) = merger.merge_longitudinal(&grid);
                    patterns.eta = eta;
                    diagnostics.longitudinal_merge = merge_diag;
                    patterns.curved = merger.lift_unmerged(&grid);
                }
            }
            diagnostics.projections.push(diag);
        }

        FinderReport {
            patterns,
            diagnostics,
            latency_ms: t0.elapsed().as_secs_f64() * 1000.0,
        }
    }
}
