//! Structured diagnostics emitted by the finder stages.
//!
//! Counters are threaded through these types explicitly; the engine keeps no
//! module-level mutable state. Everything serializes to JSON for the demo
//! tooling.

use serde::Serialize;

/// Histogram fill statistics for one projection run.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct FillStats {
    /// Individual bin increments, smear writes included.
    pub bin_writes: usize,
    /// Net weight written across all increments.
    pub weight_sum: f64,
}

impl FillStats {
    #[inline]
    pub fn record(&mut self, weight: f64) {
        self.bin_writes += 1;
        self.weight_sum += weight;
    }

    pub fn merge(&mut self, other: &FillStats) {
        self.bin_writes += other.bin_writes;
        self.weight_sum += other.weight_sum;
    }
}

/// One fill→extract→associate iteration of a projection run.
#[derive(Clone, Debug, Serialize)]
pub struct LevelDiagnostics {
    pub level: usize,
    /// Hits that passed the fill selection at this level.
    pub hits_filled: usize,
    pub maxima_found: usize,
    pub patterns_stored: usize,
    pub largest_pattern: usize,
}

/// Per-projection summary.
#[derive(Clone, Debug, Serialize)]
pub struct ProjectionDiagnostics {
    pub projection: &'static str,
    pub sectors: usize,
    pub levels: Vec<LevelDiagnostics>,
    pub fill: FillStats,
    pub elapsed_ms: f64,
}

/// Merger outcome counts for one logical axis.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct MergerDiagnostics {
    /// Non-empty candidates entering the pairing stage.
    pub candidates: usize,
    pub dropped_subsumed: usize,
    pub merged_pairs: usize,
    /// Patterns in the output collection.
    pub emitted: usize,
}

/// Full report of one finder run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FinderDiagnostics {
    pub hit_count: usize,
    /// Per-event drift-tube probability cut (0 when disabled).
    pub drift_tube_cut: f64,
    /// True when the cosmic guard skipped the event.
    pub skipped: bool,
    pub projections: Vec<ProjectionDiagnostics>,
    pub transverse_merge: MergerDiagnostics,
    pub longitudinal_merge: MergerDiagnostics,
}
