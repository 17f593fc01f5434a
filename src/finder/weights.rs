//! Per-event and per-level hit weighting.
//!
//! Two mechanisms feed the histogram fills: a per-event recalibration of the
//! drift-tube probabilities driven by event occupancy, and a per-level
//! rescale table that progressively de-emphasises hit classes as the peeling
//! iterations go deeper. Current fill weights always stay in [0, 1].

use crate::finder::params::WeightCutParams;
use crate::hit::{EventHits, Hit, HitState};
use crate::projection::ProjectionKind;
use log::debug;

/// Per-event drift-tube probability cut. Grows towards 1 with occupancy;
/// negative for quiet events, where it cuts nothing. Always 0 in cosmic
/// mode.
pub fn event_cut(event: &EventHits, cosmic: bool) -> f64 {
    if cosmic {
        return 0.0;
    }
    let n = event.drift_tube_count();
    if n == 0 {
        0.0
    } else {
        1.0 - 5.0 / (n as f64).sqrt()
    }
}

/// Recalibrates drift-tube probabilities against the event cut. Only busy
/// events (cut ≥ 0.5) are recalibrated; the formula suppresses isolated
/// background hits harder than correlated ones.
pub fn recalibrate_probabilities(
    event: &EventHits,
    state: &mut HitState,
    cut: f64,
    params: &WeightCutParams,
) {
    if !params.drift_tube_cut || cut < 0.5 {
        return;
    }
    for (idx, hit) in event.iter() {
        if !hit.technology().is_precision() {
            continue;
        }
        let p_old = hit.orig_weight();
        let p_calc = 0.25 * p_old * (1.0 - cut);
        let denom = (p_calc + cut * (1.0 - p_old)).max(1e-12);
        state.probabilities[idx] = p_calc / denom;
    }
}

/// Fill-selection cut: drift-tube hits must clear the event cut, and every
/// hit must clear the global floor when that is enabled.
pub fn passes_cut(hit: &Hit, probability: f64, cut: f64, params: &WeightCutParams) -> bool {
    (!params.drift_tube_cut || !hit.technology().is_precision() || probability >= cut)
        && (!params.global_cut || probability >= params.min_weight)
}

/// Per-level rescale factors (trigger class, precision class).
///
/// The planar family fades both classes together; the longitudinal family
/// keeps trigger hits hot longer than precision hits.
pub fn level_scale(kind: ProjectionKind, level: usize, max_level: usize) -> (f64, f64) {
    match kind {
        ProjectionKind::PlanarXY | ProjectionKind::PlanarYZ => {
            let f = (1.0 - (level as f64 - 1.0) / max_level.max(1) as f64).min(1.0);
            (f, f)
        }
        ProjectionKind::LongitudinalRZ
        | ProjectionKind::LongitudinalRZCosmic
        | ProjectionKind::CurvedCylinder => match level {
            0 | 1 => (1.0, 1.0),
            2 => (1.0, 0.75),
            3 => (0.75, 0.5),
            4 => (0.5, 0.25),
            _ => {
                debug!("PatternFinder: no weight defined for level {level}");
                (0.5, 0.25)
            }
        },
    }
}

/// Writes the rescaled fill weights for one level into the state.
pub fn apply_level_scale(
    event: &EventHits,
    state: &mut HitState,
    kind: ProjectionKind,
    level: usize,
    max_level: usize,
) {
    let (trigger, precision) = level_scale(kind, level, max_level);
    for (idx, hit) in event.iter() {
        let factor = if hit.technology().is_precision() {
            precision
        } else {
            trigger
        };
        state.weights[idx] = (state.probabilities[idx] * factor).clamp(0.0, 1.0);
    }
}
