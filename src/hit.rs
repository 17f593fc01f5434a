//! Hit records and the per-event hit arena.
//!
//! A [`Hit`] is immutable once constructed: position, technology, the
//! measures-transverse flag, and the original weight never change. Mutable
//! per-run state (current weight, association flag, owning pattern) lives in
//! [`HitState`], which each projection run owns privately. Patterns refer to
//! hits by arena index, never by pointer.

use crate::angle::wrap_two_pi;
use serde::{Deserialize, Serialize};

/// Detector technology that produced a hit.
///
/// Drift tubes are the precision class; the remaining technologies form the
/// trigger class for weighting purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technology {
    DriftTube,
    StripTrigger,
    PadTrigger,
    CathodeStrip,
}

impl Technology {
    /// True for the precision (drift-tube) class.
    #[inline]
    pub fn is_precision(self) -> bool {
        matches!(self, Technology::DriftTube)
    }
}

/// One spatial measurement. Positions are millimetres in the global frame.
#[derive(Clone, Copy, Debug)]
pub struct Hit {
    position: [f64; 3],
    technology: Technology,
    measures_transverse: bool,
    orig_weight: f64,
    // derived geometry, computed once
    radius_xy: f64,
    radius: f64,
    azimuth: f64,
    polar: f64,
}

impl Hit {
    /// Builds a hit. The original weight is clamped into [0, 1].
    pub fn new(
        position: [f64; 3],
        technology: Technology,
        measures_transverse: bool,
        orig_weight: f64,
    ) -> Self {
        let [x, y, z] = position;
        let radius_xy = x.hypot(y);
        let radius = radius_xy.hypot(z);
        let azimuth = wrap_two_pi(y.atan2(x));
        let polar = radius_xy.atan2(z);
        Self {
            position,
            technology,
            measures_transverse,
            orig_weight: orig_weight.clamp(0.0, 1.0),
            radius_xy,
            radius,
            azimuth,
            polar,
        }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.position[0]
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.position[1]
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.position[2]
    }

    #[inline]
    pub fn position(&self) -> [f64; 3] {
        self.position
    }

    #[inline]
    pub fn technology(&self) -> Technology {
        self.technology
    }

    #[inline]
    pub fn measures_transverse(&self) -> bool {
        self.measures_transverse
    }

    /// Original weight ("probability that the hit belongs to a real track").
    #[inline]
    pub fn orig_weight(&self) -> f64 {
        self.orig_weight
    }

    /// Cylindrical radius √(x² + y²).
    #[inline]
    pub fn radius_xy(&self) -> f64 {
        self.radius_xy
    }

    /// Spherical radius √(x² + y² + z²).
    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Azimuth atan2(y, x), wrapped into [0, 2π).
    #[inline]
    pub fn azimuth(&self) -> f64 {
        self.azimuth
    }

    /// Polar angle atan2(√(x² + y²), z), in [0, π].
    #[inline]
    pub fn polar(&self) -> f64 {
        self.polar
    }
}

/// Per-event hit arena. Hit identity is the arena index.
#[derive(Clone, Debug, Default)]
pub struct EventHits {
    hits: Vec<Hit>,
}

impl EventHits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            hits: Vec::with_capacity(capacity),
        }
    }

    /// Appends a hit and returns its arena index.
    pub fn add_hit(&mut self, hit: Hit) -> usize {
        self.hits.push(hit);
        self.hits.len() - 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> &Hit {
        &self.hits[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Hit)> {
        self.hits.iter().enumerate()
    }

    pub fn drift_tube_count(&self) -> usize {
        self.hits
            .iter()
            .filter(|h| h.technology().is_precision())
            .count()
    }

    pub fn transverse_count(&self) -> usize {
        self.hits.iter().filter(|h| h.measures_transverse()).count()
    }
}

/// Identifier of the pattern owning a hit within one projection run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatternId {
    pub level: usize,
    pub slot: usize,
}

/// Mutable per-run hit state: probabilities after the per-event
/// recalibration, current fill weights after the per-level rescale, the
/// association flag, and the owning pattern.
#[derive(Clone, Debug)]
pub struct HitState {
    pub probabilities: Vec<f64>,
    pub weights: Vec<f64>,
    pub associated: Vec<bool>,
    pub owner: Vec<Option<PatternId>>,
}

impl HitState {
    /// Fresh state for one projection run: probabilities seeded from the
    /// original weights, nothing associated.
    pub fn new(event: &EventHits) -> Self {
        let n = event.len();
        let probabilities = event.hits.iter().map(|h| h.orig_weight()).collect();
        Self {
            probabilities,
            weights: vec![0.0; n],
            associated: vec![false; n],
            owner: vec![None; n],
        }
    }

    #[inline]
    pub fn is_associated(&self, index: usize) -> bool {
        self.associated[index]
    }

    pub fn associate(&mut self, index: usize, id: PatternId) {
        self.associated[index] = true;
        self.owner[index] = Some(id);
    }

    pub fn hits_left(&self) -> bool {
        self.associated.iter().any(|a| !a)
    }
}
