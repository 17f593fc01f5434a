//! Parameter types configuring the finder stages.
//!
//! This module groups knobs for the projection histograms, the level loop,
//! per-hit weighting, and the pattern merger.
//!
//! Defaults aim for beam-collision (interaction-point constrained) geometry
//! at millimetre scales. The bin counts and smear fractions are calibration,
//! not contracts; tests pin the algorithmic behaviour, not these numbers.

use serde::{Deserialize, Serialize};

/// Finder-wide parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderParams {
    /// Cosmic-ray geometry: no interaction-point constraint, single sector,
    /// single maximum, wider residuals, no curved projection.
    pub cosmic_mode: bool,
    /// Enables the curved-at-cylinder projection for the longitudinal axis
    /// (ignored in cosmic mode).
    pub enable_curved: bool,
    /// Enables the auxiliary planar-yz projection (diagnostics only).
    pub enable_planar_yz: bool,
    /// Enables the negative-weight companions of the butterfly fill for the
    /// planar and curved projections.
    pub use_negative_weights: bool,
    /// Enables duplicating fills into the angularly adjacent sectors.
    pub cross_sector_duplication: bool,
    /// Maximum number of fill→extract→associate levels per projection.
    pub max_level: usize,
    /// Maxima extracted (and patterns attempted) per level.
    pub max_maxima: usize,
    /// Cosmic guard: skip events with more transverse-measuring hits.
    pub max_transverse_hits: Option<usize>,
    pub weight_cut: WeightCutParams,
    pub transverse: TransverseParams,
    pub longitudinal: LongitudinalParams,
    pub curved: CurvedParams,
    pub merger: MergerParams,
}

impl Default for FinderParams {
    fn default() -> Self {
        Self {
            cosmic_mode: false,
            enable_curved: true,
            enable_planar_yz: false,
            use_negative_weights: false,
            cross_sector_duplication: true,
            max_level: 5,
            max_maxima: 5,
            max_transverse_hits: Some(1000),
            weight_cut: WeightCutParams::default(),
            transverse: TransverseParams::default(),
            longitudinal: LongitudinalParams::default(),
            curved: CurvedParams::default(),
            merger: MergerParams::default(),
        }
    }
}

/// Per-hit probability cuts applied to the histogram-fill selection.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightCutParams {
    /// Enables the per-event drift-tube recalibration and its cut.
    pub drift_tube_cut: bool,
    /// Enables the global probability floor.
    pub global_cut: bool,
    /// The global floor value.
    pub min_weight: f64,
}

impl Default for WeightCutParams {
    fn default() -> Self {
        Self {
            drift_tube_cut: true,
            global_cut: false,
            min_weight: 0.25,
        }
    }
}

/// Transverse (planar) projection parameters, shared by xy and yz.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TransverseParams {
    /// Coord half-range (mm) in IP-constrained mode.
    pub half_range_mm: f64,
    /// Coord half-range (mm) in cosmic mode.
    pub half_range_cosmic_mm: f64,
    pub coord_step_mm: f64,
    pub coord_step_cosmic_mm: f64,
    /// Angle bin width (rad); the locus scan runs at this step.
    pub angle_step_rad: f64,
    pub sectors: usize,
    /// Minimum 3×3 area mass for a histogram maximum.
    pub histogram_threshold: f64,
    /// Minimum pattern size to trigger another level and enter merging.
    pub pattern_threshold: usize,
    pub residual_mm: f64,
    pub residual_cosmic_mm: f64,
    /// Scale (mm) of the 1/(1 + |r0|/scale) down-weighting in IP mode;
    /// `None` disables it.
    pub radius_weight_scale_mm: Option<f64>,
    /// Butterfly smear fraction.
    pub smear_fraction: f64,
    /// Cross-sector duplication fraction.
    pub sector_fraction: f64,
}

impl Default for TransverseParams {
    fn default() -> Self {
        Self {
            half_range_mm: 15_000.0,
            half_range_cosmic_mm: 25_000.0,
            coord_step_mm: 75.0,
            coord_step_cosmic_mm: 150.0,
            angle_step_rad: std::f64::consts::TAU / 360.0,
            sectors: 12,
            histogram_threshold: 0.9,
            pattern_threshold: 1,
            residual_mm: 500.0,
            residual_cosmic_mm: 2_000.0,
            radius_weight_scale_mm: Some(5_000.0),
            smear_fraction: 0.5,
            sector_fraction: 1.0 / 3.0,
        }
    }
}

/// Longitudinal (rz) projection parameters, shared by the beam and cosmic
/// variants.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LongitudinalParams {
    pub half_range_mm: f64,
    pub coord_step_mm: f64,
    pub coord_step_cosmic_mm: f64,
    pub angle_step_rad: f64,
    pub angle_step_cosmic_rad: f64,
    pub sectors: usize,
    pub histogram_threshold: f64,
    pub pattern_threshold: usize,
    pub residual_mm: f64,
    pub residual_cosmic_mm: f64,
    /// Angular residual (rad) used instead of the mm residual when
    /// `use_angular_residual` is set.
    pub residual_angle_rad: f64,
    pub use_angular_residual: bool,
    pub radius_weight_scale_mm: Option<f64>,
    pub smear_fraction: f64,
    pub sector_fraction: f64,
    /// Cosmic variant duplicates more aggressively across sectors.
    pub sector_fraction_cosmic: f64,
}

impl Default for LongitudinalParams {
    fn default() -> Self {
        Self {
            half_range_mm: 28_000.0,
            coord_step_mm: 250.0,
            coord_step_cosmic_mm: 500.0,
            angle_step_rad: std::f64::consts::PI / 360.0,
            angle_step_cosmic_rad: std::f64::consts::PI / 180.0,
            sectors: 16,
            histogram_threshold: 2.1,
            pattern_threshold: 3,
            residual_mm: 500.0,
            residual_cosmic_mm: 2_000.0,
            residual_angle_rad: 0.05,
            use_angular_residual: false,
            radius_weight_scale_mm: Some(5_000.0),
            smear_fraction: 0.5,
            sector_fraction: 1.0 / 3.0,
            sector_fraction_cosmic: 0.8,
        }
    }
}

/// Curved-at-cylinder projection parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CurvedParams {
    /// Number of inverse-curvature bins (split evenly between signs).
    pub curvature_bins: usize,
    /// Largest |inverse curvature| in the scan table (1/mm).
    pub max_inv_curvature: f64,
    /// Radius (mm) of the cylinder where bending starts.
    pub cylinder_radius_mm: f64,
    pub angle_step_rad: f64,
    pub sectors: usize,
    pub histogram_threshold: f64,
    pub pattern_threshold: usize,
    pub residual_mm: f64,
    pub smear_fraction: f64,
    pub sector_fraction: f64,
}

impl Default for CurvedParams {
    fn default() -> Self {
        Self {
            curvature_bins: 160,
            max_inv_curvature: 1.0 / 2_000.0,
            cylinder_radius_mm: 5_000.0,
            angle_step_rad: std::f64::consts::PI / 360.0,
            sectors: 16,
            histogram_threshold: 2.1,
            pattern_threshold: 3,
            residual_mm: 500.0,
            smear_fraction: 0.5,
            sector_fraction: 0.5,
        }
    }
}

/// Pattern merger parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MergerParams {
    /// Circular-distance cutoff for angular compatibility (rad).
    pub angle_cutoff_rad: f64,
    /// Deflection-angle compatibility cutoff |sin(a1 − a2)| for the
    /// longitudinal axis.
    pub curvature_cutoff: f64,
    /// Path length (mm) over which the deflection angles are compared.
    pub path_length_mm: f64,
    /// Overlap fraction above which two candidates merge.
    pub overlap_fraction: f64,
    /// Decreasing distance cutoffs (mm) of the transverse outlier removal.
    pub clean_cutoffs_mm: [f64; 4],
    /// Tightening cos-distance cuts of the merged transverse clean.
    pub merged_clean_cos_cuts: [f64; 4],
}

impl Default for MergerParams {
    fn default() -> Self {
        Self {
            angle_cutoff_rad: 0.5,
            curvature_cutoff: 0.05,
            path_length_mm: 1_000.0,
            overlap_fraction: 0.8,
            clean_cutoffs_mm: [1_000.0, 500.0, 250.0, 125.0],
            merged_clean_cos_cuts: [0.95, 0.99, 0.995, 0.995],
        }
    }
}
