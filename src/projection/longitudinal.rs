//! Longitudinal projections: straight lines in the rz plane.
//!
//! Parameter space: (r0, theta) with `r0 = z·sin(theta) − r·cos(theta)` the
//! signed perpendicular offset of the line from the origin in the rz plane
//! and `theta` the line's polar angle in [0, π]. The cosmic twin shares the
//! math and differs only in its constants (coarser bins, wider residual,
//! stronger cross-sector duplication, no interaction-point weighting).

use super::{Projection, ProjectionConfig};
use crate::angle::circular_distance;
use crate::diagnostics::FillStats;
use crate::histogram::{Maximum, SectorHistograms};
use crate::hit::Hit;

pub(super) fn fill_hit(
    cfg: &ProjectionConfig,
    projection: &Projection,
    hit: &Hit,
    weight: f64,
    sector: usize,
    histos: &mut SectorHistograms,
    stats: &mut FillStats,
) {
    let z = hit.z();
    let r = hit.radius_xy();
    let angle_width = (cfg.angle_range.1 - cfg.angle_range.0) / cfg.n_angle as f64;
    let reach = cfg.coord_range.1 + (cfg.coord_range.1 - cfg.coord_range.0) / cfg.n_coord as f64;

    for a_bin in 0..cfg.n_angle {
        let theta = cfg.angle_range.0 + (a_bin as f64 + 0.5) * angle_width;
        let r0 = z * theta.sin() - r * theta.cos();
        if r0.abs() > reach {
            continue;
        }
        let w = weight * projection.weight_of(r0);
        if w <= 0.0 {
            continue;
        }
        histos.fill_smeared(r0, theta, w, sector, &cfg.smear, stats);
    }
}

/// Residual acceptance: perpendicular mm distance by default, or the
/// polar-angle distance when the angular residual is configured.
pub(super) fn accepts_residual(cfg: &ProjectionConfig, hit: &Hit, maximum: &Maximum) -> bool {
    if cfg.use_angular_residual {
        circular_distance(hit.polar(), maximum.angle) <= cfg.residual_angle
    } else {
        let dist = hit.z() * maximum.angle.sin() - hit.radius_xy() * maximum.angle.cos()
            - maximum.coord;
        dist.abs() <= cfg.residual_mm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::params::FinderParams;
    use crate::histogram::BinIndex;
    use crate::hit::Technology;
    use crate::projection::{Projection, ProjectionKind};

    fn hit_at(theta: f64, t: f64) -> Hit {
        // on a line through the origin with polar angle theta
        Hit::new(
            [t * theta.sin(), 0.0, t * theta.cos()],
            Technology::DriftTube,
            false,
            1.0,
        )
    }

    fn maximum(r0: f64, theta: f64) -> Maximum {
        Maximum {
            sector: 0,
            bin: BinIndex { coord: 1, angle: 0 },
            coord: r0,
            angle: theta,
            mass: 1.0,
        }
    }

    #[test]
    fn origin_line_has_zero_offset() {
        let params = FinderParams::default();
        let projection = Projection::new(ProjectionKind::LongitudinalRZ, &params);
        let cfg = projection.config();
        let theta = 0.7;
        for t in [4000.0, 9000.0] {
            let hit = hit_at(theta, t);
            assert!(accepts_residual(cfg, &hit, &maximum(0.0, theta)));
            assert!(!accepts_residual(cfg, &hit, &maximum(5000.0, theta)));
        }
    }

    #[test]
    fn angular_residual_mode() {
        let mut params = FinderParams::default();
        params.longitudinal.use_angular_residual = true;
        params.longitudinal.residual_angle_rad = 0.02;
        let projection = Projection::new(ProjectionKind::LongitudinalRZ, &params);
        let cfg = projection.config();
        let hit = hit_at(0.7, 5000.0);
        assert!(accepts_residual(cfg, &hit, &maximum(0.0, 0.71)));
        assert!(!accepts_residual(cfg, &hit, &maximum(0.0, 0.78)));
    }
}
