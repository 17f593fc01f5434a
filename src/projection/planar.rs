//! Planar projections: straight lines in the xy and yz planes.
//!
//! Parameter space: (r0, phi) with `r0 = ρ·sin(α − phi)` the signed
//! perpendicular distance of the line from the origin, `ρ`/`α` the hit's
//! radius and azimuth in the projection plane, and `phi` the line direction
//! angle in [0, 2π).

use super::{Projection, ProjectionConfig, ProjectionKind};
use crate::angle::wrap_two_pi;
use crate::diagnostics::FillStats;
use crate::histogram::{Maximum, SectorHistograms};
use crate::hit::Hit;

#[inline]
fn plane_uv(kind: ProjectionKind, hit: &Hit) -> (f64, f64) {
    match kind {
        ProjectionKind::PlanarXY => (hit.x(), hit.y()),
        ProjectionKind::PlanarYZ => (hit.y(), hit.z()),
        _ => unreachable!("planar projection expected"),
    }
}

/// Azimuth of a hit in the yz plane, in [0, 2π).
#[inline]
pub(super) fn yz_azimuth(hit: &Hit) -> f64 {
    wrap_two_pi(hit.z().atan2(hit.y()))
}

/// Scans the angle axis and fills the hit's locus `r0(phi)`.
pub(super) fn fill_hit(
    cfg: &ProjectionConfig,
    projection: &Projection,
    hit: &Hit,
    weight: f64,
    sector: usize,
    histos: &mut SectorHistograms,
    stats: &mut FillStats,
) {
    let (u, v) = plane_uv(cfg.kind, hit);
    let rho = u.hypot(v);
    if rho <= f64::EPSILON {
        return;
    }
    let alpha = v.atan2(u);
    let angle_width = (cfg.angle_range.1 - cfg.angle_range.0) / cfg.n_angle as f64;
    let reach = cfg.coord_range.1 + (cfg.coord_range.1 - cfg.coord_range.0) / cfg.n_coord as f64;

    for a_bin in 0..cfg.n_angle {
        let phi = cfg.angle_range.0 + (a_bin as f64 + 0.5) * angle_width;
        let r0 = rho * (alpha - phi).sin();
        if r0.abs() > reach {
            continue;
        }
        let w = weight * projection.weight_of(r0);
        if w <= 0.0 {
            continue;
        }
        histos.fill_smeared(r0, phi, w, sector, &cfg.smear, stats);
    }
}

/// Signed perpendicular distance of a hit from the line implied by a
/// maximum.
pub(super) fn residual(cfg: &ProjectionConfig, hit: &Hit, maximum: &Maximum) -> f64 {
    let (u, v) = plane_uv(cfg.kind, hit);
    let rho = u.hypot(v);
    let alpha = v.atan2(u);
    rho * (alpha - maximum.angle).sin() - maximum.coord
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::params::FinderParams;
    use crate::hit::Technology;
    use crate::projection::Projection;
    use std::f64::consts::TAU;

    fn hit_on_line(phi: f64, r0: f64, t: f64) -> Hit {
        // point = t·(cos phi, sin phi) + r0·(−sin phi, cos phi), so that
        // ρ·sin(α − phi) = r0 exactly
        let x = t * phi.cos() - r0 * phi.sin();
        let y = t * phi.sin() + r0 * phi.cos();
        Hit::new([x, y, 500.0], Technology::StripTrigger, true, 1.0)
    }

    #[test]
    fn residual_vanishes_on_the_generating_line() {
        let params = FinderParams::default();
        let projection = Projection::new(crate::projection::ProjectionKind::PlanarXY, &params);
        let phi = 1.1;
        let r0 = -200.0;
        let maximum = Maximum {
            sector: 0,
            bin: crate::histogram::BinIndex { coord: 1, angle: 0 },
            coord: r0,
            angle: phi,
            mass: 1.0,
        };
        for t in [3000.0, 6000.0, 11000.0] {
            let hit = hit_on_line(phi, r0, t);
            let d = residual(projection_cfg(&projection), &hit, &maximum);
            assert!(d.abs() < 1e-6, "residual {d} at t={t}");
        }
    }

    #[test]
    fn yz_azimuth_wraps() {
        let hit = Hit::new([0.0, 1000.0, -1000.0], Technology::StripTrigger, true, 1.0);
        let a = yz_azimuth(&hit);
        assert!((0.0..TAU).contains(&a));
        assert!((a - 7.0 * TAU / 8.0).abs() < 1e-9);
    }

    fn projection_cfg(projection: &Projection) -> &ProjectionConfig {
        projection.config()
    }
}
