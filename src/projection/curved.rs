//! Curved-at-cylinder projection.
//!
//! Tracks are modelled as straight from the origin out to a cylinder radius
//! and circular beyond it. The coord axis is an index into a non-uniform
//! table of signed inverse curvatures; the angle axis is the implied polar
//! angle at the origin. For a hit at spherical radius ρ beyond the cylinder
//! the small-sagitta deflection is `ψ = asin(κ·(ρ − R)/2)`, so the origin
//! angle consistent with the hit is `θ₀ = θ_hit − ψ`; solutions outside
//! (0, π) are rejected.

use super::ProjectionConfig;
use crate::diagnostics::FillStats;
use crate::histogram::{Maximum, SectorHistograms};
use crate::hit::Hit;
use std::f64::consts::PI;

/// Signed inverse-curvature scan table: quadratic spacing, dense near zero
/// curvature (straight tracks), coarse at the extremes.
pub(super) fn curvature_table(bins: usize, max_inv_curvature: f64) -> Vec<f64> {
    let half = (bins / 2).max(1) as f64;
    (0..bins)
        .map(|i| {
            let centered = (i as f64 - (bins as f64 - 1.0) / 2.0) / half;
            centered * centered.abs() * max_inv_curvature
        })
        .collect()
}

/// Deflection angle accumulated beyond the cylinder, `None` when the
/// curvature cannot reach the hit at all.
fn deflection(hit: &Hit, inv_curvature: f64, cylinder_radius: f64) -> Option<f64> {
    let lever = hit.radius() - cylinder_radius;
    if lever <= 0.0 {
        return Some(0.0);
    }
    let s = 0.5 * inv_curvature * lever;
    if s.abs() >= 1.0 {
        None
    } else {
        Some(s.asin())
    }
}

pub(super) fn fill_hit(
    cfg: &ProjectionConfig,
    hit: &Hit,
    weight: f64,
    sector: usize,
    histos: &mut SectorHistograms,
    stats: &mut FillStats,
) {
    for (i, &kappa) in cfg.curvature_table.iter().enumerate() {
        let Some(psi) = deflection(hit, kappa, cfg.cylinder_radius) else {
            continue;
        };
        let theta0 = hit.polar() - psi;
        if theta0 <= 0.0 || theta0 >= PI {
            continue;
        }
        histos.fill_smeared(i as f64 + 0.5, theta0, weight, sector, &cfg.smear, stats);
    }
}

/// Distance of a hit from the curved trajectory implied by a maximum,
/// measured perpendicular to the track in the rz plane.
pub(super) fn residual(cfg: &ProjectionConfig, hit: &Hit, maximum: &Maximum) -> f64 {
    let slot = maximum
        .bin
        .coord
        .saturating_sub(1)
        .min(cfg.curvature_table.len() - 1);
    let kappa = cfg.curvature_table[slot];
    let Some(psi) = deflection(hit, kappa, cfg.cylinder_radius) else {
        return f64::MAX;
    };
    let theta_pred = maximum.angle + psi;
    hit.radius() * (hit.polar() - theta_pred).sin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::Technology;

    #[test]
    fn table_is_monotonic_and_dense_near_zero() {
        let table = curvature_table(160, 5e-4);
        assert_eq!(table.len(), 160);
        for pair in table.windows(2) {
            assert!(pair[1] > pair[0]);
        }
        let inner_gap = table[80] - table[79];
        let outer_gap = table[159] - table[158];
        assert!(inner_gap < outer_gap);
        assert!(table[0] < 0.0 && table[159] > 0.0);
    }

    #[test]
    fn no_deflection_inside_the_cylinder() {
        let hit = Hit::new([2000.0, 0.0, 3000.0], Technology::DriftTube, false, 1.0);
        assert_eq!(deflection(&hit, 4e-4, 5000.0), Some(0.0));
    }

    #[test]
    fn deflection_grows_with_curvature_and_lever() {
        let hit = Hit::new([8000.0, 0.0, 6000.0], Technology::DriftTube, false, 1.0);
        let small = deflection(&hit, 1e-4, 5000.0).expect("deflection");
        let large = deflection(&hit, 3e-4, 5000.0).expect("deflection");
        assert!(large > small && small > 0.0);
    }

    #[test]
    fn unreachable_curvature_is_rejected() {
        let hit = Hit::new([40_000.0, 0.0, 0.0], Technology::DriftTube, false, 1.0);
        assert_eq!(deflection(&hit, 1e-4, 5000.0), None);
    }
}
