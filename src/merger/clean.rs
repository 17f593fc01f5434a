//! Transverse candidate cleaning.
//!
//! Two flavours, both IP-constrained: merged pairs are re-selected under
//! tightening circular cuts around the running mean azimuth, and single
//! candidates lose their worst outlier hit per iteration under a fixed
//! schedule of decreasing distance cutoffs.

use crate::angle::CircularSum;
use crate::finder::params::MergerParams;
use crate::hit::EventHits;
use crate::pattern::{Pattern, TrackPattern};
use nalgebra::Vector3;

/// Output r0 convention for cleaned transverse patterns (mm).
const REFERENCE_R0: f64 = 1.0;

/// Merges two transverse patterns under the IP constraint.
///
/// The union of member hits is re-selected in passes: each pass keeps hits
/// whose azimuth lies within the pass's cos-distance cut of the running
/// circular mean, then recomputes the mean from the survivors. Fewer than
/// two survivors at any stage abort the merge.
pub(super) fn merge_transverse_pair(
    event: &EventHits,
    seed: &Pattern,
    other: &Pattern,
    params: &MergerParams,
) -> Option<TrackPattern> {
    let mut union = Pattern::new(seed.kind());
    union.set_union_hits(seed.hits(), other.hits());
    if union.len() < 2 {
        return None;
    }

    let mut selected: Vec<usize> = union.hits().to_vec();
    let mut sum = CircularSum::new();
    for &idx in &selected {
        sum.add(event.get(idx).azimuth());
    }
    let mut mean = sum.mean()?;

    for &cos_cut in &params.merged_clean_cos_cuts {
        let mut next = Vec::with_capacity(selected.len());
        let mut next_sum = CircularSum::new();
        for &idx in &selected {
            let phi = event.get(idx).azimuth();
            if (phi - mean).cos() > cos_cut {
                next.push(idx);
                next_sum.add(phi);
            }
        }
        if next.len() < 2 {
            return None;
        }
        mean = next_sum.mean()?;
        selected = next;
    }

    let theta = selected
        .iter()
        .map(|&idx| event.get(idx).polar())
        .sum::<f64>()
        / (selected.len() as f64 + 1e-7);

    Some(reference_track(mean, theta, selected))
}

/// Four-pass outlier removal for a single transverse candidate.
///
/// Each pass repeatedly finds the hit with the largest signed perpendicular
/// distance from the candidate's current line, drops it when the distance
/// exceeds the pass's cutoff, and re-estimates (phi, r0); then the next,
/// tighter cutoff takes over.
pub(super) fn clean_single_transverse(
    event: &EventHits,
    pattern: &Pattern,
    params: &MergerParams,
) -> TrackPattern {
    let mut work = pattern.clone();
    work.update_transverse_parameters(event, false);

    for &cutoff in &params.clean_cutoffs_mm {
        loop {
            let phi = work.e_phi;
            let r0 = work.r0_xy;
            let worst = work
                .hits()
                .iter()
                .map(|&idx| {
                    let hit = event.get(idx);
                    (idx, hit.x() * phi.sin() - hit.y() * phi.cos() - r0)
                })
                .fold(None, |acc: Option<(usize, f64)>, (idx, dist)| match acc {
                    Some((_, best)) if best >= dist => acc,
                    _ => Some((idx, dist)),
                });
            let Some((worst_idx, max_dist)) = worst else {
                break;
            };
            if max_dist < cutoff {
                break;
            }
            work.retain_hits(|h| h != worst_idx);
            work.update_transverse_parameters(event, false);
        }
    }

    let theta = work
        .hits()
        .iter()
        .map(|&idx| event.get(idx).polar())
        .sum::<f64>()
        / (work.len() as f64 + 1e-7);

    reference_track(work.e_phi, theta, work.hits().to_vec())
}

fn reference_track(phi: f64, theta: f64, hits: Vec<usize>) -> TrackPattern {
    let position = Vector3::new(REFERENCE_R0 * phi.sin(), -REFERENCE_R0 * phi.cos(), 0.0);
    let direction = Vector3::new(
        theta.sin() * phi.cos(),
        theta.sin() * phi.sin(),
        theta.cos(),
    );
    TrackPattern::from_parts(position, direction, hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::{Hit, Technology};
    use crate::projection::ProjectionKind;

    fn event_on_azimuth(phi: f64, n: usize) -> EventHits {
        let mut event = EventHits::new();
        for i in 0..n {
            let t = 3000.0 + 900.0 * i as f64;
            event.add_hit(Hit::new(
                [t * phi.cos(), t * phi.sin(), 400.0],
                Technology::StripTrigger,
                true,
                1.0,
            ));
        }
        event
    }

    fn pattern_over(event: &EventHits, indices: &[usize]) -> Pattern {
        let mut p = Pattern::new(ProjectionKind::PlanarXY);
        for &i in indices {
            p.push_hit(i);
        }
        p.refresh_mean_angles(event);
        p
    }

    #[test]
    fn merge_keeps_coherent_union() {
        let event = event_on_azimuth(0.7, 10);
        let a = pattern_over(&event, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        let b = pattern_over(&event, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let merged = merge_transverse_pair(&event, &a, &b, &MergerParams::default())
            .expect("merge succeeds");
        assert_eq!(merged.hits.len(), 10);
        let phi = merged.direction[1].atan2(merged.direction[0]);
        assert!((phi - 0.7).abs() < 1e-3);
    }

    #[test]
    fn merge_aborts_on_incoherent_hits() {
        // four mutually incompatible azimuths: no stage keeps two hits
        let mut event = EventHits::new();
        for phi in [0.0f64, 1.2, 2.4, 3.6] {
            event.add_hit(Hit::new(
                [5000.0 * phi.cos(), 5000.0 * phi.sin(), 0.0],
                Technology::StripTrigger,
                true,
                1.0,
            ));
        }
        let a = pattern_over(&event, &[0, 1]);
        let b = pattern_over(&event, &[2, 3]);
        assert!(merge_transverse_pair(&event, &a, &b, &MergerParams::default()).is_none());
    }

    #[test]
    fn clean_drops_far_outlier() {
        let phi = 1.2;
        let mut event = event_on_azimuth(phi, 9);
        // outlier well beyond the tightest cutoff, on the positive side of
        // the signed distance
        let out_idx = event.add_hit(Hit::new(
            [
                6000.0 * phi.cos() + 3000.0 * phi.sin(),
                6000.0 * phi.sin() - 3000.0 * phi.cos(),
                400.0,
            ],
            Technology::StripTrigger,
            true,
            1.0,
        ));
        let pattern = pattern_over(&event, &[0, 1, 2, 3, 4, 5, 6, 7, 8, out_idx]);
        let cleaned = clean_single_transverse(&event, &pattern, &MergerParams::default());
        assert!(!cleaned.hits.contains(&out_idx));
        assert_eq!(cleaned.hits.len(), 9);
    }

    #[test]
    fn clean_keeps_coherent_pattern_intact() {
        let event = event_on_azimuth(0.3, 8);
        let pattern = pattern_over(&event, &[0, 1, 2, 3, 4, 5, 6, 7]);
        let cleaned = clean_single_transverse(&event, &pattern, &MergerParams::default());
        assert_eq!(cleaned.hits.len(), 8);
    }
}
