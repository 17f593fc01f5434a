//! Pattern deduplication and merging.
//!
//! Overview
//! - Candidates from one projection's grid are compared pairwise in
//!   (level, slot) order. Angularly compatible pairs are classified by hit
//!   overlap: identical/subsumed candidates are dropped, heavily overlapping
//!   ones (> 80% of either) are merged with size-weighted circular means,
//!   everything else survives independently.
//! - Hit lists are ascending by arena id, so overlap is one linear merge
//!   scan per pair, not a quadratic probe.
//! - The transverse axis additionally cleans its candidates: merged pairs go
//!   through tightening circular cuts, single IP-mode candidates through the
//!   four-pass outlier removal in `clean`.

mod clean;

use crate::angle::{circular_distance, weighted_circular_mean};
use crate::diagnostics::MergerDiagnostics;
use crate::finder::builder::PatternGrid;
use crate::finder::params::{FinderParams, MergerParams};
use crate::hit::EventHits;
use crate::pattern::{Pattern, TrackPattern};
use log::debug;
use nalgebra::Vector3;

/// Merges one projection grid into a flat output collection.
pub struct PatternMerger<'a> {
    event: &'a EventHits,
    params: &'a MergerParams,
    ip_constrained: bool,
    transverse_threshold: usize,
    longitudinal_threshold: usize,
}

impl<'a> PatternMerger<'a> {
    pub fn new(event: &'a EventHits, params: &'a FinderParams) -> Self {
        Self {
            event,
            params: &params.merger,
            ip_constrained: !params.cosmic_mode,
            transverse_threshold: params.transverse.pattern_threshold,
            longitudinal_threshold: params.longitudinal.pattern_threshold,
        }
    }

    /// Transverse ("phi") axis: dedup + merge + clean.
    pub fn merge_transverse(&self, grid: &PatternGrid) -> (Vec<TrackPattern>, MergerDiagnostics) {
        let entries: Vec<&Pattern> = grid.iter_nonempty().map(|(_, p)| p).collect();
        let mut merged = vec![false; entries.len()];
        let mut out = Vec::new();
        let mut diag = MergerDiagnostics {
            candidates: entries.len(),
            ..Default::default()
        };

        for i in 0..entries.len() {
            if entries[i].len() < self.transverse_threshold {
                continue;
            }
            for k in i + 1..entries.len() {
                if merged[i] {
                    break;
                }
                if merged[k] || entries[k].len() < self.transverse_threshold {
                    continue;
                }
                let (a, b) = (entries[i], entries[k]);
                let psi = circular_distance(a.e_phi, b.e_phi);
                let chi = circular_distance(a.e_theta, b.e_theta);
                // the transverse axis accepts either angle agreeing
                if psi >= self.params.angle_cutoff_rad && chi >= self.params.angle_cutoff_rad {
                    continue;
                }
                match self.classify(a, b) {
                    OverlapClass::DropSecond => {
                        merged[k] = true;
                        diag.dropped_subsumed += 1;
                    }
                    OverlapClass::DropFirst => {
                        merged[i] = true;
                        diag.dropped_subsumed += 1;
                    }
                    OverlapClass::Merge if self.ip_constrained => {
                        let (seed, other) = if a.len() >= b.len() { (a, b) } else { (b, a) };
                        if let Some(track) =
                            clean::merge_transverse_pair(self.event, seed, other, self.params)
                        {
                            out.push(track);
                            merged[i] = true;
                            merged[k] = true;
                            diag.merged_pairs += 1;
                        }
                    }
                    _ => {}
                }
            }
        }

        for (i, pattern) in entries.iter().enumerate() {
            if merged[i] {
                continue;
            }
            let track = if self.ip_constrained {
                clean::clean_single_transverse(self.event, pattern, self.params)
            } else {
                phi_track(pattern)
            };
            out.push(track);
        }
        diag.emitted = out.len();
        debug!(
            "PatternMerger: transverse {} candidates -> {} (dropped {} merged {})",
            diag.candidates, diag.emitted, diag.dropped_subsumed, diag.merged_pairs,
        );
        (out, diag)
    }

    /// Longitudinal ("eta") axis: dedup + merge, no cleaning.
    pub fn merge_longitudinal(&self, grid: &PatternGrid) -> (Vec<TrackPattern>, MergerDiagnostics) {
        let entries: Vec<&Pattern> = grid.iter_nonempty().map(|(_, p)| p).collect();
        let mut merged = vec![false; entries.len()];
        let mut out = Vec::new();
        let mut diag = MergerDiagnostics {
            candidates: entries.len(),
            ..Default::default()
        };

        for i in 0..entries.len() {
            if entries[i].len() < self.longitudinal_threshold {
                continue;
            }
            for k in i + 1..entries.len() {
                if merged[i] {
                    break;
                }
                if merged[k] || entries[k].len() < self.longitudinal_threshold {
                    continue;
                }
                let (a, b) = (entries[i], entries[k]);
                let psi = circular_distance(a.e_phi, b.e_phi);
                let chi = circular_distance(a.e_theta, b.e_theta);
                if psi >= self.params.angle_cutoff_rad || chi >= self.params.angle_cutoff_rad {
                    continue;
                }
                if !self.curvature_compatible(a, b) {
                    continue;
                }
                match self.classify(a, b) {
                    OverlapClass::DropSecond => {
                        merged[k] = true;
                        diag.dropped_subsumed += 1;
                    }
                    OverlapClass::DropFirst => {
                        merged[i] = true;
                        diag.dropped_subsumed += 1;
                    }
                    OverlapClass::Merge => {
                        let (seed, other) = if a.len() >= b.len() { (a, b) } else { (b, a) };
                        if let Some(pattern) = self.merge_longitudinal_pair(seed, other) {
                            out.push(eta_track(&pattern));
                            merged[i] = true;
                            merged[k] = true;
                            diag.merged_pairs += 1;
                        }
                    }
                    OverlapClass::Keep => {}
                }
            }
        }

        for (i, pattern) in entries.iter().enumerate() {
            if !merged[i] {
                out.push(eta_track(pattern));
            }
        }
        diag.emitted = out.len();
        debug!(
            "PatternMerger: longitudinal {} candidates -> {} (dropped {} merged {})",
            diag.candidates, diag.emitted, diag.dropped_subsumed, diag.merged_pairs,
        );
        (out, diag)
    }

    /// Lifts every non-empty pattern of a grid without merging (curved
    /// output collection).
    pub fn lift_unmerged(&self, grid: &PatternGrid) -> Vec<TrackPattern> {
        grid.iter_nonempty().map(|(_, p)| eta_track(p)).collect()
    }

    /// Decision table over the overlap count, evaluated in order.
    fn classify(&self, a: &Pattern, b: &Pattern) -> OverlapClass {
        let overlap = overlap(a, b);
        let (ns1, ns2) = (a.len(), b.len());
        if overlap == ns2 && overlap <= ns1 {
            return OverlapClass::DropSecond;
        }
        if overlap == ns1 && overlap < ns2 {
            return OverlapClass::DropFirst;
        }
        let frac = self.params.overlap_fraction;
        if overlap as f64 > frac * ns1 as f64 || overlap as f64 > frac * ns2 as f64 {
            return OverlapClass::Merge;
        }
        OverlapClass::Keep
    }

    /// Compares the deflection angles the two curvatures imply over the
    /// configured path length. Straight patterns (zero inverse curvature)
    /// are compatible with each other and with near-straight ones of either
    /// sign.
    fn curvature_compatible(&self, a: &Pattern, b: &Pattern) -> bool {
        let a1 = deflection_angle(a.inv_curvature, self.params.path_length_mm);
        let a2 = deflection_angle(b.inv_curvature, self.params.path_length_mm);
        (a1 - a2).sin().abs() < self.params.curvature_cutoff
    }

    /// Size-weighted merge of two longitudinal patterns. Requires at least
    /// two member hits in total.
    fn merge_longitudinal_pair(&self, seed: &Pattern, other: &Pattern) -> Option<Pattern> {
        if seed.len() + other.len() < 2 {
            return None;
        }
        let (wa, wb) = (seed.len() as f64, other.len() as f64);
        let total = wa + wb;

        let mut out = Pattern::new(seed.kind());
        out.set_union_hits(seed.hits(), other.hits());
        out.e_theta = weighted_circular_mean(seed.e_theta, wa, other.e_theta, wb);
        out.e_phi = weighted_circular_mean(seed.e_phi, wa, other.e_phi, wb);
        out.inv_curvature = (wa * seed.inv_curvature + wb * other.inv_curvature) / total;
        out.r0_rz = (wa * seed.r0_rz + wb * other.r0_rz) / total;
        out.r0_xy = if self.ip_constrained {
            (wa * seed.r0_xy + wb * other.r0_xy) / total
        } else {
            seed.r0_xy
        };
        out.maximum = seed.maximum.max(other.maximum);
        Some(out)
    }
}

enum OverlapClass {
    DropSecond,
    DropFirst,
    Merge,
    Keep,
}

/// Count of hit ids present in both patterns. Both lists are ascending, so
/// one merge scan suffices; the count is symmetric in its arguments.
pub fn overlap(a: &Pattern, b: &Pattern) -> usize {
    let (ha, hb) = (a.hits(), b.hits());
    let (mut i, mut j, mut n) = (0, 0, 0);
    while i < ha.len() && j < hb.len() {
        match ha[i].cmp(&hb[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                n += 1;
                i += 1;
                j += 1;
            }
        }
    }
    n
}

/// Polar deflection over `path` implied by a signed inverse curvature.
fn deflection_angle(inv_curvature: f64, path: f64) -> f64 {
    let c = (1.0 - path * inv_curvature.abs()).clamp(-1.0, 1.0);
    let c = if inv_curvature < 0.0 { -c } else { c };
    c.acos()
}

/// Output conventions of the longitudinal axis: the curvature sign flips the
/// reference position and the direction magnitude carries the curvature
/// scale.
fn eta_track(p: &Pattern) -> TrackPattern {
    let charge = if p.inv_curvature < 0.0 { -1.0 } else { 1.0 };
    let pscale = if p.inv_curvature != 0.0 {
        1.0 / p.inv_curvature.abs()
    } else {
        1.0
    };
    let position = Vector3::new(
        charge * p.r0_xy * p.e_phi.sin(),
        -charge * p.r0_xy * p.e_phi.cos(),
        p.r0_rz * p.e_theta.sin(),
    );
    let direction = pscale * p.direction();
    TrackPattern::from_parts(position, direction, p.hits().to_vec())
}

/// Plain transverse lift used outside IP mode.
fn phi_track(p: &Pattern) -> TrackPattern {
    TrackPattern::from_parts(p.position(), p.direction(), p.hits().to_vec())
}
