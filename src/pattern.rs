//! Candidate patterns and their aggregate estimators.

use crate::angle::CircularSum;
use crate::hit::EventHits;
use crate::projection::ProjectionKind;
use nalgebra::Vector3;
use serde::Serialize;

/// A candidate group of hits believed to belong to one track segment.
///
/// The hit list holds arena indices in association order; association scans
/// the arena in index order, so the list is strictly ascending, which is what
/// the merger's linear-scan overlap relies on. Merged patterns are built via
/// sorted union to keep the invariant.
#[derive(Clone, Debug)]
pub struct Pattern {
    kind: ProjectionKind,
    hits: Vec<usize>,
    /// Circular-mean azimuth of the member hits.
    pub e_phi: f64,
    /// Circular-mean polar angle (for the curved projection: the implied
    /// polar angle at the origin).
    pub e_theta: f64,
    /// Transverse impact-parameter estimate (mm).
    pub r0_xy: f64,
    /// Longitudinal offset estimate (mm), the coord axis of the rz spaces.
    pub r0_rz: f64,
    /// Signed inverse curvature (1/mm); 0 means straight.
    pub inv_curvature: f64,
    /// Accumulated histogram mass at the seeding maximum.
    pub maximum: f64,
}

impl Pattern {
    pub fn new(kind: ProjectionKind) -> Self {
        Self {
            kind,
            hits: Vec::new(),
            e_phi: 0.0,
            e_theta: 0.0,
            r0_xy: 0.0,
            r0_rz: 0.0,
            inv_curvature: 0.0,
            maximum: 0.0,
        }
    }

    #[inline]
    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Member hit indices, ascending.
    #[inline]
    pub fn hits(&self) -> &[usize] {
        &self.hits
    }

    pub fn contains(&self, hit: usize) -> bool {
        self.hits.binary_search(&hit).is_ok()
    }

    /// Appends a hit index. Indices must arrive in ascending order;
    /// out-of-order or duplicate pushes are ignored.
    pub fn push_hit(&mut self, hit: usize) {
        if self.hits.last().map_or(true, |&last| hit > last) {
            self.hits.push(hit);
        }
    }

    /// Replaces the member list with the sorted union of two patterns' lists.
    pub fn set_union_hits(&mut self, a: &[usize], b: &[usize]) {
        self.hits.clear();
        self.hits.reserve(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => {
                    self.hits.push(a[i]);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    self.hits.push(b[j]);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    self.hits.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        self.hits.extend_from_slice(&a[i..]);
        self.hits.extend_from_slice(&b[j..]);
    }

    pub fn retain_hits(&mut self, keep: impl Fn(usize) -> bool) {
        self.hits.retain(|&h| keep(h));
    }

    /// Reference position implied by the aggregate parameters: the point of
    /// closest transverse approach, at the longitudinal offset.
    pub fn position(&self) -> Vector3<f64> {
        let z = self.r0_rz * self.e_theta.sin();
        Vector3::new(
            self.r0_xy * self.e_phi.sin(),
            -self.r0_xy * self.e_phi.cos(),
            z,
        )
    }

    /// Unit direction implied by the aggregate angles.
    pub fn direction(&self) -> Vector3<f64> {
        Vector3::new(
            self.e_theta.sin() * self.e_phi.cos(),
            self.e_theta.sin() * self.e_phi.sin(),
            self.e_theta.cos(),
        )
    }

    /// Re-estimates (phi, r0) in the transverse plane from the member hits.
    ///
    /// Principal-direction estimate: hits are weighted by their squared
    /// distance from the member centroid, with the sign folded so antipodal
    /// offsets reinforce instead of cancel. Unless `cosmic` is set the
    /// centroid is anchored towards the origin by doubling the divisor,
    /// which encodes the interaction-point constraint. Near-degenerate
    /// component sums leave the previous estimate untouched.
    pub fn update_transverse_parameters(&mut self, event: &EventHits, cosmic: bool) {
        if self.hits.is_empty() {
            return;
        }

        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        for &idx in &self.hits {
            let hit = event.get(idx);
            sum_x += hit.x();
            sum_y += hit.y();
        }
        let mut divisor = self.hits.len() as f64;
        if !cosmic || self.hits.len() == 1 {
            divisor += self.hits.len() as f64;
        }
        let av_x = sum_x / divisor;
        let av_y = sum_y / divisor;

        let mut sx = 0.0;
        let mut sy = 0.0;
        for &idx in &self.hits {
            let hit = event.get(idx);
            let dx = hit.x() - av_x;
            let dy = hit.y() - av_y;
            let height2 = dx * dx + dy * dy;
            let sign = if dx * hit.x() + dy * hit.y() < 0.0 {
                -1.0
            } else {
                1.0
            };
            sx += height2 * sign * dx;
            sy += height2 * sign * dy;
        }

        if sx.abs() < 1e-6 || sy.abs() < 1e-6 {
            return;
        }
        let phi = sy.atan2(sx);
        self.e_phi = phi;
        self.r0_xy = av_x * phi.sin() - av_y * phi.cos();
    }

    /// Circular-mean azimuth and arithmetic-mean polar angle of the members.
    pub fn refresh_mean_angles(&mut self, event: &EventHits) {
        let mut phi_sum = CircularSum::new();
        let mut theta_sum = 0.0;
        for &idx in &self.hits {
            let hit = event.get(idx);
            phi_sum.add(hit.azimuth());
            theta_sum += hit.polar();
        }
        if let Some(phi) = phi_sum.mean() {
            self.e_phi = phi;
        }
        if !self.hits.is_empty() {
            self.e_theta = theta_sum / (self.hits.len() as f64 + 1e-7);
        }
    }
}

/// Final output pattern handed to the downstream track-candidate builder.
#[derive(Clone, Debug, Serialize)]
pub struct TrackPattern {
    /// Reference position (mm).
    pub position: [f64; 3],
    /// Reference direction; its magnitude carries the curvature scale for
    /// curved-axis patterns and is 1 otherwise.
    pub direction: [f64; 3],
    /// Member hit arena indices, ascending.
    pub hits: Vec<usize>,
}

impl TrackPattern {
    pub fn from_parts(position: Vector3<f64>, direction: Vector3<f64>, hits: Vec<usize>) -> Self {
        Self {
            position: [position.x, position.y, position.z],
            direction: [direction.x, direction.y, direction.z],
            hits,
        }
    }
}
