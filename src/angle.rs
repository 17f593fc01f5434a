//! Angle utilities shared across projections, association, and merging.
//!
//! All angles are radians. Azimuths live in [0, 2π), polar angles in [0, π].
//! Aggregate angles are always computed through summed sine/cosine components
//! so that averages behave correctly across the periodic boundary.

/// Normalizes an angle into the range [0, 2π).
#[inline]
pub fn wrap_two_pi(angle: f64) -> f64 {
    let norm = angle.rem_euclid(std::f64::consts::TAU);
    if norm >= std::f64::consts::TAU {
        0.0
    } else {
        norm
    }
}

/// Circular distance between two angles: the angle between the corresponding
/// unit vectors, in [0, π].
#[inline]
pub fn circular_distance(a: f64, b: f64) -> f64 {
    let dot = (a.cos() * b.cos() + a.sin() * b.sin()).clamp(-1.0, 1.0);
    dot.acos()
}

/// Running sum of sine/cosine components used to build circular means.
#[derive(Clone, Copy, Debug, Default)]
pub struct CircularSum {
    sum_cos: f64,
    sum_sin: f64,
    weight: f64,
}

impl CircularSum {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(&mut self, angle: f64) {
        self.add_weighted(angle, 1.0);
    }

    #[inline]
    pub fn add_weighted(&mut self, angle: f64, weight: f64) {
        self.sum_cos += weight * angle.cos();
        self.sum_sin += weight * angle.sin();
        self.weight += weight;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weight <= 0.0
    }

    /// Circular mean of the accumulated angles, or `None` when nothing was
    /// accumulated or the components cancel to a degenerate resultant.
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let norm2 = self.sum_cos * self.sum_cos + self.sum_sin * self.sum_sin;
        if norm2 <= 1e-12 {
            return None;
        }
        Some(self.sum_sin.atan2(self.sum_cos))
    }
}

/// Size-weighted circular mean of two angles. Exact when both inputs agree.
pub fn weighted_circular_mean(a: f64, wa: f64, b: f64, wb: f64) -> f64 {
    let total = (wa + wb).max(1e-12);
    let cos = (wa * a.cos() + wb * b.cos()) / total;
    let sin = (wa * a.sin() + wb * b.sin()) / total;
    sin.atan2(cos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn wrap_two_pi_basic() {
        assert!(approx_eq(wrap_two_pi(0.5), 0.5));
        assert!(approx_eq(wrap_two_pi(-FRAC_PI_2), 1.5 * PI));
        assert!(approx_eq(wrap_two_pi(TAU + 0.25), 0.25));
    }

    #[test]
    fn circular_distance_handles_wrap() {
        assert!(approx_eq(circular_distance(0.05, TAU - 0.05), 0.1));
        assert!(approx_eq(circular_distance(0.0, PI), PI));
        assert!(approx_eq(circular_distance(FRAC_PI_2, -FRAC_PI_2), PI));
    }

    #[test]
    fn circular_sum_mean_crosses_boundary() {
        let mut sum = CircularSum::new();
        sum.add(0.1);
        sum.add(TAU - 0.1);
        let mean = sum.mean().expect("mean");
        assert!(approx_eq(wrap_two_pi(mean), 0.0));
    }

    #[test]
    fn circular_sum_degenerate_is_none() {
        let mut sum = CircularSum::new();
        sum.add(0.0);
        sum.add(PI);
        assert!(sum.mean().is_none());
        assert!(CircularSum::new().mean().is_none());
    }

    #[test]
    fn weighted_circular_mean_exact_when_equal() {
        let theta = 2.3;
        assert!(approx_eq(
            weighted_circular_mean(theta, 3.0, theta, 11.0),
            theta
        ));
    }
}
