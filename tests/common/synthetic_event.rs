use track_hough::{EventHits, Hit, Technology};

/// Appends `n` collinear transverse-measuring hits along azimuth `phi` at
/// transverse impact `r0` (mm). Returns the arena indices.
pub fn transverse_track(event: &mut EventHits, phi: f64, r0: f64, n: usize) -> Vec<usize> {
    let mut indices = Vec::with_capacity(n);
    for i in 0..n {
        let t = 4000.0 + 900.0 * i as f64;
        let x = t * phi.cos() - r0 * phi.sin();
        let y = t * phi.sin() + r0 * phi.cos();
        indices.push(event.add_hit(Hit::new(
            [x, y, 800.0],
            Technology::StripTrigger,
            true,
            1.0,
        )));
    }
    indices
}

/// Appends `n` drift-tube hits along a straight line through the origin with
/// polar angle `theta` and azimuth `phi`.
pub fn longitudinal_track(event: &mut EventHits, phi: f64, theta: f64, n: usize) -> Vec<usize> {
    let mut indices = Vec::with_capacity(n);
    for i in 0..n {
        let t = 5000.0 + 800.0 * i as f64;
        indices.push(event.add_hit(Hit::new(
            [
                t * theta.sin() * phi.cos(),
                t * theta.sin() * phi.sin(),
                t * theta.cos(),
            ],
            Technology::DriftTube,
            false,
            1.0,
        )));
    }
    indices
}
