//! Sub-pixel distance from a pixel center to a straight anti-aliased edge.

/// Distance from a pixel center to a straight edge crossing the pixel.
///
/// `(gx, gy)` is the edge direction and `a` the fraction of the pixel covered
/// by the shape. The direction can be either the local alpha gradient or the
/// integer offset towards the pixel; the formula is the same.
///
/// The model folds the direction into the first octant (`gx >= gy >= 0`) and
/// evaluates a piecewise closed form: a corner region for small coverage, a
/// linear middle band, and the mirrored corner region for high coverage. If
/// either component is zero the linear `0.5 - a` is returned.
pub fn approximate_edge_delta(gx: f32, gy: f32, a: f32) -> f32 {
    if gx == 0.0 || gy == 0.0 {
        return 0.5 - a;
    }

    let len = (gx * gx + gy * gy).sqrt();
    let mut gx = (gx / len).abs();
    let mut gy = (gy / len).abs();
    if gx < gy {
        core::mem::swap(&mut gx, &mut gy);
    }

    let a1 = 0.5 * gy / gx;
    if a < a1 {
        return 0.5 * (gx + gy) - (2.0 * gx * gy * a).sqrt();
    }
    if a < 1.0 - a1 {
        return (0.5 - a) * gx;
    }
    -0.5 * (gx + gy) + (2.0 * gx * gy * (1.0 - a)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::approximate_edge_delta;

    #[test]
    fn axis_aligned_edge_is_linear() {
        assert_eq!(approximate_edge_delta(1.0, 0.0, 0.5), 0.0);
        assert_eq!(approximate_edge_delta(0.0, 1.0, 0.5), 0.0);
        assert_eq!(approximate_edge_delta(1.0, 0.0, 0.0), 0.5);
        assert_eq!(approximate_edge_delta(0.0, -3.0, 1.0), -0.5);
        assert_eq!(approximate_edge_delta(0.0, 0.0, 0.25), 0.25);
    }

    #[test]
    fn octant_fold_symmetry() {
        for &(gx, gy) in &[(1.0f32, 2.0f32), (0.3, 0.7), (5.0, 1.0), (1.0, 1.0)] {
            for i in 0..=20 {
                let a = i as f32 / 20.0;
                let d = approximate_edge_delta(gx, gy, a);
                assert!((d - approximate_edge_delta(gy, gx, a)).abs() < 1e-6);
                assert!((d - approximate_edge_delta(-gx, gy, a)).abs() < 1e-6);
                assert!((d - approximate_edge_delta(gx, -gy, a)).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn diagonal_edge_extremes() {
        let s = core::f32::consts::FRAC_1_SQRT_2;
        // An empty pixel sits half a diagonal away from the corner it touches.
        assert!((approximate_edge_delta(1.0, 1.0, 0.0) - s).abs() < 1e-6);
        assert!((approximate_edge_delta(1.0, 1.0, 1.0) + s).abs() < 1e-6);
        assert!(approximate_edge_delta(1.0, 1.0, 0.5).abs() < 1e-6);
    }

    #[test]
    fn continuous_across_band_limits() {
        let (gx, gy) = (2.0f32, 1.0f32);
        let n = (gx * gx + gy * gy).sqrt();
        let a1 = 0.5 * (gy / n) / (gx / n);
        for a in [a1, 1.0 - a1] {
            let lo = approximate_edge_delta(gx, gy, a - 1e-4);
            let hi = approximate_edge_delta(gx, gy, a + 1e-4);
            assert!((lo - hi).abs() < 1e-3, "jump at a={a}: {lo} vs {hi}");
        }
    }

    #[test]
    fn decreases_with_coverage() {
        let mut prev = f32::INFINITY;
        for i in 0..=50 {
            let a = i as f32 / 50.0;
            let d = approximate_edge_delta(3.0, 1.0, a);
            assert!(d <= prev + 1e-6);
            prev = d;
        }
    }
}
