/// Cubic ease-in-out on `[0, 1]`; input is clamped.
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u * 0.5
    }
}

/// Linear progress of `elapsed` through `duration`, clamped to `[0, 1]`.
/// A non-positive duration is already complete.
pub fn progress(elapsed_ms: f64, duration_ms: f64) -> f64 {
    if !(duration_ms > 0.0) {
        return 1.0;
    }
    (elapsed_ms / duration_ms).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::{ease_cubic_in_out, progress};

    #[test]
    fn cubic_endpoints_and_symmetry() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
        assert_eq!(ease_cubic_in_out(0.5), 0.5);
        let a = ease_cubic_in_out(0.2);
        let b = ease_cubic_in_out(0.8);
        assert!((a + b - 1.0).abs() < 1e-12);
        assert_eq!(ease_cubic_in_out(-3.0), 0.0);
    }

    #[test]
    fn progress_clamps() {
        assert_eq!(progress(50.0, 100.0), 0.5);
        assert_eq!(progress(500.0, 100.0), 1.0);
        assert_eq!(progress(-5.0, 100.0), 0.0);
        assert_eq!(progress(0.0, 0.0), 1.0);
    }
}
