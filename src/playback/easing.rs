//! Fade interpolation.

use egui::emath::easing;

/// Quadratic ease-in/ease-out on `t ∈ [0, 1]` (clamped).
pub fn ease_in_out_quad(t: f32) -> f32 {
    easing::quadratic_in_out(t.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_and_midpoint() {
        assert!(ease_in_out_quad(0.0).abs() < 1e-6);
        assert!((ease_in_out_quad(1.0) - 1.0).abs() < 1e-6);
        assert!((ease_in_out_quad(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn slow_at_the_edges() {
        assert!(ease_in_out_quad(0.25) < 0.25);
        assert!(ease_in_out_quad(0.75) > 0.75);
    }

    #[test]
    fn monotonic_and_clamped() {
        let mut last = ease_in_out_quad(-1.0);
        assert!(last.abs() < 1e-6);
        for i in 1..=100 {
            let v = ease_in_out_quad(i as f32 / 100.0);
            assert!(v >= last);
            last = v;
        }
        assert!((ease_in_out_quad(2.0) - 1.0).abs() < 1e-6);
    }
}
