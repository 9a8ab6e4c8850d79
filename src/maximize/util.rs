//! Helpers shared by the maximizers.

use rand::{Rng, RngCore};

/// Relative change under which two scores are treated as equal.
pub const CONVERGENCE_TOLERANCE: f64 = 1e-4;

/// A random vector of `n` coordinates with Euclidean length `length`.
///
/// Coordinates are drawn uniformly from [-1, 1] before normalization, so the
/// direction is not uniform on the sphere. A zero `length` gives the zero
/// vector.
pub fn random_arguments(n: usize, length: f64, rng: &mut dyn RngCore) -> Vec<f64> {
    let mut x: Vec<f64> = (0..n).map(|_| rng.random::<f64>() * 2.0 - 1.0).collect();
    let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in &mut x {
            *v = *v / norm * length;
        }
    }
    x
}

/// `2|a - b| / (|a| + |b|)`, with two zeros counting as identical.
pub fn relative_spread(a: f64, b: f64) -> f64 {
    let scale = a.abs() + b.abs();
    if scale == 0.0 {
        0.0
    } else {
        2.0 * (a - b).abs() / scale
    }
}

/// Comma-separated scientific rendering for progress lines.
pub fn format_arguments(arguments: &[f64]) -> String {
    arguments
        .iter()
        .map(|v| format!("{v:e}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_arguments_have_requested_length() {
        let mut rng = StdRng::seed_from_u64(1);
        for &length in &[1.0, 0.25, 3.0] {
            let x = random_arguments(5, length, &mut rng);
            let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!((norm - length).abs() < 1e-12);
        }
    }

    #[test]
    fn random_arguments_degenerate_sizes() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(random_arguments(0, 1.0, &mut rng).is_empty());
        assert!(random_arguments(3, 0.0, &mut rng).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn relative_spread_handles_zero() {
        assert_eq!(relative_spread(0.0, 0.0), 0.0);
        assert!((relative_spread(1.0, 3.0) - 1.0).abs() < 1e-12);
        assert_eq!(relative_spread(2.0, 2.0), 0.0);
    }

    #[test]
    fn spread_is_scale_free_near_zero() {
        // Two values closing in on a peak of 0 keep the same relative spread.
        for scale in [1e-3, 1e-9, 1e-15] {
            assert!((relative_spread(-scale, -3.0 * scale) - 1.0).abs() < 1e-9);
        }
        assert!(relative_spread(-1e-12, 0.0) > CONVERGENCE_TOLERANCE);
    }

    #[test]
    fn format_uses_scientific_notation() {
        assert_eq!(format_arguments(&[1.5, -0.25]), "1.5e0, -2.5e-1");
    }
}
