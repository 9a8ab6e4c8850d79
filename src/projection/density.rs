//! Kernel-density projection indices.
//!
//! A Gaussian kernel density estimate of the standardized projection is
//! compared with the standard normal density φ on a 201-point grid spanning
//! `[-xl, xl]`, where `xl` is the largest absolute projected value. The
//! pointwise [`DensityDistance`] is integrated with the trapezoid rule; the
//! larger the integral, the less Gaussian the projection.

use std::f64::consts::PI;

/// Grid points on each side of zero; the grid has `2 * GRID_HALF_POINTS + 1` points.
pub const GRID_HALF_POINTS: usize = 100;

/// The kernel is truncated beyond this many bandwidths.
const KERNEL_REACH: f64 = 4.0;

/// Densities below this are treated as zero in the entropy term.
const ENTROPY_FLOOR: f64 = 1e-10;

/// Pointwise discrepancy between an estimated density `f̂` and φ.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DensityDistance {
    /// `f̂ ln f̂ - φ ln φ`
    Entropy,
    /// `|f̂ - φ|`
    L1,
    /// `(√f̂ - √φ)²`
    Hellinger,
    /// `(f̂ - φ)² / 2φ`
    Friedman,
    /// `(f̂ - φ)²`
    Hall,
    /// `(f̂ - φ)² φ`
    Cook,
}

impl DensityDistance {
    /// Discrepancy at one grid point. Points where φ underflowed contribute 0.
    pub fn pointwise(self, fhat: f64, phi: f64) -> f64 {
        if phi <= 0.0 {
            return 0.0;
        }
        let d = fhat - phi;
        match self {
            DensityDistance::Entropy => {
                let f_term = if fhat < ENTROPY_FLOOR { 0.0 } else { fhat * fhat.ln() };
                f_term - phi * phi.ln()
            }
            DensityDistance::L1 => d.abs(),
            DensityDistance::Hellinger => {
                let r = fhat.sqrt() - phi.sqrt();
                r * r
            }
            DensityDistance::Friedman => d * d / (2.0 * phi),
            DensityDistance::Hall => d * d,
            DensityDistance::Cook => d * d * phi,
        }
    }
}

/// Standard normal density.
#[inline]
pub fn gaussian_kernel(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * PI).sqrt()
}

/// Silverman-style bandwidth `1.06 · min(1, IQR / 1.34) · n^(-1/5)` of a
/// sorted sample. A zero interquartile range uses a factor of 1.
pub fn bandwidth(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 1.0;
    }
    let iqr = sorted[(3 * n / 4).min(n - 1)] - sorted[n / 4];
    let spread = if iqr > 0.0 { (iqr / 1.34).min(1.0) } else { 1.0 };
    1.06 * spread * (n as f64).powf(-0.2)
}

/// Gaussian KDE of `sorted` evaluated at each (ascending) point of `grid`.
///
/// Only sample values within `KERNEL_REACH` bandwidths of a grid point are
/// summed.
pub fn kernel_density(sorted: &[f64], bandwidth: f64, grid: &[f64]) -> Vec<f64> {
    let norm = sorted.len() as f64 * bandwidth;
    let reach = KERNEL_REACH * bandwidth;
    let mut start = 0;
    grid.iter()
        .map(|&x| {
            while start < sorted.len() && sorted[start] < x - reach {
                start += 1;
            }
            let sum: f64 = sorted[start..]
                .iter()
                .take_while(|&&v| v <= x + reach)
                .map(|&v| gaussian_kernel((x - v) / bandwidth))
                .sum();
            sum / norm
        })
        .collect()
}

/// Trapezoid rule over equally spaced samples.
pub fn trapezoid(samples: &[f64], step: f64) -> f64 {
    match samples {
        [] | [_] => 0.0,
        [first, inner @ .., last] => (inner.iter().sum::<f64>() + (first + last) / 2.0) * step,
    }
}

/// Integrated discrepancy between the KDE of `sorted` and φ.
///
/// `sorted` should be standardized (zero mean, unit variance) and ascending.
pub fn density_index(sorted: &[f64], distance: DensityDistance) -> f64 {
    let (Some(&lo), Some(&hi)) = (sorted.first(), sorted.last()) else {
        return 0.0;
    };
    let xl = lo.abs().max(hi.abs());
    if xl == 0.0 || !xl.is_finite() {
        return 0.0;
    }

    let step = xl / GRID_HALF_POINTS as f64;
    let grid: Vec<f64> = (0..=2 * GRID_HALF_POINTS)
        .map(|j| -xl + j as f64 * step)
        .collect();
    let fhat = kernel_density(sorted, bandwidth(sorted), &grid);

    let integrand: Vec<f64> = grid
        .iter()
        .zip(&fhat)
        .map(|(&x, &f)| distance.pointwise(f, gaussian_kernel(x)))
        .collect();
    trapezoid(&integrand, step)
}
