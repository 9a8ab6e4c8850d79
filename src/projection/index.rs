use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::density::{density_index, DensityDistance};
use super::mixture::GaussianMixture;
use crate::error::{Error, Result};
use crate::linalg::dot;
use crate::objective::Objective;
use crate::points::{collect_rows, PointSet};

/// Score returned for arguments outside the unit ball and for degenerate
/// projections.
pub const REJECTED_SCORE: f64 = -3.4e38;

/// The available measures of non-Gaussianity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProjectionIndex {
    /// Skewness and kurtosis.
    Shape,
    /// Negated AIC of a two-component Gaussian mixture.
    Mixed,
    Entropy,
    L1,
    Hellinger,
    #[default]
    Friedman,
    Hall,
    Cook,
}

impl ProjectionIndex {
    /// Every index, in menu order.
    pub const ALL: [ProjectionIndex; 8] = [
        ProjectionIndex::Shape,
        ProjectionIndex::Mixed,
        ProjectionIndex::Entropy,
        ProjectionIndex::L1,
        ProjectionIndex::Hellinger,
        ProjectionIndex::Friedman,
        ProjectionIndex::Hall,
        ProjectionIndex::Cook,
    ];

    /// Display name, also accepted by `FromStr`.
    pub fn name(self) -> &'static str {
        match self {
            ProjectionIndex::Shape => "Shape",
            ProjectionIndex::Mixed => "Mixed",
            ProjectionIndex::Entropy => "Entropy",
            ProjectionIndex::L1 => "L1",
            ProjectionIndex::Hellinger => "Hellinger's",
            ProjectionIndex::Friedman => "Friedman's",
            ProjectionIndex::Hall => "Hall's",
            ProjectionIndex::Cook => "Cook's",
        }
    }

    /// The density distance for KDE-based indices, `None` otherwise.
    pub fn density_distance(self) -> Option<DensityDistance> {
        match self {
            ProjectionIndex::Shape | ProjectionIndex::Mixed => None,
            ProjectionIndex::Entropy => Some(DensityDistance::Entropy),
            ProjectionIndex::L1 => Some(DensityDistance::L1),
            ProjectionIndex::Hellinger => Some(DensityDistance::Hellinger),
            ProjectionIndex::Friedman => Some(DensityDistance::Friedman),
            ProjectionIndex::Hall => Some(DensityDistance::Hall),
            ProjectionIndex::Cook => Some(DensityDistance::Cook),
        }
    }
}

impl fmt::Display for ProjectionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProjectionIndex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        ProjectionIndex::ALL
            .into_iter()
            .find(|i| {
                i.name().eq_ignore_ascii_case(s)
                    || i.name().trim_end_matches("'s").eq_ignore_ascii_case(s)
            })
            .ok_or(Error::InvalidParameter {
                name: "projection index",
                message: "unknown projection index name",
            })
    }
}

/// Complete `D - 1` free coordinates into a unit axis of length `D`.
///
/// The last coordinate is `sqrt(1 - Σ x²)`. Arguments outside the unit ball
/// are rescaled onto the sphere and the last coordinate is 0.
pub fn axis_from_arguments(arguments: &[f64]) -> Vec<f64> {
    let sum_of_squares: f64 = arguments.iter().map(|a| a * a).sum();
    let mut axis = Vec::with_capacity(arguments.len() + 1);
    if sum_of_squares <= 1.0 {
        axis.extend_from_slice(arguments);
        axis.push((1.0 - sum_of_squares).sqrt());
    } else {
        let norm = sum_of_squares.sqrt();
        axis.extend(arguments.iter().map(|a| a / norm));
        axis.push(0.0);
    }
    axis
}

/// The [`Objective`] maximized to find an interesting axis.
///
/// Takes the `D - 1` free coordinates of a unit axis, projects every point
/// onto it and scores the standardized projection with the selected
/// [`ProjectionIndex`].
pub struct ProjectionIndexFunction {
    index: ProjectionIndex,
    dims: usize,
    rows: Vec<f64>,
    mixture: GaussianMixture,
    rng: StdRng,
    axis: Vec<f64>,
    values: Vec<f64>,
}

impl ProjectionIndexFunction {
    /// Snapshot `points` for scoring under `index`.
    pub fn new(index: ProjectionIndex, points: &dyn PointSet) -> Self {
        let dims = points.dimension_count();
        Self {
            index,
            dims,
            rows: collect_rows(points),
            mixture: GaussianMixture::default(),
            rng: StdRng::from_rng(&mut rand::rng()),
            axis: vec![0.0; dims],
            values: Vec::with_capacity(points.point_count()),
        }
    }

    /// Seed the random source used by the mixture model.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_mixture(mut self, mixture: GaussianMixture) -> Self {
        self.mixture = mixture;
        self
    }

    /// Index being scored.
    pub fn index(&self) -> ProjectionIndex {
        self.index
    }

    /// Score a full unit axis directly.
    pub fn score_axis(&mut self, axis: &[f64]) -> f64 {
        debug_assert_eq!(axis.len(), self.dims);
        self.values.clear();
        self.values
            .extend(self.rows.chunks_exact(self.dims).map(|row| dot(row, axis)));

        let n = self.values.len() as f64;
        if self.values.is_empty() {
            return REJECTED_SCORE;
        }
        let mean = self.values.iter().sum::<f64>() / n;
        let variance = self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        if !(variance > 0.0 && variance.is_finite()) {
            return REJECTED_SCORE;
        }
        let sd = variance.sqrt();
        for v in &mut self.values {
            *v = (*v - mean) / sd;
        }

        match self.index {
            ProjectionIndex::Shape => shape_index(&self.values, variance),
            ProjectionIndex::Mixed => match self.mixture.fit(&self.values, &mut self.rng) {
                Ok(fit) => -fit.aic,
                Err(_) => REJECTED_SCORE,
            },
            other => {
                self.values.sort_by(f64::total_cmp);
                match other.density_distance() {
                    Some(distance) => density_index(&self.values, distance),
                    None => REJECTED_SCORE,
                }
            }
        }
    }
}

impl Objective for ProjectionIndexFunction {
    fn argument_count(&self) -> usize {
        self.dims.saturating_sub(1)
    }

    fn evaluate(&mut self, arguments: &[f64]) -> f64 {
        let sum_of_squares: f64 = arguments.iter().map(|a| a * a).sum();
        if sum_of_squares > 1.0 {
            return REJECTED_SCORE;
        }
        let mut axis = std::mem::take(&mut self.axis);
        axis.clear();
        axis.extend_from_slice(arguments);
        axis.push((1.0 - sum_of_squares).sqrt());
        let score = self.score_axis(&axis);
        self.axis = axis;
        score
    }
}

/// Combined skewness/kurtosis index of standardized `z`.
///
/// `k3` and `k4` are the bias-corrected sample skewness and excess kurtosis;
/// `variance` is the variance of the raw projection. Needs more than three
/// values; smaller samples score 0.
pub fn shape_index(z: &[f64], variance: f64) -> f64 {
    if z.len() <= 3 {
        return 0.0;
    }
    let n = z.len() as f64;
    let (sum3, sum4) = z.iter().fold((0.0, 0.0), |(s3, s4), &v| {
        let v3 = v * v * v;
        (s3 + v3, s4 + v3 * v)
    });
    let k3 = sum3 * n / ((n - 1.0) * (n - 2.0));
    let k4 = sum4 * n * (n + 1.0) / ((n - 1.0) * (n - 2.0) * (n - 3.0))
        - 3.0 * (n - 1.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0));
    let var3 = variance * variance * variance;
    (k3 * k3 / var3 + k4 * k4 / (4.0 * var3 * variance)) / 12.0
}
