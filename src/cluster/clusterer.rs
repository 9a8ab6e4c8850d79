//! Finding an interesting axis and the threshold that splits along it.

use rand::prelude::*;

use crate::error::{Error, Result};
use crate::maximize::{self, Algorithm, AlgorithmParameters};
use crate::monitor::Monitor;
use crate::objective::Objective;
use crate::points::PointSet;
use crate::projection::{axis_from_arguments, ProjectionIndex, ProjectionIndexFunction};

/// Relative gap below which two adjacent sorted values count as equal.
const EQUALITY_TOLERANCE: f64 = 1e-4;

/// Which search produced an axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Provenance {
    /// Index that scored the axis.
    pub index: ProjectionIndex,
    /// Maximizer that searched for it.
    pub algorithm: Algorithm,
    /// Iterations the maximizer ran; 0 when no search was needed.
    pub iterations: usize,
}

/// A unit axis together with its projection-index score.
#[derive(Clone, Debug, PartialEq)]
pub struct FoundAxis {
    /// Unit vector in the full point space.
    pub axis: Vec<f64>,
    /// Projection-index score of `axis`.
    pub score: f64,
    pub provenance: Provenance,
}

/// Search `points` for the axis that maximizes `index`.
///
/// `parameters` of `None` uses the algorithm's defaults. A one-dimensional
/// point set has only one axis, `[1.0]`, and is not searched.
pub fn find_axis(
    index: ProjectionIndex,
    algorithm: Algorithm,
    points: &dyn PointSet,
    monitor: &mut dyn Monitor,
    parameters: Option<&AlgorithmParameters>,
    rng: &mut dyn RngCore,
) -> Result<FoundAxis> {
    if points.point_count() == 0 {
        return Err(Error::EmptyInput);
    }
    let dims = points.dimension_count();
    let mut function = ProjectionIndexFunction::new(index, points).with_seed(rng.next_u64());

    if dims == 1 {
        let axis = vec![1.0];
        let score = function.score_axis(&axis);
        return Ok(FoundAxis {
            axis,
            score,
            provenance: Provenance {
                index,
                algorithm,
                iterations: 0,
            },
        });
    }

    debug_assert_eq!(function.argument_count(), dims - 1);
    let maximum = maximize::maximize(algorithm, parameters, &mut function, monitor, rng)?;
    let axis = axis_from_arguments(&maximum.arguments);
    tracing::debug!(
        %index,
        %algorithm,
        score = maximum.value,
        iterations = maximum.iterations,
        "axis found"
    );

    Ok(FoundAxis {
        axis,
        score: maximum.value,
        provenance: Provenance {
            index,
            algorithm,
            iterations: maximum.iterations,
        },
    })
}

/// Threshold that best separates an ascending list into two groups.
///
/// Every boundary between adjacent, distinct values is a candidate; the one
/// maximizing `lsum² / n_left + rsum² / n_right` wins and the midpoint of its
/// two values is returned. `None` when no boundary qualifies (fewer than two
/// distinct values).
pub fn split(sorted: &[f64]) -> Option<f64> {
    let total: f64 = sorted.iter().sum();
    let n = sorted.len();
    let mut best: Option<(f64, f64)> = None;
    let mut lsum = 0.0;

    for (l, pair) in sorted.windows(2).enumerate() {
        lsum += pair[0];
        if !distinct(pair[0], pair[1]) {
            continue;
        }
        let left = (l + 1) as f64;
        let right = (n - l - 1) as f64;
        let rsum = total - lsum;
        let statistic = lsum * lsum / left + rsum * rsum / right;
        if best.map_or(true, |(m, _)| statistic > m) {
            best = Some((statistic, 0.5 * (pair[0] + pair[1])));
        }
    }
    best.map(|(_, threshold)| threshold)
}

fn distinct(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs());
    scale > 0.0 && (a - b).abs() / scale >= EQUALITY_TOLERANCE
}

/// Axis search with a fixed projection index and algorithm.
///
/// ```rust
/// use pursuit::cluster::Clusterer;
/// use pursuit::monitor::NullMonitor;
/// use pursuit::points::DensePoints;
/// use pursuit::projection::ProjectionIndex;
///
/// let rows: Vec<Vec<f64>> = (0..40)
///     .map(|i| vec![if i % 2 == 0 { -1.0 } else { 1.0 } + 0.01 * i as f64, 0.0])
///     .collect();
/// let points = DensePoints::from_rows(&rows).unwrap();
///
/// let found = Clusterer::new(ProjectionIndex::Friedman)
///     .with_seed(42)
///     .find_axis(&points, &mut NullMonitor)
///     .unwrap();
/// assert!((found.axis.iter().map(|a| a * a).sum::<f64>() - 1.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct Clusterer {
    index: ProjectionIndex,
    algorithm: Algorithm,
    parameters: Option<AlgorithmParameters>,
    seed: Option<u64>,
}

impl Clusterer {
    /// A clusterer using the simplex with default parameters and no seed.
    pub fn new(index: ProjectionIndex) -> Self {
        Self {
            index,
            algorithm: Algorithm::default(),
            parameters: None,
            seed: None,
        }
    }

    /// Switch algorithm; parameters configured for another algorithm are dropped.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        if self.parameters.as_ref().is_some_and(|p| p.algorithm() != algorithm) {
            self.parameters = None;
        }
        self.algorithm = algorithm;
        self
    }

    /// Use explicit parameters; this also selects their algorithm.
    pub fn with_parameters(mut self, parameters: impl Into<AlgorithmParameters>) -> Self {
        let parameters = parameters.into();
        self.algorithm = parameters.algorithm();
        self.parameters = Some(parameters);
        self
    }

    /// Seed for reproducible searches. Unseeded clusterers use the thread RNG.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn index(&self) -> ProjectionIndex {
        self.index
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub(crate) fn rng(&self) -> Box<dyn RngCore> {
        match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        }
    }

    /// Search `points` with a fresh random source.
    pub fn find_axis(&self, points: &dyn PointSet, monitor: &mut dyn Monitor) -> Result<FoundAxis> {
        let mut rng = self.rng();
        self.find_axis_with(points, monitor, &mut *rng)
    }

    /// Search `points` drawing randomness from `rng`.
    pub fn find_axis_with(
        &self,
        points: &dyn PointSet,
        monitor: &mut dyn Monitor,
        rng: &mut dyn RngCore,
    ) -> Result<FoundAxis> {
        find_axis(
            self.index,
            self.algorithm,
            points,
            monitor,
            self.parameters.as_ref(),
            rng,
        )
    }
}

impl Default for Clusterer {
    fn default() -> Self {
        Self::new(ProjectionIndex::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maximize::GradientAscent;
    use crate::monitor::{CancelHandle, NullMonitor, ProgressMonitor};
    use crate::points::{project, DensePoints};

    /// Two clumps separated along (1, 1) / √2, thin noise elsewhere.
    fn diagonal_clumps(dims: usize) -> DensePoints {
        let mut rows = Vec::new();
        for i in 0..80 {
            let side = if i % 2 == 0 { -1.0 } else { 1.0 };
            let mut row: Vec<f64> = (0..dims)
                .map(|d| 0.05 * ((((i * 31 + d * 17) % 23) as f64) / 23.0 - 0.5))
                .collect();
            row[0] += side * 2.0;
            row[1] += side * 2.0;
            rows.push(row);
        }
        DensePoints::from_rows(&rows).unwrap()
    }

    #[test]
    fn split_separates_two_groups() {
        let t = split(&[1.0, 1.0, 1.0, 1.0, 10.0, 10.0, 10.0, 10.0]).unwrap();
        assert!(t > 1.0 && t < 10.0);
        assert_eq!(t, 5.5);
    }

    #[test]
    fn split_of_constant_or_single_list_is_none() {
        assert_eq!(split(&[3.0; 5]), None);
        assert_eq!(split(&[0.0; 5]), None);
        assert_eq!(split(&[7.0]), None);
        assert_eq!(split(&[]), None);
    }

    #[test]
    fn split_prefers_the_widest_gap_statistic() {
        let t = split(&[-5.0, -4.9, -4.8, 0.0, 4.8, 4.9, 5.0]).unwrap();
        assert!(t > -4.8 && t < 4.8, "{t}");
    }

    #[test]
    fn split_ignores_near_equal_neighbours() {
        // 1.0 and 1.00001 are within tolerance and cannot be separated.
        assert_eq!(split(&[1.0, 1.00001]), None);
        assert!(split(&[0.0, 1.0]).is_some());
    }

    #[test]
    fn one_dimensional_points_need_no_search() {
        let points = DensePoints::new(1, vec![1.0, 2.0, 5.0, 6.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let found = find_axis(
            ProjectionIndex::Friedman,
            Algorithm::Simplex,
            &points,
            &mut NullMonitor,
            None,
            &mut rng,
        )
        .unwrap();
        assert_eq!(found.axis, vec![1.0]);
        assert_eq!(found.provenance.iterations, 0);
    }

    #[test]
    fn empty_points_are_rejected() {
        let points = DensePoints::new(2, vec![]).unwrap();
        let result = Clusterer::default().find_axis(&points, &mut NullMonitor);
        assert!(matches!(result, Err(Error::EmptyInput)));
    }

    #[test]
    fn finds_the_separating_direction() {
        let points = diagonal_clumps(3);
        let found = Clusterer::new(ProjectionIndex::Friedman)
            .with_seed(7)
            .find_axis(&points, &mut NullMonitor)
            .unwrap();

        let norm: f64 = found.axis.iter().map(|a| a * a).sum();
        assert!((norm - 1.0).abs() < 1e-9);
        assert_eq!(found.provenance.algorithm, Algorithm::Simplex);

        let mut values = project(&points, &found.axis);
        values.sort_by(f64::total_cmp);
        let threshold = split(&values).unwrap();
        let left = values.iter().filter(|&&v| v < threshold).count();
        assert_eq!(left, 40, "axis {:?}", found.axis);
    }

    #[test]
    fn seeded_searches_are_reproducible() {
        let points = diagonal_clumps(3);
        let clusterer = Clusterer::new(ProjectionIndex::Hall).with_seed(3);
        let a = clusterer.find_axis(&points, &mut NullMonitor).unwrap();
        let b = clusterer.find_axis(&points, &mut NullMonitor).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parameters_select_their_algorithm() {
        let clusterer = Clusterer::new(ProjectionIndex::Shape)
            .with_parameters(GradientAscent::new().with_max_iterations(3));
        assert_eq!(clusterer.algorithm(), Algorithm::GradientAscent);
        let clusterer = clusterer.with_algorithm(Algorithm::Genetic);
        assert_eq!(clusterer.algorithm(), Algorithm::Genetic);
        assert!(clusterer.parameters.is_none());
    }

    #[test]
    fn cancellation_propagates() {
        let points = diagonal_clumps(3);
        let handle = CancelHandle::default();
        handle.cancel();
        let mut monitor = ProgressMonitor::new(handle);
        let result = Clusterer::default()
            .with_seed(1)
            .find_axis(&points, &mut monitor);
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
