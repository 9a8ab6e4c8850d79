//! Recursive structure-basis search.
//!
//! The most interesting axis is found first; the points are then projected
//! into the orthogonal complement of that axis and the search repeats there,
//! one dimension fewer each time. Mapping every sub-result back through the
//! complement basis yields an ordered set of mutually orthogonal unit axes.

use rand::RngCore;

use super::clusterer::Clusterer;
use crate::error::{Error, Result};
use crate::linalg::{compute_center, from_basis, orthogonal_basis, subtract_from_rows, to_basis};
use crate::maximize::{Algorithm, AlgorithmParameters};
use crate::monitor::Monitor;
use crate::points::{DensePoints, PointSet};
use crate::projection::ProjectionIndex;

/// Builder for structure-basis searches.
#[derive(Clone, Debug)]
pub struct StructureBasisFinder {
    clusterer: Clusterer,
}

impl StructureBasisFinder {
    /// A finder scoring axes with `index`, using the clusterer's defaults.
    pub fn new(index: ProjectionIndex) -> Self {
        Self {
            clusterer: Clusterer::new(index),
        }
    }

    /// Maximizer used at every level of the search.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.clusterer = self.clusterer.with_algorithm(algorithm);
        self
    }

    /// Explicit maximizer parameters; they must match the algorithm.
    pub fn with_parameters(mut self, parameters: impl Into<AlgorithmParameters>) -> Self {
        self.clusterer = self.clusterer.with_parameters(parameters);
        self
    }

    /// Seed the single rng shared by every level.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.clusterer = self.clusterer.with_seed(seed);
        self
    }

    /// Find up to `max_dimensions` orthonormal axes describing `points`.
    ///
    /// Exactly `min(max_dimensions, D)` axes come back when the centered
    /// data has full rank.
    pub fn find(
        &self,
        points: &dyn PointSet,
        max_dimensions: usize,
        monitor: &mut dyn Monitor,
    ) -> Result<Vec<Vec<f64>>> {
        if max_dimensions == 0 {
            return Err(Error::InvalidParameter {
                name: "max_dimensions",
                message: "must be at least 1",
            });
        }
        if points.point_count() == 0 {
            return Err(Error::EmptyInput);
        }

        let mut centered = DensePoints::collect(points);
        let dims = centered.dimension_count();
        let center = compute_center(centered.as_slice(), dims);
        subtract_from_rows(centered.as_mut_slice(), &center);

        let wanted = max_dimensions.min(dims);
        tracing::debug!(dims, wanted, index = %self.clusterer.index(), "searching structure basis");

        let mut rng = self.clusterer.rng();
        self.search(&centered, wanted, monitor, &mut *rng)
    }

    fn search(
        &self,
        points: &DensePoints,
        wanted: usize,
        monitor: &mut dyn Monitor,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Vec<f64>>> {
        let dims = points.dimension_count();
        if dims == 1 {
            return Ok(vec![vec![1.0]]);
        }

        let found = self.clusterer.find_axis_with(points, monitor, rng)?;
        monitor.write_line(&format!(
            "(dims = {dims}) (score = {:e}) (axis = {:?})",
            found.score, found.axis
        ));
        if wanted <= 1 {
            return Ok(vec![found.axis]);
        }

        let basis = orthogonal_basis(&found.axis, points.as_slice(), dims)?;
        let complement = &basis[1..];
        if complement.is_empty() {
            return Ok(vec![found.axis]);
        }

        let projected = DensePoints::new(
            complement.len(),
            to_basis(points.as_slice(), dims, complement),
        )?;
        let inner = self.search(&projected, wanted - 1, monitor, rng)?;

        let mut result = Vec::with_capacity(inner.len() + 1);
        result.push(found.axis);
        result.extend(from_basis(&inner, complement));
        Ok(result)
    }
}
