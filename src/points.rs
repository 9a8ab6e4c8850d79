//! Point sets: the read-only view of N-dimensional data every algorithm consumes.
//!
//! A [`PointSet`] exposes its dimensionality, its size, and a forward-only
//! [`PointCursor`]. The cursor starts *before* the first point, so
//! [`PointCursor::advance`] must be called once before reading coordinates:
//!
//! ```rust
//! use pursuit::points::{DensePoints, PointSet};
//!
//! let points = DensePoints::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
//! let mut cursor = points.cursor();
//! let mut firsts = Vec::new();
//! while cursor.has_next() {
//!     cursor.advance();
//!     firsts.push(cursor.coordinate(0));
//! }
//! assert_eq!(firsts, vec![1.0, 3.0]);
//! ```
//!
//! Storage (arrays, pixel buffers, projected subspaces) is the implementor's
//! business. [`DensePoints`] is the row-major implementation used throughout
//! the crate.

use crate::error::{Error, Result};

/// Forward-only cursor over the points of a [`PointSet`].
pub trait PointCursor {
    /// Whether another point follows the current position.
    fn has_next(&self) -> bool;

    /// Move to the next point.
    fn advance(&mut self);

    /// Coordinate `index` of the current point.
    fn coordinate(&self, index: usize) -> f64;
}

/// A finite collection of points in R^D.
pub trait PointSet {
    /// Number of coordinates per point (D).
    fn dimension_count(&self) -> usize;

    /// Number of points (P).
    fn point_count(&self) -> usize;

    /// A fresh cursor positioned before the first point.
    fn cursor(&self) -> Box<dyn PointCursor + '_>;
}

/// Row-major dense point storage.
#[derive(Clone, Debug, PartialEq)]
pub struct DensePoints {
    dims: usize,
    coords: Vec<f64>,
}

impl DensePoints {
    /// Wrap a flat row-major coordinate buffer.
    pub fn new(dims: usize, coords: Vec<f64>) -> Result<Self> {
        if dims == 0 {
            return Err(Error::InvalidParameter {
                name: "dims",
                message: "must be at least 1",
            });
        }
        if coords.len() % dims != 0 {
            return Err(Error::InvalidParameter {
                name: "coords",
                message: "length must be a multiple of dims",
            });
        }
        Ok(Self { dims, coords })
    }

    /// Build from one vector per point.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows.first().ok_or(Error::EmptyInput)?;
        let dims = first.len();
        let mut coords = Vec::with_capacity(rows.len() * dims);
        for row in rows {
            if row.len() != dims {
                return Err(Error::DimensionMismatch {
                    expected: dims,
                    found: row.len(),
                });
            }
            coords.extend_from_slice(row);
        }
        Self::new(dims, coords)
    }

    /// Copy any point set into dense storage.
    pub fn collect(points: &dyn PointSet) -> Self {
        Self {
            dims: points.dimension_count(),
            coords: collect_rows(points),
        }
    }

    /// Point `i` as a slice.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.coords[i * self.dims..(i + 1) * self.dims]
    }

    /// Iterate over the points as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.coords.chunks_exact(self.dims)
    }

    /// The flat row-major buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.coords
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.coords
    }
}

impl PointSet for DensePoints {
    fn dimension_count(&self) -> usize {
        self.dims
    }

    fn point_count(&self) -> usize {
        self.coords.len() / self.dims
    }

    fn cursor(&self) -> Box<dyn PointCursor + '_> {
        Box::new(DenseCursor {
            points: self,
            row: None,
        })
    }
}

struct DenseCursor<'a> {
    points: &'a DensePoints,
    row: Option<usize>,
}

impl PointCursor for DenseCursor<'_> {
    fn has_next(&self) -> bool {
        let next = self.row.map_or(0, |r| r + 1);
        next < self.points.point_count()
    }

    fn advance(&mut self) {
        self.row = Some(self.row.map_or(0, |r| r + 1));
    }

    fn coordinate(&self, index: usize) -> f64 {
        let row = self.row.expect("cursor read before advance");
        self.points.coords[row * self.points.dims + index]
    }
}

/// Copy every point into a flat row-major buffer.
pub fn collect_rows(points: &dyn PointSet) -> Vec<f64> {
    let dims = points.dimension_count();
    let mut out = Vec::with_capacity(points.point_count() * dims);
    let mut cursor = points.cursor();
    for _ in 0..points.point_count() {
        cursor.advance();
        out.extend((0..dims).map(|j| cursor.coordinate(j)));
    }
    out
}

/// Project every point onto `axis`, returning one dot product per point.
pub fn project(points: &dyn PointSet, axis: &[f64]) -> Vec<f64> {
    debug_assert_eq!(axis.len(), points.dimension_count());
    let n = points.point_count();
    let mut values = Vec::with_capacity(n);
    let mut cursor = points.cursor();
    for _ in 0..n {
        cursor.advance();
        let value = axis
            .iter()
            .enumerate()
            .map(|(j, a)| cursor.coordinate(j) * a)
            .sum();
        values.push(value);
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_starts_before_first_point() {
        let points = DensePoints::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let mut cursor = points.cursor();
        assert!(cursor.has_next());
        cursor.advance();
        assert_eq!(cursor.coordinate(1), 2.0);
        cursor.advance();
        assert_eq!(cursor.coordinate(0), 3.0);
        assert!(!cursor.has_next());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let result = DensePoints::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 1
            })
        ));
        assert!(DensePoints::from_rows(&[]).is_err());
        assert!(DensePoints::new(0, vec![]).is_err());
    }

    #[test]
    fn project_is_dot_product_per_point() {
        let points = DensePoints::new(2, vec![1.0, 0.0, 0.0, 1.0, 2.0, 2.0]).unwrap();
        let values = project(&points, &[0.6, 0.8]);
        assert_eq!(values.len(), 3);
        assert!((values[0] - 0.6).abs() < 1e-12);
        assert!((values[1] - 0.8).abs() < 1e-12);
        assert!((values[2] - 2.8).abs() < 1e-12);
    }

    #[test]
    fn collect_round_trips_through_cursor() {
        let points = DensePoints::new(3, (0..12).map(f64::from).collect()).unwrap();
        assert_eq!(collect_rows(&points), points.as_slice());
        assert_eq!(DensePoints::collect(&points), points);
    }
}
