//! Small dense linear-algebra helpers over row-major `f64` buffers.
//!
//! Points are stored as `rows × dims` flat slices (the same layout as
//! [`DensePoints`](crate::points::DensePoints)); bases are `Vec<Vec<f64>>`
//! with one axis per row. The symmetric eigendecomposition is delegated to
//! `nalgebra`.
//!
//! The two composite algorithms here are:
//!
//! - [`orthogonal_basis`]: an orthonormal basis of the data's span whose first
//!   row is a prescribed axis (Gram-Schmidt over the axis followed by the
//!   eigenvectors of the cross-product matrix).
//! - [`project_onto_principal_plane`]: 2-D coordinates of every point in the
//!   plane spanned by an axis and the direction of greatest remaining variance.

use nalgebra::{DMatrix, SymmetricEigen};

use crate::error::{Error, Result};
use crate::points::{collect_rows, PointSet};

/// Squared norm under which a Gram-Schmidt residual is considered zero.
pub const GRAM_SCHMIDT_TOLERANCE: f64 = 1e-5;

#[inline]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Scale `v` to unit length; zero vectors are left untouched.
pub fn normalize_in_place(v: &mut [f64]) {
    let norm = dot(v, v).sqrt();
    if norm > f64::EPSILON {
        for x in v {
            *x /= norm;
        }
    }
}

/// Mean of each column.
pub fn compute_center(rows: &[f64], dims: usize) -> Vec<f64> {
    let mut center = vec![0.0; dims];
    let n = rows.len() / dims;
    if n == 0 {
        return center;
    }
    for row in rows.chunks_exact(dims) {
        for (c, x) in center.iter_mut().zip(row) {
            *c += x;
        }
    }
    for c in &mut center {
        *c /= n as f64;
    }
    center
}

/// Subtract `vector` from every row.
pub fn subtract_from_rows(rows: &mut [f64], vector: &[f64]) {
    for row in rows.chunks_exact_mut(vector.len()) {
        for (x, v) in row.iter_mut().zip(vector) {
            *x -= v;
        }
    }
}

/// Uncentered cross-product matrix `XᵀX` (dims × dims).
pub fn cross_product(rows: &[f64], dims: usize) -> DMatrix<f64> {
    let mut out = DMatrix::<f64>::zeros(dims, dims);
    for row in rows.chunks_exact(dims) {
        for i in 0..dims {
            let ri = row[i];
            if ri == 0.0 {
                continue;
            }
            for j in i..dims {
                out[(i, j)] += ri * row[j];
            }
        }
    }
    for i in 0..dims {
        for j in 0..i {
            out[(i, j)] = out[(j, i)];
        }
    }
    out
}

/// Eigenpairs of a symmetric matrix, ordered by descending eigenvalue.
///
/// Returns `(eigenvalues, eigenvectors)` with one eigenvector per row.
pub fn symmetric_eigen(matrix: DMatrix<f64>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let eigen = SymmetricEigen::new(matrix);
    let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    let values = order.iter().map(|&k| eigen.eigenvalues[k]).collect();
    let vectors = order
        .iter()
        .map(|&k| eigen.eigenvectors.column(k).iter().copied().collect())
        .collect();
    (values, vectors)
}

/// Modified Gram-Schmidt over `candidates`, in order.
///
/// Each candidate has the components along previously accepted vectors
/// removed; residuals with squared norm below [`GRAM_SCHMIDT_TOLERANCE`] are
/// dropped. Accepted vectors are normalized. At most `limit` vectors are kept.
pub fn gram_schmidt(candidates: &[Vec<f64>], limit: usize) -> Vec<Vec<f64>> {
    let mut basis: Vec<Vec<f64>> = Vec::with_capacity(limit);
    for candidate in candidates {
        if basis.len() == limit {
            break;
        }
        let mut v = candidate.clone();
        for accepted in &basis {
            let p = dot(&v, accepted);
            for (x, a) in v.iter_mut().zip(accepted) {
                *x -= p * a;
            }
        }
        if dot(&v, &v) >= GRAM_SCHMIDT_TOLERANCE {
            normalize_in_place(&mut v);
            basis.push(v);
        }
    }
    basis
}

/// Orthonormal basis for the span of `rows` whose first row is `axis`.
///
/// `axis` is expected to be a unit vector; it is copied verbatim into row 0.
/// The remaining rows follow the eigenvectors of `XᵀX` in descending
/// eigenvalue order. The basis can have fewer than `dims` rows only if the
/// eigenvectors themselves are degenerate, which does not happen for a
/// symmetric input.
pub fn orthogonal_basis(axis: &[f64], rows: &[f64], dims: usize) -> Result<Vec<Vec<f64>>> {
    if axis.len() != dims {
        return Err(Error::DimensionMismatch {
            expected: dims,
            found: axis.len(),
        });
    }
    let (_, eigenvectors) = symmetric_eigen(cross_product(rows, dims));

    let mut candidates = Vec::with_capacity(dims + 1);
    candidates.push(axis.to_vec());
    candidates.extend(eigenvectors);

    let mut basis = gram_schmidt(&candidates, dims);
    if let Some(first) = basis.first_mut() {
        first.copy_from_slice(axis);
    }
    Ok(basis)
}

/// Express every row in the coordinates of `basis` (`rows × basisᵀ`).
pub fn to_basis(rows: &[f64], dims: usize, basis: &[Vec<f64>]) -> Vec<f64> {
    let mut out = Vec::with_capacity(rows.len() / dims * basis.len());
    for row in rows.chunks_exact(dims) {
        out.extend(basis.iter().map(|axis| dot(row, axis)));
    }
    out
}

/// Map vectors expressed in `basis` coordinates back to the ambient space.
pub fn from_basis(vectors: &[Vec<f64>], basis: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let dims = basis.first().map_or(0, Vec::len);
    vectors
        .iter()
        .map(|coeffs| {
            let mut out = vec![0.0; dims];
            for (c, axis) in coeffs.iter().zip(basis) {
                for (o, a) in out.iter_mut().zip(axis) {
                    *o += c * a;
                }
            }
            out
        })
        .collect()
}

/// Project `points` onto the plane spanned by `axis` and the direction,
/// orthogonal to `axis`, along which the points vary the most.
///
/// Returns one `[along_axis, along_principal]` pair per point, in the
/// input (uncentered) coordinates.
pub fn project_onto_principal_plane(points: &dyn PointSet, axis: &[f64]) -> Result<Vec<[f64; 2]>> {
    let dims = points.dimension_count();
    if points.point_count() == 0 {
        return Err(Error::EmptyInput);
    }
    if axis.len() != dims {
        return Err(Error::DimensionMismatch {
            expected: dims,
            found: axis.len(),
        });
    }

    let mut rows = collect_rows(points);
    let center = compute_center(&rows, dims);
    subtract_from_rows(&mut rows, &center);

    let basis = orthogonal_basis(axis, &rows, dims)?;
    let complement = &basis[1..];
    let principal = if complement.is_empty() {
        vec![0.0; dims]
    } else {
        let sub = to_basis(&rows, dims, complement);
        let (_, eigenvectors) = symmetric_eigen(cross_product(&sub, complement.len()));
        from_basis(&eigenvectors[..1], complement).remove(0)
    };

    let center_x = dot(&center, axis);
    let center_y = dot(&center, &principal);
    Ok(rows
        .chunks_exact(dims)
        .map(|row| [dot(row, axis) + center_x, dot(row, &principal) + center_y])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::DensePoints;
    use rand::prelude::*;

    fn random_rows(rng: &mut StdRng, n: usize, dims: usize) -> Vec<f64> {
        (0..n * dims).map(|_| rng.random::<f64>() * 2.0 - 1.0).collect()
    }

    fn assert_orthonormal(basis: &[Vec<f64>]) {
        for (i, a) in basis.iter().enumerate() {
            assert!((dot(a, a) - 1.0).abs() < 1e-9, "row {i} not unit");
            for b in &basis[i + 1..] {
                assert!(dot(a, b).abs() < 1e-9, "rows not orthogonal");
            }
        }
    }

    #[test]
    fn center_and_subtract() {
        let mut rows = vec![1.0, 2.0, 3.0, 6.0];
        let center = compute_center(&rows, 2);
        assert_eq!(center, vec![2.0, 4.0]);
        subtract_from_rows(&mut rows, &center);
        assert_eq!(rows, vec![-1.0, -2.0, 1.0, 2.0]);
    }

    #[test]
    fn cross_product_is_symmetric() {
        let rows = vec![1.0, 2.0, 3.0, 4.0];
        let m = cross_product(&rows, 2);
        assert_eq!(m[(0, 0)], 10.0);
        assert_eq!(m[(0, 1)], 14.0);
        assert_eq!(m[(1, 0)], 14.0);
        assert_eq!(m[(1, 1)], 20.0);
    }

    #[test]
    fn eigen_is_sorted_descending() {
        let m = DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 3.0]);
        let (values, vectors) = symmetric_eigen(m);
        assert!((values[0] - 5.0).abs() < 1e-12);
        assert!((values[1] - 3.0).abs() < 1e-12);
        assert!((values[2] - 1.0).abs() < 1e-12);
        assert!((vectors[0][1].abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn gram_schmidt_drops_dependent_vectors() {
        let candidates = vec![
            vec![1.0, 0.0, 0.0],
            vec![2.0, 0.0, 0.0],
            vec![1.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0],
        ];
        let basis = gram_schmidt(&candidates, 3);
        assert_eq!(basis.len(), 2);
        assert_orthonormal(&basis);
        assert!((basis[1][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn orthogonal_basis_starts_with_axis() {
        let mut rng = StdRng::seed_from_u64(3);
        let rows = random_rows(&mut rng, 40, 4);
        let mut axis = vec![0.3, -0.2, 0.5, 0.1];
        normalize_in_place(&mut axis);

        let basis = orthogonal_basis(&axis, &rows, 4).unwrap();
        assert_eq!(basis.len(), 4);
        assert_eq!(basis[0], axis);
        assert_orthonormal(&basis);
    }

    #[test]
    fn orthogonal_basis_survives_singular_data() {
        // All points on the x axis: XᵀX has rank 1.
        let rows = vec![1.0, 0.0, 0.0, 2.0, 0.0, 0.0, -1.0, 0.0, 0.0];
        let axis = vec![0.0, 0.0, 1.0];
        let basis = orthogonal_basis(&axis, &rows, 3).unwrap();
        assert_eq!(basis.len(), 3);
        assert_orthonormal(&basis);
    }

    #[test]
    fn orthogonal_basis_rejects_wrong_axis_length() {
        let rows = vec![1.0, 0.0];
        assert!(orthogonal_basis(&[1.0], &rows, 2).is_err());
    }

    #[test]
    fn basis_round_trip() {
        let basis = vec![vec![0.6, 0.8], vec![-0.8, 0.6]];
        let rows = vec![1.0, 2.0];
        let coords = to_basis(&rows, 2, &basis);
        let back = from_basis(&[coords], &basis);
        assert!((back[0][0] - 1.0).abs() < 1e-12);
        assert!((back[0][1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn principal_plane_picks_widest_direction() {
        // Spread along y is large, along z tiny; axis is x.
        let mut rng = StdRng::seed_from_u64(9);
        let mut rows = Vec::new();
        for _ in 0..50 {
            rows.push(rng.random::<f64>());
            rows.push(rng.random::<f64>() * 20.0 - 10.0);
            rows.push(rng.random::<f64>() * 0.01);
        }
        let points = DensePoints::new(3, rows.clone()).unwrap();
        let plane = project_onto_principal_plane(&points, &[1.0, 0.0, 0.0]).unwrap();
        assert_eq!(plane.len(), 50);

        let ys: Vec<f64> = rows.chunks_exact(3).map(|r| r[1]).collect();
        let second: Vec<f64> = plane.iter().map(|p| p[1]).collect();
        let corr = dot(&center_vec(&ys), &center_vec(&second)).abs()
            / (dot(&center_vec(&ys), &center_vec(&ys)).sqrt()
                * dot(&center_vec(&second), &center_vec(&second)).sqrt());
        assert!(corr > 0.99, "principal direction should follow y, corr = {corr}");

        for (p, r) in plane.iter().zip(rows.chunks_exact(3)) {
            assert!((p[0] - r[0]).abs() < 1e-9);
        }
    }

    fn center_vec(v: &[f64]) -> Vec<f64> {
        let m = v.iter().sum::<f64>() / v.len() as f64;
        v.iter().map(|x| x - m).collect()
    }
}
