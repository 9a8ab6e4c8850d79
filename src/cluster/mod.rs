//! Axis search, threshold selection and structure bases.
//!
//! [`Clusterer`] pairs a [`ProjectionIndex`] with a maximization
//! [`Algorithm`] and searches a point set for its most interesting unit
//! axis. [`split`] then picks the threshold along that axis that best
//! separates the projected values into two groups.
//!
//! [`StructureBasisFinder`] repeats the axis search in the orthogonal
//! complement of every axis found, yielding an ordered orthonormal basis.
//!
//! [`ProjectionIndex`]: crate::projection::ProjectionIndex
//! [`Algorithm`]: crate::maximize::Algorithm

mod clusterer;
mod structure;

pub use clusterer::{find_axis, split, Clusterer, FoundAxis, Provenance};
pub use structure::StructureBasisFinder;
