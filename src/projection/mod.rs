//! Projection indices: scores of how "interesting" (non-Gaussian) a 1-D
//! projection of a point set is.
//!
//! [`ProjectionIndexFunction`] adapts a point set into an [`Objective`]
//! over the `D - 1` free coordinates of a unit axis, so any maximizer can
//! search for the most interesting direction.
//!
//! | Index | Measure |
//! |---|---|
//! | Shape | bias-corrected skewness and kurtosis |
//! | Mixed | negated AIC of a two-component Gaussian mixture ([`mixture`]) |
//! | Entropy, L1, Hellinger's, Friedman's, Hall's, Cook's | integrated distance between a kernel density estimate and the standard normal ([`density`]) |
//!
//! # References
//!
//! Friedman, J. H., Tukey, J. W. (1974). "A Projection Pursuit Algorithm for
//! Exploratory Data Analysis." IEEE Transactions on Computers C-23(9).
//!
//! [`Objective`]: crate::objective::Objective

pub mod density;
mod index;
pub mod mixture;

pub use index::{
    axis_from_arguments, shape_index, ProjectionIndex, ProjectionIndexFunction, REJECTED_SCORE,
};
pub use mixture::{GaussianMixture, MixtureFit};
