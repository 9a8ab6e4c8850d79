use thiserror::Error;

/// Errors returned by the projection-pursuit machinery in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A maximizer could not produce an acceptable optimum within its budget.
    #[error("no convergence: {0}")]
    NoConvergence(String),

    /// The monitor requested that the computation stop.
    #[error("computation cancelled")]
    Cancelled,

    /// Input point set is empty.
    #[error("empty input")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// A vector does not have the dimensionality of the point set.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// No node with this serial number exists in the tree.
    #[error("unknown node {0}")]
    UnknownNode(u32),

    /// The node already carries a split.
    #[error("node {0} is already split")]
    AlreadySplit(u32),

    /// The node carries no split.
    #[error("node {0} is not split")]
    NotSplit(u32),

    /// Splitting the node would create serial numbers that do not fit a one-byte class.
    #[error("node {0} is too deep to split")]
    DepthExceeded(u32),
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
