//! Error types shared by the initializers, the parameter store and the cells.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CellError>;

/// Errors raised while configuring, binding or stepping a recurrent cell.
///
/// None of these are transient: each one points at a configuration or
/// programming bug and is propagated to the caller unchanged.
#[derive(Debug, Error)]
pub enum CellError {
    /// Invalid hyperparameter (non-positive unit count, keep probability
    /// outside `(0, 1]`, non-positive dimension, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Initializer selected by a name that is not recognized.
    #[error("unknown initializer `{0}` (expected zeros, constant, gaussian or ortho)")]
    UnknownInitializer(String),

    /// Input or state tensor width (or batch size) does not match.
    #[error("{context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Which tensor was being checked.
        context: String,
        /// Size the cell was configured for (or the input's batch size).
        expected: usize,
        /// Size that was actually supplied.
        actual: usize,
    },

    /// A named parameter already exists with a different shape.
    #[error("parameter `{path}` has shape {actual:?}, requested {expected:?}")]
    ParamShapeMismatch {
        /// Scope path of the parameter.
        path: String,
        /// Requested shape.
        expected: Vec<usize>,
        /// Shape stored under that path.
        actual: Vec<usize>,
    },

    /// Strict reuse was requested but nothing is registered under the path.
    #[error("parameter `{0}` does not exist and reuse was required")]
    MissingParam(String),

    /// The singular value decomposition did not yield the requested factor.
    #[error("orthogonal decomposition failed: {0}")]
    Decomposition(String),
}

impl CellError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        CellError::InvalidConfig(msg.into())
    }

    pub(crate) fn shape(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        CellError::ShapeMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }
}
