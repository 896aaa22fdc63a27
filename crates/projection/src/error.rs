//! Error types for coordinate operations.

use thiserror::Error;

/// Result type alias using ProjectionError.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Errors raised by coordinate operation lookup and execution.
///
/// None of these are transient: they describe an operation that is not
/// defined, so callers should not retry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    /// No coordinate operation is known between two CRS.
    #[error("no coordinate operation from {from} to {to}")]
    Factory { from: String, to: String },

    /// An operation exists but could not transform the input.
    #[error("coordinate transform failed: {0}")]
    Transform(String),

    /// The matrix has no inverse.
    #[error("affine transform is not invertible")]
    NonInvertible,

    /// The matrix is not a valid affine transform.
    #[error("invalid affine matrix: {0}")]
    InvalidMatrix(String),

    #[error("dimension mismatch: expected {expected}, found {found}")]
    MismatchedDimension { expected: usize, found: usize },
}

impl ProjectionError {
    /// Create a Factory error.
    pub fn factory(from: impl ToString, to: impl ToString) -> Self {
        Self::Factory {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Create a Transform error.
    pub fn transform(msg: impl Into<String>) -> Self {
        Self::Transform(msg.into())
    }
}
