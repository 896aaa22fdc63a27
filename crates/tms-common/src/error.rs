//! Error types for geometry primitives.

use thiserror::Error;

/// Result type alias using GeometryError.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Errors raised while constructing or combining geometry primitives.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Invalid grid extent: {0}")]
    InvalidExtent(String),

    #[error("Dimension mismatch: expected {expected}, found {found}")]
    MismatchedDimension { expected: usize, found: usize },

    #[error("Invalid BBOX format: {0}. Expected 'minx,miny,maxx,maxy'")]
    InvalidBboxFormat(String),

    #[error("Invalid number in BBOX: {0}")]
    InvalidBboxNumber(String),

    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

impl GeometryError {
    /// Create a MismatchedDimension error.
    pub fn dimension(expected: usize, found: usize) -> Self {
        Self::MismatchedDimension { expected, found }
    }

    /// Fail with MismatchedDimension unless both counts agree.
    pub fn check_dimension(expected: usize, found: usize) -> GeometryResult<()> {
        if expected == found {
            Ok(())
        } else {
            Err(Self::dimension(expected, found))
        }
    }
}
