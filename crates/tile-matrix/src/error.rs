//! Error types for tile matrix construction and queries.

use std::fmt::Display;

use projection::ProjectionError;
use thiserror::Error;
use tms_common::GeometryError;

/// Errors that can occur while building or querying tile matrix sets.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TileMatrixError {
    /// The builder or a constructor was given unusable parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Two inputs disagree on their number of axes.
    #[error("dimension mismatch for {what}: expected {expected}, found {found}")]
    MismatchedDimension {
        what: String,
        expected: usize,
        found: usize,
    },

    /// An input is expressed in a different CRS than the tile matrix.
    #[error("incompatible CRS: expected {expected}, found {found}")]
    IncompatibleCrs { expected: String, found: String },

    /// The request lies entirely outside the tile matrix.
    #[error("no data in tile matrix '{matrix}' for {requested}")]
    NoSuchData { matrix: String, requested: String },

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Failure reported by the coordinate operation service, unchanged.
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl TileMatrixError {
    /// Create an InvalidConfiguration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create a MismatchedDimension error.
    pub fn dimension(what: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::MismatchedDimension {
            what: what.into(),
            expected,
            found,
        }
    }

    /// Create an IncompatibleCrs error.
    pub fn incompatible_crs(expected: impl Display, found: impl Display) -> Self {
        Self::IncompatibleCrs {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Create a NoSuchData error.
    pub fn no_such_data(matrix: impl Into<String>, requested: impl Display) -> Self {
        Self::NoSuchData {
            matrix: matrix.into(),
            requested: requested.to_string(),
        }
    }

    /// Fail with MismatchedDimension unless both counts agree.
    pub(crate) fn check_dimension(what: &str, expected: usize, found: usize) -> Result<()> {
        if expected == found {
            Ok(())
        } else {
            Err(Self::dimension(what, expected, found))
        }
    }
}

/// Result type for tile matrix operations.
pub type Result<T> = std::result::Result<T, TileMatrixError>;
