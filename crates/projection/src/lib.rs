//! Coordinate transformations consumed by the pyramid engine.
//!
//! Two things live here:
//! - [`AffineTransform`], the n-dimensional affine mapping used as the
//!   grid-to-CRS relationship of every grid geometry.
//! - [`CoordinateOperations`], the narrow service interface through which
//!   envelopes are moved between CRS. Actual map projection math is supplied
//!   by the caller as [`MathTransform`] implementations.

pub mod affine;
pub mod error;
pub mod operation;

pub use affine::AffineTransform;
pub use error::{ProjectionError, ProjectionResult};
pub use operation::{CoordinateOperations, MathTransform, OperationRegistry};
