//! Common geometry types shared across the tile pyramid crates.
//!
//! Everything here is a plain value type: no I/O and no coordinate
//! transformation. Reprojection lives behind the `projection` crate.

pub mod compare;
pub mod crs;
pub mod envelope;
pub mod error;
pub mod extent;
pub mod position;

pub use compare::Comparison;
pub use crs::Crs;
pub use envelope::Envelope;
pub use error::{GeometryError, GeometryResult};
pub use extent::{GridExtent, PixelAnchor};
pub use position::DirectPosition;
