//! Tile Matrix Set Construction
//!
//! Builds multi-resolution tile pyramids ("tile matrix sets") over an
//! n-dimensional domain. Every level shares the upper-left corner of the
//! domain, so tiles of different levels stay pixel-aligned.
//!
//! # Architecture
//!
//! ```text
//! GridGeometry / Envelope + resolution
//!      │
//!      ▼
//! TileMatrixSetBuilder::build()
//!      │
//!      ├─► IterationPolicy::scales()   (or explicit scales, sorted)
//!      │
//!      ├─► one tiling scheme per scale, anchored at the shared corner
//!      │
//!      └─► DefiningTileMatrixSet::seal()
//!               │
//!               ▼
//!          TileMatrixSet (immutable)
//!               │
//!               ├─► tile_matrices::tiles_in_envelope()
//!               └─► reconcile::to_tiling_scheme()
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tile_matrix::{IterationPolicy, TileMatrixSetBuilder};
//!
//! let set = TileMatrixSetBuilder::new()
//!     .domain(grid)
//!     .tile_size(vec![256, 256])
//!     .iteration(IterationPolicy::TopToBottomLastExact)
//!     .build()?;
//!
//! for matrix in set.coarse_to_fine() {
//!     println!("{} -> {}", matrix.identifier(), matrix.scale());
//! }
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod grid_geometry;
pub mod iteration;
pub mod matrix;
pub mod matrix_set;
pub mod reconcile;
pub mod subdivide;
pub mod tile_matrices;

mod rounding;

// Re-export commonly used types at crate root
pub use builder::TileMatrixSetBuilder;
pub use config::{BuilderConfig, ReconcileOptions};
pub use error::{Result, TileMatrixError};
pub use grid_geometry::GridGeometry;
pub use iteration::{IterationPolicy, ScaleContext};
pub use matrix::TileMatrix;
pub use matrix_set::{DefiningTileMatrixSet, TileMatrixSet};
pub use reconcile::{to_tiling_scheme, Reconciliation};
pub use subdivide::FromTopBuilder;

pub use projection::{AffineTransform, CoordinateOperations, MathTransform, ProjectionError};
pub use tms_common::{Comparison, Crs, DirectPosition, Envelope, GridExtent, PixelAnchor};
