//! Convenience functions over tile matrices and tile matrix sets.

use projection::CoordinateOperations;
use tms_common::{Comparison, Crs, DirectPosition, Envelope, GridExtent};
use tracing::debug;

use crate::builder::TileMatrixSetBuilder;
use crate::error::{Result, TileMatrixError};
use crate::grid_geometry::GridGeometry;
use crate::iteration::IterationPolicy;
use crate::matrix::TileMatrix;
use crate::matrix_set::TileMatrixSet;

/// Scales of every level, finest first.
pub fn scales(set: &TileMatrixSet) -> Vec<f64> {
    set.scales()
}

/// Levels of `set` at `scale`, within a relative tolerance of 1e-9.
pub fn tile_matrices_at(set: &TileMatrixSet, scale: f64) -> Vec<&TileMatrix> {
    set.at_scale(scale, Comparison::default())
}

pub fn upper_left_corner(matrix: &TileMatrix) -> Result<DirectPosition> {
    matrix.upper_left_corner()
}

pub fn tile_size(matrix: &TileMatrix) -> &[u32] {
    matrix.tile_size()
}

pub fn tiles_in_envelope(matrix: &TileMatrix, envelope: &Envelope) -> Result<GridExtent> {
    matrix.tiles_in_envelope(envelope)
}

/// Pyramid over `domain` that ends exactly at its native resolution.
pub fn create_template(domain: &GridGeometry, tile_size: &[u32]) -> Result<TileMatrixSet> {
    TileMatrixSetBuilder::new()
        .domain(domain.clone())
        .tile_size(tile_size.to_vec())
        .iteration(IterationPolicy::TopToBottomLastExact)
        .build()
}

/// Like [`create_template`], with the domain first moved into `target`.
///
/// The resolution in `target` keeps the source cell count on each axis.
/// Failures of the coordinate operation service are returned unchanged.
pub fn create_template_in_crs(
    domain: &GridGeometry,
    target: &Crs,
    tile_size: &[u32],
    operations: &dyn CoordinateOperations,
) -> Result<TileMatrixSet> {
    if domain.crs() == target {
        return create_template(domain, tile_size);
    }

    let source = domain.envelope()?;
    let projected = operations.transform_envelope(&source, target)?;
    TileMatrixError::check_dimension("projected envelope", domain.dimension(), projected.dimension())?;

    let resolution: Vec<f64> = (0..projected.dimension())
        .map(|axis| projected.span(axis) / domain.extent().size(axis) as f64)
        .collect();
    if resolution.iter().any(|r| *r <= 0.0) {
        return Err(TileMatrixError::invalid_config(format!(
            "domain collapses to {} in {}",
            projected, target
        )));
    }
    debug!(from = %domain.crs(), to = %target, ?resolution, "Estimated target resolution");

    TileMatrixSetBuilder::new()
        .domain_envelope(projected, resolution)
        .tile_size(tile_size.to_vec())
        .iteration(IterationPolicy::TopToBottomLastExact)
        .build()
}
