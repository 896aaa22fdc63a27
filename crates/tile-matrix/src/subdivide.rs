//! Pyramids built by repeatedly halving an envelope.

use projection::AffineTransform;
use tms_common::{Envelope, GridExtent, PixelAnchor};
use tracing::{debug, info};

use crate::builder::{resolve_axes, resolve_tile_size};
use crate::error::{Result, TileMatrixError};
use crate::grid_geometry::GridGeometry;
use crate::matrix::TileMatrix;
use crate::matrix_set::{DefiningTileMatrixSet, TileMatrixSet};

/// Deepest supported subdivision; level `k` holds `2^k` tiles per axis.
const MAX_SUBDIVISIONS: usize = 32;

/// Tile span given to an axis whose envelope span is zero. An invertible
/// tiling scheme needs a non-zero step, so such an axis is one tile wide
/// starting at the envelope value and the level envelope is wider than the
/// input there. Non-degenerate axes match the input envelope exactly.
const DEGENERATE_TILE_SPAN: f64 = 1.0;

/// Builds `n` levels over an envelope where level `k` splits every selected
/// axis into `2^k` tiles. Level "0" is a single tile covering the envelope.
#[derive(Debug, Clone)]
pub struct FromTopBuilder {
    identifier: String,
    envelope: Envelope,
    levels: usize,
    axes: Option<Vec<usize>>,
    tile_size: Option<Vec<u32>>,
}

impl FromTopBuilder {
    pub fn new(envelope: Envelope) -> Self {
        Self {
            identifier: "default".to_string(),
            envelope,
            levels: 1,
            axes: None,
            tile_size: None,
        }
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Number of levels to generate.
    pub fn subdivide(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    /// Axes that get split. Defaults to the first two.
    pub fn axis(mut self, axes: impl IntoIterator<Item = usize>) -> Self {
        self.axes = Some(axes.into_iter().collect());
        self
    }

    pub fn tile_size(mut self, tile_size: Vec<u32>) -> Self {
        self.tile_size = Some(tile_size);
        self
    }

    pub fn build(self) -> Result<TileMatrixSet> {
        if self.levels == 0 || self.levels > MAX_SUBDIVISIONS {
            return Err(TileMatrixError::invalid_config(format!(
                "subdivision depth must be in 1..={}, got {}",
                MAX_SUBDIVISIONS, self.levels
            )));
        }

        let envelope = &self.envelope;
        let dim = envelope.dimension();
        let tile_size = resolve_tile_size(self.tile_size.as_deref(), 256, dim)?;
        let axes = resolve_axes(self.axes.as_deref(), dim)?;
        let split: Vec<usize> = axes
            .iter()
            .copied()
            .filter(|&axis| !envelope.is_degenerate(axis))
            .collect();
        let Some(&reference) = split.first() else {
            return Err(TileMatrixError::invalid_config(
                "every selected axis has an empty span",
            ));
        };

        // Raster convention: y grows downward from the top edge.
        let directions: Vec<f64> = (0..dim).map(|axis| if axis == 1 { -1.0 } else { 1.0 }).collect();
        let anchor: Vec<f64> = (0..dim)
            .map(|axis| {
                if directions[axis] < 0.0 {
                    envelope.max(axis)
                } else {
                    envelope.min(axis)
                }
            })
            .collect();

        let mut set = DefiningTileMatrixSet::new(self.identifier.clone(), envelope.crs().clone());
        for level in 0..self.levels {
            let cells = 1u64 << level;
            let mut counts = Vec::with_capacity(dim);
            let mut steps = Vec::with_capacity(dim);
            for axis in 0..dim {
                let count = if split.contains(&axis) { cells } else { 1 };
                let span = envelope.span(axis);
                let tile_span = if span > 0.0 {
                    span / count as f64
                } else {
                    DEGENERATE_TILE_SPAN
                };
                counts.push(count);
                steps.push(directions[axis] * tile_span);
            }

            let scale = steps[reference].abs() / f64::from(tile_size[reference]);
            let tiling_scheme = GridGeometry::new(
                GridExtent::from_size(&counts)?,
                PixelAnchor::CellCorner,
                AffineTransform::from_scale_and_translation(&steps, &anchor)?,
                envelope.crs().clone(),
            )?;
            let matrix = TileMatrix::new(level.to_string(), scale, tiling_scheme, tile_size.clone())?;
            debug!(matrix = %matrix.identifier(), scale = scale, tiles = ?counts, "Subdivided level");
            set.insert(matrix)?;
        }

        let set = set.seal();
        info!(
            identifier = %set.identifier(),
            levels = set.len(),
            axes = ?split,
            "Built subdivided tile matrix set"
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tms_common::Crs;

    fn world() -> Envelope {
        Envelope::from_ranges(&[(-180.0, 180.0), (-90.0, 90.0)], Crs::wgs84()).unwrap()
    }

    #[test]
    fn test_subdivide_world() {
        let set = FromTopBuilder::new(world()).subdivide(3).build().unwrap();
        assert_eq!(set.len(), 3);
        let sizes: Vec<Vec<u64>> = set.coarse_to_fine().map(|m| m.matrix_size()).collect();
        assert_eq!(sizes, vec![vec![1, 1], vec![2, 2], vec![4, 4]]);
        assert!((set.get("0").unwrap().scale() - 360.0 / 256.0).abs() < 1e-12);
        assert!((set.get("2").unwrap().scale() - 90.0 / 256.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_axis() {
        let set = FromTopBuilder::new(world())
            .subdivide(2)
            .axis([1])
            .build()
            .unwrap();
        assert_eq!(set.get("1").unwrap().matrix_size(), vec![1, 2]);
    }

    #[test]
    fn test_third_axis_untouched_by_default() {
        let cube = Envelope::from_ranges(
            &[(0.0, 100.0), (0.0, 100.0), (0.0, 10.0)],
            Crs::compound(&[Crs::web_mercator(), Crs::time()]),
        )
        .unwrap();
        let set = FromTopBuilder::new(cube).subdivide(2).build().unwrap();
        assert_eq!(set.get("1").unwrap().matrix_size(), vec![2, 2, 1]);
        assert_eq!(set.get("1").unwrap().tile_size(), &[256, 256, 1]);
    }

    #[test]
    fn test_degenerate_axis_gets_one_unit_tile() {
        let slab = Envelope::from_ranges(
            &[(0.0, 100.0), (0.0, 100.0), (5.0, 5.0)],
            Crs::compound(&[Crs::web_mercator(), Crs::time()]),
        )
        .unwrap();
        let set = FromTopBuilder::new(slab.clone()).subdivide(2).build().unwrap();
        for matrix in set.coarse_to_fine() {
            let env = matrix.envelope().unwrap();
            for axis in 0..2 {
                assert!((env.min(axis) - slab.min(axis)).abs() < 1e-9);
                assert!((env.max(axis) - slab.max(axis)).abs() < 1e-9);
            }
            assert_eq!(env.min(2), 5.0);
            assert_eq!(env.max(2), 5.0 + DEGENERATE_TILE_SPAN);
            assert_eq!(matrix.matrix_size()[2], 1);
        }
    }

    #[test]
    fn test_rejects_zero_levels() {
        assert!(FromTopBuilder::new(world()).subdivide(0).build().is_err());
    }

    #[test]
    fn test_rejects_flat_envelope() {
        let flat = Envelope::from_ranges(&[(0.0, 0.0), (5.0, 5.0)], Crs::wgs84()).unwrap();
        assert!(FromTopBuilder::new(flat).subdivide(2).build().is_err());
    }
}
