//! A single level of a tile pyramid.

use serde::{Deserialize, Serialize};
use tms_common::{Crs, DirectPosition, Envelope, GridExtent, PixelAnchor};
use tracing::warn;

use crate::error::{Result, TileMatrixError};
use crate::grid_geometry::GridGeometry;
use crate::rounding::{ceil_tolerant, floor_tolerant, INDEX_TOLERANCE};

/// One resolution level: a grid of tiles where each cell of the tiling
/// scheme is one tile of `tile_size` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMatrix {
    identifier: String,
    /// Size of one cell of a tile, in CRS units, along the reference axis.
    scale: f64,
    tiling_scheme: GridGeometry,
    tile_size: Vec<u32>,
}

impl TileMatrix {
    pub fn new(
        identifier: impl Into<String>,
        scale: f64,
        tiling_scheme: GridGeometry,
        tile_size: Vec<u32>,
    ) -> Result<Self> {
        let identifier = identifier.into();
        if identifier.is_empty() {
            return Err(TileMatrixError::invalid_config(
                "tile matrix identifier must not be empty",
            ));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(TileMatrixError::invalid_config(format!(
                "tile matrix scale must be a finite number > 0, got {}",
                scale
            )));
        }
        TileMatrixError::check_dimension("tile size", tiling_scheme.dimension(), tile_size.len())?;
        if tile_size.contains(&0) {
            return Err(TileMatrixError::invalid_config("tile size must be > 0 on every axis"));
        }

        Ok(Self {
            identifier,
            scale,
            tiling_scheme,
            tile_size,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn tiling_scheme(&self) -> &GridGeometry {
        &self.tiling_scheme
    }

    pub fn tile_size(&self) -> &[u32] {
        &self.tile_size
    }

    pub fn crs(&self) -> &Crs {
        self.tiling_scheme.crs()
    }

    pub fn dimension(&self) -> usize {
        self.tiling_scheme.dimension()
    }

    /// Number of tiles along each axis.
    pub fn matrix_size(&self) -> Vec<u64> {
        self.tiling_scheme.extent().sizes()
    }

    pub fn tile_count(&self) -> u64 {
        self.tiling_scheme.extent().cell_count()
    }

    /// Size of one pixel along each axis, in CRS units.
    pub fn resolution(&self) -> Vec<f64> {
        self.tiling_scheme
            .resolution()
            .iter()
            .zip(&self.tile_size)
            .map(|(span, size)| span / f64::from(*size))
            .collect()
    }

    pub fn upper_left_corner(&self) -> Result<DirectPosition> {
        self.tiling_scheme.upper_left_corner()
    }

    pub fn envelope(&self) -> Result<Envelope> {
        self.tiling_scheme.envelope()
    }

    /// Tile indices intersecting `envelope`, clipped to the matrix.
    ///
    /// A point or an envelope edge lying exactly on a tile boundary selects
    /// the tile that starts there. Fails with `NoSuchData` when nothing is
    /// left after clipping.
    pub fn tiles_in_envelope(&self, envelope: &Envelope) -> Result<GridExtent> {
        self.check_crs(envelope.crs())?;

        let dim = self.dimension();
        let inverse = self.tiling_scheme.corner_transform().inverse()?;
        let mut lo = vec![f64::INFINITY; dim];
        let mut hi = vec![f64::NEG_INFINITY; dim];
        for corner in envelope.corners() {
            for (axis, v) in inverse.apply(&corner).into_iter().enumerate() {
                lo[axis] = lo[axis].min(v);
                hi[axis] = hi[axis].max(v);
            }
        }

        let extent = self.tiling_scheme.extent();
        let mut low = Vec::with_capacity(dim);
        let mut high = Vec::with_capacity(dim);
        for axis in 0..dim {
            // Keep far-away queries in i64 range before the cast.
            let min = (extent.low(axis) - 1) as f64;
            let max = (extent.high(axis) + 2) as f64;
            let first = floor_tolerant(lo[axis].clamp(min, max), INDEX_TOLERANCE) as i64;
            let mut end = ceil_tolerant(hi[axis].clamp(min, max), INDEX_TOLERANCE) as i64;
            if end <= first {
                end = first.saturating_add(1);
            }

            let first = first.max(extent.low(axis));
            let end = end.min(extent.high(axis) + 1);
            if first >= end {
                warn!(
                    matrix = %self.identifier,
                    requested = %envelope,
                    axis = axis,
                    "Envelope outside tile matrix"
                );
                return Err(TileMatrixError::no_such_data(&self.identifier, envelope));
            }
            low.push(first);
            high.push(end);
        }

        Ok(GridExtent::from_half_open(low, high)?)
    }

    /// Index of the tile containing `position`.
    pub fn tile_at(&self, position: &DirectPosition) -> Result<Vec<i64>> {
        self.check_crs(position.crs())?;
        let index: Vec<i64> = self
            .tiling_scheme
            .world_to_grid(position.coordinates())?
            .into_iter()
            .map(|g| floor_tolerant(g, INDEX_TOLERANCE) as i64)
            .collect();

        if !self.tiling_scheme.extent().contains(&index) {
            warn!(matrix = %self.identifier, ?index, "Position outside tile matrix");
            return Err(TileMatrixError::no_such_data(
                &self.identifier,
                format!("{:?}", position.coordinates()),
            ));
        }
        Ok(index)
    }

    /// Envelope covered by one tile.
    pub fn tile_envelope(&self, index: &[i64]) -> Result<Envelope> {
        self.check_index(index)?;
        let g2c = self.tiling_scheme.corner_transform();
        let start: Vec<f64> = index.iter().map(|&i| i as f64).collect();
        let end: Vec<f64> = index.iter().map(|&i| (i + 1) as f64).collect();
        Ok(Envelope::from_corners(
            &g2c.apply(&start),
            &g2c.apply(&end),
            self.crs().clone(),
        )?)
    }

    /// Pixel grid of one tile: `tile_size` cells mapped into the CRS.
    pub fn tile_grid_geometry(&self, index: &[i64]) -> Result<GridGeometry> {
        self.check_index(index)?;
        let offset: Vec<f64> = index.iter().map(|&i| i as f64).collect();
        let shrink: Vec<f64> = self.tile_size.iter().map(|&s| 1.0 / f64::from(s)).collect();
        let pixel_to_crs = self
            .tiling_scheme
            .corner_transform()
            .pre_translate(&offset)?
            .pre_scale(&shrink)?;
        let sizes: Vec<u64> = self.tile_size.iter().map(|&s| u64::from(s)).collect();

        GridGeometry::new(
            GridExtent::from_size(&sizes)?,
            PixelAnchor::CellCorner,
            pixel_to_crs,
            self.crs().clone(),
        )
    }

    fn check_crs(&self, crs: &Crs) -> Result<()> {
        if crs != self.crs() {
            return Err(TileMatrixError::incompatible_crs(self.crs(), crs));
        }
        Ok(())
    }

    fn check_index(&self, index: &[i64]) -> Result<()> {
        TileMatrixError::check_dimension("tile index", self.dimension(), index.len())?;
        if !self.tiling_scheme.extent().contains(index) {
            return Err(TileMatrixError::no_such_data(
                &self.identifier,
                format!("tile {:?}", index),
            ));
        }
        Ok(())
    }
}
