//! Grid geometry: a grid extent tied to a CRS through an affine transform.

use projection::AffineTransform;
use serde::{Deserialize, Serialize};
use tms_common::{Crs, DirectPosition, Envelope, GridExtent, PixelAnchor};

use crate::error::{Result, TileMatrixError};
use crate::rounding::{ceil_tolerant, INDEX_TOLERANCE};

/// A grid extent located in a CRS.
///
/// The grid-to-CRS transform is kept in cell-corner form: grid coordinate
/// `(0, 0)` maps to the outer corner of the first cell. Transforms given with
/// a cell-center anchor are converted on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    extent: GridExtent,
    grid_to_crs: AffineTransform,
    crs: Crs,
}

impl GridGeometry {
    pub fn new(
        extent: GridExtent,
        anchor: PixelAnchor,
        grid_to_crs: AffineTransform,
        crs: Crs,
    ) -> Result<Self> {
        let dim = extent.dimension();
        TileMatrixError::check_dimension("grid to CRS transform", dim, grid_to_crs.dimension())?;
        TileMatrixError::check_dimension("CRS", dim, crs.dimension())?;

        let grid_to_crs = match anchor {
            PixelAnchor::CellCorner => grid_to_crs,
            PixelAnchor::CellCenter => grid_to_crs.pre_translate_uniform(-anchor.offset()),
        };

        Ok(Self {
            extent,
            grid_to_crs,
            crs,
        })
    }

    /// Estimate a north-up grid covering `envelope` at the given per-axis resolution.
    ///
    /// The second axis points down (negative scale) as in raster images, so
    /// the grid origin sits at the envelope's minimum x and maximum y.
    /// Further axes grow with their grid index.
    pub fn from_envelope_and_resolution(envelope: &Envelope, resolution: &[f64]) -> Result<Self> {
        let dim = envelope.dimension();
        TileMatrixError::check_dimension("resolution", dim, resolution.len())?;

        let mut sizes = Vec::with_capacity(dim);
        let mut scale = Vec::with_capacity(dim);
        let mut origin = Vec::with_capacity(dim);
        for (axis, &res) in resolution.iter().enumerate() {
            if !res.is_finite() || res <= 0.0 {
                return Err(TileMatrixError::invalid_config(format!(
                    "resolution on axis {} must be a finite number > 0, got {}",
                    axis, res
                )));
            }
            let cells = ceil_tolerant(envelope.span(axis) / res, INDEX_TOLERANCE) as u64;
            sizes.push(cells.max(1));

            if axis == 1 {
                scale.push(-res);
                origin.push(envelope.max(axis));
            } else {
                scale.push(res);
                origin.push(envelope.min(axis));
            }
        }

        let grid_to_crs = AffineTransform::from_scale_and_translation(&scale, &origin)?;
        Self::new(
            GridExtent::from_size(&sizes)?,
            PixelAnchor::CellCorner,
            grid_to_crs,
            envelope.crs().clone(),
        )
    }

    pub fn dimension(&self) -> usize {
        self.extent.dimension()
    }

    pub fn extent(&self) -> &GridExtent {
        &self.extent
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Grid-to-CRS transform for the requested cell anchor.
    pub fn grid_to_crs(&self, anchor: PixelAnchor) -> AffineTransform {
        match anchor {
            PixelAnchor::CellCorner => self.grid_to_crs.clone(),
            PixelAnchor::CellCenter => self.grid_to_crs.pre_translate_uniform(anchor.offset()),
        }
    }

    pub(crate) fn corner_transform(&self) -> &AffineTransform {
        &self.grid_to_crs
    }

    /// Cell size along each grid axis, in CRS units.
    pub fn resolution(&self) -> Vec<f64> {
        self.grid_to_crs.column_norms()
    }

    /// Sign of the dominant grid axis feeding each CRS axis.
    pub fn axis_directions(&self) -> Vec<f64> {
        let dim = self.dimension();
        (0..dim)
            .map(|row| {
                let dominant = (0..dim)
                    .map(|col| self.grid_to_crs.element(row, col))
                    .fold(0.0_f64, |best, v| if v.abs() > best.abs() { v } else { best });
                if dominant < 0.0 {
                    -1.0
                } else {
                    1.0
                }
            })
            .collect()
    }

    /// Envelope covered by the whole grid, cell edges included.
    pub fn envelope(&self) -> Result<Envelope> {
        let dim = self.dimension();
        let mut lower = vec![f64::INFINITY; dim];
        let mut upper = vec![f64::NEG_INFINITY; dim];

        for mask in 0..(1usize << dim) {
            let corner: Vec<f64> = (0..dim)
                .map(|axis| {
                    if mask & (1 << axis) == 0 {
                        self.extent.low(axis) as f64
                    } else {
                        (self.extent.high(axis) + 1) as f64
                    }
                })
                .collect();
            for (axis, v) in self.grid_to_crs.apply(&corner).into_iter().enumerate() {
                lower[axis] = lower[axis].min(v);
                upper[axis] = upper[axis].max(v);
            }
        }

        Ok(Envelope::new(lower, upper, self.crs.clone())?)
    }

    /// CRS position of grid coordinate zero.
    pub fn upper_left_corner(&self) -> Result<DirectPosition> {
        let origin = vec![0.0; self.dimension()];
        Ok(DirectPosition::new(
            self.grid_to_crs.apply(&origin),
            self.crs.clone(),
        )?)
    }

    /// Continuous grid coordinates of a CRS position.
    pub fn world_to_grid(&self, coordinates: &[f64]) -> Result<Vec<f64>> {
        TileMatrixError::check_dimension("position", self.dimension(), coordinates.len())?;
        let inverse = self.grid_to_crs.inverse()?;
        Ok(inverse.apply(coordinates))
    }

    /// Same transform and CRS over a different extent.
    pub fn with_extent(&self, extent: GridExtent) -> Result<Self> {
        self.derived_grid(extent, PixelAnchor::CellCorner)
    }

    /// Same transform and CRS over `extent`, with the transform read as
    /// mapping the `anchor` point of each cell.
    ///
    /// With `CellCenter` the derived cells are centered on the integer grid
    /// positions of this geometry, so they shift by half a cell.
    pub fn derived_grid(&self, extent: GridExtent, anchor: PixelAnchor) -> Result<Self> {
        TileMatrixError::check_dimension("extent", self.dimension(), extent.dimension())?;
        Ok(Self {
            extent,
            grid_to_crs: self.grid_to_crs.pre_translate_uniform(-anchor.offset()),
            crs: self.crs.clone(),
        })
    }
}
