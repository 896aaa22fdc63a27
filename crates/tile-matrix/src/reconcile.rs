//! Merging several grid geometries into one common tiling scheme.

use serde::{Deserialize, Serialize};
use tms_common::{Comparison, GridExtent, PixelAnchor};
use tracing::{debug, warn};

use crate::config::ReconcileOptions;
use crate::grid_geometry::GridGeometry;

/// Integer translation of one source grid inside the merged grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridOffset {
    pub source: GridGeometry,
    /// Index in the merged grid = index in `source` + `offset`.
    pub offset: Vec<i64>,
}

/// A grid covering every input, with per-input offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    tiling_scheme: GridGeometry,
    offsets: Vec<GridOffset>,
}

impl Reconciliation {
    pub fn tiling_scheme(&self) -> &GridGeometry {
        &self.tiling_scheme
    }

    pub fn offsets(&self) -> &[GridOffset] {
        &self.offsets
    }

    pub fn offset_of(&self, grid: &GridGeometry) -> Option<&[i64]> {
        self.offsets
            .iter()
            .find(|entry| &entry.source == grid)
            .map(|entry| entry.offset.as_slice())
    }

    pub fn into_parts(self) -> (GridGeometry, Vec<GridOffset>) {
        (self.tiling_scheme, self.offsets)
    }
}

/// Largest offset, in cells, that is still an exact integer in f64.
const MAX_EXACT_OFFSET: f64 = 9_007_199_254_740_992.0;

/// Find one grid whose cells line up with the cells of every input.
///
/// Inputs must share CRS, dimension and cell size, and their origins must
/// differ by a whole number of cells. Returns `None` otherwise. The merged
/// grid starts at index zero.
pub fn to_tiling_scheme(grids: &[GridGeometry], options: &ReconcileOptions) -> Option<Reconciliation> {
    let (first, rest) = grids.split_first()?;
    let dim = first.dimension();
    let reference = first.grid_to_crs(PixelAnchor::CellCorner);
    let same_scale = Comparison::Relative(options.scale_tolerance);

    for grid in rest {
        if grid.crs() != first.crs() || grid.dimension() != dim {
            debug!(expected = %first.crs(), found = %grid.crs(), "Grids use different CRS");
            return None;
        }
        if !grid
            .grid_to_crs(PixelAnchor::CellCorner)
            .linear_approx_eq(&reference, same_scale)
        {
            debug!(resolution = ?grid.resolution(), expected = ?first.resolution(), "Grids have different cell sizes");
            return None;
        }
    }

    let Ok(inverse) = reference.inverse() else {
        warn!("Reference grid transform is not invertible");
        return None;
    };

    let mut raw_offsets = Vec::with_capacity(grids.len());
    for grid in grids {
        let origin = grid.grid_to_crs(PixelAnchor::CellCorner).translation_vector();
        let mut offset = Vec::with_capacity(dim);
        for cells in inverse.apply(&origin) {
            let whole = cells.round();
            if !cells.is_finite()
                || whole.abs() > MAX_EXACT_OFFSET
                || (cells - whole).abs() > options.offset_tolerance
            {
                debug!(offset = cells, "Grid origins are not a whole number of cells apart");
                return None;
            }
            offset.push(whole as i64);
        }
        raw_offsets.push(offset);
    }

    let mut low = vec![i64::MAX; dim];
    let mut high = vec![i64::MIN; dim];
    for (grid, offset) in grids.iter().zip(&raw_offsets) {
        for axis in 0..dim {
            low[axis] = low[axis].min(grid.extent().low(axis) + offset[axis]);
            high[axis] = high[axis].max(grid.extent().high(axis) + offset[axis]);
        }
    }

    // Rebase so the merged extent starts at zero.
    let shift: Vec<f64> = low.iter().map(|&v| v as f64).collect();
    let sizes: Vec<u64> = low
        .iter()
        .zip(&high)
        .map(|(l, h)| (h - l + 1) as u64)
        .collect();
    let merged = reference.pre_translate(&shift).ok().and_then(|g2c| {
        let extent = GridExtent::from_size(&sizes).ok()?;
        GridGeometry::new(extent, PixelAnchor::CellCorner, g2c, first.crs().clone()).ok()
    });
    let Some(tiling_scheme) = merged else {
        warn!(?low, ?high, "Failed to assemble merged grid");
        return None;
    };

    let offsets = grids
        .iter()
        .zip(raw_offsets)
        .map(|(grid, offset)| GridOffset {
            source: grid.clone(),
            offset: offset.iter().zip(&low).map(|(o, l)| o - l).collect(),
        })
        .collect();

    debug!(inputs = grids.len(), extent = %tiling_scheme.extent(), "Reconciled grids");
    Some(Reconciliation {
        tiling_scheme,
        offsets,
    })
}
