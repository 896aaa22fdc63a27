//! Tile matrix set builder.
//!
//! Collects a domain plus tiling options, then generates one tile matrix per
//! scale. All levels share the domain's upper-left corner so tile boundaries
//! of a coarse level always fall on tile boundaries of the finer ones when
//! the scale factor is an integer.

use projection::AffineTransform;
use tms_common::{Comparison, Crs, Envelope, GridExtent, PixelAnchor};
use tracing::{debug, info};

use crate::config::{validate_epsilon, validate_scale_factor, BuilderConfig};
use crate::error::{Result, TileMatrixError};
use crate::grid_geometry::GridGeometry;
use crate::iteration::{IterationPolicy, ScaleContext};
use crate::matrix::TileMatrix;
use crate::matrix_set::{DefiningTileMatrixSet, TileMatrixSet};
use crate::rounding::ceil_tolerant;
use crate::subdivide::FromTopBuilder;

#[derive(Debug, Clone)]
enum Domain {
    Grid(GridGeometry),
    Estimated {
        envelope: Envelope,
        resolution: Vec<f64>,
    },
}

/// Builder for [`TileMatrixSet`].
///
/// ```ignore
/// let set = TileMatrixSetBuilder::new()
///     .domain(grid)
///     .tile_size(vec![256, 256])
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct TileMatrixSetBuilder {
    identifier: String,
    domain: Option<Domain>,
    tile_size: Option<Vec<u32>>,
    default_tile_size: u32,
    scale_factor: f64,
    scales: Option<Vec<f64>>,
    iteration: IterationPolicy,
    nb_tile_threshold: u64,
    axes: Option<Vec<usize>>,
    epsilon: f64,
    max_levels: usize,
}

impl Default for TileMatrixSetBuilder {
    fn default() -> Self {
        Self::with_config(&BuilderConfig::default())
    }
}

impl TileMatrixSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &BuilderConfig) -> Self {
        Self {
            identifier: "default".to_string(),
            domain: None,
            tile_size: None,
            default_tile_size: config.tile_size,
            scale_factor: config.scale_factor,
            scales: None,
            iteration: config.iteration,
            nb_tile_threshold: config.nb_tile_threshold,
            axes: None,
            epsilon: config.epsilon,
            max_levels: config.max_levels,
        }
    }

    /// Start a pyramid that halves an envelope `n` times instead of
    /// following a native resolution.
    pub fn from_top(envelope: Envelope) -> FromTopBuilder {
        FromTopBuilder::new(envelope)
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Use an existing grid as the domain.
    pub fn domain(mut self, grid: GridGeometry) -> Self {
        self.domain = Some(Domain::Grid(grid));
        self
    }

    /// Use an envelope and a per-axis resolution as the domain.
    pub fn domain_envelope(mut self, envelope: Envelope, resolution: Vec<f64>) -> Self {
        self.domain = Some(Domain::Estimated {
            envelope,
            resolution,
        });
        self
    }

    pub fn tile_size(mut self, tile_size: Vec<u32>) -> Self {
        self.tile_size = Some(tile_size);
        self
    }

    pub fn scale_factor(mut self, factor: f64) -> Self {
        self.scale_factor = factor;
        self
    }

    /// Explicit level scales. Overrides the iteration policy.
    pub fn scales(mut self, scales: Vec<f64>) -> Self {
        self.scales = Some(scales);
        self
    }

    pub fn iteration(mut self, policy: IterationPolicy) -> Self {
        self.iteration = policy;
        self
    }

    pub fn nb_tile_threshold(mut self, threshold: u64) -> Self {
        self.nb_tile_threshold = threshold;
        self
    }

    /// Grid axes that get subdivided between levels. Defaults to the first two.
    pub fn axes(mut self, axes: impl IntoIterator<Item = usize>) -> Self {
        self.axes = Some(axes.into_iter().collect());
        self
    }

    pub fn max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }

    pub fn build(self) -> Result<TileMatrixSet> {
        self.validate()?;

        let grid = match self.domain.as_ref() {
            Some(Domain::Grid(grid)) => grid.clone(),
            Some(Domain::Estimated {
                envelope,
                resolution,
            }) => GridGeometry::from_envelope_and_resolution(envelope, resolution)?,
            None => {
                return Err(TileMatrixError::invalid_config(
                    "a domain grid geometry or envelope is required",
                ))
            }
        };

        let dim = grid.dimension();
        let tile_size = resolve_tile_size(self.tile_size.as_deref(), self.default_tile_size, dim)?;
        let axes = resolve_axes(self.axes.as_deref(), dim)?;
        let layout = LevelLayout::new(&grid, tile_size, &axes, self.epsilon)?;

        let scales = match self.scales.as_deref() {
            Some(explicit) => sort_explicit_scales(explicit, self.epsilon)?,
            None => self.iteration.scales(&layout.scale_context(&self)),
        };

        let count = scales.len();
        let mut set =
            DefiningTileMatrixSet::new(self.identifier.clone(), grid.crs().clone()).with_tolerance(self.epsilon);
        for (k, &scale) in scales.iter().enumerate() {
            // Ascending scales: the last one is the coarsest and gets "0".
            let identifier = (count - 1 - k).to_string();
            let matrix = layout.tile_matrix(identifier, scale, grid.crs())?;
            debug!(
                matrix = %matrix.identifier(),
                scale = scale,
                tiles = ?matrix.matrix_size(),
                "Generated tile matrix"
            );
            set.insert(matrix)?;
        }

        let set = set.seal();
        info!(
            identifier = %set.identifier(),
            crs = %set.crs(),
            levels = set.len(),
            finest = set.finest().map(TileMatrix::scale),
            coarsest = set.coarsest().map(TileMatrix::scale),
            policy = %self.iteration,
            explicit_scales = self.scales.is_some(),
            "Built tile matrix set"
        );
        Ok(set)
    }

    fn validate(&self) -> Result<()> {
        validate_scale_factor(self.scale_factor)?;
        validate_epsilon(self.epsilon)?;
        if self.nb_tile_threshold == 0 {
            return Err(TileMatrixError::invalid_config(
                "nb_tile_threshold must be >= 1",
            ));
        }
        if self.max_levels == 0 {
            return Err(TileMatrixError::invalid_config("max_levels must be >= 1"));
        }
        if self.default_tile_size == 0 {
            return Err(TileMatrixError::invalid_config("tile_size must be > 0"));
        }
        Ok(())
    }
}

/// Geometry shared by every level of one build.
struct LevelLayout {
    envelope: Envelope,
    /// Corner every level starts from, per axis.
    anchor: Vec<f64>,
    directions: Vec<f64>,
    native: Vec<f64>,
    tile_size: Vec<u32>,
    /// Selected axes with a non-zero span.
    participating: Vec<usize>,
    epsilon: f64,
}

impl LevelLayout {
    fn new(grid: &GridGeometry, tile_size: Vec<u32>, axes: &[usize], epsilon: f64) -> Result<Self> {
        let envelope = grid.envelope()?;
        let directions = grid.axis_directions();
        let anchor = directions
            .iter()
            .enumerate()
            .map(|(axis, dir)| {
                if *dir < 0.0 {
                    envelope.max(axis)
                } else {
                    envelope.min(axis)
                }
            })
            .collect();
        let participating = axes
            .iter()
            .copied()
            .filter(|&axis| !envelope.is_degenerate(axis))
            .collect();

        Ok(Self {
            envelope,
            anchor,
            directions,
            native: grid.resolution(),
            tile_size,
            participating,
            epsilon,
        })
    }

    fn scale_context(&self, builder: &TileMatrixSetBuilder) -> ScaleContext {
        let axes = &self.participating;
        let native_resolution = if axes.is_empty() {
            self.native.iter().copied().fold(f64::INFINITY, f64::min)
        } else {
            axes.iter().map(|&a| self.native[a]).fold(f64::INFINITY, f64::min)
        };

        ScaleContext {
            native_resolution,
            spans: axes.iter().map(|&a| self.envelope.span(a)).collect(),
            tile_size: axes.iter().map(|&a| self.tile_size[a]).collect(),
            scale_factor: builder.scale_factor,
            nb_tile_threshold: builder.nb_tile_threshold,
            epsilon: builder.epsilon,
            max_levels: builder.max_levels,
        }
    }

    fn tile_matrix(&self, identifier: String, scale: f64, crs: &Crs) -> Result<TileMatrix> {
        let dim = self.anchor.len();
        let mut counts = Vec::with_capacity(dim);
        let mut steps = Vec::with_capacity(dim);

        for axis in 0..dim {
            let span = self.envelope.span(axis);
            let (count, tile_span) = if self.participating.contains(&axis) {
                let tile_span = scale * f64::from(self.tile_size[axis]);
                let count = ceil_tolerant(span / tile_span, self.epsilon) as u64;
                (count.max(1), tile_span)
            } else if span > 0.0 {
                (1, span)
            } else {
                (1, self.native[axis] * f64::from(self.tile_size[axis]))
            };
            counts.push(count);
            steps.push(self.directions[axis] * tile_span);
        }

        let tiling_scheme = GridGeometry::new(
            GridExtent::from_size(&counts)?,
            PixelAnchor::CellCorner,
            AffineTransform::from_scale_and_translation(&steps, &self.anchor)?,
            crs.clone(),
        )?;
        TileMatrix::new(identifier, scale, tiling_scheme, self.tile_size.clone())
    }
}

/// Default tile shape: `size` cells on the first two axes, 1 beyond.
pub(crate) fn default_tile_size(size: u32, dimension: usize) -> Vec<u32> {
    (0..dimension).map(|axis| if axis < 2 { size } else { 1 }).collect()
}

pub(crate) fn resolve_tile_size(
    explicit: Option<&[u32]>,
    default_size: u32,
    dimension: usize,
) -> Result<Vec<u32>> {
    match explicit {
        Some(tile_size) => {
            TileMatrixError::check_dimension("tile size", dimension, tile_size.len())?;
            if tile_size.contains(&0) {
                return Err(TileMatrixError::invalid_config(
                    "tile size must be > 0 on every axis",
                ));
            }
            Ok(tile_size.to_vec())
        }
        None => Ok(default_tile_size(default_size, dimension)),
    }
}

pub(crate) fn resolve_axes(explicit: Option<&[usize]>, dimension: usize) -> Result<Vec<usize>> {
    let Some(axes) = explicit else {
        return Ok((0..dimension.min(2)).collect());
    };
    if axes.is_empty() {
        return Err(TileMatrixError::invalid_config("at least one axis must be selected"));
    }
    for (i, &axis) in axes.iter().enumerate() {
        if axis >= dimension {
            return Err(TileMatrixError::invalid_config(format!(
                "axis {} out of range for a {}-dimensional domain",
                axis, dimension
            )));
        }
        if axes[..i].contains(&axis) {
            return Err(TileMatrixError::invalid_config(format!("axis {} selected twice", axis)));
        }
    }
    Ok(axes.to_vec())
}

fn sort_explicit_scales(scales: &[f64], epsilon: f64) -> Result<Vec<f64>> {
    if scales.is_empty() {
        return Err(TileMatrixError::invalid_config("explicit scale list is empty"));
    }
    if let Some(bad) = scales.iter().find(|s| !s.is_finite() || **s <= 0.0) {
        return Err(TileMatrixError::invalid_config(format!(
            "scales must be finite numbers > 0, got {}",
            bad
        )));
    }

    let mut sorted = scales.to_vec();
    sorted.sort_by(f64::total_cmp);
    let same = Comparison::Relative(epsilon);
    if let Some(pair) = sorted.windows(2).find(|w| same.equals(w[0], w[1])) {
        return Err(TileMatrixError::invalid_config(format!(
            "duplicate scale {}",
            pair[0]
        )));
    }
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> Envelope {
        Envelope::from_ranges(&[(-180.0, 180.0), (-90.0, 90.0)], Crs::wgs84()).unwrap()
    }

    fn world_grid(resolution: f64) -> GridGeometry {
        GridGeometry::from_envelope_and_resolution(&world(), &[resolution, resolution]).unwrap()
    }

    #[test]
    fn test_missing_domain() {
        let result = TileMatrixSetBuilder::new().build();
        assert!(matches!(result, Err(TileMatrixError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_identifiers_coarsest_is_zero() {
        let set = TileMatrixSetBuilder::new()
            .domain(world_grid(0.1))
            .iteration(IterationPolicy::TopToBottomStrict)
            .build()
            .unwrap();
        let ids: Vec<&str> = set.coarse_to_fine().map(|m| m.identifier()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
        assert_eq!(set.coarsest().unwrap().matrix_size(), vec![2, 1]);
    }

    #[test]
    fn test_explicit_scales_sorted() {
        let set = TileMatrixSetBuilder::new()
            .domain(world_grid(1.0))
            .scales(vec![4.0, 1.0, 2.0])
            .build()
            .unwrap();
        assert_eq!(set.scales(), vec![1.0, 2.0, 4.0]);
        assert_eq!(set.get("0").unwrap().scale(), 4.0);
    }

    #[test]
    fn test_explicit_duplicate_scales() {
        let result = TileMatrixSetBuilder::new()
            .domain(world_grid(1.0))
            .scales(vec![2.0, 1.0, 2.0 * (1.0 + 1e-12)])
            .build();
        assert!(matches!(result, Err(TileMatrixError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_rejects_invalid_options() {
        let invalid = [
            TileMatrixSetBuilder::new().domain(world_grid(1.0)).scale_factor(1.0),
            TileMatrixSetBuilder::new().domain(world_grid(1.0)).nb_tile_threshold(0),
            TileMatrixSetBuilder::new().domain(world_grid(1.0)).tile_size(vec![256]),
            TileMatrixSetBuilder::new().domain(world_grid(1.0)).tile_size(vec![256, 0]),
            TileMatrixSetBuilder::new().domain(world_grid(1.0)).axes([0, 0]),
            TileMatrixSetBuilder::new().domain(world_grid(1.0)).axes([5]),
            TileMatrixSetBuilder::new().domain(world_grid(1.0)).scales(vec![-1.0]),
        ];
        for builder in invalid {
            assert!(builder.build().is_err());
        }
    }

    #[test]
    fn test_single_axis_subdivision() {
        let set = TileMatrixSetBuilder::new()
            .domain(world_grid(1.0))
            .axes([0])
            .tile_size(vec![90, 256])
            .iteration(IterationPolicy::TopToBottomLastExact)
            .build()
            .unwrap();
        for matrix in set.tile_matrices() {
            assert_eq!(matrix.matrix_size()[1], 1);
        }
        // x starts with one 360 degree tile, the y axis is never split
        assert_eq!(set.scales(), vec![1.0, 2.0, 4.0]);
        assert_eq!(set.finest().unwrap().matrix_size(), vec![4, 1]);
        assert_eq!(set.coarsest().unwrap().matrix_size(), vec![1, 1]);
    }

    #[test]
    fn test_default_tile_size() {
        assert_eq!(default_tile_size(256, 3), vec![256, 256, 1]);
        assert_eq!(default_tile_size(512, 1), vec![512]);
    }

    #[test]
    fn test_with_config() {
        let config = BuilderConfig {
            tile_size: 128,
            iteration: IterationPolicy::TopToBottomLastExact,
            ..Default::default()
        };
        let set = TileMatrixSetBuilder::with_config(&config)
            .domain(world_grid(1.0))
            .build()
            .unwrap();
        assert_eq!(set.scales(), vec![1.0, 1.40625]);
        assert_eq!(set.finest().unwrap().tile_size(), &[128, 128]);
    }
}
