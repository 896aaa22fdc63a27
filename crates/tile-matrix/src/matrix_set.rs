//! Tile matrix sets: ordered collections of tile matrices sharing one CRS.

use serde::{Deserialize, Serialize};
use tms_common::{Comparison, Crs, Envelope};
use tracing::debug;

use crate::error::{Result, TileMatrixError};
use crate::matrix::TileMatrix;

/// An immutable pyramid of tile matrices, sorted by ascending scale
/// (finest level first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMatrixSet {
    identifier: String,
    crs: Crs,
    tile_matrices: Vec<TileMatrix>,
}

impl TileMatrixSet {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// All levels, finest first.
    pub fn tile_matrices(&self) -> &[TileMatrix] {
        &self.tile_matrices
    }

    /// All levels, coarsest first.
    pub fn coarse_to_fine(&self) -> impl DoubleEndedIterator<Item = &TileMatrix> {
        self.tile_matrices.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.tile_matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tile_matrices.is_empty()
    }

    pub fn scales(&self) -> Vec<f64> {
        self.tile_matrices.iter().map(TileMatrix::scale).collect()
    }

    pub fn finest(&self) -> Option<&TileMatrix> {
        self.tile_matrices.first()
    }

    pub fn coarsest(&self) -> Option<&TileMatrix> {
        self.tile_matrices.last()
    }

    /// Look up a level by identifier.
    pub fn get(&self, identifier: &str) -> Option<&TileMatrix> {
        self.tile_matrices
            .iter()
            .find(|m| m.identifier() == identifier)
    }

    /// Levels whose scale equals `scale` under `mode`.
    pub fn at_scale(&self, scale: f64, mode: Comparison) -> Vec<&TileMatrix> {
        self.tile_matrices
            .iter()
            .filter(|m| mode.equals(m.scale(), scale))
            .collect()
    }

    /// The coarsest level that is still at least as fine as `resolution`,
    /// or the finest level when every level is coarser.
    pub fn matrix_for_resolution(&self, resolution: f64) -> Option<&TileMatrix> {
        let limit = resolution * (1.0 + 1e-9);
        self.tile_matrices
            .iter()
            .rev()
            .find(|m| m.scale() <= limit)
            .or_else(|| self.finest())
    }

    /// Union of the envelopes of all levels.
    pub fn envelope(&self) -> Result<Option<Envelope>> {
        let mut union: Option<Envelope> = None;
        for matrix in &self.tile_matrices {
            let envelope = matrix.envelope()?;
            union = Some(match union {
                Some(current) => current.union(&envelope)?,
                None => envelope,
            });
        }
        Ok(union)
    }
}

/// A tile matrix set under construction.
///
/// Levels can be inserted in any order; they are kept sorted by scale.
/// [`DefiningTileMatrixSet::seal`] freezes the result.
#[derive(Debug, Clone)]
pub struct DefiningTileMatrixSet {
    identifier: String,
    crs: Crs,
    tile_matrices: Vec<TileMatrix>,
    epsilon: f64,
}

impl DefiningTileMatrixSet {
    pub fn new(identifier: impl Into<String>, crs: Crs) -> Self {
        Self {
            identifier: identifier.into(),
            crs,
            tile_matrices: Vec::new(),
            epsilon: 1e-9,
        }
    }

    /// Relative tolerance under which two scales count as the same level.
    pub fn with_tolerance(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn len(&self) -> usize {
        self.tile_matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tile_matrices.is_empty()
    }

    /// Insert a level at its sorted position.
    pub fn insert(&mut self, matrix: TileMatrix) -> Result<()> {
        if matrix.crs() != &self.crs {
            return Err(TileMatrixError::incompatible_crs(&self.crs, matrix.crs()));
        }

        let same_scale = Comparison::Relative(self.epsilon);
        if let Some(existing) = self
            .tile_matrices
            .iter()
            .find(|m| same_scale.equals(m.scale(), matrix.scale()))
        {
            return Err(TileMatrixError::invalid_config(format!(
                "tile matrix '{}' duplicates the scale {} of '{}'",
                matrix.identifier(),
                matrix.scale(),
                existing.identifier()
            )));
        }
        if self.tile_matrices.iter().any(|m| m.identifier() == matrix.identifier()) {
            return Err(TileMatrixError::invalid_config(format!(
                "duplicate tile matrix identifier '{}'",
                matrix.identifier()
            )));
        }

        let position = self
            .tile_matrices
            .partition_point(|m| m.scale() < matrix.scale());
        debug!(
            set = %self.identifier,
            matrix = %matrix.identifier(),
            scale = matrix.scale(),
            position = position,
            "Inserted tile matrix"
        );
        self.tile_matrices.insert(position, matrix);
        Ok(())
    }

    pub fn remove(&mut self, identifier: &str) -> Option<TileMatrix> {
        let index = self
            .tile_matrices
            .iter()
            .position(|m| m.identifier() == identifier)?;
        Some(self.tile_matrices.remove(index))
    }

    pub fn seal(self) -> TileMatrixSet {
        TileMatrixSet {
            identifier: self.identifier,
            crs: self.crs,
            tile_matrices: self.tile_matrices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_geometry::GridGeometry;
    use projection::AffineTransform;
    use tms_common::{GridExtent, PixelAnchor};

    fn level(id: &str, tiles: u64) -> TileMatrix {
        let span = 360.0 / tiles as f64;
        let g2c = AffineTransform::from_scale_and_translation(&[span, -span], &[-180.0, 90.0]).unwrap();
        let scheme = GridGeometry::new(
            GridExtent::from_size(&[tiles, tiles.div_ceil(2)]).unwrap(),
            PixelAnchor::CellCorner,
            g2c,
            Crs::wgs84(),
        )
        .unwrap();
        TileMatrix::new(id, span / 256.0, scheme, vec![256, 256]).unwrap()
    }

    fn pyramid() -> TileMatrixSet {
        let mut set = DefiningTileMatrixSet::new("world", Crs::wgs84());
        set.insert(level("1", 2)).unwrap();
        set.insert(level("0", 1)).unwrap();
        set.insert(level("2", 4)).unwrap();
        set.seal()
    }

    #[test]
    fn test_insert_keeps_scale_order() {
        let set = pyramid();
        let ids: Vec<&str> = set.tile_matrices().iter().map(|m| m.identifier()).collect();
        assert_eq!(ids, vec!["2", "1", "0"]);
        let coarse: Vec<&str> = set.coarse_to_fine().map(|m| m.identifier()).collect();
        assert_eq!(coarse, vec!["0", "1", "2"]);
        assert!(set.scales().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_duplicate_scale_rejected() {
        let mut set = DefiningTileMatrixSet::new("world", Crs::wgs84());
        set.insert(level("a", 2)).unwrap();
        let result = set.insert(level("b", 2));
        assert!(matches!(result, Err(TileMatrixError::InvalidConfiguration(_))));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let mut set = DefiningTileMatrixSet::new("world", Crs::wgs84());
        set.insert(level("a", 2)).unwrap();
        assert!(set.insert(level("a", 4)).is_err());
    }

    #[test]
    fn test_remove() {
        let mut set = DefiningTileMatrixSet::new("world", Crs::wgs84());
        set.insert(level("a", 2)).unwrap();
        assert!(set.remove("a").is_some());
        assert!(set.remove("a").is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn test_lookup() {
        let set = pyramid();
        assert_eq!(set.get("1").unwrap().matrix_size(), vec![2, 1]);
        assert!(set.get("9").is_none());
        assert_eq!(set.at_scale(180.0 / 256.0, Comparison::default()).len(), 1);
    }

    #[test]
    fn test_matrix_for_resolution() {
        let set = pyramid();
        // scales: 0.3515625, 0.703125, 1.40625
        assert_eq!(set.matrix_for_resolution(1.0).unwrap().identifier(), "1");
        assert_eq!(set.matrix_for_resolution(0.703125).unwrap().identifier(), "1");
        assert_eq!(set.matrix_for_resolution(100.0).unwrap().identifier(), "0");
        assert_eq!(set.matrix_for_resolution(0.01).unwrap().identifier(), "2");
    }

    #[test]
    fn test_envelope_union() {
        let envelope = pyramid().envelope().unwrap().unwrap();
        assert!((envelope.min(0) + 180.0).abs() < 1e-9);
        assert!((envelope.max(0) - 180.0).abs() < 1e-9);
        assert!((envelope.max(1) - 90.0).abs() < 1e-9);
        assert!(DefiningTileMatrixSet::new("e", Crs::wgs84())
            .seal()
            .envelope()
            .unwrap()
            .is_none());
    }
}
