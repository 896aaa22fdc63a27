//! Integer grid extents and pixel anchors.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{GeometryError, GeometryResult};

/// Which point of a cell a grid index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PixelAnchor {
    /// Integer indices address cell centers.
    CellCenter,
    /// Integer indices address the cell corner closest to index zero.
    #[default]
    CellCorner,
}

impl PixelAnchor {
    /// Offset, in cells, from the cell corner to the anchored point.
    pub fn offset(&self) -> f64 {
        match self {
            PixelAnchor::CellCenter => 0.5,
            PixelAnchor::CellCorner => 0.0,
        }
    }
}

/// A box of integer cell indices with inclusive bounds on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridExtent {
    low: Vec<i64>,
    high: Vec<i64>,
}

impl GridExtent {
    /// Create an extent from inclusive low and high indices.
    pub fn new(low: Vec<i64>, high: Vec<i64>) -> GeometryResult<Self> {
        GeometryError::check_dimension(low.len(), high.len())?;
        for (axis, (l, h)) in low.iter().zip(&high).enumerate() {
            if l > h {
                return Err(GeometryError::InvalidExtent(format!(
                    "axis {} has low {} greater than high {}",
                    axis, l, h
                )));
            }
        }
        Ok(Self { low, high })
    }

    /// Create an extent starting at zero with the given cell count per axis.
    pub fn from_size(size: &[u64]) -> GeometryResult<Self> {
        if let Some(axis) = size.iter().position(|s| *s == 0) {
            return Err(GeometryError::InvalidExtent(format!(
                "axis {} has zero size",
                axis
            )));
        }
        if let Some(axis) = size.iter().position(|s| *s > i64::MAX as u64) {
            return Err(GeometryError::InvalidExtent(format!(
                "axis {} size {} does not fit a signed index",
                axis, size[axis]
            )));
        }
        let low = vec![0; size.len()];
        let high = size.iter().map(|s| *s as i64 - 1).collect();
        Self::new(low, high)
    }

    /// Create an extent from inclusive low and exclusive high indices.
    pub fn from_half_open(low: Vec<i64>, high_exclusive: Vec<i64>) -> GeometryResult<Self> {
        GeometryError::check_dimension(low.len(), high_exclusive.len())?;
        let high = high_exclusive.iter().map(|h| h - 1).collect();
        Self::new(low, high)
    }

    pub fn dimension(&self) -> usize {
        self.low.len()
    }

    pub fn low(&self, axis: usize) -> i64 {
        self.low[axis]
    }

    pub fn high(&self, axis: usize) -> i64 {
        self.high[axis]
    }

    pub fn lows(&self) -> &[i64] {
        &self.low
    }

    pub fn highs(&self) -> &[i64] {
        &self.high
    }

    /// Upper bounds in half-open form (`high + 1`).
    pub fn high_exclusive(&self) -> Vec<i64> {
        self.high.iter().map(|h| h + 1).collect()
    }

    /// Number of cells along an axis.
    pub fn size(&self, axis: usize) -> u64 {
        (self.high[axis] - self.low[axis] + 1) as u64
    }

    pub fn sizes(&self) -> Vec<u64> {
        (0..self.dimension()).map(|i| self.size(i)).collect()
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> u64 {
        self.sizes()
            .into_iter()
            .fold(1u64, |acc, s| acc.saturating_mul(s))
    }

    /// Check if a cell index lies inside this extent.
    pub fn contains(&self, index: &[i64]) -> bool {
        index.len() == self.dimension()
            && index
                .iter()
                .enumerate()
                .all(|(i, v)| *v >= self.low[i] && *v <= self.high[i])
    }

    /// Shift the extent by a per-axis cell offset.
    pub fn translate(&self, offset: &[i64]) -> GeometryResult<Self> {
        GeometryError::check_dimension(self.dimension(), offset.len())?;
        Ok(Self {
            low: self.low.iter().zip(offset).map(|(l, o)| l + o).collect(),
            high: self.high.iter().zip(offset).map(|(h, o)| h + o).collect(),
        })
    }

    /// Cells shared by both extents, if any.
    pub fn intersection(&self, other: &GridExtent) -> Option<GridExtent> {
        if other.dimension() != self.dimension() {
            return None;
        }
        let low: Vec<i64> = (0..self.dimension())
            .map(|i| self.low[i].max(other.low[i]))
            .collect();
        let high: Vec<i64> = (0..self.dimension())
            .map(|i| self.high[i].min(other.high[i]))
            .collect();
        Self::new(low, high).ok()
    }

    /// Smallest extent covering both.
    pub fn union(&self, other: &GridExtent) -> GeometryResult<GridExtent> {
        GeometryError::check_dimension(self.dimension(), other.dimension())?;
        Ok(Self {
            low: (0..self.dimension())
                .map(|i| self.low[i].min(other.low[i]))
                .collect(),
            high: (0..self.dimension())
                .map(|i| self.high[i].max(other.high[i]))
                .collect(),
        })
    }
}

impl fmt::Display for GridExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} - {:?}", self.low, self.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_size() {
        let extent = GridExtent::from_size(&[360, 180]).unwrap();
        assert_eq!(extent.lows(), &[0, 0]);
        assert_eq!(extent.highs(), &[359, 179]);
        assert_eq!(extent.sizes(), vec![360, 180]);
        assert_eq!(extent.cell_count(), 64800);
        assert!(GridExtent::from_size(&[4, 0]).is_err());
    }

    #[test]
    fn test_from_size_rejects_unsigned_overflow() {
        let largest = GridExtent::from_size(&[i64::MAX as u64]).unwrap();
        assert_eq!(largest.highs(), &[i64::MAX - 1]);
        assert!(matches!(
            GridExtent::from_size(&[4, i64::MAX as u64 + 1]),
            Err(GeometryError::InvalidExtent(_))
        ));
        assert!(GridExtent::from_size(&[u64::MAX]).is_err());
    }

    #[test]
    fn test_half_open_round_trip() {
        let extent = GridExtent::from_half_open(vec![0, 0], vec![1, 1]).unwrap();
        assert_eq!(extent.highs(), &[0, 0]);
        assert_eq!(extent.high_exclusive(), vec![1, 1]);
        assert!(GridExtent::from_half_open(vec![2], vec![2]).is_err());
    }

    #[test]
    fn test_translate_and_union() {
        let a = GridExtent::from_size(&[2, 2]).unwrap();
        let b = a.translate(&[3, -1]).unwrap();
        assert_eq!(b.lows(), &[3, -1]);
        assert_eq!(b.highs(), &[4, 0]);

        let u = a.union(&b).unwrap();
        assert_eq!(u.lows(), &[0, -1]);
        assert_eq!(u.highs(), &[4, 1]);
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn test_pixel_anchor_offset() {
        assert_eq!(PixelAnchor::CellCenter.offset(), 0.5);
        assert_eq!(PixelAnchor::CellCorner.offset(), 0.0);
        assert_eq!(PixelAnchor::default(), PixelAnchor::CellCorner);
    }
}
