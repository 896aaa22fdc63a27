//! Positions in world coordinates.

use serde::{Deserialize, Serialize};

use crate::{Comparison, Crs, GeometryError, GeometryResult};

/// A point with one coordinate per CRS axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectPosition {
    coordinates: Vec<f64>,
    crs: Crs,
}

impl DirectPosition {
    /// Create a position, checking that it matches the CRS dimension.
    pub fn new(coordinates: Vec<f64>, crs: Crs) -> GeometryResult<Self> {
        GeometryError::check_dimension(crs.dimension(), coordinates.len())?;
        Ok(Self { coordinates, crs })
    }

    pub(crate) fn from_parts(coordinates: Vec<f64>, crs: Crs) -> Self {
        Self { coordinates, crs }
    }

    pub fn dimension(&self) -> usize {
        self.coordinates.len()
    }

    pub fn coordinate(&self, axis: usize) -> f64 {
        self.coordinates[axis]
    }

    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Compare coordinates under the given mode. CRS must be equal.
    pub fn approx_eq(&self, other: &DirectPosition, mode: Comparison) -> bool {
        self.crs == other.crs && mode.equals_all(&self.coordinates, &other.coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_checked() {
        assert!(DirectPosition::new(vec![1.0, 2.0], Crs::wgs84()).is_ok());
        assert_eq!(
            DirectPosition::new(vec![1.0], Crs::wgs84()),
            Err(GeometryError::MismatchedDimension {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_approx_eq_requires_same_crs() {
        let a = DirectPosition::new(vec![1.0, 2.0], Crs::wgs84()).unwrap();
        let b = DirectPosition::new(vec![1.0, 2.0], Crs::web_mercator()).unwrap();
        assert!(!a.approx_eq(&b, Comparison::Exact));
        assert!(a.approx_eq(&a.clone(), Comparison::Exact));
    }
}
