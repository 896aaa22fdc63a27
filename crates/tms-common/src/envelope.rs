//! Axis-aligned envelopes of arbitrary dimension.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Comparison, Crs, DirectPosition, GeometryError, GeometryResult};

/// An n-dimensional axis-aligned box in world coordinates.
///
/// For geographic CRS (EPSG:4326), coordinates are in degrees.
/// For projected CRS (EPSG:3857, etc.), coordinates are in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    lower: Vec<f64>,
    upper: Vec<f64>,
    crs: Crs,
}

impl Envelope {
    /// Create an envelope from its lower and upper corners.
    ///
    /// Fails when the corner lengths disagree with each other or with the CRS,
    /// or when any `lower[i] > upper[i]` (NaN included).
    pub fn new(lower: Vec<f64>, upper: Vec<f64>, crs: Crs) -> GeometryResult<Self> {
        GeometryError::check_dimension(lower.len(), upper.len())?;
        GeometryError::check_dimension(crs.dimension(), lower.len())?;

        for (axis, (min, max)) in lower.iter().zip(&upper).enumerate() {
            if !(min <= max) {
                return Err(GeometryError::InvalidEnvelope(format!(
                    "axis {} has min {} greater than max {}",
                    axis, min, max
                )));
            }
        }

        Ok(Self { lower, upper, crs })
    }

    /// Create an envelope from one `(min, max)` pair per axis.
    pub fn from_ranges(ranges: &[(f64, f64)], crs: Crs) -> GeometryResult<Self> {
        let (lower, upper) = ranges.iter().copied().unzip();
        Self::new(lower, upper, crs)
    }

    /// Create the smallest envelope holding two arbitrary opposite corners.
    pub fn from_corners(a: &[f64], b: &[f64], crs: Crs) -> GeometryResult<Self> {
        GeometryError::check_dimension(a.len(), b.len())?;
        let lower = a.iter().zip(b).map(|(x, y)| x.min(*y)).collect();
        let upper = a.iter().zip(b).map(|(x, y)| x.max(*y)).collect();
        Self::new(lower, upper, crs)
    }

    /// Parse a BBOX parameter string "minx,miny,maxx,maxy" for a 2-D CRS.
    pub fn parse_bbox(s: &str, crs: Crs) -> GeometryResult<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(GeometryError::InvalidBboxFormat(s.to_string()));
        }

        let values = parts
            .iter()
            .map(|p| {
                p.parse::<f64>()
                    .map_err(|_| GeometryError::InvalidBboxNumber(p.to_string()))
            })
            .collect::<GeometryResult<Vec<_>>>()?;

        Self::new(vec![values[0], values[1]], vec![values[2], values[3]], crs)
    }

    /// Number of axes.
    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Minimum along an axis.
    pub fn min(&self, axis: usize) -> f64 {
        self.lower[axis]
    }

    /// Maximum along an axis.
    pub fn max(&self, axis: usize) -> f64 {
        self.upper[axis]
    }

    /// Extent along an axis in coordinate units.
    pub fn span(&self, axis: usize) -> f64 {
        self.upper[axis] - self.lower[axis]
    }

    /// Midpoint along an axis.
    pub fn median(&self, axis: usize) -> f64 {
        (self.lower[axis] + self.upper[axis]) / 2.0
    }

    /// True when the envelope has zero span along `axis`.
    pub fn is_degenerate(&self, axis: usize) -> bool {
        self.span(axis) == 0.0
    }

    pub fn lower_corner(&self) -> DirectPosition {
        DirectPosition::from_parts(self.lower.clone(), self.crs.clone())
    }

    pub fn upper_corner(&self) -> DirectPosition {
        DirectPosition::from_parts(self.upper.clone(), self.crs.clone())
    }

    /// Get the center point of the envelope.
    pub fn center(&self) -> DirectPosition {
        let coords = (0..self.dimension()).map(|i| self.median(i)).collect();
        DirectPosition::from_parts(coords, self.crs.clone())
    }

    /// All `2^D` corners, axis 0 varying fastest.
    pub fn corners(&self) -> Vec<Vec<f64>> {
        let dim = self.dimension();
        (0..1usize << dim)
            .map(|mask| {
                (0..dim)
                    .map(|i| {
                        if mask & (1 << i) == 0 {
                            self.lower[i]
                        } else {
                            self.upper[i]
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Check if a position is inside this envelope (boundaries included).
    pub fn contains_position(&self, position: &DirectPosition) -> bool {
        position.dimension() == self.dimension()
            && position
                .coordinates()
                .iter()
                .enumerate()
                .all(|(i, v)| *v >= self.lower[i] && *v <= self.upper[i])
    }

    /// Check if `other` lies entirely inside this envelope.
    pub fn contains(&self, other: &Envelope) -> bool {
        other.dimension() == self.dimension()
            && (0..self.dimension())
                .all(|i| other.lower[i] >= self.lower[i] && other.upper[i] <= self.upper[i])
    }

    /// Check if this envelope intersects another. Touching boundaries count.
    pub fn intersects(&self, other: &Envelope) -> bool {
        other.dimension() == self.dimension()
            && (0..self.dimension())
                .all(|i| self.lower[i] <= other.upper[i] && self.upper[i] >= other.lower[i])
    }

    /// Compute the intersection of two envelopes.
    pub fn intersection(&self, other: &Envelope) -> Option<Envelope> {
        if !self.intersects(other) {
            return None;
        }

        let lower = (0..self.dimension())
            .map(|i| self.lower[i].max(other.lower[i]))
            .collect();
        let upper = (0..self.dimension())
            .map(|i| self.upper[i].min(other.upper[i]))
            .collect();
        Some(Envelope {
            lower,
            upper,
            crs: self.crs.clone(),
        })
    }

    /// Smallest envelope containing both. The CRS of `self` is kept.
    pub fn union(&self, other: &Envelope) -> GeometryResult<Envelope> {
        GeometryError::check_dimension(self.dimension(), other.dimension())?;
        let lower = (0..self.dimension())
            .map(|i| self.lower[i].min(other.lower[i]))
            .collect();
        let upper = (0..self.dimension())
            .map(|i| self.upper[i].max(other.upper[i]))
            .collect();
        Ok(Envelope {
            lower,
            upper,
            crs: self.crs.clone(),
        })
    }

    /// Grow the envelope so that it contains `position`.
    pub fn expand_to_include(&mut self, position: &DirectPosition) -> GeometryResult<()> {
        GeometryError::check_dimension(self.dimension(), position.dimension())?;
        for (i, v) in position.coordinates().iter().enumerate() {
            self.lower[i] = self.lower[i].min(*v);
            self.upper[i] = self.upper[i].max(*v);
        }
        Ok(())
    }

    /// Compare corners under the given mode. CRS must be equal.
    pub fn approx_eq(&self, other: &Envelope, mode: Comparison) -> bool {
        self.crs == other.crs
            && mode.equals_all(&self.lower, &other.lower)
            && mode.equals_all(&self.upper, &other.upper)
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.crs)?;
        for i in 0..self.dimension() {
            if i > 0 {
                write!(f, " x ")?;
            }
            write!(f, "[{}, {}]", self.lower[i], self.upper[i])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = Envelope::parse_bbox("-125.0,24.0,-66.0,50.0", Crs::wgs84()).unwrap();
        assert_eq!(bbox.min(0), -125.0);
        assert_eq!(bbox.min(1), 24.0);
        assert_eq!(bbox.max(0), -66.0);
        assert_eq!(bbox.max(1), 50.0);
    }

    #[test]
    fn test_intersection() {
        let a = Envelope::from_ranges(&[(0.0, 10.0), (0.0, 10.0)], Crs::wgs84()).unwrap();
        let b = Envelope::from_ranges(&[(5.0, 15.0), (5.0, 15.0)], Crs::wgs84()).unwrap();
        let c = Envelope::from_ranges(&[(20.0, 30.0), (20.0, 30.0)], Crs::wgs84()).unwrap();

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));

        let intersection = a.intersection(&b).unwrap();
        assert_eq!(intersection.lower(), &[5.0, 5.0]);
        assert_eq!(intersection.upper(), &[10.0, 10.0]);
    }

    #[test]
    fn test_corners_3d() {
        let env = Envelope::from_ranges(
            &[(0.0, 1.0), (2.0, 3.0), (4.0, 5.0)],
            Crs::compound(&[Crs::wgs84(), Crs::time()]),
        )
        .unwrap();
        let corners = env.corners();
        assert_eq!(corners.len(), 8);
        assert_eq!(corners[0], vec![0.0, 2.0, 4.0]);
        assert_eq!(corners[1], vec![1.0, 2.0, 4.0]);
        assert_eq!(corners[7], vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_rejects_inverted_axis() {
        let result = Envelope::new(vec![0.0, 10.0], vec![1.0, 5.0], Crs::wgs84());
        assert!(matches!(result, Err(GeometryError::InvalidEnvelope(_))));
    }

    #[test]
    fn test_rejects_nan() {
        let result = Envelope::new(vec![f64::NAN, 0.0], vec![1.0, 1.0], Crs::wgs84());
        assert!(result.is_err());
    }
}
