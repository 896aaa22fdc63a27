//! Coordinate Reference System tags.
//!
//! The pyramid crates never interpret a CRS numerically. A [`Crs`] is an
//! identifier plus the number of axes it spans, and two CRS are the same
//! only when both agree.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Envelope, GeometryError, GeometryResult};

/// Web Mercator half-width in meters.
const WEB_MERCATOR_MAX_EXTENT: f64 = 20037508.342789244;

/// An opaque coordinate reference system identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    code: String,
    dimension: usize,
}

impl Crs {
    /// Create a CRS tag with an arbitrary code.
    pub fn new(code: impl Into<String>, dimension: usize) -> Self {
        Self {
            code: code.into(),
            dimension,
        }
    }

    /// A two-dimensional EPSG CRS.
    pub fn epsg(code: u32) -> Self {
        Self::new(format!("EPSG:{}", code), 2)
    }

    /// WGS84 Geographic (lon/lat in degrees).
    pub fn wgs84() -> Self {
        Self::epsg(4326)
    }

    /// Web Mercator (meters).
    pub fn web_mercator() -> Self {
        Self::epsg(3857)
    }

    /// A one-dimensional temporal axis.
    pub fn time() -> Self {
        Self::new("TIME", 1)
    }

    /// Parse a CRS string.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326" / "epsg:4326"
    /// - "CRS:84" (equivalent to EPSG:4326)
    /// - "EPSG:900913" (legacy alias of EPSG:3857)
    /// - "EPSG:4326+TIME" (compound, one extra axis per extra component)
    pub fn parse(s: &str) -> GeometryResult<Self> {
        let components = s
            .split('+')
            .map(|part| Self::parse_single(part.trim()))
            .collect::<GeometryResult<Vec<_>>>()?;
        Ok(Self::compound(&components))
    }

    fn parse_single(s: &str) -> GeometryResult<Self> {
        let normalized = s.to_uppercase();

        match normalized.as_str() {
            "CRS:84" => return Ok(Self::wgs84()),
            "EPSG:900913" => return Ok(Self::web_mercator()),
            "TIME" => return Ok(Self::time()),
            "HEIGHT" | "DEPTH" => return Ok(Self::new(normalized, 1)),
            _ => {}
        }

        normalized
            .strip_prefix("EPSG:")
            .and_then(|code| code.parse::<u32>().ok())
            .map(Self::epsg)
            .ok_or_else(|| GeometryError::UnsupportedCrs(s.to_string()))
    }

    /// Combine several CRS into one whose axes are the concatenation of theirs.
    pub fn compound(components: &[Crs]) -> Self {
        match components {
            [] => Self::new("", 0),
            [single] => single.clone(),
            _ => Self {
                code: components
                    .iter()
                    .map(|c| c.code.as_str())
                    .collect::<Vec<_>>()
                    .join("+"),
                dimension: components.iter().map(|c| c.dimension).sum(),
            },
        }
    }

    /// The full identifier.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Number of axes.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Identifier of the first (horizontal) component of a compound CRS.
    pub fn horizontal_code(&self) -> &str {
        self.code.split('+').next().unwrap_or("")
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self.horizontal_code(), "EPSG:4326" | "EPSG:4269")
    }

    /// Get the valid bounds for this CRS, when known.
    pub fn valid_bounds(&self) -> Option<Envelope> {
        let (min, max) = match self.code.as_str() {
            "EPSG:4326" | "EPSG:4269" => ([-180.0, -90.0], [180.0, 90.0]),
            "EPSG:3857" => (
                [-WEB_MERCATOR_MAX_EXTENT, -WEB_MERCATOR_MAX_EXTENT],
                [WEB_MERCATOR_MAX_EXTENT, WEB_MERCATOR_MAX_EXTENT],
            ),
            // Polar stereographic - approximate bounds
            "EPSG:3413" | "EPSG:3031" => ([-4000000.0, -4000000.0], [4000000.0, 4000000.0]),
            _ => return None,
        };
        Envelope::new(min.to_vec(), max.to_vec(), self.clone()).ok()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(Crs::parse("EPSG:4326").unwrap(), Crs::wgs84());
        assert_eq!(Crs::parse("epsg:3857").unwrap(), Crs::web_mercator());
        assert_eq!(Crs::parse("CRS:84").unwrap(), Crs::wgs84());
        assert_eq!(Crs::parse("EPSG:900913").unwrap(), Crs::web_mercator());
        assert!(Crs::parse("EPSG:abc").is_err());
        assert!(Crs::parse("WGS84").is_err());
    }

    #[test]
    fn test_parse_compound() {
        let crs = Crs::parse("EPSG:4326+TIME").unwrap();
        assert_eq!(crs.dimension(), 3);
        assert_eq!(crs.code(), "EPSG:4326+TIME");
        assert_eq!(crs.horizontal_code(), "EPSG:4326");
        assert!(crs.is_geographic());
        assert_eq!(crs, Crs::compound(&[Crs::wgs84(), Crs::time()]));
    }

    #[test]
    fn test_valid_bounds() {
        let bounds = Crs::wgs84().valid_bounds().unwrap();
        assert_eq!(bounds.span(0), 360.0);
        assert_eq!(bounds.span(1), 180.0);
        assert!(Crs::new("LOCAL", 2).valid_bounds().is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(Crs::web_mercator().to_string(), "EPSG:3857");
    }
}
