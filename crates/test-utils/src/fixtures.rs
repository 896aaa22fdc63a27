//! Common test fixtures for tile pyramid tests.
//!
//! Domains are given as plain envelopes plus a resolution so that crates
//! can build grid geometries from them without this crate depending on
//! the pyramid engine.

use tms_common::{Crs, Envelope};

/// Common bounding boxes as (min_x, min_y, max_x, max_y).
pub mod bbox {
    /// Global bounding box (-180 to 180, -90 to 90)
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Continental United States bounding box
    pub const CONUS: (f64, f64, f64, f64) = (-130.0, 20.0, -60.0, 55.0);

    /// Europe bounding box
    pub const EUROPE: (f64, f64, f64, f64) = (-15.0, 35.0, 45.0, 72.0);

    /// A small area inside CONUS
    pub const SMALL_TILE: (f64, f64, f64, f64) = (-100.0, 40.0, -99.0, 41.0);

    /// Single point (degenerate bbox)
    pub const POINT: (f64, f64, f64, f64) = (0.0, 0.0, 0.0, 0.0);

    /// Full Web Mercator square in meters
    pub const WEB_MERCATOR: (f64, f64, f64, f64) = (
        -20_037_508.342789244,
        -20_037_508.342789244,
        20_037_508.342789244,
        20_037_508.342789244,
    );
}

/// Common grid specifications for testing.
pub mod grid {
    /// 1 degree global grid
    pub const GLOBAL_1DEG: GridSpec = GridSpec {
        width: 360,
        height: 180,
        min_x: -180.0,
        max_x: 180.0,
        min_y: -90.0,
        max_y: 90.0,
    };

    /// 0.25 degree global grid
    pub const GLOBAL_QUARTER_DEG: GridSpec = GridSpec {
        width: 1440,
        height: 720,
        min_x: -180.0,
        max_x: 180.0,
        min_y: -90.0,
        max_y: 90.0,
    };

    /// 0.01 degree CONUS grid
    pub const CONUS_1KM: GridSpec = GridSpec {
        width: 7000,
        height: 3500,
        min_x: -130.0,
        max_x: -60.0,
        min_y: 20.0,
        max_y: 55.0,
    };

    /// Simple 10x10 test grid
    pub const SIMPLE_10X10: GridSpec = GridSpec {
        width: 10,
        height: 10,
        min_x: -10.0,
        max_x: 10.0,
        min_y: -10.0,
        max_y: 10.0,
    };

    /// Grid specification for testing.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub width: usize,
        pub height: usize,
        pub min_x: f64,
        pub max_x: f64,
        pub min_y: f64,
        pub max_y: f64,
    }

    impl GridSpec {
        /// Returns the total number of grid cells.
        pub fn size(&self) -> usize {
            self.width * self.height
        }

        /// Returns the cell size along x and y.
        pub fn resolution(&self) -> [f64; 2] {
            let dx = (self.max_x - self.min_x) / self.width as f64;
            let dy = (self.max_y - self.min_y) / self.height as f64;
            [dx, dy]
        }

        /// Returns the bounding box as (min_x, min_y, max_x, max_y).
        pub fn bbox(&self) -> (f64, f64, f64, f64) {
            (self.min_x, self.min_y, self.max_x, self.max_y)
        }
    }
}

/// Common CRS identifiers.
pub mod crs {
    /// WGS84 geographic
    pub const EPSG_4326: &str = "EPSG:4326";

    /// Web Mercator
    pub const EPSG_3857: &str = "EPSG:3857";

    /// Lon/lat order alias of WGS84
    pub const CRS_84: &str = "CRS:84";

    /// WGS84 with a time axis
    pub const EPSG_4326_TIME: &str = "EPSG:4326+TIME";
}

/// Build a 2-D envelope from a `(min_x, min_y, max_x, max_y)` tuple.
pub fn envelope_2d(bbox: (f64, f64, f64, f64), crs: Crs) -> Envelope {
    Envelope::from_ranges(&[(bbox.0, bbox.2), (bbox.1, bbox.3)], crs)
        .expect("fixture bbox must be valid")
}

/// The whole world in WGS84.
pub fn world_envelope() -> Envelope {
    envelope_2d(bbox::GLOBAL, Crs::wgs84())
}

/// The whole world in WGS84 with a time axis of `hours` hours.
pub fn world_time_envelope(hours: f64) -> Envelope {
    Envelope::from_ranges(
        &[(-180.0, 180.0), (-90.0, 90.0), (0.0, hours)],
        Crs::compound(&[Crs::wgs84(), Crs::time()]),
    )
    .expect("fixture envelope must be valid")
}

/// Envelope of a grid spec in WGS84.
pub fn spec_envelope(spec: &grid::GridSpec) -> Envelope {
    envelope_2d(spec.bbox(), Crs::wgs84())
}
