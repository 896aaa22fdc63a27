//! Shared test utilities for the tile pyramid workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Test data path helpers
//! - Common domains (envelopes, grid specs, CRS) used across crates
//! - Approximate float assertions
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, fixtures};
//! ```

pub mod fixtures;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use paths::*;

/// Macro to skip a test if the required file is not found.
///
/// ```ignore
/// let path = require_test_file!("pyramid-cli", "world.yaml");
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($service:expr, $name:expr) => {{
        match $crate::find_service_test_file($service, $name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Test file '{}' not found. Set TEST_DATA_DIR to override.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Element-wise approximate equality of two coordinate slices.
///
/// ```ignore
/// assert_coords_approx_eq!(&[1.0001, 2.0001], &[1.0, 2.0], 0.001);
/// ```
#[macro_export]
macro_rules! assert_coords_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: &[f64] = $left;
        let right: &[f64] = $right;
        assert_eq!(left.len(), right.len(), "coordinate count differs");
        for (l, r) in left.iter().zip(right) {
            $crate::assert_approx_eq!(*l, *r, $epsilon);
        }
    }};
}
