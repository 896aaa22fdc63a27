//! Tolerant rounding of continuous grid coordinates.
//!
//! Tile counts and tile indices come out of floating point divisions such as
//! `360.0 / (1.40625 * 128.0)`. A value that lands within `epsilon` of an
//! integer is treated as that integer before ceil/floor, so accumulated
//! noise never adds or drops a whole tile.

/// Tolerance used when converting world coordinates to tile indices.
pub(crate) const INDEX_TOLERANCE: f64 = 1e-9;

/// Snap `value` to the nearest integer when it is within a relative `epsilon`.
pub(crate) fn snap(value: f64, epsilon: f64) -> f64 {
    let nearest = value.round();
    if (value - nearest).abs() <= epsilon * nearest.abs().max(1.0) {
        nearest
    } else {
        value
    }
}

pub(crate) fn ceil_tolerant(value: f64, epsilon: f64) -> f64 {
    snap(value, epsilon).ceil()
}

pub(crate) fn floor_tolerant(value: f64, epsilon: f64) -> f64 {
    snap(value, epsilon).floor()
}
