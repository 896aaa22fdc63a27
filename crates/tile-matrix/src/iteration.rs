//! Level iteration policies.
//!
//! A policy turns the domain's native resolution and extent into the list of
//! scales that make up the pyramid. The computation is pure: the builder
//! gathers a [`ScaleContext`] and turns each returned scale into one tile
//! matrix.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TileMatrixError;
use crate::rounding::ceil_tolerant;

/// How the builder walks from one level to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IterationPolicy {
    /// Start at the native resolution and coarsen by the scale factor until
    /// the domain fits in one tile or the tile threshold is reached.
    BottomToTop,
    /// Start with the domain in one tile and refine by the scale factor, never
    /// going finer than the native resolution.
    TopToBottomStrict,
    /// Like strict, but keep refining until at or finer than the native
    /// resolution. The finest level may overshoot it.
    #[default]
    TopToBottomExtrapolate,
    /// Like strict, then append the exact native resolution when the
    /// finest generated level is still coarser than it.
    TopToBottomLastExact,
}

impl IterationPolicy {
    pub const ALL: [IterationPolicy; 4] = [
        Self::BottomToTop,
        Self::TopToBottomStrict,
        Self::TopToBottomExtrapolate,
        Self::TopToBottomLastExact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BottomToTop => "bottom-to-top",
            Self::TopToBottomStrict => "top-to-bottom-strict",
            Self::TopToBottomExtrapolate => "top-to-bottom-extrapolate",
            Self::TopToBottomLastExact => "top-to-bottom-last-exact",
        }
    }

    /// Compute the scales of all levels, sorted ascending (finest first).
    pub fn scales(&self, ctx: &ScaleContext) -> Vec<f64> {
        let mut scales = match self {
            Self::BottomToTop => bottom_to_top(ctx),
            Self::TopToBottomStrict => top_to_bottom_strict(ctx),
            Self::TopToBottomExtrapolate => top_to_bottom_extrapolate(ctx),
            Self::TopToBottomLastExact => {
                let mut scales = top_to_bottom_strict(ctx);
                if let Some(&finest) = scales.last() {
                    if ctx.coarser_than_native(finest) && scales.len() < ctx.max_levels {
                        scales.push(ctx.native_resolution);
                    }
                }
                scales
            }
        };
        scales.sort_by(f64::total_cmp);
        scales
    }
}

impl fmt::Display for IterationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IterationPolicy {
    type Err = TileMatrixError;

    /// Parse from string (case-insensitive, `-` or `_` separated).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .find(|p| p.as_str() == normalized)
            .copied()
            .ok_or_else(|| {
                TileMatrixError::invalid_config(format!("unknown iteration policy '{}'", s))
            })
    }
}

/// Inputs to a scale computation, restricted to the axes that get subdivided.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleContext {
    /// Finest resolution of the domain among the participating axes.
    pub native_resolution: f64,
    /// Envelope span along each participating axis.
    pub spans: Vec<f64>,
    /// Tile size in cells along each participating axis.
    pub tile_size: Vec<u32>,
    pub scale_factor: f64,
    pub nb_tile_threshold: u64,
    pub epsilon: f64,
    pub max_levels: usize,
}

impl ScaleContext {
    /// Number of tiles along each participating axis at `scale`.
    pub fn tile_counts(&self, scale: f64) -> Vec<u64> {
        self.spans
            .iter()
            .zip(&self.tile_size)
            .map(|(span, size)| {
                let tiles = ceil_tolerant(span / (scale * f64::from(*size)), self.epsilon);
                (tiles as u64).max(1)
            })
            .collect()
    }

    /// Scale at which the domain fits in exactly one tile along its
    /// shortest participating axis.
    pub fn top_scale(&self) -> f64 {
        self.spans
            .iter()
            .zip(&self.tile_size)
            .map(|(span, size)| span / f64::from(*size))
            .fold(f64::INFINITY, f64::min)
    }

    fn coarser_than_native(&self, scale: f64) -> bool {
        scale > self.native_resolution * (1.0 + self.epsilon)
    }

    fn finer_than_native(&self, scale: f64) -> bool {
        scale < self.native_resolution * (1.0 - self.epsilon)
    }

    fn start_scale(&self) -> f64 {
        let top = self.top_scale();
        if top.is_finite() && self.coarser_than_native(top) {
            top
        } else {
            self.native_resolution
        }
    }
}

fn bottom_to_top(ctx: &ScaleContext) -> Vec<f64> {
    let mut scales = vec![ctx.native_resolution];
    while scales.len() < ctx.max_levels {
        let last = scales[scales.len() - 1];
        if ctx.tile_counts(last).iter().all(|&count| count <= 1) {
            break;
        }
        let next = last * ctx.scale_factor;
        if ctx
            .tile_counts(next)
            .iter()
            .all(|&count| count < ctx.nb_tile_threshold)
        {
            break;
        }
        scales.push(next);
    }
    scales
}

fn top_to_bottom_strict(ctx: &ScaleContext) -> Vec<f64> {
    let mut scales = vec![ctx.start_scale()];
    while scales.len() < ctx.max_levels {
        let next = scales[scales.len() - 1] / ctx.scale_factor;
        if ctx.finer_than_native(next) {
            break;
        }
        scales.push(next);
    }
    scales
}

fn top_to_bottom_extrapolate(ctx: &ScaleContext) -> Vec<f64> {
    let mut scales = vec![ctx.start_scale()];
    while scales.len() < ctx.max_levels {
        let last = scales[scales.len() - 1];
        if !ctx.coarser_than_native(last) {
            break;
        }
        scales.push(last / ctx.scale_factor);
    }
    scales
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(native: f64, tile: u32) -> ScaleContext {
        ScaleContext {
            native_resolution: native,
            spans: vec![360.0, 180.0],
            tile_size: vec![tile, tile],
            scale_factor: 2.0,
            nb_tile_threshold: 1,
            epsilon: 1e-9,
            max_levels: 64,
        }
    }

    fn assert_scales(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "{:?} vs {:?}", actual, expected);
        }
    }

    #[test]
    fn test_last_exact_appends_native() {
        let scales = IterationPolicy::TopToBottomLastExact.scales(&world(1.0, 128));
        assert_scales(&scales, &[1.0, 1.40625]);
    }

    #[test]
    fn test_last_exact_single_level_when_native_fits() {
        let scales = IterationPolicy::TopToBottomLastExact.scales(&world(1.40625, 128));
        assert_scales(&scales, &[1.40625]);
    }

    #[test]
    fn test_strict_never_finer_than_native() {
        let scales = IterationPolicy::TopToBottomStrict.scales(&world(0.1, 256));
        // top = 180 / 256 = 0.703125
        assert_scales(&scales, &[0.17578125, 0.3515625, 0.703125]);
        assert!(scales.iter().all(|s| *s >= 0.1));
    }

    #[test]
    fn test_extrapolate_reaches_native() {
        let scales = IterationPolicy::TopToBottomExtrapolate.scales(&world(0.1, 256));
        assert_scales(&scales, &[0.087890625, 0.17578125, 0.3515625, 0.703125]);
        assert!(scales[0] <= 0.1);
    }

    #[test]
    fn test_bottom_to_top_stops_at_single_tile() {
        let scales = IterationPolicy::BottomToTop.scales(&world(0.5, 256));
        // 0.5: 3x2 tiles, 1.0: 2x1 tiles, 2.0: 1x1 tiles
        assert_scales(&scales, &[0.5, 1.0, 2.0]);
    }

    #[test]
    fn test_bottom_to_top_threshold() {
        let ctx = ScaleContext {
            nb_tile_threshold: 2,
            ..world(0.5, 256)
        };
        let scales = IterationPolicy::BottomToTop.scales(&ctx);
        // At 2.0 no axis has 2 tiles left.
        assert_scales(&scales, &[0.5, 1.0]);
    }

    #[test]
    fn test_max_levels_caps_output() {
        let ctx = ScaleContext {
            max_levels: 2,
            ..world(0.001, 256)
        };
        for policy in IterationPolicy::ALL {
            assert!(policy.scales(&ctx).len() <= 2, "{}", policy);
        }
    }

    #[test]
    fn test_no_participating_axes() {
        let ctx = ScaleContext {
            spans: Vec::new(),
            tile_size: Vec::new(),
            ..world(3.0, 256)
        };
        for policy in IterationPolicy::ALL {
            assert_scales(&policy.scales(&ctx), &[3.0]);
        }
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!(
            "TOP_TO_BOTTOM_LAST_EXACT".parse::<IterationPolicy>().unwrap(),
            IterationPolicy::TopToBottomLastExact
        );
        assert_eq!(
            "bottom-to-top".parse::<IterationPolicy>().unwrap(),
            IterationPolicy::BottomToTop
        );
        assert!("sideways".parse::<IterationPolicy>().is_err());
        assert_eq!(
            IterationPolicy::TopToBottomStrict.to_string(),
            "top-to-bottom-strict"
        );
    }
}
