//! Floating point comparison modes.

use serde::{Deserialize, Serialize};

/// How two coordinates are compared for equality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Comparison {
    /// Bitwise-equal values only (`-0.0 == 0.0` still holds).
    Exact,
    /// `|a - b| <= tolerance`.
    Absolute(f64),
    /// `|a - b| <= tolerance * max(|a|, |b|)`, falling back to an absolute
    /// test near zero.
    Relative(f64),
}

impl Default for Comparison {
    fn default() -> Self {
        Comparison::Relative(1e-9)
    }
}

impl Comparison {
    /// Compare two scalars under this mode.
    pub fn equals(&self, a: f64, b: f64) -> bool {
        match *self {
            Comparison::Exact => a == b,
            Comparison::Absolute(tolerance) => (a - b).abs() <= tolerance,
            Comparison::Relative(tolerance) => {
                let scale = a.abs().max(b.abs());
                if scale < 1.0 {
                    (a - b).abs() <= tolerance
                } else {
                    (a - b).abs() <= tolerance * scale
                }
            }
        }
    }

    /// Compare two slices element-wise. Slices of different length never match.
    pub fn equals_all(&self, a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.equals(*x, *y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact() {
        assert!(Comparison::Exact.equals(0.1, 0.1));
        assert!(Comparison::Exact.equals(-0.0, 0.0));
        assert!(!Comparison::Exact.equals(0.1 + 0.2, 0.3));
    }

    #[test]
    fn test_absolute() {
        let cmp = Comparison::Absolute(1e-6);
        assert!(cmp.equals(0.1 + 0.2, 0.3));
        assert!(!cmp.equals(1.0, 1.001));
    }

    #[test]
    fn test_relative_scales_with_magnitude() {
        let cmp = Comparison::Relative(1e-9);
        assert!(cmp.equals(20037508.342789244, 20037508.342789244 + 1e-9));
        assert!(!cmp.equals(20037508.0, 20037509.0));
        assert!(cmp.equals(1e-12, 0.0));
    }

    #[test]
    fn test_equals_all_length_mismatch() {
        assert!(!Comparison::Exact.equals_all(&[1.0, 2.0], &[1.0]));
        assert!(Comparison::Exact.equals_all(&[1.0, 2.0], &[1.0, 2.0]));
    }
}
