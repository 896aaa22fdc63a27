//! N-dimensional affine transforms.
//!
//! A transform of dimension `n` is stored as an `(n + 1) x (n + 1)` matrix in
//! homogeneous coordinates:
//!
//! ```text
//! | x' |   | m00 .. m0n-1  t0 |   | x |
//! | .. | = | ..   ..  ..   .. | * | .. |
//! | 1  |   | 0   ..  0     1  |   | 1 |
//! ```

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tms_common::Comparison;

use crate::{MathTransform, ProjectionError, ProjectionResult};

/// Allowed drift of the homogeneous row from `[0 .. 0 1]`.
const HOMOGENEOUS_ROW_TOLERANCE: f64 = 1e-12;

/// An affine mapping between two n-dimensional coordinate spaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    matrix: DMatrix<f64>,
}

impl AffineTransform {
    /// Wrap a homogeneous matrix, checking that it is square and affine.
    pub fn new(matrix: DMatrix<f64>) -> ProjectionResult<Self> {
        if !matrix.is_square() || matrix.nrows() == 0 {
            return Err(ProjectionError::InvalidMatrix(format!(
                "expected a non-empty square matrix, got {}x{}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }

        let n = matrix.nrows() - 1;
        for col in 0..=n {
            let expected = if col == n { 1.0 } else { 0.0 };
            if (matrix[(n, col)] - expected).abs() > HOMOGENEOUS_ROW_TOLERANCE {
                return Err(ProjectionError::InvalidMatrix(format!(
                    "last row must be [0 .. 0 1], found {} at column {}",
                    matrix[(n, col)],
                    col
                )));
            }
        }

        Ok(Self { matrix })
    }

    pub fn identity(dimension: usize) -> Self {
        Self {
            matrix: DMatrix::identity(dimension + 1, dimension + 1),
        }
    }

    /// A diagonal transform: `x'[i] = scale[i] * x[i] + translation[i]`.
    pub fn from_scale_and_translation(scale: &[f64], translation: &[f64]) -> ProjectionResult<Self> {
        if scale.len() != translation.len() {
            return Err(ProjectionError::MismatchedDimension {
                expected: scale.len(),
                found: translation.len(),
            });
        }

        let n = scale.len();
        let mut matrix = DMatrix::identity(n + 1, n + 1);
        for i in 0..n {
            matrix[(i, i)] = scale[i];
            matrix[(i, n)] = translation[i];
        }
        Ok(Self { matrix })
    }

    /// A pure translation.
    pub fn translation(offset: &[f64]) -> Self {
        let n = offset.len();
        let mut matrix = DMatrix::identity(n + 1, n + 1);
        for (i, v) in offset.iter().enumerate() {
            matrix[(i, n)] = *v;
        }
        Self { matrix }
    }

    pub fn dimension(&self) -> usize {
        self.matrix.nrows() - 1
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn element(&self, row: usize, col: usize) -> f64 {
        self.matrix[(row, col)]
    }

    /// The translation column.
    pub fn translation_vector(&self) -> Vec<f64> {
        let n = self.dimension();
        (0..n).map(|i| self.matrix[(i, n)]).collect()
    }

    /// Length in target units of one unit step along each source axis.
    pub fn column_norms(&self) -> Vec<f64> {
        let n = self.dimension();
        let linear = self.matrix.view((0, 0), (n, n));
        (0..n).map(|j| linear.column(j).norm()).collect()
    }

    /// Transform one point. `point` must hold exactly `dimension()` values.
    pub fn apply(&self, point: &[f64]) -> Vec<f64> {
        let n = self.dimension();
        let homogeneous = DVector::from_iterator(
            n + 1,
            point.iter().copied().take(n).chain(std::iter::once(1.0)),
        );
        let result = &self.matrix * homogeneous;
        result.iter().take(n).copied().collect()
    }

    pub fn inverse(&self) -> ProjectionResult<Self> {
        self.matrix
            .clone()
            .try_inverse()
            .map(|matrix| Self { matrix })
            .ok_or(ProjectionError::NonInvertible)
    }

    /// `next ∘ self`: apply `self` first, then `next`.
    pub fn then(&self, next: &AffineTransform) -> ProjectionResult<Self> {
        self.check_same_dimension(next.dimension())?;
        Ok(Self {
            matrix: &next.matrix * &self.matrix,
        })
    }

    /// `self ∘ translate(offset)`: shift source coordinates before applying `self`.
    pub fn pre_translate(&self, offset: &[f64]) -> ProjectionResult<Self> {
        self.check_same_dimension(offset.len())?;
        Ok(Self {
            matrix: &self.matrix * Self::translation(offset).matrix,
        })
    }

    /// `self ∘ translate([shift; n])`: shift every source coordinate by the same amount.
    pub fn pre_translate_uniform(&self, shift: f64) -> Self {
        let offset = vec![shift; self.dimension()];
        Self {
            matrix: &self.matrix * Self::translation(&offset).matrix,
        }
    }

    /// `self ∘ scale(factors)`: scale source coordinates before applying `self`.
    pub fn pre_scale(&self, factors: &[f64]) -> ProjectionResult<Self> {
        let zeros = vec![0.0; factors.len()];
        let scale = Self::from_scale_and_translation(factors, &zeros)?;
        scale.then(self)
    }

    /// Compare the linear part (everything but the translation column).
    pub fn linear_approx_eq(&self, other: &AffineTransform, mode: Comparison) -> bool {
        let n = self.dimension();
        n == other.dimension()
            && (0..n).all(|i| (0..n).all(|j| mode.equals(self.matrix[(i, j)], other.matrix[(i, j)])))
    }

    fn check_same_dimension(&self, found: usize) -> ProjectionResult<()> {
        if self.dimension() == found {
            Ok(())
        } else {
            Err(ProjectionError::MismatchedDimension {
                expected: self.dimension(),
                found,
            })
        }
    }
}

impl MathTransform for AffineTransform {
    fn source_dimension(&self) -> usize {
        self.dimension()
    }

    fn target_dimension(&self) -> usize {
        self.dimension()
    }

    fn transform(&self, point: &[f64]) -> ProjectionResult<Vec<f64>> {
        self.check_same_dimension(point.len())?;
        Ok(self.apply(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_identity() {
        let aff = AffineTransform::identity(2);
        assert_eq!(aff.apply(&[5.0, 10.0]), vec![5.0, 10.0]);
    }

    #[test]
    fn test_scale_and_translation() {
        let aff = AffineTransform::from_scale_and_translation(&[0.25, -0.25], &[-180.0, 90.0]).unwrap();
        assert_eq!(aff.apply(&[0.0, 0.0]), vec![-180.0, 90.0]);
        assert_eq!(aff.apply(&[4.0, 4.0]), vec![-179.0, 89.0]);
        assert_eq!(aff.column_norms(), vec![0.25, 0.25]);
        assert_eq!(aff.translation_vector(), vec![-180.0, 90.0]);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let aff = AffineTransform::from_scale_and_translation(&[30.0, -30.0, 2.0], &[100.0, 200.0, 5.0]).unwrap();
        let inv = aff.inverse().unwrap();
        let p = aff.apply(&[3.0, 7.0, 1.0]);
        let back = inv.apply(&p);
        for (a, b) in back.iter().zip([3.0, 7.0, 1.0]) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_singular_matrix() {
        let aff = AffineTransform::from_scale_and_translation(&[1.0, 0.0], &[0.0, 0.0]).unwrap();
        assert_eq!(aff.inverse(), Err(ProjectionError::NonInvertible));
    }

    #[test]
    fn test_pre_translate_half_pixel() {
        let aff = AffineTransform::from_scale_and_translation(&[2.0, -2.0], &[10.0, 20.0]).unwrap();
        let shifted = aff.pre_translate(&[0.5, 0.5]).unwrap();
        assert_eq!(shifted.apply(&[0.0, 0.0]), vec![11.0, 19.0]);
        assert!(shifted.linear_approx_eq(&aff, Comparison::Exact));
        assert_eq!(aff.pre_translate_uniform(0.5), shifted);
    }

    #[test]
    fn test_then_composes_in_order() {
        let scale = AffineTransform::from_scale_and_translation(&[2.0], &[0.0]).unwrap();
        let shift = AffineTransform::translation(&[1.0]);
        assert_eq!(scale.then(&shift).unwrap().apply(&[3.0]), vec![7.0]);
        assert_eq!(shift.then(&scale).unwrap().apply(&[3.0]), vec![8.0]);
    }

    #[test]
    fn test_rejects_non_affine_matrix() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.5, 1.0]);
        assert!(matches!(
            AffineTransform::new(m),
            Err(ProjectionError::InvalidMatrix(_))
        ));
        let m = DMatrix::<f64>::zeros(2, 3);
        assert!(AffineTransform::new(m).is_err());
    }

    #[test]
    fn test_transform_checks_dimension() {
        let aff = AffineTransform::identity(2);
        assert!(aff.transform(&[1.0, 2.0, 3.0]).is_err());
        assert_eq!(aff.transform(&[1.0, 2.0]).unwrap(), vec![1.0, 2.0]);
    }
}
