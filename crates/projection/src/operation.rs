//! Coordinate operation service interface.
//!
//! The pyramid engine only ever asks two questions of a CRS service: "give me
//! the operation from A to B" and "move this envelope into B". Both may fail
//! and neither is retried.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tms_common::{Crs, Envelope};
use tracing::debug;

use crate::{AffineTransform, ProjectionError, ProjectionResult};

/// A coordinate mapping between two spaces.
pub trait MathTransform: fmt::Debug + Send + Sync {
    fn source_dimension(&self) -> usize;

    fn target_dimension(&self) -> usize;

    /// Transform a single point.
    fn transform(&self, point: &[f64]) -> ProjectionResult<Vec<f64>>;
}

/// A provider of coordinate operations between CRS.
pub trait CoordinateOperations: Send + Sync {
    /// Find the operation mapping coordinates from `source` to `target`.
    ///
    /// Fails with [`ProjectionError::Factory`] when none is defined.
    fn find_operation(&self, source: &Crs, target: &Crs)
        -> ProjectionResult<Arc<dyn MathTransform>>;

    /// Transform an envelope into `target`.
    ///
    /// The default implementation maps every corner through the operation and
    /// keeps the bounding box of the results, which is exact for affine
    /// operations.
    fn transform_envelope(&self, envelope: &Envelope, target: &Crs) -> ProjectionResult<Envelope> {
        if envelope.crs() == target {
            return Ok(envelope.clone());
        }

        let operation = self.find_operation(envelope.crs(), target)?;
        if operation.source_dimension() != envelope.dimension() {
            return Err(ProjectionError::MismatchedDimension {
                expected: operation.source_dimension(),
                found: envelope.dimension(),
            });
        }

        let dim = operation.target_dimension();
        let mut lower = vec![f64::INFINITY; dim];
        let mut upper = vec![f64::NEG_INFINITY; dim];
        for corner in envelope.corners() {
            let projected = operation.transform(&corner)?;
            for (i, v) in projected.iter().enumerate().take(dim) {
                if !v.is_finite() {
                    return Err(ProjectionError::transform(format!(
                        "corner {:?} maps to a non-finite coordinate",
                        corner
                    )));
                }
                lower[i] = lower[i].min(*v);
                upper[i] = upper[i].max(*v);
            }
        }

        Envelope::new(lower, upper, target.clone())
            .map_err(|e| ProjectionError::transform(e.to_string()))
    }
}

/// A lookup table of operations registered by the caller.
///
/// Same-CRS lookups always resolve to the identity.
#[derive(Debug, Default, Clone)]
pub struct OperationRegistry {
    operations: HashMap<(Crs, Crs), Arc<dyn MathTransform>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a one-way operation.
    pub fn register(&mut self, source: Crs, target: Crs, operation: Arc<dyn MathTransform>) {
        self.operations.insert((source, target), operation);
    }

    /// Register an affine operation and its inverse.
    pub fn register_affine(
        &mut self,
        source: Crs,
        target: Crs,
        transform: AffineTransform,
    ) -> ProjectionResult<()> {
        let inverse = transform.inverse()?;
        self.register(target.clone(), source.clone(), Arc::new(inverse));
        self.register(source, target, Arc::new(transform));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl CoordinateOperations for OperationRegistry {
    fn find_operation(
        &self,
        source: &Crs,
        target: &Crs,
    ) -> ProjectionResult<Arc<dyn MathTransform>> {
        if source == target {
            return Ok(Arc::new(AffineTransform::identity(source.dimension())));
        }

        match self.operations.get(&(source.clone(), target.clone())) {
            Some(op) => Ok(Arc::clone(op)),
            None => {
                debug!(from = %source, to = %target, "No registered coordinate operation");
                Err(ProjectionError::factory(source, target))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A transform that refuses every point.
    #[derive(Debug)]
    struct Failing;

    impl MathTransform for Failing {
        fn source_dimension(&self) -> usize {
            2
        }

        fn target_dimension(&self) -> usize {
            2
        }

        fn transform(&self, _point: &[f64]) -> ProjectionResult<Vec<f64>> {
            Err(ProjectionError::transform("outside domain of validity"))
        }
    }

    fn local() -> Crs {
        Crs::new("LOCAL:KM", 2)
    }

    fn registry() -> OperationRegistry {
        let mut registry = OperationRegistry::new();
        // degrees to a made-up kilometre grid with a flipped Y axis
        let op = AffineTransform::from_scale_and_translation(&[100.0, -100.0], &[0.0, 0.0]).unwrap();
        registry.register_affine(Crs::wgs84(), local(), op).unwrap();
        registry
    }

    #[test]
    fn test_identity_for_same_crs() {
        let registry = OperationRegistry::new();
        let op = registry.find_operation(&Crs::wgs84(), &Crs::wgs84()).unwrap();
        assert_eq!(op.transform(&[1.0, 2.0]).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_missing_operation_is_factory_error() {
        let registry = OperationRegistry::new();
        let err = registry
            .find_operation(&Crs::wgs84(), &Crs::web_mercator())
            .unwrap_err();
        assert_eq!(err, ProjectionError::factory("EPSG:4326", "EPSG:3857"));
    }

    #[test]
    fn test_transform_envelope_reorders_flipped_axis() {
        let registry = registry();
        assert_eq!(registry.len(), 2);

        let env = Envelope::from_ranges(&[(0.0, 1.0), (0.0, 2.0)], Crs::wgs84()).unwrap();
        let out = registry.transform_envelope(&env, &local()).unwrap();
        assert_eq!(out.crs(), &local());
        assert_eq!(out.lower(), &[0.0, -200.0]);
        assert_eq!(out.upper(), &[100.0, 0.0]);

        let back = registry.transform_envelope(&out, &Crs::wgs84()).unwrap();
        assert!((back.max(1) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_error_propagates() {
        let mut registry = OperationRegistry::new();
        registry.register(Crs::wgs84(), local(), Arc::new(Failing));
        let env = Envelope::from_ranges(&[(0.0, 1.0), (0.0, 1.0)], Crs::wgs84()).unwrap();
        let err = registry.transform_envelope(&env, &local()).unwrap_err();
        assert!(matches!(err, ProjectionError::Transform(_)));
    }
}
