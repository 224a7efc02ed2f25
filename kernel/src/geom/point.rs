//! BIM Point: a 2D coordinate plus provenance/numerical metadata (spec §3).

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use super::vector::Vec2;

static NEXT_POINT_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_POINT_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
}

/// How a point came to exist. Used by provenance-aware operations (healing,
/// simplification) to decide how much to trust a point's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreationMethod {
    UserInput,
    Offset,
    Intersection,
    Miter,
    Healing,
    Simplification,
    VertexMerge,
}

/// A point in the BIM data model: coordinates plus identity, a local
/// numerical-stability tolerance, creation provenance, an accuracy score in
/// `[0, 1]`, and a validated flag.
///
/// Equality is distance-within-tolerance, not bit equality — see
/// [`BimPoint::eq`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BimPoint {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub tolerance: f64,
    pub creation_method: CreationMethod,
    pub accuracy: f64,
    pub validated: bool,
}

impl BimPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            id: next_id(),
            x,
            y,
            tolerance: 1e-6,
            creation_method: CreationMethod::UserInput,
            accuracy: 1.0,
            validated: false,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_creation_method(mut self, method: CreationMethod) -> Self {
        self.creation_method = method;
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy.clamp(0.0, 1.0);
        self
    }

    pub fn validated(mut self, validated: bool) -> Self {
        self.validated = validated;
        self
    }

    #[inline]
    pub fn coords(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    #[inline]
    pub fn distance_to(&self, other: &BimPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Is `other` within `tolerance` of this point?
    pub fn is_close(&self, other: &BimPoint, tolerance: f64) -> bool {
        self.distance_to(other) <= tolerance
    }

    pub fn translated(&self, delta: Vec2) -> BimPoint {
        BimPoint::new(self.x + delta.x, self.y + delta.y)
            .with_tolerance(self.tolerance)
            .with_creation_method(self.creation_method)
    }

    pub fn as_vector2(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl PartialEq for BimPoint {
    /// Distance-within-tolerance equality, using the larger of the two
    /// points' tolerances, per spec §3.
    fn eq(&self, other: &Self) -> bool {
        self.distance_to(other) <= self.tolerance.max(other.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_within_tolerance_are_equal() {
        let a = BimPoint::new(0.0, 0.0).with_tolerance(1e-3);
        let b = BimPoint::new(0.0005, 0.0).with_tolerance(1e-3);
        assert_eq!(a, b);
    }

    #[test]
    fn points_beyond_tolerance_are_not_equal() {
        let a = BimPoint::new(0.0, 0.0).with_tolerance(1e-6);
        let b = BimPoint::new(1.0, 0.0).with_tolerance(1e-6);
        assert_ne!(a, b);
    }

    #[test]
    fn accuracy_is_clamped() {
        let p = BimPoint::new(0.0, 0.0).with_accuracy(1.5);
        assert_eq!(p.accuracy, 1.0);
    }
}
