//! Miter Calculator (spec §4.3, ≈6% of budget).
//!
//! A transient per-vertex record describing how a join was realized: the
//! apex point, the two adjacent offset-line intersections, the angle the
//! walls actually meet at, and an accuracy score reflecting how close the
//! construction got to its ideal form. Grounded in the same join-profile
//! shape as `pensaer_geometry::joins::JoinGeometry`, generalized from wall
//! pairs to a single offset vertex.

use serde::{Deserialize, Serialize};

use crate::geom::BimPoint;
use crate::offset::JoinType;

/// Accuracy assigned to a miter calculation by how it was actually realized,
/// per spec §4.3.
pub const ACCURACY_EXACT_BISECTOR: f64 = 0.95;
pub const ACCURACY_BEVEL_MIDPOINT: f64 = 0.9;
pub const ACCURACY_ROUND: f64 = 0.85;
pub const ACCURACY_LINE_FALLBACK: f64 = 0.8;
pub const ACCURACY_MIDPOINT_FALLBACK: f64 = 0.5;

/// How the apex of a [`MiterCalculation`] was actually constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculationMethod {
    ExactBisector,
    BevelMidpoint,
    RoundArc,
    LineIntersectionFallback,
    MidpointFallback,
}

/// A transient record of how one vertex's join was resolved (spec §3
/// "MiterCalculation").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiterCalculation {
    pub apex: BimPoint,
    pub left_intersection: BimPoint,
    pub right_intersection: BimPoint,
    pub realized_angle: f64,
    pub join_type: JoinType,
    pub calculation_method: CalculationMethod,
    pub accuracy: f64,
    pub fallback_used: bool,
    pub warnings: Vec<String>,
}

impl MiterCalculation {
    /// Builds and validates a miter calculation from the geometry the offset
    /// engine produced for one interior vertex, per spec §4.3.
    pub fn new(
        left_intersection: BimPoint,
        right_intersection: BimPoint,
        baseline_vertex: &BimPoint,
        prev_tangent_dot_next: f64,
        join_type: JoinType,
        calculation_method: CalculationMethod,
        tolerance: f64,
    ) -> Self {
        let realized_angle = prev_tangent_dot_next.clamp(-1.0, 1.0).acos();
        let accuracy = accuracy_for(calculation_method);

        let apex = baseline_vertex.clone();

        let mut warnings = Vec::new();
        if apex.is_close(&left_intersection, tolerance) || apex.is_close(&right_intersection, tolerance) {
            warnings.push("miter apex coincides with an offset-line intersection".into());
        }
        if !join_type_consistent_with_angle(join_type, realized_angle) {
            warnings.push("chosen join type is suboptimal for the realized angle".into());
        }

        Self {
            apex,
            left_intersection,
            right_intersection,
            realized_angle,
            join_type,
            calculation_method,
            accuracy,
            fallback_used: matches!(
                calculation_method,
                CalculationMethod::LineIntersectionFallback | CalculationMethod::MidpointFallback
            ),
            warnings,
        }
    }

    pub fn is_valid(&self) -> bool {
        (0.0..=std::f64::consts::PI).contains(&self.realized_angle) && (0.0..=1.0).contains(&self.accuracy)
    }
}

fn accuracy_for(method: CalculationMethod) -> f64 {
    match method {
        CalculationMethod::ExactBisector => ACCURACY_EXACT_BISECTOR,
        CalculationMethod::BevelMidpoint => ACCURACY_BEVEL_MIDPOINT,
        CalculationMethod::RoundArc => ACCURACY_ROUND,
        CalculationMethod::LineIntersectionFallback => ACCURACY_LINE_FALLBACK,
        CalculationMethod::MidpointFallback => ACCURACY_MIDPOINT_FALLBACK,
    }
}

fn join_type_consistent_with_angle(join: JoinType, angle_rad: f64) -> bool {
    let deg = angle_rad.to_degrees();
    match join {
        JoinType::Round => deg < 15.0 || deg > 165.0,
        JoinType::Bevel => true,
        JoinType::Miter => !(deg < 15.0 || deg > 165.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_angle_miter_has_exact_bisector_accuracy() {
        let apex_vertex = BimPoint::new(10.0, 0.0);
        let left = BimPoint::new(10.0, 2.0);
        let right = BimPoint::new(12.0, 0.0);
        let calc = MiterCalculation::new(
            left,
            right,
            &apex_vertex,
            0.0,
            JoinType::Miter,
            CalculationMethod::ExactBisector,
            1e-6,
        );
        assert!((calc.realized_angle - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert_eq!(calc.accuracy, ACCURACY_EXACT_BISECTOR);
        assert!(calc.is_valid());
        assert!(calc.warnings.is_empty());
    }

    #[test]
    fn coincident_apex_and_intersection_warns() {
        let vertex = BimPoint::new(0.0, 0.0);
        let calc = MiterCalculation::new(
            vertex.clone(),
            BimPoint::new(5.0, 5.0),
            &vertex,
            0.5,
            JoinType::Bevel,
            CalculationMethod::BevelMidpoint,
            1e-3,
        );
        assert!(calc.warnings.iter().any(|w| w.contains("coincides")));
    }

    #[test]
    fn round_join_at_moderate_angle_is_flagged_suboptimal() {
        let vertex = BimPoint::new(0.0, 0.0);
        let calc = MiterCalculation::new(
            BimPoint::new(1.0, 1.0),
            BimPoint::new(-1.0, 1.0),
            &vertex,
            0.0,
            JoinType::Round,
            CalculationMethod::RoundArc,
            1e-6,
        );
        assert!(calc.warnings.iter().any(|w| w.contains("suboptimal")));
    }

    #[test]
    fn fallback_methods_are_flagged() {
        let vertex = BimPoint::new(0.0, 0.0);
        let calc = MiterCalculation::new(
            BimPoint::new(1.0, 0.0),
            BimPoint::new(-1.0, 0.0),
            &vertex,
            -1.0,
            JoinType::Bevel,
            CalculationMethod::MidpointFallback,
            1e-6,
        );
        assert!(calc.fallback_used);
        assert_eq!(calc.accuracy, ACCURACY_MIDPOINT_FALLBACK);
    }
}
