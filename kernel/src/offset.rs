//! Robust Offset Engine (spec §4.2, ≈12% of budget).
//!
//! Takes a baseline curve and a signed distance and produces left/right
//! offset curves, choosing a join type per interior vertex and falling back
//! to a relaxed-tolerance bevel pass, then a straight-displacement
//! approximation, if the primary pass throws.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{KernelError, KernelResult};
use crate::geom::{BimPoint, CreationMethod, Curve};

const DEFAULT_MITER_LIMIT: f64 = 10.0;
const SHARP_ANGLE_DEG: f64 = 15.0;
const THICK_WALL_THRESHOLD: f64 = 300.0;
const HIGH_CURVATURE_THRESHOLD: f64 = 0.01;

/// How a vertex's two offset rays are reconciled into one displaced point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    Miter,
    Bevel,
    Round,
}

/// Picks the join type for an interior vertex from its turning angle,
/// the wall's thickness and the curve's local curvature, per spec §4.2.
pub fn select_optimal_join_type(angle_rad: f64, thickness: f64, curvature: f64) -> JoinType {
    let angle_deg = angle_rad.to_degrees();
    if angle_deg < SHARP_ANGLE_DEG || angle_deg > (180.0 - SHARP_ANGLE_DEG) {
        return JoinType::Round;
    }
    let sharp = angle_deg < 60.0 || angle_deg > 120.0;
    if sharp && (thickness > THICK_WALL_THRESHOLD || curvature.abs() > HIGH_CURVATURE_THRESHOLD) {
        return JoinType::Bevel;
    }
    JoinType::Miter
}

/// Downgrades `Miter` to `Bevel` when the miter ratio `1 / sin(angle/2)`
/// exceeds `miter_limit` (default 10), per spec §4.2.
pub fn apply_miter_limit(join: JoinType, angle_rad: f64, miter_limit: f64) -> JoinType {
    if join != JoinType::Miter {
        return join;
    }
    let half = (angle_rad * 0.5).sin().abs();
    if half < 1e-9 {
        return JoinType::Bevel;
    }
    if 1.0 / half > miter_limit {
        JoinType::Bevel
    } else {
        JoinType::Miter
    }
}

/// Result of offsetting a baseline curve, per spec §4.2's contract.
///
/// `join_types` is a `SmallVec`: architectural wall baselines rarely bend
/// more than a handful of times, so the common case never touches the heap.
#[derive(Debug, Clone)]
pub struct OffsetResult {
    pub left: Curve,
    pub right: Curve,
    pub join_types: SmallVec<[JoinType; 8]>,
    pub fallback_used: bool,
    pub warnings: Vec<String>,
}

/// Offsets `baseline` by `distance` on each side, choosing join types per
/// vertex. Fails only for degenerate input (spec §4.2's contract); any
/// other failure during the primary pass is caught internally and retried.
pub fn offset_curve(
    baseline: &Curve,
    distance: f64,
    requested_join: JoinType,
    tolerance: f64,
    miter_limit: f64,
) -> KernelResult<OffsetResult> {
    if baseline.points.len() < 2 {
        return Err(KernelError::invalid_parameter(
            "offset_curve",
            "baseline curve has fewer than 2 points",
        ));
    }
    if distance <= 0.0 {
        return Err(KernelError::invalid_parameter(
            "offset_curve",
            "offset distance must be positive",
        ));
    }
    if tolerance < 0.0 {
        return Err(KernelError::invalid_parameter(
            "offset_curve",
            "tolerance must be non-negative",
        ));
    }

    match try_offset(baseline, distance, requested_join, tolerance, miter_limit) {
        Some(mut result) => {
            result.fallback_used = false;
            Ok(result)
        }
        None => match try_offset(baseline, distance, JoinType::Bevel, tolerance * 10.0, miter_limit) {
            Some(mut result) => {
                result.fallback_used = true;
                result
                    .warnings
                    .push("primary offset pass failed; retried with relaxed tolerance and bevel joins".into());
                Ok(result)
            }
            None => Ok(straight_displacement_fallback(baseline, distance)),
        },
    }
}

fn try_offset(
    baseline: &Curve,
    distance: f64,
    requested_join: JoinType,
    tolerance: f64,
    miter_limit: f64,
) -> Option<OffsetResult> {
    let n = baseline.points.len();
    let tangents = baseline.tangents();
    let curvature = baseline.curvature();

    let mut left_pts = Vec::with_capacity(n);
    let mut right_pts = Vec::with_capacity(n);
    let mut join_types: SmallVec<[JoinType; 8]> = SmallVec::with_capacity(n);
    let mut warnings = Vec::new();

    for i in 0..n {
        let dir = tangents[i];
        if dir.length() < f64::EPSILON {
            return None;
        }
        let normal = dir.perpendicular();

        let left = baseline.points[i].translated(normal * distance);
        let right = baseline.points[i].translated(normal * -distance);

        if i == 0 || i == n - 1 {
            left_pts.push(left.with_creation_method(CreationMethod::Offset));
            right_pts.push(right.with_creation_method(CreationMethod::Offset));
            continue;
        }

        let prev_dir = tangents[i - 1];
        let turning_angle = std::f64::consts::PI - prev_dir.angle_to(&dir);

        let chosen = apply_miter_limit(
            select_optimal_join_type(turning_angle, distance.abs() * 2.0, curvature[i]),
            turning_angle,
            miter_limit,
        );
        let chosen = if requested_join != JoinType::Miter {
            requested_join
        } else {
            chosen
        };
        join_types.push(chosen);

        let (left_vertex, right_vertex) = match chosen {
            JoinType::Miter => (
                miter_point(baseline, i, &tangents, distance, tolerance).unwrap_or(left.clone()),
                miter_point(baseline, i, &tangents, -distance, tolerance).unwrap_or(right.clone()),
            ),
            JoinType::Bevel | JoinType::Round => (left.clone(), right.clone()),
        };

        left_pts.push(left_vertex.with_creation_method(CreationMethod::Offset));
        right_pts.push(right_vertex.with_creation_method(CreationMethod::Offset));
    }

    if join_types.is_empty() && n > 2 {
        warnings.push("no interior vertices received a join classification".into());
    }

    Some(OffsetResult {
        left: Curve::polyline(left_pts),
        right: Curve::polyline(right_pts),
        join_types,
        fallback_used: false,
        warnings,
    })
}

/// Intersects the two offset lines adjacent to vertex `i` (the miter
/// bisector construction). Returns `None` when the adjacent segments are
/// nearly parallel (line intersection is ill-conditioned).
fn miter_point(
    baseline: &Curve,
    i: usize,
    tangents: &[crate::geom::Vec2],
    signed_distance: f64,
    tolerance: f64,
) -> Option<BimPoint> {
    let prev_dir = tangents[i - 1];
    let next_dir = tangents[i];

    let n1 = prev_dir.perpendicular();
    let n2 = next_dir.perpendicular();

    let p1 = baseline.points[i - 1].translated(n1 * signed_distance);
    let p2 = baseline.points[i].translated(n1 * signed_distance);
    let p3 = baseline.points[i].translated(n2 * signed_distance);
    let p4 = baseline.points[i + 1].translated(n2 * signed_distance);

    line_intersection(&p1, &p2, &p3, &p4, tolerance)
}

fn line_intersection(
    p1: &BimPoint,
    p2: &BimPoint,
    p3: &BimPoint,
    p4: &BimPoint,
    tolerance: f64,
) -> Option<BimPoint> {
    let (x1, y1) = (p1.x, p1.y);
    let (x2, y2) = (p2.x, p2.y);
    let (x3, y3) = (p3.x, p3.y);
    let (x4, y4) = (p4.x, p4.y);

    let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if denom.abs() < tolerance.max(1e-12) {
        return None;
    }

    let t = ((x1 - x3) * (y3 - y4) - (y1 - y3) * (x3 - x4)) / denom;
    Some(BimPoint::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1)))
}

fn straight_displacement_fallback(baseline: &Curve, distance: f64) -> OffsetResult {
    let tangents = baseline.tangents();
    let left_pts: Vec<BimPoint> = baseline
        .points
        .iter()
        .zip(tangents.iter())
        .map(|(p, t)| p.translated(t.perpendicular() * distance).with_creation_method(CreationMethod::Offset))
        .collect();
    let right_pts: Vec<BimPoint> = baseline
        .points
        .iter()
        .zip(tangents.iter())
        .map(|(p, t)| p.translated(t.perpendicular() * -distance).with_creation_method(CreationMethod::Offset))
        .collect();

    OffsetResult {
        left: Curve::polyline(left_pts),
        right: Curve::polyline(right_pts),
        join_types: SmallVec::from_elem(JoinType::Bevel, baseline.points.len().saturating_sub(2)),
        fallback_used: true,
        warnings: vec!["offset fell back to straight-displacement approximation".into()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::BimPoint;

    fn straight_line() -> Curve {
        Curve::polyline(vec![BimPoint::new(0.0, 0.0), BimPoint::new(10.0, 0.0)])
    }

    fn l_shape() -> Curve {
        Curve::polyline(vec![
            BimPoint::new(0.0, 0.0),
            BimPoint::new(10.0, 0.0),
            BimPoint::new(10.0, 10.0),
        ])
    }

    #[test]
    fn degenerate_baseline_is_rejected() {
        let single = Curve::polyline(vec![BimPoint::new(0.0, 0.0)]);
        let result = offset_curve(&single, 1.0, JoinType::Miter, 1e-6, 10.0);
        assert!(result.is_err());
    }

    #[test]
    fn non_positive_distance_is_rejected() {
        let line = straight_line();
        assert!(offset_curve(&line, 0.0, JoinType::Miter, 1e-6, 10.0).is_err());
        assert!(offset_curve(&line, -1.0, JoinType::Miter, 1e-6, 10.0).is_err());
    }

    #[test]
    fn straight_line_offsets_parallel() {
        let line = straight_line();
        let result = offset_curve(&line, 2.0, JoinType::Miter, 1e-6, 10.0).unwrap();
        assert_eq!(result.left.points.len(), 2);
        assert!((result.left.points[0].y - 2.0).abs() < 1e-9);
        assert!((result.right.points[0].y + 2.0).abs() < 1e-9);
        assert!(!result.fallback_used);
    }

    #[test]
    fn l_shape_picks_a_join_for_its_one_interior_vertex() {
        let shape = l_shape();
        let result = offset_curve(&shape, 2.0, JoinType::Miter, 1e-6, 10.0).unwrap();
        assert_eq!(result.join_types.len(), 1);
    }

    #[test]
    fn very_sharp_angle_selects_round() {
        let join = select_optimal_join_type(5.0_f64.to_radians(), 100.0, 0.0);
        assert_eq!(join, JoinType::Round);
    }

    #[test]
    fn sharp_thick_wall_selects_bevel() {
        let join = select_optimal_join_type(30.0_f64.to_radians(), 400.0, 0.0);
        assert_eq!(join, JoinType::Bevel);
    }

    #[test]
    fn miter_limit_downgrades_to_bevel() {
        let tiny_angle = 2.0_f64.to_radians();
        let downgraded = apply_miter_limit(JoinType::Miter, tiny_angle, DEFAULT_MITER_LIMIT);
        assert_eq!(downgraded, JoinType::Bevel);
    }

    #[test]
    fn moderate_angle_keeps_miter_within_limit() {
        let angle = 90.0_f64.to_radians();
        let kept = apply_miter_limit(JoinType::Miter, angle, DEFAULT_MITER_LIMIT);
        assert_eq!(kept, JoinType::Miter);
    }
}
