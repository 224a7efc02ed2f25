//! Geometry Simplification (spec §4.9, ≈9% of budget).
//!
//! Three passes per ring — RDP, collinear-point elimination, redundant-
//! vertex filtering — run to convergence (or `max_iterations`), with a
//! thickness-adaptive tolerance and a per-ring revert when a pass would
//! drop below the minimum vertex count.

use crate::geom::{signed_area, BimPoint, BimPolygon};

#[derive(Debug, Clone, Copy)]
pub struct SimplificationConfig {
    pub input_tolerance: f64,
    pub collinear_angle_threshold_deg: f64,
    pub distance_threshold: f64,
    pub min_vertices_per_ring: usize,
    pub max_iterations: usize,
}

impl Default for SimplificationConfig {
    fn default() -> Self {
        Self {
            input_tolerance: 1e-6,
            collinear_angle_threshold_deg: 1.0,
            distance_threshold: 1e-6,
            min_vertices_per_ring: 3,
            max_iterations: 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimplificationResult {
    pub polygon: BimPolygon,
    pub vertices_removed: usize,
    pub iterations_used: usize,
    pub accuracy_preserved: bool,
}

/// `max(inputTol, thickness * 0.01)`, per spec §4.9.
pub fn adaptive_tolerance(input_tolerance: f64, thickness: f64) -> f64 {
    input_tolerance.max(thickness * 0.01)
}

/// Ramer-Douglas-Peucker simplification, keeping the first and last points.
fn rdp(points: &[BimPoint], tolerance: f64) -> Vec<BimPoint> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    rdp_recurse(points, 0, points.len() - 1, tolerance, &mut keep);
    points
        .iter()
        .zip(keep.iter())
        .filter(|(_, &k)| k)
        .map(|(p, _)| p.clone())
        .collect()
}

fn rdp_recurse(points: &[BimPoint], start: usize, end: usize, tolerance: f64, keep: &mut [bool]) {
    if end <= start + 1 {
        return;
    }
    let a = &points[start];
    let b = &points[end];
    let mut max_dist = 0.0;
    let mut max_index = start;
    for i in (start + 1)..end {
        let d = perpendicular_distance(&points[i], a, b);
        if d > max_dist {
            max_dist = d;
            max_index = i;
        }
    }
    if max_dist > tolerance {
        keep[max_index] = true;
        rdp_recurse(points, start, max_index, tolerance, keep);
        rdp_recurse(points, max_index, end, tolerance, keep);
    }
}

fn perpendicular_distance(p: &BimPoint, a: &BimPoint, b: &BimPoint) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq < f64::EPSILON {
        return p.distance_to(a);
    }
    ((p.x - a.x) * dy - (p.y - a.y) * dx).abs() / len_sq.sqrt()
}

/// Drops a middle point whenever `|angle(prev, cur, next)| <= threshold`
/// (near-collinear), treating the ring as closed for neighbour lookups.
fn eliminate_collinear(points: &[BimPoint], angle_threshold_deg: f64) -> Vec<BimPoint> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let mut keep = Vec::with_capacity(n);
    for i in 0..n {
        let prev = &points[(i + n - 1) % n];
        let cur = &points[i];
        let next = &points[(i + 1) % n];
        let v1 = crate::geom::Vec2::new(cur.x - prev.x, cur.y - prev.y);
        let v2 = crate::geom::Vec2::new(next.x - cur.x, next.y - cur.y);
        if v1.length() < f64::EPSILON || v2.length() < f64::EPSILON {
            keep.push(true);
            continue;
        }
        let turn_deg = v1.normalize().angle_to(&v2.normalize()).to_degrees();
        keep.push(turn_deg > angle_threshold_deg);
    }
    points
        .iter()
        .zip(keep.iter())
        .filter(|(_, &k)| k)
        .map(|(p, _)| p.clone())
        .collect()
}

/// Removes consecutive vertices closer than `distance_threshold`.
fn remove_redundant(points: &[BimPoint], distance_threshold: f64) -> Vec<BimPoint> {
    if points.is_empty() {
        return Vec::new();
    }
    let mut result = vec![points[0].clone()];
    for p in &points[1..] {
        if p.distance_to(result.last().unwrap()) > distance_threshold {
            result.push(p.clone());
        }
    }
    if result.len() > 1 && result[0].distance_to(result.last().unwrap()) <= distance_threshold {
        result.pop();
    }
    result
}

/// Runs the three simplification passes on one ring, reverting to its
/// pre-pass state if the ring would drop below `min_vertices_per_ring`.
fn simplify_ring(ring: &[BimPoint], tolerance: f64, config: &SimplificationConfig) -> (Vec<BimPoint>, bool) {
    let before = ring.to_vec();
    let mut current = ring.to_vec();

    for _ in 0..config.max_iterations {
        let prev_len = current.len();

        let after_rdp = rdp(&current, tolerance);
        if after_rdp.len() < config.min_vertices_per_ring {
            return (before, false);
        }
        current = after_rdp;

        let after_collinear = eliminate_collinear(&current, config.collinear_angle_threshold_deg);
        if after_collinear.len() < config.min_vertices_per_ring {
            return (before, false);
        }
        current = after_collinear;

        let after_redundant = remove_redundant(&current, config.distance_threshold);
        if after_redundant.len() < config.min_vertices_per_ring {
            return (before, false);
        }
        current = after_redundant;

        if current.len() == prev_len {
            break;
        }
    }

    if signed_area(&current).abs() < 1e-12 {
        return (before, false);
    }

    (current, true)
}

/// Simplifies every ring of `polygon` (spec §4.9), adapting the tolerance
/// to `thickness`. A ring that cannot shrink without violating invariants
/// reverts and marks the polygon `accuracy_preserved = false`.
pub fn simplify_polygon(polygon: &BimPolygon, thickness: f64, config: &SimplificationConfig) -> SimplificationResult {
    let tolerance = adaptive_tolerance(config.input_tolerance, thickness);

    let before_count = polygon.vertex_count();
    let (outer, outer_ok) = simplify_ring(&polygon.outer, tolerance, config);
    let mut holes = Vec::with_capacity(polygon.holes.len());
    let mut all_ok = outer_ok;
    for hole in &polygon.holes {
        let (simplified_hole, ok) = simplify_ring(hole, tolerance, config);
        all_ok &= ok;
        holes.push(simplified_hole);
    }

    let mut result_polygon = BimPolygon::new(outer, holes);
    result_polygon.provenance.simplification_applied = true;
    let removed = before_count.saturating_sub(result_polygon.vertex_count());

    SimplificationResult {
        polygon: result_polygon,
        vertices_removed: removed,
        iterations_used: config.max_iterations,
        accuracy_preserved: all_ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nearly_straight_zigzag() -> Vec<BimPoint> {
        vec![
            BimPoint::new(0.0, 0.0),
            BimPoint::new(2.0, 0.0000001),
            BimPoint::new(4.0, -0.0000001),
            BimPoint::new(6.0, 0.0),
            BimPoint::new(6.0, 10.0),
            BimPoint::new(0.0, 10.0),
        ]
    }

    #[test]
    fn adaptive_tolerance_scales_with_thickness() {
        let thin = adaptive_tolerance(1e-6, 10.0);
        let thick = adaptive_tolerance(1e-6, 1000.0);
        assert!(thick > thin);
    }

    #[test]
    fn near_collinear_points_are_dropped() {
        let polygon = BimPolygon::new(nearly_straight_zigzag(), vec![]);
        let config = SimplificationConfig {
            input_tolerance: 1e-3,
            ..SimplificationConfig::default()
        };
        let result = simplify_polygon(&polygon, 100.0, &config);
        assert!(result.polygon.outer.len() < polygon.outer.len());
        assert!(result.accuracy_preserved);
    }

    #[test]
    fn ring_below_minimum_reverts() {
        let triangle = vec![
            BimPoint::new(0.0, 0.0),
            BimPoint::new(10.0, 0.0),
            BimPoint::new(5.0, 0.0001),
        ];
        let polygon = BimPolygon::new(triangle.clone(), vec![]);
        let config = SimplificationConfig {
            input_tolerance: 10.0,
            min_vertices_per_ring: 3,
            ..SimplificationConfig::default()
        };
        let result = simplify_polygon(&polygon, 0.0, &config);
        assert_eq!(result.polygon.outer.len(), 3);
    }

    #[test]
    fn square_is_unchanged_by_simplification() {
        let square = vec![
            BimPoint::new(0.0, 0.0),
            BimPoint::new(10.0, 0.0),
            BimPoint::new(10.0, 10.0),
            BimPoint::new(0.0, 10.0),
        ];
        let polygon = BimPolygon::new(square, vec![]);
        let result = simplify_polygon(&polygon, 100.0, &SimplificationConfig::default());
        assert_eq!(result.polygon.outer.len(), 4);
        assert!(result.accuracy_preserved);
    }
}
