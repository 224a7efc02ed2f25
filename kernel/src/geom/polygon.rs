//! BIM Polygon: outer ring plus holes, with derived area/perimeter/centroid
//! and quality/provenance flags (spec §3 "Polygon (BIM)").
//!
//! The signed-area and winding helpers here follow the same shoelace /
//! reverse-to-orient approach as `ifc_lite_geometry::bool2d`, generalized
//! from `nalgebra::Point2` pairs to the `BimPoint` ring representation used
//! throughout this crate.

use serde::{Deserialize, Serialize};

use super::curve::BBox;
use super::point::{BimPoint, CreationMethod};

static NEXT_POLYGON_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_POLYGON_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
}

/// Signed area via the shoelace formula. Positive for a CCW ring.
pub fn signed_area(ring: &[BimPoint]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let n = ring.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += ring[i].x * ring[j].y;
        area -= ring[j].x * ring[i].y;
    }
    area * 0.5
}

pub fn perimeter(ring: &[BimPoint]) -> f64 {
    if ring.len() < 2 {
        return 0.0;
    }
    let n = ring.len();
    (0..n)
        .map(|i| ring[i].distance_to(&ring[(i + 1) % n]))
        .sum()
}

pub fn centroid(ring: &[BimPoint]) -> BimPoint {
    let area = signed_area(ring);
    let n = ring.len();
    if n == 0 {
        return BimPoint::new(0.0, 0.0);
    }
    if area.abs() < 1e-12 {
        let sx: f64 = ring.iter().map(|p| p.x).sum();
        let sy: f64 = ring.iter().map(|p| p.y).sum();
        return BimPoint::new(sx / n as f64, sy / n as f64);
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        let cross = ring[i].x * ring[j].y - ring[j].x * ring[i].y;
        cx += (ring[i].x + ring[j].x) * cross;
        cy += (ring[i].y + ring[j].y) * cross;
    }
    let factor = 1.0 / (6.0 * area);
    BimPoint::new(cx * factor, cy * factor)
}

pub fn bbox_of(ring: &[BimPoint]) -> Option<BBox> {
    if ring.is_empty() {
        return None;
    }
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in ring {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BBox {
        min_x,
        min_y,
        max_x,
        max_y,
    })
}

pub fn ensure_ccw(ring: &[BimPoint]) -> Vec<BimPoint> {
    if signed_area(ring) < 0.0 {
        ring.iter().rev().cloned().collect()
    } else {
        ring.to_vec()
    }
}

pub fn ensure_cw(ring: &[BimPoint]) -> Vec<BimPoint> {
    if signed_area(ring) > 0.0 {
        ring.iter().rev().cloned().collect()
    } else {
        ring.to_vec()
    }
}

/// Ray-casting point-in-ring test.
pub fn point_in_ring(point: &BimPoint, ring: &[BimPoint]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let n = ring.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = &ring[i];
        let pj = &ring[j];
        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Does a ring cross itself? O(n^2) segment-intersection check; fine for the
/// vertex counts walls realistically have after simplification.
pub fn ring_self_intersects(ring: &[BimPoint]) -> bool {
    let n = ring.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let a1 = &ring[i];
        let a2 = &ring[(i + 1) % n];
        for j in (i + 1)..n {
            // Skip edges that share a vertex with edge i.
            if j == i || (j + 1) % n == i || j == (i + 1) % n {
                continue;
            }
            let b1 = &ring[j];
            let b2 = &ring[(j + 1) % n];
            if segments_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

fn orient(a: &BimPoint, b: &BimPoint, c: &BimPoint) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: &BimPoint, b: &BimPoint, p: &BimPoint) -> bool {
    p.x.min(a.x.min(b.x)) <= p.x
        && p.x <= a.x.max(b.x)
        && p.y.min(a.y.min(b.y)) <= p.y
        && p.y <= a.y.max(b.y)
}

fn segments_intersect(p1: &BimPoint, p2: &BimPoint, p3: &BimPoint, p4: &BimPoint) -> bool {
    let d1 = orient(p3, p4, p1);
    let d2 = orient(p3, p4, p2);
    let d3 = orient(p1, p2, p3);
    let d4 = orient(p1, p2, p4);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    if d1.abs() < 1e-12 && on_segment(p3, p4, p1) {
        return true;
    }
    if d2.abs() < 1e-12 && on_segment(p3, p4, p2) {
        return true;
    }
    if d3.abs() < 1e-12 && on_segment(p1, p2, p3) {
        return true;
    }
    if d4.abs() < 1e-12 && on_segment(p1, p2, p4) {
        return true;
    }
    false
}

/// Quality flags derived from geometric checks (spec §3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityFlags {
    pub is_valid: bool,
    pub self_intersects: bool,
    pub has_sliver_faces: bool,
}

/// How a polygon came to exist and what's been done to it since.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub creation_method: Option<CreationMethod>,
    pub healing_applied: bool,
    pub simplification_applied: bool,
}

/// A 2D polygon with holes: outer ring (CCW) plus zero or more hole rings
/// (CW), per spec §3 winding invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BimPolygon {
    pub id: u64,
    pub outer: Vec<BimPoint>,
    pub holes: Vec<Vec<BimPoint>>,
    pub quality: QualityFlags,
    pub provenance: Provenance,
}

impl BimPolygon {
    pub fn new(outer: Vec<BimPoint>, holes: Vec<Vec<BimPoint>>) -> Self {
        let outer = ensure_ccw(&outer);
        let holes = holes.iter().map(|h| ensure_cw(h)).collect();
        let mut polygon = Self {
            id: next_id(),
            outer,
            holes,
            quality: QualityFlags::default(),
            provenance: Provenance::default(),
        };
        polygon.recompute_quality(1e-9);
        polygon
    }

    pub fn recompute_quality(&mut self, sliver_area_threshold: f64) {
        let valid_rings = self.outer.len() >= 3 && self.holes.iter().all(|h| h.len() >= 3);
        let self_intersects =
            ring_self_intersects(&self.outer) || self.holes.iter().any(|h| ring_self_intersects(h));
        let has_sliver = self.area().abs() < sliver_area_threshold
            || self
                .holes
                .iter()
                .any(|h| signed_area(h).abs() < sliver_area_threshold);
        self.quality = QualityFlags {
            is_valid: valid_rings && !self_intersects,
            self_intersects,
            has_sliver_faces: has_sliver,
        };
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.outer).abs() - self.holes.iter().map(|h| signed_area(h).abs()).sum::<f64>()
    }

    pub fn perimeter(&self) -> f64 {
        perimeter(&self.outer) + self.holes.iter().map(|h| perimeter(h)).sum::<f64>()
    }

    pub fn centroid(&self) -> BimPoint {
        centroid(&self.outer)
    }

    pub fn bbox(&self) -> Option<BBox> {
        bbox_of(&self.outer)
    }

    pub fn vertex_count(&self) -> usize {
        self.outer.len() + self.holes.iter().map(|h| h.len()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, side: f64) -> Vec<BimPoint> {
        vec![
            BimPoint::new(x0, y0),
            BimPoint::new(x0 + side, y0),
            BimPoint::new(x0 + side, y0 + side),
            BimPoint::new(x0, y0 + side),
        ]
    }

    #[test]
    fn area_of_unit_square() {
        let poly = BimPolygon::new(square(0.0, 0.0, 1.0), vec![]);
        assert!((poly.area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn area_with_hole_subtracts() {
        let hole = vec![
            BimPoint::new(4.0, 4.0),
            BimPoint::new(6.0, 4.0),
            BimPoint::new(6.0, 6.0),
            BimPoint::new(4.0, 6.0),
        ];
        let poly = BimPolygon::new(square(0.0, 0.0, 10.0), vec![hole]);
        assert!((poly.area() - 96.0).abs() < 1e-9);
    }

    #[test]
    fn outer_is_ccw_holes_are_cw() {
        let cw_outer: Vec<BimPoint> = square(0.0, 0.0, 10.0).into_iter().rev().collect();
        let poly = BimPolygon::new(cw_outer, vec![]);
        assert!(signed_area(&poly.outer) > 0.0);
    }

    #[test]
    fn self_intersecting_bowtie_is_flagged() {
        let bowtie = vec![
            BimPoint::new(0.0, 0.0),
            BimPoint::new(10.0, 10.0),
            BimPoint::new(10.0, 0.0),
            BimPoint::new(0.0, 10.0),
        ];
        let poly = BimPolygon::new(bowtie, vec![]);
        assert!(poly.quality.self_intersects);
        assert!(!poly.quality.is_valid);
    }

    #[test]
    fn sliver_polygon_is_flagged() {
        // Extremely thin rectangle: ~0.001 x 10
        let sliver = vec![
            BimPoint::new(0.0, 0.0),
            BimPoint::new(0.001, 0.0),
            BimPoint::new(0.001, 10.0),
            BimPoint::new(0.0, 10.0),
        ];
        let mut poly = BimPolygon::new(sliver, vec![]);
        poly.recompute_quality(1e-4);
        assert!(poly.quality.has_sliver_faces);
    }
}
