//! Geometric primitives layer (spec §2 layer 1, ≈8% of budget).
//!
//! Point, Vector, Curve and Polygon. Lower layers in this module know
//! nothing about walls, tolerances, or boolean operations — those build on
//! top in sibling modules.

mod curve;
mod point;
mod polygon;
mod vector;

pub use curve::{BBox, Curve, CurveType};
pub use point::{BimPoint, CreationMethod};
pub use polygon::{
    bbox_of, centroid, ensure_ccw, ensure_cw, perimeter, point_in_ring, ring_self_intersects,
    signed_area, BimPolygon, Provenance, QualityFlags,
};
pub use vector::Vec2;
