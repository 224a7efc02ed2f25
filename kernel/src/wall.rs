//! `WallSolid`: the BIM-mode wall entity (spec §3 "WallSolid").
//!
//! Owns its baseline and offset curves and its polygon list outright;
//! intersection data is held by value (wall ids are weak references, never
//! ownership — see spec §3 "Ownership"). Every "update" is copy-on-write: it
//! produces a new `WallSolid` and appends to the healing history rather than
//! mutating in place, per spec §9.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::geom::{BimPolygon, Curve};
use crate::healing::{HealingOperation, HealingOperationType};
use crate::intersection::IntersectionData;
use crate::offset::JoinType;
use crate::quality::QualityMetrics;

static NEXT_WALL_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_WALL_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
}

/// Wall-type thickness convention, bit-compatible with spec §6: `layout=350,
/// zone=250, area=150` (dimensionless at kernel level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum WallType {
    Layout = 350,
    Zone = 250,
    Area = 150,
}

impl WallType {
    pub fn nominal_thickness(self) -> f64 {
        self as u32 as f64
    }
}

/// An append-only entry recording one healing/simplification/merge pass
/// applied to a `WallSolid`, distinct from [`HealingOperation`] in that it
/// lives on the wall itself rather than inside a single `heal_polygon` call.
#[derive(Debug, Clone)]
pub struct HealingHistoryEntry {
    pub operation: HealingOperation,
    pub note: String,
}

/// A wall's full BIM-mode representation: baseline, offsets, solid
/// polygons, join-type map, intersections, and provenance/quality metadata.
#[derive(Debug, Clone)]
pub struct WallSolid {
    pub id: u64,
    pub baseline: Curve,
    pub thickness: f64,
    pub wall_type: WallType,
    pub left_offset: Curve,
    pub right_offset: Curve,
    pub solid_geometry: Vec<BimPolygon>,
    /// Baseline-vertex `BimPoint::id` -> chosen join type for that vertex.
    pub join_types: Vec<(u64, JoinType)>,
    pub intersection_data: Vec<IntersectionData>,
    pub healing_history: Vec<HealingHistoryEntry>,
    pub quality: QualityMetrics,
    pub last_validated: Option<OffsetDateTime>,
    pub processing_time_secs: f64,
    pub complexity: f64,
}

/// Builds a single closed polygon directly from a wall's left/right offset
/// curves: left forward, right reversed. Used by the offset engine's
/// construction path and by validation's fallback-reconstruction recovery
/// (spec §4.10) when the solid geometry has been lost entirely.
pub fn polygon_from_offsets(left: &Curve, right: &Curve) -> BimPolygon {
    let mut outer = left.points.clone();
    outer.extend(right.points.iter().rev().cloned());
    BimPolygon::new(outer, vec![])
}

impl WallSolid {
    /// Factory: constructs a `WallSolid` from a baseline curve, thickness,
    /// and the left/right offsets already computed by the offset engine,
    /// plus the initial solid polygon(s) built from those offsets.
    pub fn construct_from_baseline(
        baseline: Curve,
        thickness: f64,
        wall_type: WallType,
        left_offset: Curve,
        right_offset: Curve,
        join_types: Vec<(u64, JoinType)>,
        solid_geometry: Vec<BimPolygon>,
        processing_time_secs: f64,
    ) -> Self {
        let complexity = (left_offset.points.len() + right_offset.points.len()) as f64;
        Self {
            id: next_id(),
            baseline,
            thickness,
            wall_type,
            left_offset,
            right_offset,
            solid_geometry,
            join_types,
            intersection_data: Vec::new(),
            healing_history: Vec::new(),
            quality: QualityMetrics::default(),
            last_validated: None,
            processing_time_secs,
            complexity,
        }
    }

    /// Factory: constructs a `WallSolid` representing the union of several
    /// inputs, keeping the first input's baseline/offsets/thickness/type as
    /// representative and replacing only the solid geometry.
    pub fn construct_from_union(
        representative: &WallSolid,
        solid_geometry: Vec<BimPolygon>,
        processing_time_secs: f64,
    ) -> Self {
        let mut solid = representative.clone();
        solid.id = next_id();
        solid.solid_geometry = solid_geometry;
        solid.processing_time_secs += processing_time_secs;
        solid.healing_history.push(HealingHistoryEntry {
            operation: HealingOperation::new(HealingOperationType::SliverRemoval, true, "constructed from union"),
            note: "construct_from_union".into(),
        });
        solid
    }

    /// Copy-on-write update: returns a new `WallSolid` with `solid_geometry`
    /// replaced and a healing-history entry appended, per spec §3
    /// "Lifecycle".
    pub fn with_updated_geometry(&self, solid_geometry: Vec<BimPolygon>, note: impl Into<String>) -> WallSolid {
        let mut next = self.clone();
        next.solid_geometry = solid_geometry;
        let note = note.into();
        next.healing_history.push(HealingHistoryEntry {
            operation: HealingOperation::new(HealingOperationType::DuplicateEdgeMerge, true, note.clone()),
            note,
        });
        next
    }

    pub fn with_intersection(&self, data: IntersectionData) -> WallSolid {
        let mut next = self.clone();
        next.intersection_data.push(data);
        next
    }

    pub fn with_quality(&self, quality: QualityMetrics, validated_at: OffsetDateTime) -> WallSolid {
        let mut next = self.clone();
        next.quality = quality;
        next.last_validated = Some(validated_at);
        next
    }

    pub fn total_area(&self) -> f64 {
        self.solid_geometry.iter().map(|p| p.area()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{BimPoint, CurveType};

    fn sample_curve() -> Curve {
        Curve::new(
            vec![BimPoint::new(0.0, 0.0), BimPoint::new(10.0, 0.0)],
            CurveType::Polyline,
            false,
        )
    }

    fn sample_wall() -> WallSolid {
        WallSolid::construct_from_baseline(
            sample_curve(),
            200.0,
            WallType::Layout,
            sample_curve(),
            sample_curve(),
            vec![],
            vec![BimPolygon::new(
                vec![
                    BimPoint::new(0.0, -1.0),
                    BimPoint::new(10.0, -1.0),
                    BimPoint::new(10.0, 1.0),
                    BimPoint::new(0.0, 1.0),
                ],
                vec![],
            )],
            0.001,
        )
    }

    #[test]
    fn wall_type_thicknesses_match_spec_convention() {
        assert_eq!(WallType::Layout.nominal_thickness(), 350.0);
        assert_eq!(WallType::Zone.nominal_thickness(), 250.0);
        assert_eq!(WallType::Area.nominal_thickness(), 150.0);
    }

    #[test]
    fn with_updated_geometry_preserves_identity_and_appends_history() {
        let wall = sample_wall();
        let updated = wall.with_updated_geometry(wall.solid_geometry.clone(), "no-op heal");
        assert_eq!(updated.id, wall.id);
        assert_eq!(updated.healing_history.len(), 1);
    }

    #[test]
    fn total_area_sums_solid_polygons() {
        let wall = sample_wall();
        assert!((wall.total_area() - 20.0).abs() < 1e-9);
    }
}
