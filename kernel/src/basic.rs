//! Basic representation: a lightweight nodes-and-segments graph standing in
//! for the full BIM solid when a wall hasn't been (or no longer needs to be)
//! promoted to solid geometry (`SPEC_FULL.md` "Basic representation").
//!
//! Stable keys via `slotmap`, the same arena-storage idiom the teacher's
//! topology crate uses for its entity graph, generalized here from IFC
//! entities to wall nodes/segments.

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::geom::{BimPoint, Curve};

new_key_type! {
    pub struct NodeId;
    pub struct SegmentId;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub point: BimPoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start: NodeId,
    pub end: NodeId,
    pub wall_id: u64,
}

/// A wall's basic-mode representation: an arena of nodes connected by
/// segments, one segment per baseline edge.
#[derive(Debug, Clone, Default)]
pub struct BasicRepresentation {
    pub nodes: SlotMap<NodeId, Node>,
    pub segments: SlotMap<SegmentId, Segment>,
}

impl BasicRepresentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a basic representation from a wall's baseline: one node per
    /// baseline vertex, one segment per consecutive pair.
    pub fn from_baseline(baseline: &Curve, wall_id: u64) -> Self {
        let mut repr = Self::new();
        let node_ids: Vec<NodeId> = baseline
            .points
            .iter()
            .map(|p| repr.nodes.insert(Node { point: p.clone() }))
            .collect();
        for pair in node_ids.windows(2) {
            repr.segments.insert(Segment {
                start: pair[0],
                end: pair[1],
                wall_id,
            });
        }
        repr
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Rebuilds the `Curve` implied by walking segments from the first
    /// inserted node. Assumes a single open polyline, which is all the
    /// basic representation ever models for one wall.
    pub fn to_baseline(&self) -> Option<Curve> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut successor = std::collections::HashMap::new();
        for segment in self.segments.values() {
            successor.insert(segment.start, segment.end);
        }
        let starts: std::collections::HashSet<NodeId> = successor.keys().copied().collect();
        let ends: std::collections::HashSet<NodeId> = successor.values().copied().collect();
        let first = starts.difference(&ends).next().copied().or_else(|| self.nodes.keys().next());
        let mut points = Vec::with_capacity(self.nodes.len());
        let mut current = first;
        let mut visited = std::collections::HashSet::new();
        while let Some(id) = current {
            if !visited.insert(id) {
                break;
            }
            points.push(self.nodes[id].point.clone());
            current = successor.get(&id).copied();
        }
        if points.len() < self.nodes.len() {
            points = self.nodes.values().map(|n| n.point.clone()).collect();
        }
        Some(Curve::polyline(points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::BimPoint;

    fn sample_baseline() -> Curve {
        Curve::polyline(vec![
            BimPoint::new(0.0, 0.0),
            BimPoint::new(10.0, 0.0),
            BimPoint::new(10.0, 10.0),
        ])
    }

    #[test]
    fn baseline_with_n_points_yields_n_minus_1_segments() {
        let repr = BasicRepresentation::from_baseline(&sample_baseline(), 1);
        assert_eq!(repr.node_count(), 3);
        assert_eq!(repr.segment_count(), 2);
    }

    #[test]
    fn to_baseline_round_trips_point_count() {
        let baseline = sample_baseline();
        let repr = BasicRepresentation::from_baseline(&baseline, 1);
        let rebuilt = repr.to_baseline().unwrap();
        assert_eq!(rebuilt.points.len(), baseline.points.len());
    }
}
