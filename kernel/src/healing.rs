//! Shape Healing (spec §4.7, ≈9% of budget).
//!
//! Three passes over a polygon — sliver removal, duplicate-edge merging,
//! micro-gap elimination — run to convergence (or `max_iterations`), each
//! appending an append-only [`HealingOperation`] record and contributing to
//! the returned [`HealingResult`] counters.

use time::OffsetDateTime;

use crate::geom::{perimeter, signed_area, ring_self_intersects, BimPoint, BimPolygon};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealingOperationType {
    SliverRemoval,
    DuplicateEdgeMerge,
    MicroGapElimination,
}

/// An append-only record of one healing pass (spec §3 "HealingOperation").
#[derive(Debug, Clone)]
pub struct HealingOperation {
    pub id: u64,
    pub operation_type: HealingOperationType,
    pub timestamp: OffsetDateTime,
    pub success: bool,
    pub details: String,
}

static NEXT_HEALING_OP_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

impl HealingOperation {
    pub(crate) fn new(operation_type: HealingOperationType, success: bool, details: impl Into<String>) -> Self {
        Self {
            id: NEXT_HEALING_OP_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed),
            operation_type,
            timestamp: OffsetDateTime::now_utc(),
            success,
            details: details.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HealingConfig {
    pub sliver_area_threshold: f64,
    pub thinness_threshold: f64,
    pub duplicate_edge_tolerance: f64,
    pub micro_gap_threshold: f64,
    pub max_iterations: usize,
}

impl Default for HealingConfig {
    fn default() -> Self {
        Self {
            sliver_area_threshold: 1e-6,
            thinness_threshold: 1e-4,
            duplicate_edge_tolerance: 1e-6,
            micro_gap_threshold: 1e-5,
            max_iterations: 5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HealingResult {
    pub healed_polygons: Vec<BimPolygon>,
    pub operations: Vec<HealingOperationSummary>,
    pub faces_removed: usize,
    pub edges_merged: usize,
    pub gaps_eliminated: usize,
    pub iterations_used: usize,
}

#[derive(Debug, Clone)]
pub struct HealingOperationSummary {
    pub operation_type: HealingOperationType,
    pub success: bool,
    pub details: String,
}

fn is_sliver(ring: &[BimPoint], config: &HealingConfig) -> bool {
    if ring.len() < 3 {
        return true;
    }
    let area = signed_area(ring).abs();
    if area < config.sliver_area_threshold.powi(2) * 10.0 {
        return true;
    }
    let perim = perimeter(ring);
    if perim < f64::EPSILON {
        return true;
    }
    area / (perim * perim) < config.thinness_threshold
}

/// Drops any hole ring that qualifies as a sliver, and reports whether the
/// outer ring itself is a sliver (in which case the whole polygon must be
/// dropped by the caller — spec §4.7 counts both paths identically).
fn remove_slivers(polygon: &mut BimPolygon, config: &HealingConfig) -> (usize, bool) {
    let mut removed = 0;
    polygon.holes.retain(|h| {
        let sliver = is_sliver(h, config);
        if sliver {
            removed += 1;
        }
        !sliver
    });
    let outer_is_sliver = is_sliver(&polygon.outer, config);
    (removed, outer_is_sliver)
}

/// Collapses runs of consecutive points within `tolerance` to their centroid.
fn merge_duplicate_edges(ring: &[BimPoint], tolerance: f64) -> (Vec<BimPoint>, usize) {
    if ring.len() < 2 {
        return (ring.to_vec(), 0);
    }
    let mut result = Vec::with_capacity(ring.len());
    let mut merged = 0usize;
    let mut i = 0;
    let n = ring.len();
    while i < n {
        let mut run = vec![ring[i].clone()];
        let mut j = i + 1;
        while j < n && ring[j].distance_to(&ring[i]) <= tolerance {
            run.push(ring[j].clone());
            j += 1;
        }
        if run.len() > 1 {
            let sx: f64 = run.iter().map(|p| p.x).sum::<f64>() / run.len() as f64;
            let sy: f64 = run.iter().map(|p| p.y).sum::<f64>() / run.len() as f64;
            result.push(BimPoint::new(sx, sy));
            merged += run.len() - 1;
        } else {
            result.push(run.into_iter().next().unwrap());
        }
        i = j;
    }
    (result, merged)
}

/// Snaps a ring's near-closing endpoints together under `gap_threshold`.
fn eliminate_micro_gaps(ring: &mut Vec<BimPoint>, gap_threshold: f64) -> usize {
    if ring.len() < 3 {
        return 0;
    }
    let first = ring[0].clone();
    let last_idx = ring.len() - 1;
    let gap = ring[last_idx].distance_to(&first);
    if gap > 0.0 && gap <= gap_threshold {
        ring[last_idx] = first;
        1
    } else {
        0
    }
}

/// Runs sliver removal, duplicate-edge merging, and micro-gap elimination to
/// convergence (or `config.max_iterations`), per spec §4.7.
pub fn heal_polygon(polygon: &BimPolygon, config: &HealingConfig) -> HealingResult {
    let mut current = polygon.clone();
    let mut result = HealingResult::default();
    let mut dropped = false;

    for iteration in 0..config.max_iterations {
        result.iterations_used = iteration + 1;
        let mut changed = false;

        let (slivers_removed, outer_sliver) = remove_slivers(&mut current, config);
        if slivers_removed > 0 {
            changed = true;
            result.faces_removed += slivers_removed;
            result.operations.push(HealingOperationSummary {
                operation_type: HealingOperationType::SliverRemoval,
                success: true,
                details: format!("removed {} sliver ring(s)", slivers_removed),
            });
            let _ = HealingOperation::new(
                HealingOperationType::SliverRemoval,
                true,
                format!("removed {} sliver ring(s)", slivers_removed),
            );
        }
        if outer_sliver {
            // The outer ring is itself a sliver: the whole polygon goes,
            // counted the same way a sliver hole is (spec §4.7).
            result.faces_removed += 1;
            result.operations.push(HealingOperationSummary {
                operation_type: HealingOperationType::SliverRemoval,
                success: true,
                details: "dropped whole polygon: outer ring is a sliver".into(),
            });
            let _ = HealingOperation::new(
                HealingOperationType::SliverRemoval,
                true,
                "dropped whole polygon: outer ring is a sliver",
            );
            dropped = true;
            break;
        }

        let (merged_outer, merged_count_outer) = merge_duplicate_edges(&current.outer, config.duplicate_edge_tolerance);
        let mut total_merged = merged_count_outer;
        current.outer = merged_outer;
        let mut new_holes = Vec::with_capacity(current.holes.len());
        for hole in &current.holes {
            let (merged_hole, count) = merge_duplicate_edges(hole, config.duplicate_edge_tolerance);
            total_merged += count;
            new_holes.push(merged_hole);
        }
        current.holes = new_holes;
        if total_merged > 0 {
            changed = true;
            result.edges_merged += total_merged;
            result.operations.push(HealingOperationSummary {
                operation_type: HealingOperationType::DuplicateEdgeMerge,
                success: true,
                details: format!("merged {} duplicate edge(s)", total_merged),
            });
        }

        let mut total_gaps = eliminate_micro_gaps(&mut current.outer, config.micro_gap_threshold);
        for hole in &mut current.holes {
            total_gaps += eliminate_micro_gaps(hole, config.micro_gap_threshold);
        }
        if total_gaps > 0 {
            changed = true;
            result.gaps_eliminated += total_gaps;
            result.operations.push(HealingOperationSummary {
                operation_type: HealingOperationType::MicroGapElimination,
                success: true,
                details: format!("eliminated {} micro-gap(s)", total_gaps),
            });
        }

        current.recompute_quality(config.sliver_area_threshold.powi(2) * 10.0);

        if !changed {
            break;
        }
    }

    result.healed_polygons = if dropped { Vec::new() } else { vec![current] };
    result
}

pub fn validate_ring_topology(ring: &[BimPoint], min_area: f64) -> bool {
    ring.len() >= 3 && !ring_self_intersects(ring) && signed_area(ring).abs() >= min_area
}
