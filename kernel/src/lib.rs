//! Wall geometry kernel: offsetting, intersection resolution, healing,
//! simplification, vertex merging, validation and BIM/basic mode switching
//! for architectural wall networks.
//!
//! Each public facade function below logs an `info!`/`debug!` event on entry
//! and exit, following the teacher's per-operation instrumentation
//! convention rather than span-based tracing.

pub mod basic;
pub mod boolean;
pub mod config;
pub mod error;
pub mod geom;
pub mod healing;
pub mod intersection;
pub mod miter;
pub mod mode_switch;
pub mod offset;
pub mod quality;
pub mod recommendations;
pub mod simplify;
pub mod tolerance;
pub mod unified;
pub mod validation;
pub mod vertex_merge;
pub mod wall;

pub use config::{CacheConfig, KernelConfig, ReportingLevel};
pub use error::{ErrorKind, KernelError, KernelResult};
pub use geom::{BimPoint, BimPolygon, Curve, CurveType};
pub use quality::QualityMetrics;
pub use wall::{WallSolid, WallType};

use healing::HealingConfig;
use intersection::{IntersectionData, WallRef};
use offset::JoinType;
use simplify::SimplificationConfig;
use validation::{ExecutionPhase, ValidationPipeline, ValidationPipelineConfig, ValidationReport};
use vertex_merge::VertexMergeConfig;

/// Offsets `baseline` by half of `thickness` on each side and constructs the
/// initial `WallSolid` for it (spec §4.2 into §3). This is the entry point a
/// host calls when it first promotes a wall from basic to BIM mode outside
/// of `mode_switch`'s `UnifiedWallData` wrapper.
pub fn build_wall_solid(
    baseline: Curve,
    thickness: f64,
    wall_type: WallType,
    config: &KernelConfig,
) -> KernelResult<WallSolid> {
    tracing::debug!(thickness, point_count = baseline.points.len(), "building wall solid");

    if thickness <= 0.0 {
        return Err(KernelError::invalid_parameter("build_wall_solid", "thickness must be positive"));
    }

    let start = std::time::Instant::now();
    let distance = thickness / 2.0;
    let offset_result = offset::offset_curve(&baseline, distance, JoinType::Miter, config.tolerance, config.miter_limit)?;
    let outer = wall::polygon_from_offsets(&offset_result.left, &offset_result.right);

    let interior = &baseline.points[1..baseline.points.len().saturating_sub(1)];
    let join_types = interior
        .iter()
        .zip(offset_result.join_types.iter())
        .map(|(p, j)| (p.id, *j))
        .collect();

    let solid = WallSolid::construct_from_baseline(
        baseline,
        thickness,
        wall_type,
        offset_result.left,
        offset_result.right,
        join_types,
        vec![outer],
        start.elapsed().as_secs_f64(),
    );

    if offset_result.fallback_used {
        tracing::warn!(wall_id = solid.id, "offset engine fell back during wall construction");
    }
    tracing::info!(wall_id = solid.id, processing_time_secs = solid.processing_time_secs, "wall solid built");

    Ok(solid)
}

/// Resolves an intersection of two or more wall baselines into an
/// `IntersectionData`, caching the result through `manager` (spec §4.5–§4.6).
/// Three or more walls go through cross-junction resolution; exactly two
/// walls go through parallel-overlap detection, falling back to a plain
/// L-junction at their nearest endpoints when they aren't parallel.
pub fn resolve_intersection(
    walls: &[WallRef],
    manager: &intersection::IntersectionManager,
    tolerance: f64,
) -> KernelResult<IntersectionData> {
    tracing::debug!(wall_count = walls.len(), "resolving intersection");

    if walls.len() < 2 {
        return Err(KernelError::invalid_parameter(
            "resolve_intersection",
            "at least two walls are required to form an intersection",
        ));
    }

    let wall_ids: Vec<u64> = walls.iter().map(|w| w.id).collect();

    if walls.len() >= 3 {
        let junction = intersection::resolve_cross_junction(walls);
        let data = IntersectionData::new(
            intersection::IntersectionType::CrossJunction,
            wall_ids,
            junction.center,
            format!("{:?}", junction.strategy),
        );
        manager.create(data.clone(), tolerance);
        tracing::info!(wall_count = walls.len(), "cross-junction resolved");
        return Ok(data);
    }

    let overlap = intersection::resolve_parallel_overlap(&walls[0], &walls[1]);
    let intersection_type = if overlap.has_overlap {
        intersection::IntersectionType::ParallelOverlap
    } else {
        intersection::IntersectionType::LJunction
    };
    let point = nearest_endpoint_midpoint(&walls[0], &walls[1]);
    let data = IntersectionData::new(intersection_type, wall_ids, point, format!("{:?}", overlap.resolution_method));
    manager.create(data.clone(), tolerance);
    tracing::info!(intersection_type = ?data.intersection_type, "intersection resolved");
    Ok(data)
}

fn nearest_endpoint_midpoint(a: &WallRef, b: &WallRef) -> BimPoint {
    let mut best = (f64::INFINITY, BimPoint::new(0.0, 0.0));
    for pa in [&a.baseline.points[0], &a.baseline.points[a.baseline.points.len() - 1]] {
        for pb in [&b.baseline.points[0], &b.baseline.points[b.baseline.points.len() - 1]] {
            let d = pa.distance_to(pb);
            if d < best.0 {
                best = (d, BimPoint::new((pa.x + pb.x) * 0.5, (pa.y + pb.y) * 0.5));
            }
        }
    }
    best.1
}

/// Runs shape healing over every polygon in `wall` and returns the updated
/// wall with a healing-history entry appended (spec §4.7).
pub fn heal_solid(wall: &WallSolid, config: &HealingConfig) -> WallSolid {
    tracing::debug!(wall_id = wall.id, "healing wall solid");

    let mut healed = Vec::new();
    let mut total_removed = 0;
    for polygon in &wall.solid_geometry {
        let result = healing::heal_polygon(polygon, config);
        total_removed += result.faces_removed;
        healed.extend(result.healed_polygons);
    }

    tracing::info!(wall_id = wall.id, faces_removed = total_removed, "wall solid healed");
    wall.with_updated_geometry(healed, format!("heal_solid removed {} sliver face(s)", total_removed))
}

/// Simplifies every polygon in `wall` (spec §4.9), using `wall.thickness` to
/// scale the tolerance adaptively.
pub fn simplify_solid(wall: &WallSolid, config: &SimplificationConfig) -> WallSolid {
    tracing::debug!(wall_id = wall.id, "simplifying wall solid");

    let mut simplified = Vec::new();
    let mut vertices_removed = 0;
    for polygon in &wall.solid_geometry {
        let result = simplify::simplify_polygon(polygon, wall.thickness, config);
        vertices_removed += result.vertices_removed;
        simplified.push(result.polygon);
    }

    tracing::info!(wall_id = wall.id, vertices_removed, "wall solid simplified");
    wall.with_updated_geometry(simplified, format!("simplify_solid removed {} vertices", vertices_removed))
}

/// Runs the non-consecutive vertex-merge pass across every polygon in
/// `wall` at once (spec §4.8), so vertices belonging to two different
/// polygons (as a boolean union typically leaves behind) can still be
/// merged.
pub fn merge_vertices(wall: &WallSolid, config: &VertexMergeConfig) -> WallSolid {
    tracing::debug!(wall_id = wall.id, "merging non-consecutive vertices");

    let result = vertex_merge::merge_non_consecutive_vertices(&wall.solid_geometry, config);

    tracing::info!(wall_id = wall.id, merges_applied = result.merges_applied, "vertex merge complete");
    wall.with_updated_geometry(
        result.polygons,
        format!("merge_vertices applied {} merge(s)", result.merges_applied),
    )
}

/// Runs the staged validation pipeline over `wall` (spec §4.10).
pub fn validate(wall: &WallSolid, phase: ExecutionPhase, config: &ValidationPipelineConfig) -> ValidationReport {
    tracing::debug!(wall_id = wall.id, phase = ?phase, "running validation pipeline");
    let report = ValidationPipeline::default().run(wall, phase, config);
    tracing::info!(wall_id = wall.id, overall_passed = report.overall_passed, "validation complete");
    report
}

pub use mode_switch::{check_compatibility, switch_to_basic, switch_to_bim, synchronize};
