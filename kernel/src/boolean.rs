//! Boolean Operations Engine (spec §4.4, ≈10% of budget).
//!
//! Wraps the abstract ring-clipping primitive (`i_overlay`) the same way
//! `ifc_lite_geometry::bool2d` wraps it for profile/void subtraction:
//! marshal BIM polygons to closed `[f64; 2]` rings, run the overlay, marshal
//! back. This module adds the complexity estimate, fallback retry, sliver
//! detection, and batching spec §4.4 asks for on top of that.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use tracing::warn;

use crate::error::{ErrorKind, KernelError};
use crate::geom::{ensure_ccw, ensure_cw, signed_area, BimPoint, BimPolygon};

const SLIVER_AREA_MULTIPLIER: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Union,
    Intersection,
    Difference,
    BatchUnion,
}

/// Result of a boolean operation, per spec §4.4's contract.
#[derive(Debug, Clone)]
pub struct BooleanResult {
    pub success: bool,
    pub result_solids: Vec<BimPolygon>,
    pub operation_type: OperationType,
    pub warnings: Vec<String>,
    pub requires_healing: bool,
}

/// Configuration the boolean engine needs from the host: the tolerance to
/// retry with on failure and the complexity ceiling to warn above.
#[derive(Debug, Clone, Copy)]
pub struct BooleanConfig {
    pub tolerance: f64,
    pub max_complexity: usize,
}

impl Default for BooleanConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_complexity: 50_000,
        }
    }
}

fn ring_len(ring: &[BimPoint]) -> usize {
    ring.len()
}

fn complexity_of(polygons: &[&BimPolygon]) -> usize {
    polygons
        .iter()
        .map(|p| ring_len(&p.outer) + p.holes.iter().map(|h| ring_len(h)).sum::<usize>())
        .sum()
}

fn polygon_to_paths(polygon: &BimPolygon) -> Vec<Vec<[f64; 2]>> {
    let mut paths = Vec::with_capacity(1 + polygon.holes.len());
    paths.push(contour_to_path(&ensure_ccw(&polygon.outer)));
    for hole in &polygon.holes {
        paths.push(contour_to_path(&ensure_cw(hole)));
    }
    paths
}

fn contour_to_path(ring: &[BimPoint]) -> Vec<[f64; 2]> {
    let mut path: Vec<[f64; 2]> = ring.iter().map(|p| [p.x, p.y]).collect();
    if let (Some(first), Some(last)) = (path.first().copied(), path.last().copied()) {
        if (first[0] - last[0]).abs() > 1e-12 || (first[1] - last[1]).abs() > 1e-12 {
            path.push(first);
        }
    }
    path
}

fn shapes_to_polygons(shapes: Vec<Vec<Vec<[f64; 2]>>>, sliver_threshold: f64) -> (Vec<BimPolygon>, bool) {
    let mut polygons = Vec::new();
    let mut requires_healing = false;

    for shape in shapes {
        let mut rings: Vec<Vec<BimPoint>> = shape
            .into_iter()
            .map(|path| path.into_iter().map(|[x, y]| BimPoint::new(x, y)).collect())
            .collect();
        if rings.is_empty() {
            continue;
        }
        let outer = rings.remove(0);
        if signed_area(&outer).abs() < sliver_threshold {
            requires_healing = true;
        }
        for hole in &rings {
            if signed_area(hole).abs() < sliver_threshold {
                requires_healing = true;
            }
        }
        if outer.len() >= 3 {
            polygons.push(BimPolygon::new(outer, rings));
        }
    }

    (polygons, requires_healing)
}

fn run_overlay(
    subject: &[&BimPolygon],
    clip: &[&BimPolygon],
    rule: OverlayRule,
    tolerance: f64,
) -> (Vec<BimPolygon>, bool) {
    let subject_paths: Vec<Vec<[f64; 2]>> = subject.iter().flat_map(|p| polygon_to_paths(p)).collect();
    let clip_paths: Vec<Vec<[f64; 2]>> = clip.iter().flat_map(|p| polygon_to_paths(p)).collect();

    let shapes = subject_paths.overlay(&clip_paths, rule, FillRule::EvenOdd);
    let sliver_threshold = tolerance * tolerance * SLIVER_AREA_MULTIPLIER;
    shapes_to_polygons(shapes, sliver_threshold)
}

fn operation(
    subject: &[&BimPolygon],
    clip: &[&BimPolygon],
    rule: OverlayRule,
    op_type: OperationType,
    config: BooleanConfig,
) -> Result<BooleanResult, KernelError> {
    let all: Vec<&BimPolygon> = subject.iter().chain(clip.iter()).copied().collect();
    let complexity = complexity_of(&all);

    let mut warnings = Vec::new();
    if complexity > config.max_complexity {
        warnings.push(format!(
            "boolean input complexity {} exceeds configured maximum {}",
            complexity, config.max_complexity
        ));
    }

    let (polygons, requires_healing) = run_overlay(subject, clip, rule, config.tolerance);
    if !polygons.is_empty() || (subject.is_empty() && clip.is_empty()) {
        return Ok(BooleanResult {
            success: !polygons.is_empty(),
            result_solids: polygons,
            operation_type: op_type,
            warnings,
            requires_healing,
        });
    }

    let relaxed = config.tolerance * 10.0;
    let (retry_polygons, retry_healing) = run_overlay(subject, clip, rule, relaxed);
    if !retry_polygons.is_empty() {
        warnings.push("primary boolean pass produced no output; retried with relaxed tolerance".into());
        return Ok(BooleanResult {
            success: true,
            result_solids: retry_polygons,
            operation_type: op_type,
            warnings,
            requires_healing: retry_healing,
        });
    }

    Err(KernelError::new(
        ErrorKind::BooleanFailure,
        "boolean_operation",
        "overlay produced no geometry even after a relaxed-tolerance retry",
        "check that inputs are non-degenerate and overlap as expected",
        true,
    ))
}

/// `union(solids[])` with two or more inputs folded pairwise in order.
pub fn union(solids: &[BimPolygon], config: BooleanConfig) -> Result<BooleanResult, KernelError> {
    match solids.len() {
        0 => Ok(BooleanResult {
            success: false,
            result_solids: Vec::new(),
            operation_type: OperationType::Union,
            warnings: Vec::new(),
            requires_healing: false,
        }),
        1 => Ok(BooleanResult {
            success: true,
            result_solids: vec![solids[0].clone()],
            operation_type: OperationType::Union,
            warnings: Vec::new(),
            requires_healing: false,
        }),
        _ => {
            let mut acc = vec![solids[0].clone()];
            let mut warnings = Vec::new();
            let mut requires_healing = false;
            for next in &solids[1..] {
                let acc_refs: Vec<&BimPolygon> = acc.iter().collect();
                let result = operation(
                    &acc_refs,
                    &[next],
                    OverlayRule::Union,
                    OperationType::Union,
                    config,
                )?;
                warnings.extend(result.warnings);
                requires_healing |= result.requires_healing;
                acc = result.result_solids;
            }
            Ok(BooleanResult {
                success: true,
                result_solids: acc,
                operation_type: OperationType::Union,
                warnings,
                requires_healing,
            })
        }
    }
}

pub fn intersection(a: &BimPolygon, b: &BimPolygon, config: BooleanConfig) -> Result<BooleanResult, KernelError> {
    operation(&[a], &[b], OverlayRule::Intersect, OperationType::Intersection, config)
}

pub fn difference(a: &BimPolygon, b: &BimPolygon, config: BooleanConfig) -> Result<BooleanResult, KernelError> {
    operation(&[a], &[b], OverlayRule::Difference, OperationType::Difference, config)
}

/// Orders inputs by ascending complexity; folds sequentially for small
/// batches, divides-and-conquers for large ones, per spec §4.4.
pub fn batch_union(solids: &[BimPolygon], config: BooleanConfig) -> Result<BooleanResult, KernelError> {
    const DIVIDE_THRESHOLD: usize = 16;

    if solids.is_empty() {
        return Ok(BooleanResult {
            success: false,
            result_solids: Vec::new(),
            operation_type: OperationType::BatchUnion,
            warnings: Vec::new(),
            requires_healing: false,
        });
    }
    if solids.len() == 1 {
        return Ok(BooleanResult {
            success: true,
            result_solids: vec![solids[0].clone()],
            operation_type: OperationType::BatchUnion,
            warnings: Vec::new(),
            requires_healing: false,
        });
    }

    let mut ordered = solids.to_vec();
    ordered.sort_by_key(|p| p.vertex_count());

    if ordered.len() <= DIVIDE_THRESHOLD {
        let mut result = union(&ordered, config)?;
        result.operation_type = OperationType::BatchUnion;
        return Ok(result);
    }

    let mid = ordered.len() / 2;
    let (left, right) = ordered.split_at(mid);
    let left_result = batch_union(left, config)?;
    let right_result = batch_union(right, config)?;

    let mut combined = left_result.result_solids;
    combined.extend(right_result.result_solids);
    let mut warnings = left_result.warnings;
    warnings.extend(right_result.warnings);
    if combined.len() > DIVIDE_THRESHOLD {
        warn!(count = combined.len(), "batch_union: recursed halves still large after merge");
    }

    let mut final_result = union(&combined, config)?;
    final_result.operation_type = OperationType::BatchUnion;
    final_result.warnings.extend(warnings);
    final_result.requires_healing |= left_result.requires_healing || right_result.requires_healing;
    Ok(final_result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::BimPoint;

    fn square(x0: f64, y0: f64, side: f64) -> BimPolygon {
        BimPolygon::new(
            vec![
                BimPoint::new(x0, y0),
                BimPoint::new(x0 + side, y0),
                BimPoint::new(x0 + side, y0 + side),
                BimPoint::new(x0, y0 + side),
            ],
            vec![],
        )
    }

    #[test]
    fn empty_union_is_unsuccessful_without_error() {
        let result = union(&[], BooleanConfig::default()).unwrap();
        assert!(!result.success);
        assert!(result.result_solids.is_empty());
    }

    #[test]
    fn single_input_union_returns_it_unchanged() {
        let sq = square(0.0, 0.0, 10.0);
        let result = union(&[sq.clone()], BooleanConfig::default()).unwrap();
        assert!(result.success);
        assert_eq!(result.result_solids.len(), 1);
        assert!((result.result_solids[0].area() - sq.area()).abs() < 1e-9);
    }

    #[test]
    fn overlapping_squares_union_into_one_shape() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(5.0, 0.0, 10.0);
        let result = union(&[a, b], BooleanConfig::default()).unwrap();
        assert!(result.success);
        assert_eq!(result.result_solids.len(), 1);
        assert!(result.result_solids[0].area() > 100.0);
    }

    #[test]
    fn disjoint_squares_intersection_fails_after_retry() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(100.0, 100.0, 1.0);
        let result = intersection(&a, &b, BooleanConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn overlapping_squares_intersection_has_expected_area() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(5.0, 0.0, 10.0);
        let result = intersection(&a, &b, BooleanConfig::default()).unwrap();
        assert!(result.success);
        assert!((result.result_solids[0].area() - 50.0).abs() < 1e-6);
    }

    #[test]
    fn difference_removes_overlap() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(5.0, 0.0, 10.0);
        let result = difference(&a, &b, BooleanConfig::default()).unwrap();
        assert!(result.success);
        assert!((result.result_solids[0].area() - 50.0).abs() < 1e-6);
    }

    #[test]
    fn batch_union_of_many_disjoint_squares_keeps_them_separate() {
        let solids: Vec<BimPolygon> = (0..5).map(|i| square(i as f64 * 100.0, 0.0, 10.0)).collect();
        let result = batch_union(&solids, BooleanConfig::default()).unwrap();
        assert!(result.success);
        assert_eq!(result.result_solids.len(), 5);
        assert_eq!(result.operation_type, OperationType::BatchUnion);
    }
}
