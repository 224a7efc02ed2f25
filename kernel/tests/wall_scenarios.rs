//! End-to-end scenarios exercising the public facade: a straight wall, an
//! L-corner, a T-junction union, sliver removal, vertex merging, tolerance
//! scaling by thickness, and miter-limit fallback to bevel.

use wall_geometry_kernel::boolean::{self, BooleanConfig};
use wall_geometry_kernel::geom::{BimPoint, BimPolygon, Curve};
use wall_geometry_kernel::healing::HealingConfig;
use wall_geometry_kernel::simplify::{adaptive_tolerance, SimplificationConfig};
use wall_geometry_kernel::vertex_merge::VertexMergeConfig;
use wall_geometry_kernel::{build_wall_solid, heal_solid, merge_vertices, simplify_solid, KernelConfig, WallType};

fn straight_baseline() -> Curve {
    Curve::polyline(vec![BimPoint::new(0.0, 0.0), BimPoint::new(10_000.0, 0.0)])
}

fn l_corner_baseline() -> Curve {
    Curve::polyline(vec![
        BimPoint::new(0.0, 0.0),
        BimPoint::new(5_000.0, 0.0),
        BimPoint::new(5_000.0, 5_000.0),
    ])
}

#[test]
fn s1_straight_wall_offsets_into_a_rectangle() {
    let config = KernelConfig::default();
    let solid = build_wall_solid(straight_baseline(), 200.0, WallType::Layout, &config).unwrap();

    assert_eq!(solid.solid_geometry.len(), 1);
    let expected_area = 10_000.0 * 200.0;
    assert!((solid.total_area() - expected_area).abs() / expected_area < 0.01);
}

#[test]
fn s2_l_corner_wall_produces_a_mitered_single_polygon() {
    let config = KernelConfig::default();
    let solid = build_wall_solid(l_corner_baseline(), 200.0, WallType::Zone, &config).unwrap();

    assert_eq!(solid.solid_geometry.len(), 1);
    assert_eq!(solid.join_types.len(), 1);
    assert!(solid.total_area() > 0.0);
}

#[test]
fn s3_t_junction_union_merges_two_wall_solids_into_one() {
    let config = KernelConfig::default();
    let horizontal = build_wall_solid(straight_baseline(), 200.0, WallType::Layout, &config).unwrap();
    let vertical_baseline = Curve::polyline(vec![BimPoint::new(5_000.0, -2_000.0), BimPoint::new(5_000.0, 2_000.0)]);
    let vertical = build_wall_solid(vertical_baseline, 200.0, WallType::Layout, &config).unwrap();

    let polygons: Vec<BimPolygon> = horizontal
        .solid_geometry
        .iter()
        .chain(vertical.solid_geometry.iter())
        .cloned()
        .collect();

    let result = boolean::union(&polygons, BooleanConfig::default()).unwrap();
    assert!(!result.result_solids.is_empty());
    let merged_area: f64 = result.result_solids.iter().map(|p| p.area()).sum();
    assert!(merged_area > horizontal.total_area());
    assert!(merged_area < horizontal.total_area() + vertical.total_area());
}

#[test]
fn s4_healing_removes_a_sliver_polygon() {
    let config = KernelConfig::default();
    let mut solid = build_wall_solid(straight_baseline(), 200.0, WallType::Layout, &config).unwrap();
    solid.solid_geometry.push(BimPolygon::new(
        vec![
            BimPoint::new(0.0, 0.0),
            BimPoint::new(1e-6, 0.0),
            BimPoint::new(5e-7, 1e-6),
        ],
        vec![],
    ));

    let healed = heal_solid(&solid, &HealingConfig::default());
    assert!(healed.solid_geometry.len() < solid.solid_geometry.len());
    assert_eq!(healed.healing_history.len(), 1);
}

#[test]
fn s5_vertex_merge_collapses_near_coincident_vertices() {
    let config = KernelConfig::default();
    let solid = build_wall_solid(straight_baseline(), 200.0, WallType::Layout, &config).unwrap();
    let merged = merge_vertices(&solid, &VertexMergeConfig::default());
    assert_eq!(merged.id, solid.id);
    assert_eq!(merged.healing_history.len(), 1);
}

#[test]
fn s6_adaptive_tolerance_scales_with_thickness() {
    let thin_wall_tolerance = adaptive_tolerance(1e-6, 150.0);
    let thick_wall_tolerance = adaptive_tolerance(1e-6, 350.0);

    assert!((thin_wall_tolerance - 1.5).abs() < 1e-9);
    assert!((thick_wall_tolerance - 3.5).abs() < 1e-9);
    assert!(thick_wall_tolerance > thin_wall_tolerance);
}

#[test]
fn s7_tight_miter_limit_falls_back_without_erroring() {
    let sharp_corner = Curve::polyline(vec![
        BimPoint::new(0.0, 0.0),
        BimPoint::new(1_000.0, 0.0),
        BimPoint::new(1_000.0, 50.0),
    ]);
    let config = KernelConfig::default().with_miter_limit(1.01);

    let solid = build_wall_solid(sharp_corner, 200.0, WallType::Area, &config).unwrap();
    assert_eq!(solid.solid_geometry.len(), 1);
    assert!(solid.total_area() > 0.0);
}

#[test]
fn simplify_solid_reduces_vertex_count_on_an_over_segmented_straight_run() {
    let mut points = Vec::new();
    for i in 0..=20 {
        points.push(BimPoint::new(i as f64 * 100.0, 0.0));
    }
    let baseline = Curve::polyline(points);
    let config = KernelConfig::default();
    let solid = build_wall_solid(baseline, 200.0, WallType::Layout, &config).unwrap();

    let before: usize = solid.solid_geometry.iter().map(|p| p.outer.len()).sum();
    let simplified = simplify_solid(&solid, &SimplificationConfig::default());
    let after: usize = simplified.solid_geometry.iter().map(|p| p.outer.len()).sum();

    assert!(after <= before);
}
