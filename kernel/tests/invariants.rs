//! Property tests over the cross-cutting invariants of spec.md §8, run with
//! randomly generated baselines/thicknesses/tolerances rather than fixed
//! fixtures (mirrors the teacher's use of `proptest` for `core-render`'s
//! cross-cutting render invariants).

use proptest::prelude::*;

use wall_geometry_kernel::boolean::{self, BooleanConfig};
use wall_geometry_kernel::geom::{BimPoint, BimPolygon, Curve};
use wall_geometry_kernel::intersection::{IntersectionKey, IntersectionType};
use wall_geometry_kernel::offset::{self, JoinType};
use wall_geometry_kernel::tolerance::{ToleranceContext, ToleranceManager};

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

proptest! {
    /// Testable property 1: the offset result has at least as many vertices
    /// as the baseline, both endpoints land on the perpendicular offset of
    /// the baseline's own endpoints, and left/right curve types match the
    /// baseline's.
    #[test]
    fn offset_endpoints_track_the_baseline(
        len in 10.0f64..5_000.0,
        distance in 1.0f64..500.0,
    ) {
        let baseline = Curve::polyline(vec![BimPoint::new(0.0, 0.0), BimPoint::new(len, 0.0)]);
        let result = offset::offset_curve(&baseline, distance, JoinType::Miter, 1e-6, 10.0).unwrap();

        prop_assert!(result.left.points.len() >= baseline.points.len());
        prop_assert!(result.right.points.len() >= baseline.points.len());
        prop_assert_eq!(result.left.curve_type, baseline.curve_type);
        prop_assert_eq!(result.right.curve_type, baseline.curve_type);

        prop_assert!((result.left.points[0].y - distance).abs() < 1e-6);
        prop_assert!((result.right.points[0].y + distance).abs() < 1e-6);
        let last = result.left.points.len() - 1;
        prop_assert!((result.left.points[last].y - distance).abs() < 1e-6);
    }

    /// Testable property 2: union area is bounded between the largest input
    /// and the sum of all inputs, with a tolerance-scaled perimeter slack.
    #[test]
    fn union_area_is_bounded_by_inputs(
        side_a in 5.0f64..200.0,
        side_b in 5.0f64..200.0,
        overlap_frac in 0.0f64..1.0,
    ) {
        let a = square(0.0, 0.0, side_a);
        let overlap_x = side_a * (1.0 - overlap_frac);
        let b = square(overlap_x, 0.0, side_b);

        let inputs = [a.clone(), b.clone()];
        let result = boolean::union(&inputs, BooleanConfig::default()).unwrap();
        prop_assume!(result.success);

        let result_area: f64 = result.result_solids.iter().map(|p| p.area()).sum();
        let input_area_sum = a.area() + b.area();
        let max_input_area = a.area().max(b.area());
        let perimeter_sum = a.perimeter() + b.perimeter();
        let tol = BooleanConfig::default().tolerance;

        prop_assert!(result_area <= input_area_sum + tol * perimeter_sum + 1e-6);
        prop_assert!(result_area >= max_input_area - tol * perimeter_sum - 1e-6);
    }

    /// Testable property 5 (bounds + determinism half): tolerance always
    /// lands in `[max(baseTol, t*0.1), min(docPrecision*10, t*100)]` and
    /// identical inputs always produce identical outputs.
    #[test]
    fn tolerance_is_bounded_and_deterministic(
        thickness in 1.0f64..1000.0,
        doc_precision in 1e-6f64..1e-2,
        angle_deg in 0.1f64..179.0,
    ) {
        let mgr = ToleranceManager::new();
        let angle = angle_deg.to_radians();
        let a = mgr.calculate(thickness, doc_precision, angle, ToleranceContext::Offset);
        let b = mgr.calculate(thickness, doc_precision, angle, ToleranceContext::Offset);

        prop_assert_eq!(a, b);
        prop_assert!(a > 0.0);
        prop_assert!(a <= doc_precision * 10.0 + 1e-15);
    }

    /// Testable property 6: `generateIntersectionKey` is permutation-invariant
    /// in the participating wall ids.
    #[test]
    fn intersection_key_is_permutation_invariant(
        mut ids in prop::collection::hash_set(1u64..1000, 2..6),
    ) {
        let ids: Vec<u64> = ids.drain().collect();
        let mut shuffled = ids.clone();
        shuffled.reverse();

        let point = BimPoint::new(3.5, -2.25);
        let a = IntersectionKey::new(&ids, IntersectionType::CrossJunction, &point, 1e-6);
        let b = IntersectionKey::new(&shuffled, IntersectionType::CrossJunction, &point, 1e-6);
        prop_assert_eq!(a, b);
    }
}
