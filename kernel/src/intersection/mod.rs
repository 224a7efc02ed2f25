//! Intersection Manager & Cache, and the Advanced Intersection Resolver
//! (spec §4.5–§4.6, ≈14% of budget combined).

mod cache;
mod manager;
mod resolver;

pub use cache::{CacheStatistics, IntersectionCache, IntersectionKey, MiterKey};
pub use manager::IntersectionManager;
pub use resolver::{
    classify_extreme_angle, optimize_network, resolve_cross_junction, resolve_parallel_overlap,
    ExtremeAngleTreatment, NetworkOptimizationReport, OverlapResolution, ResolutionMethod,
    ResolutionStrategy, ResolvedJunction, WallRef,
};

use serde::{Deserialize, Serialize};

use crate::geom::BimPoint;
use crate::miter::MiterCalculation;

/// The structural kind a resolved wall intersection takes, per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntersectionType {
    TJunction,
    LJunction,
    CrossJunction,
    ParallelOverlap,
}

impl IntersectionType {
    fn tag(self) -> &'static str {
        match self {
            IntersectionType::TJunction => "t_junction",
            IntersectionType::LJunction => "l_junction",
            IntersectionType::CrossJunction => "cross_junction",
            IntersectionType::ParallelOverlap => "parallel_overlap",
        }
    }
}

/// A resolved wall intersection (spec §3 "IntersectionData").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntersectionData {
    pub id: u64,
    pub intersection_type: IntersectionType,
    pub wall_ids: Vec<u64>,
    pub point: BimPoint,
    pub miter_apex: Option<BimPoint>,
    pub offset_line_intersections: Vec<BimPoint>,
    pub resolution_method: String,
    pub geometric_accuracy: f64,
    pub validated: bool,
}

static NEXT_INTERSECTION_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

impl IntersectionData {
    pub fn new(
        intersection_type: IntersectionType,
        mut wall_ids: Vec<u64>,
        point: BimPoint,
        resolution_method: impl Into<String>,
    ) -> Self {
        wall_ids.sort_unstable();
        wall_ids.dedup();
        Self {
            id: NEXT_INTERSECTION_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed),
            intersection_type,
            wall_ids,
            point,
            miter_apex: None,
            offset_line_intersections: Vec::new(),
            resolution_method: resolution_method.into(),
            geometric_accuracy: 1.0,
            validated: false,
        }
    }

    pub fn with_miter(mut self, miter: &MiterCalculation) -> Self {
        self.miter_apex = Some(miter.apex.clone());
        self.offset_line_intersections = vec![miter.left_intersection.clone(), miter.right_intersection.clone()];
        self.geometric_accuracy = miter.accuracy;
        self
    }

    /// Canonical cache key, per spec §4.5: sorted wall ids + type +
    /// 6-decimal-rounded point + tolerance.
    pub fn cache_key(&self, tolerance: f64) -> IntersectionKey {
        IntersectionKey::new(&self.wall_ids, self.intersection_type, &self.point, tolerance)
    }
}
