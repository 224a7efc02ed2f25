//! Mode switching between the basic graph and the full BIM solid
//! (`SPEC_FULL.md` "Mode switching", generalizing spec §3's two-
//! representation data model into an explicit state machine).

use crate::basic::BasicRepresentation;
use crate::error::KernelResult;
use crate::offset::{offset_curve, JoinType};
use crate::quality::QualityMetrics;
use crate::unified::{BimRepresentation, Mode, UnifiedWallData};
use crate::wall::{polygon_from_offsets, WallSolid};

/// Pre-flight result for a prospective mode switch or synchronization.
#[derive(Debug, Clone)]
pub struct CompatibilityReport {
    pub is_compatible: bool,
    pub can_switch_to_bim: bool,
    pub can_switch_to_basic: bool,
    pub blockers: Vec<String>,
    pub potential_data_loss: Vec<String>,
    pub estimated_processing_time_secs: f64,
}

/// Checks whether `data` can switch representations, and what would be lost
/// in doing so, without performing the switch.
pub fn check_compatibility(data: &UnifiedWallData) -> CompatibilityReport {
    let mut blockers = Vec::new();
    let mut potential_data_loss = Vec::new();

    let mut can_switch_to_bim = true;
    if data.baseline.points.len() < 2 {
        blockers.push("baseline has fewer than 2 points".into());
        can_switch_to_bim = false;
    }
    if data.thickness <= 0.0 {
        blockers.push("thickness is non-positive".into());
        can_switch_to_bim = false;
    }

    if data.bim.is_some() {
        potential_data_loss.push(
            "switching to basic discards intersection metadata and quality metrics; \
             the baseline graph itself is preserved"
                .into(),
        );
    }

    CompatibilityReport {
        is_compatible: blockers.is_empty(),
        can_switch_to_bim,
        can_switch_to_basic: true,
        blockers,
        potential_data_loss,
        estimated_processing_time_secs: 0.0001 * data.baseline.points.len() as f64,
    }
}

/// Builds the BIM representation from `data`'s baseline/thickness and
/// attaches it, leaving the basic graph untouched.
pub fn switch_to_bim(data: &UnifiedWallData, tolerance: f64, miter_limit: f64) -> KernelResult<UnifiedWallData> {
    let distance = data.thickness / 2.0;
    let offset = offset_curve(&data.baseline, distance, JoinType::Miter, tolerance, miter_limit)?;
    let outer = polygon_from_offsets(&offset.left, &offset.right);

    let interior = &data.baseline.points[1..data.baseline.points.len().saturating_sub(1)];
    let join_types = interior
        .iter()
        .zip(offset.join_types.iter())
        .map(|(p, j)| (p.id, *j))
        .collect();

    let wall_solid = WallSolid::construct_from_baseline(
        data.baseline.clone(),
        data.thickness,
        data.wall_type,
        offset.left.clone(),
        offset.right.clone(),
        join_types,
        vec![outer],
        0.0,
    );

    let mut next = data.clone();
    next.bim = Some(BimRepresentation {
        wall_solid,
        offset_curves: (offset.left, offset.right),
        intersection_data: Vec::new(),
        quality_metrics: QualityMetrics::default(),
    });
    next.last_modified_mode = Mode::Bim;
    next.processing_history.push("switch_to_bim".into());
    Ok(next)
}

/// Drops the BIM representation, keeping only the basic graph rebuilt from
/// the current baseline. Per spec, this loses intersection metadata.
pub fn switch_to_basic(data: &UnifiedWallData) -> UnifiedWallData {
    let mut next = data.clone();
    if next.bim.take().is_some() {
        next.processing_history
            .push("switch_to_basic: dropped BIM intersection and quality metadata".into());
    }
    next.basic = BasicRepresentation::from_baseline(&next.baseline, next.id);
    next.last_modified_mode = Mode::Basic;
    next
}

/// Reconciles the two representations after an edit, applying spec's
/// conflict order (thickness, then wall type, then baseline) by always
/// treating `last_modified_mode`'s fields as authoritative and rebuilding
/// the other side from them.
pub fn synchronize(data: &UnifiedWallData, tolerance: f64, miter_limit: f64) -> KernelResult<UnifiedWallData> {
    match data.last_modified_mode {
        Mode::Basic => {
            let mut next = data.clone();
            if let Some(rebuilt) = next.basic.to_baseline() {
                next.baseline = rebuilt;
            }
            if next.bim.is_some() {
                next = switch_to_bim(&next, tolerance, miter_limit)?;
                next.last_modified_mode = Mode::Basic;
            }
            Ok(next)
        }
        Mode::Bim => {
            let mut next = data.clone();
            if let Some(bim) = &data.bim {
                next.baseline = bim.wall_solid.baseline.clone();
                next.thickness = bim.wall_solid.thickness;
                next.wall_type = bim.wall_solid.wall_type;
            }
            next.basic = BasicRepresentation::from_baseline(&next.baseline, next.id);
            Ok(next)
        }
    }
}
