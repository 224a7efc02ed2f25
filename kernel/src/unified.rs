//! Unified wall data: the host-facing entity carrying both representations
//! at once (`SPEC_FULL.md` "Mode switching"). A wall always has a basic
//! representation; it gains a BIM one only once `switch_to_bim` succeeds.

use crate::basic::BasicRepresentation;
use crate::geom::Curve;
use crate::intersection::IntersectionData;
use crate::quality::QualityMetrics;
use crate::wall::WallType;
use crate::wall::WallSolid;

/// Which representation was most recently written to directly; drives
/// conflict resolution in `mode_switch::synchronize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Basic,
    Bim,
}

/// A wall's BIM-mode payload: its solved solid plus the offset curves and
/// quality snapshot that produced it.
#[derive(Debug, Clone)]
pub struct BimRepresentation {
    pub wall_solid: WallSolid,
    pub offset_curves: (Curve, Curve),
    pub intersection_data: Vec<IntersectionData>,
    pub quality_metrics: QualityMetrics,
}

/// The host-visible wall entity: always carries a basic representation,
/// optionally a BIM one, and tracks which side was edited last.
#[derive(Debug, Clone)]
pub struct UnifiedWallData {
    pub id: u64,
    pub wall_type: WallType,
    pub thickness: f64,
    pub baseline: Curve,
    pub basic: BasicRepresentation,
    pub bim: Option<BimRepresentation>,
    pub processing_history: Vec<String>,
    pub last_modified_mode: Mode,
}

impl UnifiedWallData {
    /// Starts a wall in basic mode only, per `SPEC_FULL.md`'s "new walls
    /// start basic" default.
    pub fn new_basic(id: u64, wall_type: WallType, thickness: f64, baseline: Curve) -> Self {
        let basic = BasicRepresentation::from_baseline(&baseline, id);
        Self {
            id,
            wall_type,
            thickness,
            baseline,
            basic,
            bim: None,
            processing_history: vec!["new_basic".into()],
            last_modified_mode: Mode::Basic,
        }
    }

    pub fn is_bim(&self) -> bool {
        self.bim.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{BimPoint, CurveType};

    fn baseline() -> Curve {
        Curve::new(
            vec![BimPoint::new(0.0, 0.0), BimPoint::new(10.0, 0.0)],
            CurveType::Polyline,
            false,
        )
    }

    #[test]
    fn new_wall_starts_in_basic_mode() {
        let wall = UnifiedWallData::new_basic(1, WallType::Layout, 200.0, baseline());
        assert!(!wall.is_bim());
        assert_eq!(wall.last_modified_mode, Mode::Basic);
        assert_eq!(wall.basic.node_count(), 2);
    }
}
