//! Validation Pipeline & Recovery (spec §4.10, ≈15% of budget).
//!
//! Five staged checks run in order, each producing a [`StageOutcome`].
//! `ValidationStage` is an open set (spec §9): a constructor-supplied table
//! mapping a name to a boxed [`Stage`] trait object rather than a closed
//! enum, so a host can register additional stages without touching this
//! module. [`recover`] applies the priority-ordered recovery strategies of
//! spec §4.10 to a [`ValidationReport`]'s findings.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::config::ReportingLevel;
use crate::error::ErrorKind;
use crate::geom::{ring_self_intersects, signed_area, BimPolygon};
use crate::healing::{heal_polygon, HealingConfig};
use crate::simplify::{simplify_polygon, SimplificationConfig};
use crate::wall::WallSolid;

/// A single finding surfaced by a validation stage.
#[derive(Debug, Clone)]
pub struct ValidationFinding {
    pub kind: ErrorKind,
    pub message: String,
    pub recoverable: bool,
}

/// The result of running one stage over a `WallSolid`.
#[derive(Debug, Clone, Default)]
pub struct StageOutcome {
    pub stage: String,
    pub passed: bool,
    pub errors: Vec<ValidationFinding>,
    pub warnings: Vec<String>,
    pub metrics: BTreeMap<String, f64>,
    pub processing_time_secs: f64,
}

/// Which side of an operation validation is running on (host-supplied).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPhase {
    Pre,
    Post,
}

/// A named, pluggable validation stage. Built-in stages below implement
/// this; a host may register its own to extend the open set (spec §9).
pub trait Stage {
    fn name(&self) -> &'static str;
    fn validate(&self, solid: &WallSolid, tolerance: f64) -> StageOutcome;
}

struct GeometricConsistencyStage;
struct TopologyStage;
struct NumericalStabilityStage;
struct QualityMetricsStage;
struct PerformanceStage;

impl Stage for GeometricConsistencyStage {
    fn name(&self) -> &'static str {
        "geometric-consistency"
    }

    fn validate(&self, solid: &WallSolid, _tolerance: f64) -> StageOutcome {
        let start = Instant::now();
        let mut errors = Vec::new();

        if solid.baseline.points.len() < 2 {
            errors.push(ValidationFinding {
                kind: ErrorKind::DegenerateGeometry,
                message: "baseline has fewer than 2 points".into(),
                recoverable: true,
            });
        }
        if solid.thickness <= 0.0 {
            errors.push(ValidationFinding {
                kind: ErrorKind::InvalidParameter,
                message: "wall thickness is non-positive".into(),
                recoverable: true,
            });
        }
        for polygon in &solid.solid_geometry {
            if polygon.area().abs() < 1e-12 {
                errors.push(ValidationFinding {
                    kind: ErrorKind::DegenerateGeometry,
                    message: format!("polygon {} has zero area", polygon.id),
                    recoverable: true,
                });
            }
        }

        let mut metrics = BTreeMap::new();
        metrics.insert("polygon_count".into(), solid.solid_geometry.len() as f64);

        StageOutcome {
            stage: self.name().into(),
            passed: errors.is_empty(),
            errors,
            warnings: Vec::new(),
            metrics,
            processing_time_secs: start.elapsed().as_secs_f64(),
        }
    }
}

impl Stage for TopologyStage {
    fn name(&self) -> &'static str {
        "topology"
    }

    fn validate(&self, solid: &WallSolid, _tolerance: f64) -> StageOutcome {
        let start = Instant::now();
        let mut errors = Vec::new();

        for polygon in &solid.solid_geometry {
            if polygon.outer.len() < 3 {
                errors.push(ValidationFinding {
                    kind: ErrorKind::TopologyError,
                    message: format!("polygon {} outer ring has fewer than 3 points", polygon.id),
                    recoverable: true,
                });
                continue;
            }
            if signed_area(&polygon.outer) < 0.0 {
                errors.push(ValidationFinding {
                    kind: ErrorKind::TopologyError,
                    message: format!("polygon {} outer ring is not CCW", polygon.id),
                    recoverable: true,
                });
            }
            for (i, hole) in polygon.holes.iter().enumerate() {
                if hole.len() < 3 {
                    errors.push(ValidationFinding {
                        kind: ErrorKind::TopologyError,
                        message: format!("polygon {} hole {} has fewer than 3 points", polygon.id, i),
                        recoverable: true,
                    });
                } else if signed_area(hole) > 0.0 {
                    errors.push(ValidationFinding {
                        kind: ErrorKind::TopologyError,
                        message: format!("polygon {} hole {} is not CW", polygon.id, i),
                        recoverable: true,
                    });
                }
            }
            if ring_self_intersects(&polygon.outer) {
                errors.push(ValidationFinding {
                    kind: ErrorKind::SelfIntersection,
                    message: format!("polygon {} outer ring self-intersects", polygon.id),
                    recoverable: true,
                });
            }
        }

        StageOutcome {
            stage: self.name().into(),
            passed: errors.is_empty(),
            errors,
            warnings: Vec::new(),
            metrics: BTreeMap::new(),
            processing_time_secs: start.elapsed().as_secs_f64(),
        }
    }
}

impl Stage for NumericalStabilityStage {
    fn name(&self) -> &'static str {
        "numerical-stability"
    }

    fn validate(&self, solid: &WallSolid, tolerance: f64) -> StageOutcome {
        let start = Instant::now();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        const HUGE_COORD: f64 = 1e9;
        for polygon in &solid.solid_geometry {
            for p in polygon.outer.iter().chain(polygon.holes.iter().flatten()) {
                if p.x.abs() > HUGE_COORD || p.y.abs() > HUGE_COORD {
                    errors.push(ValidationFinding {
                        kind: ErrorKind::NumericalInstability,
                        message: format!("point ({}, {}) exceeds plausible coordinate magnitude", p.x, p.y),
                        recoverable: true,
                    });
                }
            }
            let n = polygon.outer.len();
            for i in 0..n {
                let d = polygon.outer[i].distance_to(&polygon.outer[(i + 1) % n]);
                if d > 0.0 && d < tolerance * 0.01 {
                    warnings.push(format!("polygon {} has a micro-segment of length {:.3e}", polygon.id, d));
                }
            }
        }

        StageOutcome {
            stage: self.name().into(),
            passed: errors.is_empty(),
            errors,
            warnings,
            metrics: BTreeMap::new(),
            processing_time_secs: start.elapsed().as_secs_f64(),
        }
    }
}

impl Stage for QualityMetricsStage {
    fn name(&self) -> &'static str {
        "quality-metrics"
    }

    fn validate(&self, solid: &WallSolid, _tolerance: f64) -> StageOutcome {
        let start = Instant::now();
        let mut errors = Vec::new();
        let score = solid.quality.overall_score();
        if score < 0.5 {
            errors.push(ValidationFinding {
                kind: ErrorKind::ValidationFailure,
                message: format!("overall quality score {:.2} is below the 0.5 floor", score),
                recoverable: true,
            });
        }

        let mut metrics = BTreeMap::new();
        metrics.insert("overall_score".into(), score);
        metrics.insert("sliver_face_count".into(), solid.quality.sliver_face_count as f64);
        metrics.insert("self_intersection_count".into(), solid.quality.self_intersection_count as f64);

        StageOutcome {
            stage: self.name().into(),
            passed: errors.is_empty(),
            errors,
            warnings: Vec::new(),
            metrics,
            processing_time_secs: start.elapsed().as_secs_f64(),
        }
    }
}

impl Stage for PerformanceStage {
    fn name(&self) -> &'static str {
        "performance"
    }

    fn validate(&self, solid: &WallSolid, _tolerance: f64) -> StageOutcome {
        let start = Instant::now();
        let mut errors = Vec::new();
        const COMPLEXITY_CEILING: f64 = 50_000.0;
        if solid.complexity > COMPLEXITY_CEILING {
            errors.push(ValidationFinding {
                kind: ErrorKind::ComplexityExceeded,
                message: format!("wall complexity {} exceeds the configured ceiling", solid.complexity),
                recoverable: true,
            });
        }

        let mut metrics = BTreeMap::new();
        metrics.insert("complexity".into(), solid.complexity);
        metrics.insert("processing_time_secs".into(), solid.processing_time_secs);

        StageOutcome {
            stage: self.name().into(),
            passed: errors.is_empty(),
            errors,
            warnings: Vec::new(),
            metrics,
            processing_time_secs: start.elapsed().as_secs_f64(),
        }
    }
}

/// A full validation run's output across all stages.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub phase: ExecutionPhase,
    pub overall_passed: bool,
    pub stages: Vec<StageOutcome>,
    pub recommendations: Vec<String>,
}

impl ValidationReport {
    pub fn errors_of(&self, kind: ErrorKind) -> Vec<&ValidationFinding> {
        self.stages
            .iter()
            .flat_map(|s| s.errors.iter())
            .filter(|f| f.kind == kind)
            .collect()
    }

    pub fn no_errors_of(&self, kind: ErrorKind) -> bool {
        self.errors_of(kind).is_empty()
    }

    /// Filters the report's content to the requested reporting level (spec
    /// §4.10 "Reporting levels").
    pub fn at_level(&self, level: ReportingLevel) -> ValidationReport {
        match level {
            ReportingLevel::Minimal => ValidationReport {
                phase: self.phase,
                overall_passed: self.overall_passed,
                stages: Vec::new(),
                recommendations: Vec::new(),
            },
            ReportingLevel::Normal => ValidationReport {
                phase: self.phase,
                overall_passed: self.overall_passed,
                stages: self
                    .stages
                    .iter()
                    .map(|s| StageOutcome {
                        stage: s.stage.clone(),
                        passed: s.passed,
                        errors: s.errors.clone(),
                        warnings: s.warnings.clone(),
                        metrics: BTreeMap::new(),
                        processing_time_secs: 0.0,
                    })
                    .collect(),
                recommendations: Vec::new(),
            },
            ReportingLevel::Comprehensive => self.clone(),
        }
    }
}

impl PartialEq for ValidationFinding {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ValidationPipelineConfig {
    pub tolerance: f64,
    pub fail_fast: bool,
    pub reporting_level: ReportingLevel,
}

impl Default for ValidationPipelineConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            fail_fast: false,
            reporting_level: ReportingLevel::Normal,
        }
    }
}

/// The staged validation pipeline (spec §4.10). Holds the default five
/// stages in their required order; additional stages can be appended since
/// `ValidationStage` is an open set.
pub struct ValidationPipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self {
            stages: vec![
                Box::new(GeometricConsistencyStage),
                Box::new(TopologyStage),
                Box::new(NumericalStabilityStage),
                Box::new(QualityMetricsStage),
                Box::new(PerformanceStage),
            ],
        }
    }
}

impl ValidationPipeline {
    pub fn with_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Runs every stage in order, honoring `fail_fast`, and generates
    /// recommendations when `reporting_level` is `Comprehensive`.
    pub fn run(&self, solid: &WallSolid, phase: ExecutionPhase, config: &ValidationPipelineConfig) -> ValidationReport {
        let mut outcomes = Vec::with_capacity(self.stages.len());
        let mut overall_passed = true;

        for stage in &self.stages {
            let outcome = stage.validate(solid, config.tolerance);
            overall_passed &= outcome.passed;
            let stop = config.fail_fast && !outcome.passed;
            outcomes.push(outcome);
            if stop {
                break;
            }
        }

        let mut report = ValidationReport {
            phase,
            overall_passed,
            stages: outcomes,
            recommendations: Vec::new(),
        };

        if matches!(config.reporting_level, ReportingLevel::Comprehensive) {
            report.recommendations = crate::recommendations::suggest(&report);
        }

        report.at_level(config.reporting_level)
    }
}

/// Which remediation a recoverable finding's `ErrorKind` maps to, in the
/// priority order spec §4.10 mandates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    DegenerateRecovery,
    SelfIntersectionResolution,
    NumericalStability,
    TopologyRepair,
    DuplicateVertexRemoval,
    GeometricSimplification,
    FallbackReconstruction,
}

impl RecoveryStrategy {
    /// Lower runs first, matching spec §4.10's priority list.
    fn priority(self) -> u8 {
        match self {
            RecoveryStrategy::DegenerateRecovery => 0,
            RecoveryStrategy::SelfIntersectionResolution => 1,
            RecoveryStrategy::NumericalStability => 2,
            RecoveryStrategy::TopologyRepair => 3,
            RecoveryStrategy::DuplicateVertexRemoval => 4,
            RecoveryStrategy::GeometricSimplification => 5,
            RecoveryStrategy::FallbackReconstruction => 6,
        }
    }

    fn for_kind(kind: ErrorKind) -> RecoveryStrategy {
        match kind {
            ErrorKind::DegenerateGeometry => RecoveryStrategy::DegenerateRecovery,
            ErrorKind::SelfIntersection => RecoveryStrategy::SelfIntersectionResolution,
            ErrorKind::NumericalInstability => RecoveryStrategy::NumericalStability,
            ErrorKind::TopologyError => RecoveryStrategy::TopologyRepair,
            ErrorKind::DuplicateVertices => RecoveryStrategy::DuplicateVertexRemoval,
            ErrorKind::ComplexityExceeded => RecoveryStrategy::GeometricSimplification,
            _ => RecoveryStrategy::FallbackReconstruction,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecoveryOutcome {
    pub strategy: RecoveryStrategy,
    pub success: bool,
    pub quality_impact: f64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct RecoveryConfig {
    pub max_attempts: usize,
    pub quality_threshold: f64,
    pub sliver_area_threshold: f64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            quality_threshold: 0.7,
            sliver_area_threshold: 1e-6,
        }
    }
}

/// Applies recovery strategies to `solid`'s findings from `report`, in
/// priority order, stopping at `max_attempts`, when accumulated quality
/// impact exceeds `1 - quality_threshold`, or at a non-recoverable
/// critical finding (spec §4.10 "Recovery").
pub fn recover(solid: &WallSolid, report: &ValidationReport, config: &RecoveryConfig) -> (WallSolid, Vec<RecoveryOutcome>) {
    let mut findings: Vec<&ValidationFinding> = report.stages.iter().flat_map(|s| s.errors.iter()).collect();
    findings.sort_by_key(|f| RecoveryStrategy::for_kind(f.kind).priority());

    let mut current = solid.clone();
    let mut outcomes = Vec::new();
    let mut accumulated_impact = 0.0;
    let max_impact = 1.0 - config.quality_threshold;

    for finding in findings {
        if outcomes.len() >= config.max_attempts {
            break;
        }
        if !finding.recoverable {
            outcomes.push(RecoveryOutcome {
                strategy: RecoveryStrategy::for_kind(finding.kind),
                success: false,
                quality_impact: 1.0,
                warnings: vec![format!("critical non-recoverable finding: {}", finding.message)],
            });
            break;
        }

        let strategy = RecoveryStrategy::for_kind(finding.kind);
        let outcome = apply_strategy(&mut current, strategy, config);
        accumulated_impact += outcome.quality_impact;
        let stop = accumulated_impact > max_impact;
        outcomes.push(outcome);
        if stop {
            break;
        }
    }

    (current, outcomes)
}

fn apply_strategy(solid: &mut WallSolid, strategy: RecoveryStrategy, config: &RecoveryConfig) -> RecoveryOutcome {
    match strategy {
        RecoveryStrategy::DegenerateRecovery => {
            let before = solid.solid_geometry.len();
            solid.solid_geometry.retain(|p| p.outer.len() >= 3 && p.area().abs() > 1e-12);
            let removed = before - solid.solid_geometry.len();
            RecoveryOutcome {
                strategy,
                success: true,
                quality_impact: removed as f64 * 0.05,
                warnings: if removed > 0 {
                    vec![format!("removed {} degenerate polygon(s)", removed)]
                } else {
                    vec![]
                },
            }
        }
        RecoveryStrategy::SelfIntersectionResolution | RecoveryStrategy::DuplicateVertexRemoval | RecoveryStrategy::NumericalStability => {
            let healing_config = HealingConfig {
                sliver_area_threshold: config.sliver_area_threshold,
                ..HealingConfig::default()
            };
            let mut total_impact = 0.0;
            let mut warnings = Vec::new();
            let mut healed = Vec::with_capacity(solid.solid_geometry.len());
            for polygon in &solid.solid_geometry {
                let result = heal_polygon(polygon, &healing_config);
                if result.faces_removed + result.edges_merged + result.gaps_eliminated > 0 {
                    total_impact += 0.01 * (result.faces_removed + result.edges_merged + result.gaps_eliminated) as f64;
                }
                healed.extend(result.healed_polygons);
            }
            if healed.is_empty() {
                warnings.push("healing pass removed every polygon during recovery".into());
            }
            solid.solid_geometry = healed;
            RecoveryOutcome {
                strategy,
                success: true,
                quality_impact: total_impact.min(1.0),
                warnings,
            }
        }
        RecoveryStrategy::TopologyRepair => {
            let mut warnings = Vec::new();
            let rebuilt: Vec<BimPolygon> = solid
                .solid_geometry
                .iter()
                .map(|p| BimPolygon::new(p.outer.clone(), p.holes.clone()))
                .collect();
            if rebuilt.iter().any(|p| p.quality.self_intersects) {
                warnings.push("topology repair could not eliminate all self-intersections".into());
            }
            solid.solid_geometry = rebuilt;
            RecoveryOutcome {
                strategy,
                success: true,
                quality_impact: 0.05,
                warnings,
            }
        }
        RecoveryStrategy::GeometricSimplification => {
            let simp_config = SimplificationConfig::default();
            let simplified: Vec<BimPolygon> = solid
                .solid_geometry
                .iter()
                .map(|p| simplify_polygon(p, solid.thickness, &simp_config).polygon)
                .collect();
            solid.solid_geometry = simplified;
            RecoveryOutcome {
                strategy,
                success: true,
                quality_impact: 0.1,
                warnings: vec![],
            }
        }
        RecoveryStrategy::FallbackReconstruction => {
            let outer = crate::wall::polygon_from_offsets(&solid.left_offset, &solid.right_offset);
            solid.solid_geometry = vec![outer];
            RecoveryOutcome {
                strategy,
                success: true,
                quality_impact: 0.3,
                warnings: vec!["reconstructed solid geometry directly from offset curves".into()],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{BimPoint, CurveType};
    use crate::geom::Curve;
    use crate::wall::WallType;

    fn baseline() -> Curve {
        Curve::new(
            vec![BimPoint::new(0.0, 0.0), BimPoint::new(10.0, 0.0)],
            CurveType::Polyline,
            false,
        )
    }

    fn healthy_wall() -> WallSolid {
        let square = BimPolygon::new(
            vec![
                BimPoint::new(0.0, -1.0),
                BimPoint::new(10.0, -1.0),
                BimPoint::new(10.0, 1.0),
                BimPoint::new(0.0, 1.0),
            ],
            vec![],
        );
        WallSolid::construct_from_baseline(
            baseline(),
            200.0,
            WallType::Layout,
            baseline(),
            baseline(),
            vec![],
            vec![square],
            0.001,
        )
    }

    #[test]
    fn healthy_wall_passes_all_stages() {
        let wall = healthy_wall();
        let report = ValidationPipeline::default().run(&wall, ExecutionPhase::Pre, &ValidationPipelineConfig::default());
        assert!(report.overall_passed);
    }

    #[test]
    fn zero_thickness_fails_geometric_consistency() {
        let mut wall = healthy_wall();
        wall.thickness = 0.0;
        let report = ValidationPipeline::default().run(&wall, ExecutionPhase::Pre, &ValidationPipelineConfig::default());
        assert!(!report.overall_passed);
        assert!(!report.no_errors_of(ErrorKind::InvalidParameter));
    }

    #[test]
    fn fail_fast_stops_after_first_failing_stage() {
        let mut wall = healthy_wall();
        wall.thickness = 0.0;
        let config = ValidationPipelineConfig {
            fail_fast: true,
            ..ValidationPipelineConfig::default()
        };
        let report = ValidationPipeline::default().run(&wall, ExecutionPhase::Pre, &config);
        assert_eq!(report.stages.len(), 1);
    }

    #[test]
    fn recovery_removes_degenerate_polygons() {
        let mut wall = healthy_wall();
        wall.solid_geometry.push(BimPolygon::new(
            vec![BimPoint::new(0.0, 0.0), BimPoint::new(0.0, 0.0), BimPoint::new(0.0, 0.0)],
            vec![],
        ));
        let report = ValidationPipeline::default().run(&wall, ExecutionPhase::Pre, &ValidationPipelineConfig::default());
        let (recovered, outcomes) = recover(&wall, &report, &RecoveryConfig::default());
        assert!(!outcomes.is_empty());
        assert!(recovered.solid_geometry.len() <= wall.solid_geometry.len());
    }

    #[test]
    fn minimal_reporting_level_strips_stage_detail() {
        let wall = healthy_wall();
        let config = ValidationPipelineConfig {
            reporting_level: ReportingLevel::Minimal,
            ..ValidationPipelineConfig::default()
        };
        let report = ValidationPipeline::default().run(&wall, ExecutionPhase::Pre, &config);
        assert!(report.stages.is_empty());
    }
}
