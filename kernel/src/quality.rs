//! Quality metrics snapshot attached to a [`crate::wall::WallSolid`] and
//! surfaced by the validation pipeline (spec §3 "QualityMetrics").

use serde::{Deserialize, Serialize};

/// Scalar scores and counts describing how "clean" a solid's geometry is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub geometric_accuracy: f64,
    pub topological_consistency: f64,
    pub manufacturability: f64,
    pub architectural_compliance: f64,
    pub sliver_face_count: usize,
    pub micro_gap_count: usize,
    pub self_intersection_count: usize,
    pub degenerate_element_count: usize,
    pub complexity_measure: f64,
    pub processing_efficiency: f64,
    pub memory_usage_estimate: f64,
}

impl Default for QualityMetrics {
    fn default() -> Self {
        Self {
            geometric_accuracy: 1.0,
            topological_consistency: 1.0,
            manufacturability: 1.0,
            architectural_compliance: 1.0,
            sliver_face_count: 0,
            micro_gap_count: 0,
            self_intersection_count: 0,
            degenerate_element_count: 0,
            complexity_measure: 0.0,
            processing_efficiency: 1.0,
            memory_usage_estimate: 0.0,
        }
    }
}

impl QualityMetrics {
    /// Clamps every scalar score to `[0, 1]`; counts and measures are left
    /// as-is since they have no natural upper bound.
    pub fn clamped(mut self) -> Self {
        self.geometric_accuracy = self.geometric_accuracy.clamp(0.0, 1.0);
        self.topological_consistency = self.topological_consistency.clamp(0.0, 1.0);
        self.manufacturability = self.manufacturability.clamp(0.0, 1.0);
        self.architectural_compliance = self.architectural_compliance.clamp(0.0, 1.0);
        self.processing_efficiency = self.processing_efficiency.clamp(0.0, 1.0);
        self
    }

    /// A single overall score: the mean of the four `[0,1]` quality scores,
    /// penalized by the presence of any defect counts.
    pub fn overall_score(&self) -> f64 {
        let mean = (self.geometric_accuracy
            + self.topological_consistency
            + self.manufacturability
            + self.architectural_compliance)
            / 4.0;
        let defects = self.sliver_face_count
            + self.micro_gap_count
            + self.self_intersection_count
            + self.degenerate_element_count;
        if defects == 0 {
            mean
        } else {
            (mean - 0.05 * defects as f64).max(0.0)
        }
    }
}
