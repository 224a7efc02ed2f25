//! Recommendation generation for comprehensive validation reports
//! (spec §4.10 "comprehensive reporting"; supplemented per `SPEC_FULL.md`).
//!
//! A small query-oriented helper rather than ad hoc string assembly,
//! grounded in the `ValidationReport::errors_of`/`no_errors_of` shape from
//! the retrieval pack's waffle-iron kernel reference.

use std::collections::HashMap;

use crate::error::ErrorKind;
use crate::validation::ValidationReport;

/// Turns repeated error kinds across a report's stages into human-readable
/// suggestions for the host to surface.
pub fn suggest(report: &ValidationReport) -> Vec<String> {
    let mut counts: HashMap<ErrorKind, usize> = HashMap::new();
    for stage in &report.stages {
        for finding in &stage.errors {
            *counts.entry(finding.kind).or_insert(0) += 1;
        }
    }

    let mut suggestions = Vec::new();

    if counts.get(&ErrorKind::SelfIntersection).copied().unwrap_or(0) >= 3 {
        suggestions.push(
            "repeated self-intersections detected; consider lowering max_complexity and \
             pre-simplifying baselines before building BIM solids"
                .into(),
        );
    }
    if counts.get(&ErrorKind::ToleranceExceeded).copied().unwrap_or(0) >= 2 {
        suggestions.push(
            "tolerance was exceeded more than once; widen the document precision or the base \
             tolerance for this operation context"
                .into(),
        );
    }
    if counts.get(&ErrorKind::ComplexityExceeded).copied().unwrap_or(0) > 0 {
        suggestions.push("input complexity exceeded the configured maximum; simplify before retrying".into());
    }
    if counts.get(&ErrorKind::BooleanFailure).copied().unwrap_or(0) > 0 {
        suggestions.push("boolean operation failed even after retry; check for degenerate overlap regions".into());
    }
    if counts.get(&ErrorKind::OffsetFailure).copied().unwrap_or(0) > 0 {
        suggestions.push("offset engine fell back to straight displacement; review sharp baseline corners".into());
    }
    if counts.get(&ErrorKind::DuplicateVertices).copied().unwrap_or(0) > 0 {
        suggestions.push("duplicate vertices found; run shape healing before validation".into());
    }

    suggestions
}
