//! Typed errors for structural kernel failures.
//!
//! Per spec: routine numerical failures (offset retry, boolean retry) never
//! produce an `Err` — they surface as `warnings` on the relevant result
//! struct with `fallback_used = true`. Only invariant-breaking conditions
//! (null wall list, insufficient walls for a junction kind, a missing
//! required intersection point) raise a `KernelError`.

use thiserror::Error;

/// Result type for kernel operations that can fail structurally.
pub type KernelResult<T> = std::result::Result<T, KernelError>;

/// Classification of a validation/recovery finding (spec §4.10's error taxonomy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DegenerateGeometry,
    SelfIntersection,
    NumericalInstability,
    TopologyError,
    DuplicateVertices,
    BooleanFailure,
    OffsetFailure,
    ToleranceExceeded,
    ComplexityExceeded,
    InvalidParameter,
    ValidationFailure,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::DegenerateGeometry => "degenerate-geometry",
            ErrorKind::SelfIntersection => "self-intersection",
            ErrorKind::NumericalInstability => "numerical-instability",
            ErrorKind::TopologyError => "topology-error",
            ErrorKind::DuplicateVertices => "duplicate-vertices",
            ErrorKind::BooleanFailure => "boolean-failure",
            ErrorKind::OffsetFailure => "offset-failure",
            ErrorKind::ToleranceExceeded => "tolerance-exceeded",
            ErrorKind::ComplexityExceeded => "complexity-exceeded",
            ErrorKind::InvalidParameter => "invalid-parameter",
            ErrorKind::ValidationFailure => "validation-failure",
        };
        f.write_str(s)
    }
}

/// A typed, structural kernel error. Carries enough context for the host to
/// decide whether to retry, recover, or surface the failure to the user.
#[derive(Error, Debug)]
#[error("{operation}: {kind} — {summary} (suggested fix: {suggested_fix})")]
pub struct KernelError {
    pub kind: ErrorKind,
    pub operation: String,
    pub summary: String,
    pub suggested_fix: String,
    pub recoverable: bool,
}

impl KernelError {
    pub fn new(
        kind: ErrorKind,
        operation: impl Into<String>,
        summary: impl Into<String>,
        suggested_fix: impl Into<String>,
        recoverable: bool,
    ) -> Self {
        Self {
            kind,
            operation: operation.into(),
            summary: summary.into(),
            suggested_fix: suggested_fix.into(),
            recoverable,
        }
    }

    pub fn invalid_parameter(operation: impl Into<String>, summary: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::InvalidParameter,
            operation,
            summary,
            "supply a positive, finite value",
            true,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_fix() {
        let err = KernelError::invalid_parameter("build_wall_solid", "thickness <= 0");
        let rendered = err.to_string();
        assert!(rendered.contains("invalid-parameter"));
        assert!(rendered.contains("thickness <= 0"));
    }
}
