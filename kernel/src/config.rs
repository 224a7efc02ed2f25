//! Kernel-wide configuration (spec §6 "Configuration").
//!
//! Mirrors the `GeometryRouter::with_units`/`with_scale` builder-setter
//! convention from the teacher's router, but as a single plain struct since
//! the kernel has no entity-routing concerns of its own.

use serde::{Deserialize, Serialize};

/// Reporting verbosity for [`crate::validation::ValidationReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportingLevel {
    /// Pass/fail only.
    Minimal,
    /// Errors and warnings.
    Normal,
    /// Errors, warnings, per-stage metrics and recommendations.
    Comprehensive,
}

impl Default for ReportingLevel {
    fn default() -> Self {
        ReportingLevel::Normal
    }
}

/// Cache sizing/eviction knobs shared by the intersection and tolerance caches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub max_memory_mb: f64,
    pub ttl_minutes: f64,
    /// Advisory only — the kernel owns no timers (spec §5); the host decides
    /// how often to call `sweep_expired`.
    pub cleanup_interval_minutes: f64,
    pub enable_statistics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            max_memory_mb: 64.0,
            ttl_minutes: 30.0,
            cleanup_interval_minutes: 5.0,
            enable_statistics: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelConfig {
    pub tolerance: f64,
    pub max_complexity: f64,
    pub miter_limit: f64,
    pub extreme_angle_threshold_deg: f64,
    pub parallel_overlap_threshold: f64,
    /// Scheduling hint only — see spec §5. The kernel never spawns threads.
    pub enable_parallel_processing: bool,
    pub spatial_indexing_enabled: bool,
    pub optimization_enabled: bool,
    pub enable_auto_recovery: bool,
    pub max_recovery_attempts: usize,
    pub quality_threshold: f64,
    pub fail_fast: bool,
    pub reporting_level: ReportingLevel,
    pub enable_pre_validation: bool,
    pub enable_post_validation: bool,
    pub cache: CacheConfig,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_complexity: 50_000.0,
            miter_limit: 10.0,
            extreme_angle_threshold_deg: 15.0,
            parallel_overlap_threshold: 0.9,
            enable_parallel_processing: false,
            spatial_indexing_enabled: true,
            optimization_enabled: true,
            enable_auto_recovery: true,
            max_recovery_attempts: 5,
            quality_threshold: 0.7,
            fail_fast: false,
            reporting_level: ReportingLevel::Normal,
            enable_pre_validation: true,
            enable_post_validation: true,
            cache: CacheConfig::default(),
        }
    }
}

impl KernelConfig {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_miter_limit(mut self, miter_limit: f64) -> Self {
        self.miter_limit = miter_limit;
        self
    }

    pub fn with_reporting_level(mut self, level: ReportingLevel) -> Self {
        self.reporting_level = level;
        self
    }
}
