//! Adaptive Tolerance Manager (spec §4.1, ≈5% of budget).
//!
//! A pure, deterministic function of (thickness, document precision, local
//! angle, operation context) with an LRU-bounded memoization cache and a
//! bounded failure-adjustment history, following the same
//! `RefCell<FxHashMap<..>>` caching idiom the teacher's `GeometryRouter` uses
//! for mesh/geometry caches.

use std::cell::RefCell;
use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

const BASE_TOLERANCE: f64 = 1e-6;
const MAX_CACHE_ENTRIES: usize = 4096;
const MAX_FAILURE_HISTORY: usize = 256;

/// The operation a tolerance request is being computed for; scales the base
/// tolerance differently per spec §4.1's context factor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToleranceContext {
    VertexMerge,
    Offset,
    Boolean,
    ShapeHealing,
}

impl ToleranceContext {
    fn factor(self) -> f64 {
        match self {
            ToleranceContext::VertexMerge => 2.0,
            ToleranceContext::Offset => 1.0,
            ToleranceContext::Boolean => 1.5,
            ToleranceContext::ShapeHealing => 3.0,
        }
    }
}

fn angle_factor(local_angle_rad: f64) -> f64 {
    let deg = local_angle_rad.to_degrees().abs();
    if deg < 15.0 {
        5.0
    } else if deg < 30.0 {
        3.0
    } else if deg < 60.0 {
        1.5
    } else if deg <= 120.0 {
        1.0
    } else {
        0.8
    }
}

/// A record of a failure-driven tolerance adjustment (bounded history).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToleranceAdjustment {
    pub previous: f64,
    pub adjusted: f64,
    pub suggested_adjustment: f64,
    pub severity: f64,
}

/// Cache key: rounded, formatted inputs so that numerically-close requests
/// collapse onto the same entry (spec §4.1 "Caching").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ToleranceKey {
    thickness_2dp: i64,
    precision_exp: String,
    angle_exp: String,
    context: ToleranceContext,
    complexity_or_curvature_exp: Option<String>,
}

fn mantissa_exp(value: f64) -> String {
    format!("{:.6e}", value)
}

fn make_key(
    thickness: f64,
    doc_precision: f64,
    local_angle: f64,
    context: ToleranceContext,
    complexity_or_curvature: Option<f64>,
) -> ToleranceKey {
    ToleranceKey {
        thickness_2dp: (thickness * 100.0).round() as i64,
        precision_exp: mantissa_exp(doc_precision),
        angle_exp: mantissa_exp(local_angle),
        context,
        complexity_or_curvature_exp: complexity_or_curvature.map(mantissa_exp),
    }
}

/// Pure, cached tolerance calculator. Cheap to construct; one per host
/// session/document is the expected usage, matching the single
/// `IntersectionCache`-per-document pattern elsewhere in the kernel.
#[derive(Debug, Default)]
pub struct ToleranceManager {
    cache: RefCell<FxHashMap<ToleranceKey, f64>>,
    cache_order: RefCell<VecDeque<ToleranceKey>>,
    failure_history: RefCell<VecDeque<ToleranceAdjustment>>,
}

impl ToleranceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flushes the cache. Call this whenever document precision changes
    /// (spec §4.1: "Precision updates flush the cache.").
    pub fn on_precision_changed(&self) {
        self.cache.borrow_mut().clear();
        self.cache_order.borrow_mut().clear();
    }

    /// Core tolerance contract: `tolerance(thickness, docPrecision,
    /// localAngle, context) -> positive scalar`.
    pub fn calculate(
        &self,
        thickness: f64,
        doc_precision: f64,
        local_angle: f64,
        context: ToleranceContext,
    ) -> f64 {
        self.calculate_with_extra(thickness, doc_precision, local_angle, context, None)
    }

    /// Variant taking the optional curvature (offset context) or complexity
    /// (boolean context) scaling factor from spec §4.1.
    pub fn calculate_with_extra(
        &self,
        thickness: f64,
        doc_precision: f64,
        local_angle: f64,
        context: ToleranceContext,
        complexity_or_curvature: Option<f64>,
    ) -> f64 {
        let key = make_key(
            thickness,
            doc_precision,
            local_angle,
            context,
            complexity_or_curvature,
        );

        if let Some(&cached) = self.cache.borrow().get(&key) {
            return cached;
        }

        let result = self.compute(thickness, doc_precision, local_angle, context, complexity_or_curvature);
        self.insert_cache(key, result);
        result
    }

    fn compute(
        &self,
        thickness: f64,
        doc_precision: f64,
        local_angle: f64,
        context: ToleranceContext,
        complexity_or_curvature: Option<f64>,
    ) -> f64 {
        let mut t = BASE_TOLERANCE;
        t *= (doc_precision * 0.01).max(1.0);
        t *= ((thickness / 100.0).sqrt()).clamp(0.5, 2.0);
        t *= context.factor();
        t *= angle_factor(local_angle);

        if let Some(extra) = complexity_or_curvature {
            match context {
                ToleranceContext::Offset => {
                    t *= 1.0 + (1.0 + extra * 1000.0).log10();
                }
                ToleranceContext::Boolean => {
                    t *= 1.0 + (1.0f64.max(extra)).log10();
                }
                _ => {}
            }
        }

        clamp_tolerance(t, BASE_TOLERANCE, doc_precision)
    }

    fn insert_cache(&self, key: ToleranceKey, value: f64) {
        let mut cache = self.cache.borrow_mut();
        let mut order = self.cache_order.borrow_mut();
        if cache.len() >= MAX_CACHE_ENTRIES {
            if let Some(oldest) = order.pop_front() {
                cache.remove(&oldest);
            }
        }
        order.push_back(key.clone());
        cache.insert(key, value);
    }

    /// Failure-driven adjustment: `t * (1 + suggestedAdjustment) *
    /// max(1, severity)`, re-clamped, with the adjustment logged.
    pub fn adjust_for_failure(
        &self,
        current: f64,
        doc_precision: f64,
        suggested_adjustment: f64,
        severity: f64,
    ) -> f64 {
        let adjusted = clamp_tolerance(
            current * (1.0 + suggested_adjustment) * severity.max(1.0),
            BASE_TOLERANCE,
            doc_precision,
        );

        let mut history = self.failure_history.borrow_mut();
        if history.len() >= MAX_FAILURE_HISTORY {
            history.pop_front();
        }
        history.push_back(ToleranceAdjustment {
            previous: current,
            adjusted,
            suggested_adjustment,
            severity,
        });

        adjusted
    }

    pub fn failure_history(&self) -> Vec<ToleranceAdjustment> {
        self.failure_history.borrow().iter().cloned().collect()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }
}

fn clamp_tolerance(t: f64, base_tol: f64, doc_precision: f64) -> f64 {
    let lower = base_tol.max(t * 0.1);
    let upper = (doc_precision * 10.0).min(t * 100.0);
    if upper < lower {
        lower
    } else {
        t.clamp(lower, upper)
    }
}
