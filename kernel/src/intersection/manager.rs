//! The Intersection Manager (spec §4.5 "Responsibilities").
//!
//! Creates, retrieves, updates and removes [`IntersectionData`] records
//! through the shared [`IntersectionCache`], while keeping secondary
//! indices by participating wall and by intersection type so the resolver
//! (§4.6) doesn't have to scan the whole cache.

use std::cell::RefCell;
use std::time::Duration;

use rustc_hash::FxHashMap;

use super::cache::{IntersectionCache, IntersectionKey, MiterKey};
use super::{IntersectionData, IntersectionType};
use crate::geom::BimPoint;
use crate::miter::MiterCalculation;

/// Owns the [`IntersectionCache`] plus the by-wall and by-type indices used
/// to answer "which intersections touch wall W" / "which are T-junctions"
/// without a linear cache scan.
pub struct IntersectionManager {
    cache: IntersectionCache,
    by_wall: RefCell<FxHashMap<u64, Vec<IntersectionKey>>>,
    by_type: RefCell<FxHashMap<IntersectionType, Vec<IntersectionKey>>>,
}

impl IntersectionManager {
    pub fn new(max_entries: usize, ttl_minutes: f64, track_stats: bool) -> Self {
        let ttl = if ttl_minutes > 0.0 {
            Some(Duration::from_secs_f64(ttl_minutes * 60.0))
        } else {
            None
        };
        Self {
            cache: IntersectionCache::new(max_entries, ttl, track_stats),
            by_wall: RefCell::new(FxHashMap::default()),
            by_type: RefCell::new(FxHashMap::default()),
        }
    }

    fn index(&self, key: &IntersectionKey, data: &IntersectionData) {
        let mut by_wall = self.by_wall.borrow_mut();
        for wall_id in &data.wall_ids {
            let entry = by_wall.entry(*wall_id).or_default();
            if !entry.contains(key) {
                entry.push(key.clone());
            }
        }
        let mut by_type = self.by_type.borrow_mut();
        let entry = by_type.entry(data.intersection_type).or_default();
        if !entry.contains(key) {
            entry.push(key.clone());
        }
    }

    fn deindex(&self, key: &IntersectionKey, data: &IntersectionData) {
        let mut by_wall = self.by_wall.borrow_mut();
        for wall_id in &data.wall_ids {
            if let Some(keys) = by_wall.get_mut(wall_id) {
                keys.retain(|k| k != key);
            }
        }
        let mut by_type = self.by_type.borrow_mut();
        if let Some(keys) = by_type.get_mut(&data.intersection_type) {
            keys.retain(|k| k != key);
        }
    }

    /// Creates (or overwrites) an intersection record, keyed canonically on
    /// its sorted wall ids, type, rounded point, and tolerance.
    pub fn create(&self, data: IntersectionData, tolerance: f64) -> IntersectionKey {
        let key = data.cache_key(tolerance);
        if let Some(previous) = self.cache.get_intersection(&key) {
            self.deindex(&key, &previous);
        }
        self.index(&key, &data);
        self.cache.put_intersection(key.clone(), data);
        key
    }

    pub fn get(&self, key: &IntersectionKey) -> Option<IntersectionData> {
        self.cache.get_intersection(key)
    }

    /// Replaces an existing record atomically, per spec §5 ("updates
    /// replace the record atomically in the cache's map"). A no-op (not an
    /// error) if the key isn't present, per spec §4.5's null tolerance.
    pub fn update(&self, key: &IntersectionKey, data: IntersectionData) {
        if let Some(previous) = self.cache.get_intersection(key) {
            self.deindex(key, &previous);
        }
        self.index(key, &data);
        self.cache.put_intersection(key.clone(), data);
    }

    pub fn remove(&self, key: &IntersectionKey) {
        if let Some(data) = self.cache.get_intersection(key) {
            self.deindex(key, &data);
        }
        self.cache.remove_intersection(key);
    }

    pub fn by_wall(&self, wall_id: u64) -> Vec<IntersectionData> {
        self.by_wall
            .borrow()
            .get(&wall_id)
            .into_iter()
            .flatten()
            .filter_map(|k| self.cache.get_intersection(k))
            .collect()
    }

    pub fn by_type(&self, kind: IntersectionType) -> Vec<IntersectionData> {
        self.by_type
            .borrow()
            .get(&kind)
            .into_iter()
            .flatten()
            .filter_map(|k| self.cache.get_intersection(k))
            .collect()
    }

    pub fn get_or_compute_miter(
        &self,
        left: &BimPoint,
        right: &BimPoint,
        thickness: f64,
        tolerance: f64,
        compute: impl FnOnce() -> MiterCalculation,
    ) -> MiterCalculation {
        let key = MiterKey::new(left, right, thickness, tolerance);
        if let Some(cached) = self.cache.get_miter(&key) {
            return cached;
        }
        let calc = compute();
        self.cache.put_miter(key, calc.clone());
        calc
    }

    /// Host-driven TTL sweep; the kernel owns no timer (spec §5).
    pub fn sweep_expired(&self) {
        self.cache.sweep();
    }

    pub fn trim_to(&self, target_capacity: usize) {
        self.cache.trim_to(target_capacity);
    }

    pub fn statistics(&self) -> super::CacheStatistics {
        self.cache.statistics()
    }

    /// Stops any host-visible periodic behaviour. The kernel owns no timer
    /// thread to begin with (spec §5), so disposal is just a cache clear.
    pub fn dispose(&self) {
        self.cache.clear();
        self.by_wall.borrow_mut().clear();
        self.by_type.borrow_mut().clear();
    }
}
