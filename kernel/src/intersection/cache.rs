//! The intersection/miter cache (spec §4.5).
//!
//! Two `RefCell<FxHashMap<..>>` stores following the same interior-mutable
//! caching idiom as `GeometryRouter::geometry_hash_cache`, plus LRU eviction,
//! TTL expiry driven by a host-called sweep (no internal timer thread — see
//! the concurrency model), and optional hit/miss statistics.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::{IntersectionData, IntersectionType};
use crate::geom::BimPoint;
use crate::miter::MiterCalculation;

fn round6(v: f64) -> i64 {
    (v * 1_000_000.0).round() as i64
}

/// `"intersection_" + sortedWallIds + "_" + type + "_" + roundedPoint + "_" + tolerance`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntersectionKey(String);

impl IntersectionKey {
    pub fn new(wall_ids: &[u64], kind: IntersectionType, point: &BimPoint, tolerance: f64) -> Self {
        let mut sorted = wall_ids.to_vec();
        sorted.sort_unstable();
        let ids = sorted.iter().map(|id| id.to_string()).collect::<Vec<_>>().join("_");
        Self(format!(
            "intersection_{}_{}_{}_{}_{}",
            ids,
            kind.tag(),
            round6(point.x),
            round6(point.y),
            round6(tolerance)
        ))
    }
}

/// `"miter_" + roundedPoints + "_" + roundedThickness + "_" + tolerance`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MiterKey(String);

impl MiterKey {
    pub fn new(left: &BimPoint, right: &BimPoint, thickness: f64, tolerance: f64) -> Self {
        Self(format!(
            "miter_{}_{}_{}_{}_{}_{}",
            round6(left.x),
            round6(left.y),
            round6(right.x),
            round6(right.y),
            round6(thickness),
            round6(tolerance)
        ))
    }
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Aggregate cache statistics (spec §4.5); tracking can be disabled for a
/// zero-overhead mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub intersection_entries: usize,
    pub miter_entries: usize,
}

impl CacheStatistics {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct IntersectionCache {
    intersections: RefCell<FxHashMap<IntersectionKey, Entry<IntersectionData>>>,
    intersection_order: RefCell<VecDeque<IntersectionKey>>,
    miters: RefCell<FxHashMap<MiterKey, Entry<MiterCalculation>>>,
    miter_order: RefCell<VecDeque<MiterKey>>,
    max_entries: usize,
    ttl: Option<Duration>,
    track_stats: bool,
    hits: RefCell<u64>,
    misses: RefCell<u64>,
}

impl IntersectionCache {
    pub fn new(max_entries: usize, ttl: Option<Duration>, track_stats: bool) -> Self {
        Self {
            intersections: RefCell::new(FxHashMap::default()),
            intersection_order: RefCell::new(VecDeque::new()),
            miters: RefCell::new(FxHashMap::default()),
            miter_order: RefCell::new(VecDeque::new()),
            max_entries,
            ttl,
            track_stats,
            hits: RefCell::new(0),
            misses: RefCell::new(0),
        }
    }

    pub fn get_intersection(&self, key: &IntersectionKey) -> Option<IntersectionData> {
        let found = self.intersections.borrow().get(key).map(|e| e.value.clone());
        if self.track_stats {
            if found.is_some() {
                *self.hits.borrow_mut() += 1;
            } else {
                *self.misses.borrow_mut() += 1;
            }
        }
        found
    }

    pub fn put_intersection(&self, key: IntersectionKey, data: IntersectionData) {
        let mut map = self.intersections.borrow_mut();
        let mut order = self.intersection_order.borrow_mut();
        if !map.contains_key(&key) && map.len() >= self.max_entries {
            if let Some(oldest) = order.pop_front() {
                map.remove(&oldest);
            }
        }
        order.push_back(key.clone());
        map.insert(
            key,
            Entry {
                value: data,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn remove_intersection(&self, key: &IntersectionKey) {
        self.intersections.borrow_mut().remove(key);
    }

    pub fn get_miter(&self, key: &MiterKey) -> Option<MiterCalculation> {
        let found = self.miters.borrow().get(key).map(|e| e.value.clone());
        if self.track_stats {
            if found.is_some() {
                *self.hits.borrow_mut() += 1;
            } else {
                *self.misses.borrow_mut() += 1;
            }
        }
        found
    }

    pub fn put_miter(&self, key: MiterKey, calc: MiterCalculation) {
        let mut map = self.miters.borrow_mut();
        let mut order = self.miter_order.borrow_mut();
        if !map.contains_key(&key) && map.len() >= self.max_entries {
            if let Some(oldest) = order.pop_front() {
                map.remove(&oldest);
            }
        }
        order.push_back(key.clone());
        map.insert(
            key,
            Entry {
                value: calc,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Removes entries past TTL. The host calls this on whatever cadence it
    /// likes (spec §5: the kernel owns no timer thread); `ttl = None`
    /// disables expiry entirely.
    pub fn sweep(&self) {
        let Some(ttl) = self.ttl else { return };
        let now = Instant::now();

        self.intersections
            .borrow_mut()
            .retain(|_, entry| now.duration_since(entry.inserted_at) < ttl);
        self.miters
            .borrow_mut()
            .retain(|_, entry| now.duration_since(entry.inserted_at) < ttl);

        let live_intersections: std::collections::HashSet<_> =
            self.intersections.borrow().keys().cloned().collect();
        self.intersection_order
            .borrow_mut()
            .retain(|k| live_intersections.contains(k));

        let live_miters: std::collections::HashSet<_> = self.miters.borrow().keys().cloned().collect();
        self.miter_order.borrow_mut().retain(|k| live_miters.contains(k));
    }

    /// Trims both maps down to `target_capacity` entries under memory
    /// pressure, evicting oldest-first.
    pub fn trim_to(&self, target_capacity: usize) {
        while self.intersections.borrow().len() > target_capacity {
            let oldest = self.intersection_order.borrow_mut().pop_front();
            match oldest {
                Some(key) => {
                    self.intersections.borrow_mut().remove(&key);
                }
                None => break,
            }
        }
        while self.miters.borrow().len() > target_capacity {
            let oldest = self.miter_order.borrow_mut().pop_front();
            match oldest {
                Some(key) => {
                    self.miters.borrow_mut().remove(&key);
                }
                None => break,
            }
        }
    }

    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics {
            hits: *self.hits.borrow(),
            misses: *self.misses.borrow(),
            intersection_entries: self.intersections.borrow().len(),
            miter_entries: self.miters.borrow().len(),
        }
    }

    pub fn clear(&self) {
        self.intersections.borrow_mut().clear();
        self.intersection_order.borrow_mut().clear();
        self.miters.borrow_mut().clear();
        self.miter_order.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miter::CalculationMethod;
    use crate::offset::JoinType;

    fn sample_intersection() -> IntersectionData {
        IntersectionData::new(
            IntersectionType::TJunction,
            vec![3, 1, 2],
            BimPoint::new(5.0, 5.0),
            "sequential_union",
        )
    }

    #[test]
    fn wall_id_ordering_does_not_affect_cache_key() {
        let point = BimPoint::new(1.0, 2.0);
        let a = IntersectionKey::new(&[3, 1, 2], IntersectionType::TJunction, &point, 1e-6);
        let b = IntersectionKey::new(&[1, 2, 3], IntersectionType::TJunction, &point, 1e-6);
        assert_eq!(a, b);
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = IntersectionCache::new(16, None, true);
        let data = sample_intersection();
        let key = data.cache_key(1e-6);
        cache.put_intersection(key.clone(), data.clone());
        let fetched = cache.get_intersection(&key).unwrap();
        assert_eq!(fetched.id, data.id);
        assert_eq!(cache.statistics().hits, 1);
    }

    #[test]
    fn miss_is_recorded() {
        let cache = IntersectionCache::new(16, None, true);
        let missing_key = IntersectionKey::new(&[9], IntersectionType::LJunction, &BimPoint::new(0.0, 0.0), 1e-6);
        assert!(cache.get_intersection(&missing_key).is_none());
        assert_eq!(cache.statistics().misses, 1);
    }

    #[test]
    fn lru_eviction_drops_oldest_when_full() {
        let cache = IntersectionCache::new(2, None, false);
        for i in 0..3u64 {
            let data = IntersectionData::new(
                IntersectionType::LJunction,
                vec![i],
                BimPoint::new(i as f64, 0.0),
                "test",
            );
            cache.put_intersection(data.cache_key(1e-6), data);
        }
        assert_eq!(cache.statistics().intersection_entries, 2);
    }

    #[test]
    fn ttl_sweep_removes_expired_entries() {
        let cache = IntersectionCache::new(16, Some(Duration::from_millis(1)), false);
        let data = sample_intersection();
        cache.put_intersection(data.cache_key(1e-6), data);
        std::thread::sleep(Duration::from_millis(5));
        cache.sweep();
        assert_eq!(cache.statistics().intersection_entries, 0);
    }

    #[test]
    fn miter_cache_round_trips() {
        let cache = IntersectionCache::new(16, None, true);
        let vertex = BimPoint::new(0.0, 0.0);
        let calc = MiterCalculation::new(
            BimPoint::new(1.0, 0.0),
            BimPoint::new(-1.0, 0.0),
            &vertex,
            0.0,
            JoinType::Miter,
            CalculationMethod::ExactBisector,
            1e-6,
        );
        let key = MiterKey::new(&calc.left_intersection, &calc.right_intersection, 200.0, 1e-6);
        cache.put_miter(key.clone(), calc);
        assert!(cache.get_miter(&key).is_some());
    }

    #[test]
    fn trim_to_reduces_size() {
        let cache = IntersectionCache::new(16, None, false);
        for i in 0..8u64 {
            let data = IntersectionData::new(
                IntersectionType::LJunction,
                vec![i],
                BimPoint::new(i as f64, 0.0),
                "test",
            );
            cache.put_intersection(data.cache_key(1e-6), data);
        }
        cache.trim_to(3);
        assert_eq!(cache.statistics().intersection_entries, 3);
    }
}
