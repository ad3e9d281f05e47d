//! Per-observer, per-region visibility cache with tick-based expiry

use std::collections::HashMap;

use parking_lot::RwLock;

use super::ObserverKey;
use crate::world::RegionCoord;

/// Caches visibility verdicts per (region, observer) pair.
///
/// Entries carry the tick they were recorded at and expire after a
/// configurable time-to-live, so a stale verdict can survive at most one
/// TTL window after the world changes underneath it.
pub struct RegionVisibilityCache {
    entries: RwLock<HashMap<(RegionCoord, ObserverKey), (bool, u64)>>,
    ttl_ticks: u64,
}

impl RegionVisibilityCache {
    /// Create an empty cache whose entries expire after `ttl_ticks`.
    pub fn new(ttl_ticks: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl_ticks,
        }
    }

    /// Look up a cached verdict, treating expired entries as misses.
    pub fn get(&self, region: RegionCoord, observer: ObserverKey, current_tick: u64) -> Option<bool> {
        let entries = self.entries.read();
        let (visible, recorded_tick) = *entries.get(&(region, observer))?;
        if current_tick.saturating_sub(recorded_tick) >= self.ttl_ticks {
            return None;
        }
        Some(visible)
    }

    /// Record a verdict for a (region, observer) pair at the given tick.
    pub fn insert(&self, region: RegionCoord, observer: ObserverKey, visible: bool, tick: u64) {
        self.entries.write().insert((region, observer), (visible, tick));
    }

    /// Drop every entry that has outlived the TTL.
    pub fn purge_stale(&self, current_tick: u64) {
        self.entries
            .write()
            .retain(|_, (_, recorded)| current_tick.saturating_sub(*recorded) < self.ttl_ticks);
    }

    /// Drop every entry belonging to the given observer.
    pub fn forget_observer(&self, observer: ObserverKey) {
        self.entries.write().retain(|(_, key), _| *key != observer);
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of live entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;

    fn observer_keys(count: usize) -> Vec<ObserverKey> {
        let mut map: SlotMap<ObserverKey, ()> = SlotMap::with_key();
        (0..count).map(|_| map.insert(())).collect()
    }

    fn observer_key() -> ObserverKey {
        observer_keys(1)[0]
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = RegionVisibilityCache::new(60);
        let observer = observer_key();
        let region = RegionCoord { x: 2, z: -1 };
        cache.insert(region, observer, true, 100);
        assert_eq!(cache.get(region, observer, 130), Some(true));
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = RegionVisibilityCache::new(60);
        let observer = observer_key();
        let region = RegionCoord { x: 0, z: 0 };
        cache.insert(region, observer, false, 100);
        assert_eq!(cache.get(region, observer, 160), None);
    }

    #[test]
    fn test_purge_drops_only_stale_entries() {
        let cache = RegionVisibilityCache::new(60);
        let observer = observer_key();
        cache.insert(RegionCoord { x: 0, z: 0 }, observer, true, 10);
        cache.insert(RegionCoord { x: 1, z: 0 }, observer, true, 80);
        cache.purge_stale(100);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(RegionCoord { x: 1, z: 0 }, observer, 100), Some(true));
    }

    #[test]
    fn test_forget_observer() {
        let cache = RegionVisibilityCache::new(60);
        let keys = observer_keys(2);
        let (first, second) = (keys[0], keys[1]);
        cache.insert(RegionCoord { x: 0, z: 0 }, first, true, 0);
        cache.insert(RegionCoord { x: 0, z: 0 }, second, false, 0);
        cache.forget_observer(first);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(RegionCoord { x: 0, z: 0 }, second, 1), Some(false));
    }
}
