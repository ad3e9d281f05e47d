//! Observer-aware visibility decisions layered on the connectivity graph

use std::sync::Arc;

use parking_lot::RwLock;
use slotmap::SlotMap;

use super::line_of_sight::{connected_by_door, has_line_of_sight};
use super::region_cache::RegionVisibilityCache;
use super::ObserverKey;
use crate::config::CacheConfig;
use crate::connectivity::{ConnectivityGraph, GroupId};
use crate::world::{GridCoordinate, Passability, WorldQuery};

/// Cached per-observer state: last resolved group, last position, and the
/// tick the group was last refreshed at.
#[derive(Debug, Clone, Copy)]
pub struct ObserverState {
    /// Group the observer was last known to stand in, if resolved
    pub group: Option<GroupId>,
    /// Cell the observer occupied when the group was resolved
    pub position: GridCoordinate,
    /// Tick of the last group refresh
    pub updated_tick: u64,
}

/// Answers "can this observer see that cell" using room connectivity,
/// a per-region verdict cache, and 3-D line-of-sight traces.
///
/// Every failure path resolves to "visible": a visibility subsystem that
/// errs toward hiding content produces permanent holes in the world,
/// while erring toward showing it only costs draw calls.
pub struct VisibilityOracle {
    graph: Arc<ConnectivityGraph>,
    passability: Arc<dyn Passability>,
    observers: RwLock<SlotMap<ObserverKey, ObserverState>>,
    region_cache: RegionVisibilityCache,
    cooldown_ticks: u64,
}

impl VisibilityOracle {
    /// Build an oracle over an existing connectivity graph. The
    /// passability strategy should be the same one the graph floods with,
    /// so sight lines and room walls agree on what blocks.
    pub fn new(
        graph: Arc<ConnectivityGraph>,
        passability: Arc<dyn Passability>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            graph,
            passability,
            observers: RwLock::new(SlotMap::with_key()),
            region_cache: RegionVisibilityCache::new(config.region_ttl_ticks),
            cooldown_ticks: config.observer_cooldown_ticks,
        }
    }

    /// Register a new observer and return its stable key.
    pub fn register_observer(&self, position: GridCoordinate) -> ObserverKey {
        self.observers.write().insert(ObserverState {
            group: None,
            position,
            updated_tick: 0,
        })
    }

    /// Remove an observer and its cached region verdicts.
    pub fn remove_observer(&self, key: ObserverKey) {
        self.observers.write().remove(key);
        self.region_cache.forget_observer(key);
    }

    /// Feed a new observer position, refreshing the cached group if the
    /// observer moved more than the epsilon or the cooldown elapsed.
    pub fn update_observer(&self, world: &dyn WorldQuery, key: ObserverKey, position: GridCoordinate) {
        let _ = self.observer_group(world, key, position);
    }

    /// Resolve the observer's current group, reusing the cached value
    /// while the observer stays within one cell of where it was last
    /// resolved and the cooldown window has not elapsed.
    fn observer_group(
        &self,
        world: &dyn WorldQuery,
        key: ObserverKey,
        position: GridCoordinate,
    ) -> Option<GroupId> {
        let tick = world.current_tick();
        {
            let observers = self.observers.read();
            let state = observers.get(key)?;
            let moved = state.position.distance_squared(position) > 1;
            let cooled = tick.saturating_sub(state.updated_tick) >= self.cooldown_ticks;
            if let Some(group) = state.group {
                if !moved && !cooled {
                    return Some(group);
                }
            }
        }

        let room = self.graph.room_of(world, position);
        let group = self.graph.group_of(room);
        if let Some(state) = self.observers.write().get_mut(key) {
            state.group = Some(group);
            state.position = position;
            state.updated_tick = tick;
        }
        Some(group)
    }

    /// Whether `observer` standing at `observer_pos` can see `target`.
    ///
    /// Decision order: unbounded rooms are always visible; differing
    /// groups are visible only through an open door on the segment; same
    /// group consults the region cache and falls back to a line-of-sight
    /// trace whose verdict is cached per (region, observer).
    pub fn is_visible(
        &self,
        world: &dyn WorldQuery,
        target: GridCoordinate,
        observer_pos: GridCoordinate,
        observer: ObserverKey,
    ) -> bool {
        let target_room = self.graph.room_of(world, target);
        if self.graph.is_unbounded(target_room) {
            return true;
        }
        let target_group = self.graph.group_of(target_room);

        let Some(observer_group) = self.observer_group(world, observer, observer_pos) else {
            // Unknown observer key: no basis for a cull decision.
            return true;
        };

        if observer_group != target_group {
            return connected_by_door(world, observer_pos, target);
        }

        let region = target.region();
        let tick = world.current_tick();
        if let Some(cached) = self.region_cache.get(region, observer, tick) {
            return cached;
        }
        let visible = has_line_of_sight(world, self.passability.as_ref(), observer_pos, target);
        self.region_cache.insert(region, observer, visible, tick);
        visible
    }

    /// Pure line-of-sight test with no observer identity and no caching.
    /// Used for one-off probes from a fixed origin.
    pub fn is_visible_from(
        &self,
        world: &dyn WorldQuery,
        target: GridCoordinate,
        origin: GridCoordinate,
    ) -> bool {
        has_line_of_sight(world, self.passability.as_ref(), origin, target)
    }

    /// Drop all cached region verdicts.
    pub fn clear_region_cache(&self) {
        self.region_cache.clear();
    }

    /// Drop expired region verdicts.
    pub fn purge_stale(&self, current_tick: u64) {
        self.region_cache.purge_stale(current_tick);
    }

    /// Number of cached region verdicts.
    pub fn cached_regions(&self) -> usize {
        self.region_cache.len()
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }
}
