//! The engine context: owns every table and runs the per-query pipeline

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::config::CullingConfig;
use crate::connectivity::{ConnectivityGraph, GroupId, RoomId};
use crate::culling::{FrustumCuller, LodClassifier, LodLevel};
use crate::foundation::collections::LruCache;
use crate::foundation::math::{Mat4, Point3};
use crate::render::{BatchAggregator, BatchStats, RenderSubmission};
use crate::visibility::{ObserverKey, VisibilityOracle};
use crate::world::{
    GridCoordinate, Passability, TransparentPassability, WorldQuery, CARDINAL_OFFSETS,
};


/// Probes out of six that must hit something opaque before a cell counts
/// as enclosed
const ENCLOSURE_THRESHOLD: usize = 5;

/// How often opportunistic batch cleanup runs
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(5);

/// Read-only counters for diagnostic tooling.
#[derive(Debug, Clone, Copy)]
pub struct StatsSnapshot {
    /// Rooms discovered since the last clear
    pub room_count: usize,
    /// Connectivity groups after unioning
    pub group_count: usize,
    /// Entries in the per-observer region cache
    pub cached_regions: usize,
    /// Entries in the per-coordinate occlusion cache
    pub occlusion_cache_len: usize,
    /// Batching counters
    pub batches: BatchStats,
    /// Current adaptive LOD bias
    pub lod_bias: f32,
}

/// One culling context per world instance.
///
/// Owns the connectivity graph, the visibility oracle, the frustum and LOD
/// state, the per-coordinate occlusion cache, and the batch aggregator.
/// All methods take `&self`; interior locks keep the render and simulation
/// threads from corrupting the tables. Tear the whole thing down with
/// [`clear_all`](Self::clear_all) on world unload.
pub struct CullingEngine {
    config: CullingConfig,
    graph: Arc<ConnectivityGraph>,
    oracle: VisibilityOracle,
    frustum: RwLock<FrustumCuller>,
    lod: RwLock<LodClassifier>,
    occlusion_cache: Mutex<LruCache<GridCoordinate, bool>>,
    batches: BatchAggregator,
    last_maintenance: Mutex<Instant>,
}

impl CullingEngine {
    /// Build an engine from validated settings with the default
    /// passability rule (opaque blocks sight, glass-class does not).
    pub fn new(config: CullingConfig) -> Self {
        Self::with_passability(config, Arc::new(TransparentPassability::default()), 0)
    }

    /// Build an engine with a custom passability strategy and a world key
    /// that seeds room identity (distinct per world instance).
    pub fn with_passability(
        config: CullingConfig,
        passability: Arc<dyn Passability>,
        world_key: u64,
    ) -> Self {
        let config = config.validated();
        let graph = Arc::new(ConnectivityGraph::new(
            Arc::clone(&passability),
            config.rooms.max_room_size,
            world_key,
        ));
        let oracle = VisibilityOracle::new(Arc::clone(&graph), passability, &config.cache);
        let lod = RwLock::new(LodClassifier::new(config.lod.clone()));
        let occlusion_cache = Mutex::new(LruCache::new(config.cache.occlusion_cache_size));
        let batches = BatchAggregator::new(&config.batching);
        Self {
            config,
            graph,
            oracle,
            frustum: RwLock::new(FrustumCuller::new()),
            lod,
            occlusion_cache,
            batches,
            last_maintenance: Mutex::new(Instant::now()),
        }
    }

    /// The settings this engine was built with (post-validation).
    pub fn config(&self) -> &CullingConfig {
        &self.config
    }

    /// Register a new observer at a starting position.
    pub fn register_observer(&self, position: GridCoordinate) -> ObserverKey {
        self.oracle.register_observer(position)
    }

    /// Remove an observer and its cached state.
    pub fn remove_observer(&self, key: ObserverKey) {
        self.oracle.remove_observer(key);
    }

    /// Feed an observer's current position, refreshing its cached group
    /// membership if it moved or its cooldown elapsed.
    pub fn update_observer(&self, world: &dyn WorldQuery, key: ObserverKey, position: GridCoordinate) {
        self.oracle.update_observer(world, key, position);
    }

    /// Per-frame entry point: rebuild the frustum, feed the adaptive
    /// bias, expire stale region-visibility entries, and run
    /// opportunistic batch maintenance.
    pub fn begin_frame(&self, world: &dyn WorldQuery, projection: &Mat4, view: &Mat4, frame_ms: f32) {
        if self.config.enable_frustum_culling {
            self.frustum.write().update(projection, view);
        }
        if self.config.enable_lod {
            self.lod.write().observe_frame(frame_ms);
        }
        self.oracle.purge_stale(world.current_tick());
        self.run_maintenance();
    }

    fn run_maintenance(&self) {
        let mut last = self.last_maintenance.lock();
        if last.elapsed() < MAINTENANCE_INTERVAL {
            return;
        }
        *last = Instant::now();
        drop(last);
        let evicted = self.batches.cleanup();
        if evicted > 0 {
            log::debug!("batch maintenance evicted {evicted} idle batches");
        }
    }

    /// Whether a cell should be drawn for this observer. Runs the full
    /// pipeline and, on a visible verdict, forwards the cell to the batch
    /// aggregator.
    pub fn should_render(
        &self,
        world: &dyn WorldQuery,
        coord: GridCoordinate,
        observer_pos: Point3,
        observer: ObserverKey,
    ) -> bool {
        if !self.config.enable_culling {
            return true;
        }
        let visible = !self.is_position_occluded(world, coord, observer_pos, observer);
        if visible && self.config.enable_batching {
            match world.material_at(coord) {
                Ok(material) => {
                    let lod = self.classify(coord.center(), observer_pos);
                    self.batches.insert(world, coord, material, lod);
                }
                Err(e) => {
                    log::warn!("material lookup failed for batch insert at {coord:?}: {e}");
                }
            }
        }
        visible
    }

    /// The occlusion pipeline, cheapest test first. Every failure path
    /// resolves to "not occluded".
    pub fn is_position_occluded(
        &self,
        world: &dyn WorldQuery,
        coord: GridCoordinate,
        observer_pos: Point3,
        observer: ObserverKey,
    ) -> bool {
        if self.config.enable_frustum_culling && !self.frustum.read().test_cell(coord) {
            return true;
        }
        if self.config.enable_lod
            && self.classify(coord.center(), observer_pos) == LodLevel::Culled
        {
            return true;
        }

        let observer_cell = GridCoordinate::containing(observer_pos);
        if !self.oracle.is_visible(world, coord, observer_cell, observer) {
            return true;
        }

        if let Some(&occluded) = self.occlusion_cache.lock().get(&coord) {
            return occluded;
        }

        let radius = self.config.cache.force_visible_radius;
        if coord.distance_squared_to_point(observer_pos) <= radius * radius {
            self.occlusion_cache.lock().insert(coord, false);
            return false;
        }

        let occluded =
            self.is_enclosed(world, coord) && !self.oracle.is_visible_from(world, coord, observer_cell);
        self.occlusion_cache.lock().insert(coord, occluded);
        occluded
    }

    /// Entity-style query for a bounding sphere. Runs the cheap frame
    /// tests always; the detailed per-cell pipeline only applies beyond
    /// 32 units, so nearby entities never pop out.
    pub fn should_render_sphere(
        &self,
        world: &dyn WorldQuery,
        center: Point3,
        radius: f32,
        observer_pos: Point3,
        observer: ObserverKey,
    ) -> bool {
        if !self.config.enable_culling {
            return true;
        }
        if self.config.enable_frustum_culling && !self.frustum.read().test_sphere(center, radius) {
            return false;
        }
        if self.config.enable_lod && self.classify(center, observer_pos) == LodLevel::Culled {
            return false;
        }
        const DETAIL_DISTANCE_SQUARED: f32 = 32.0 * 32.0;
        if (center - observer_pos).norm_squared() <= DETAIL_DISTANCE_SQUARED {
            return true;
        }
        let coord = GridCoordinate::containing(center);
        !self.is_position_occluded(world, coord, observer_pos, observer)
    }

    /// Six axis-aligned probes at the configured radius; enclosed when at
    /// least five land in something opaque. Query failures count as open.
    fn is_enclosed(&self, world: &dyn WorldQuery, coord: GridCoordinate) -> bool {
        let radius = self.config.cache.probe_radius;
        let mut opaque = 0;
        for (dx, dy, dz) in CARDINAL_OFFSETS {
            let probe = coord.offset(dx * radius, dy * radius, dz * radius);
            match world.material_at(probe) {
                Ok(material) if world.is_opaque(material) => opaque += 1,
                Ok(_) => {}
                Err(e) => {
                    log::warn!("enclosure probe failed at {probe:?}: {e}");
                }
            }
        }
        opaque >= ENCLOSURE_THRESHOLD
    }

    fn classify(&self, position: Point3, observer_pos: Point3) -> LodLevel {
        if self.config.enable_lod {
            self.lod.read().classify(position, observer_pos)
        } else {
            LodLevel::High
        }
    }

    /// Re-batch members against the current observer position and take a
    /// snapshot of the drawable set.
    pub fn collect_submission(&self, observer_pos: Point3) -> RenderSubmission {
        if self.config.enable_lod {
            self.batches.update(&self.lod.read(), observer_pos);
        }
        self.batches.collect_submission()
    }

    /// Drop every table: rooms, groups, caches, batches, LOD bias. Call
    /// on world unload or reload.
    pub fn clear_all(&self) {
        self.graph.clear();
        self.oracle.clear_region_cache();
        self.occlusion_cache.lock().clear();
        self.batches.clear();
        self.lod.write().reset_bias();
        self.frustum.write().invalidate();
    }

    /// Drop only the per-observer region cache.
    pub fn clear_region_cache(&self) {
        self.oracle.clear_region_cache();
    }

    /// Room identity at a coordinate, if one has been discovered.
    pub fn room_id_at(&self, coord: GridCoordinate) -> Option<RoomId> {
        self.graph.known_room_of(coord)
    }

    /// Group identity at a coordinate, if a room has been discovered.
    pub fn group_id_at(&self, coord: GridCoordinate) -> Option<GroupId> {
        self.graph.known_room_of(coord).map(|room| self.graph.group_of(room))
    }

    /// Read-only counters for diagnostics.
    pub fn stats_snapshot(&self) -> StatsSnapshot {
        let graph = self.graph.stats();
        StatsSnapshot {
            room_count: graph.room_count,
            group_count: graph.group_count,
            cached_regions: self.oracle.cached_regions(),
            occlusion_cache_len: self.occlusion_cache.lock().len(),
            batches: self.batches.stats(),
            lod_bias: self.lod.read().bias(),
        }
    }
}
