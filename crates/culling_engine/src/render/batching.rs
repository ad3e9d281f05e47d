//! Groups visible cells into draw batches keyed by material, LOD, and region

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::config::BatchConfig;
use crate::culling::{LodClassifier, LodLevel};
use crate::foundation::math::Point3;
use crate::world::{GridCoordinate, MaterialClass, MaterialId, RegionCoord, WorldQuery};

/// Key a batch aggregates under: coarse material bucket, detail level,
/// and the 16x16 world region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchKey {
    /// Coarse material bucket so visually similar surfaces share a batch
    pub class: MaterialClass,
    /// Detail level of every member
    pub lod: LodLevel,
    /// World region the members lie in
    pub region: RegionCoord,
}

/// A bounded set of cells sharing one [`BatchKey`].
#[derive(Debug)]
pub struct RenderBatch {
    members: Vec<(GridCoordinate, MaterialId)>,
    dirty: bool,
    last_touched: Instant,
}

impl RenderBatch {
    fn new() -> Self {
        Self {
            members: Vec::new(),
            dirty: false,
            last_touched: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_touched = Instant::now();
    }

    /// Members currently in the batch.
    pub fn members(&self) -> &[(GridCoordinate, MaterialId)] {
        &self.members
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the batch holds no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether members changed since the flag was last cleared.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag after the host re-uploaded the batch.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

/// Everything judged drawable this frame: full batches plus the cells
/// whose batches were too small to be worth submitting as a unit.
#[derive(Debug, Default)]
pub struct RenderSubmission {
    /// Batches at or above the minimum population
    pub batches: Vec<(BatchKey, Vec<(GridCoordinate, MaterialId)>)>,
    /// Members of under-populated batches, drawn individually
    pub individual: Vec<(GridCoordinate, MaterialId)>,
}

/// Aggregate batching counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchStats {
    /// Number of batches currently held
    pub total_batches: usize,
    /// Batches at or above the minimum population
    pub active_batches: usize,
    /// Members across all batches
    pub total_members: usize,
    /// Members sitting in active batches
    pub batched_members: usize,
}

impl BatchStats {
    /// Fraction of members that actually draw batched, in `[0, 1]`.
    pub fn efficiency(&self) -> f32 {
        if self.total_members == 0 {
            0.0
        } else {
            self.batched_members as f32 / self.total_members as f32
        }
    }
}

/// Collects visible cells into draw batches and garbage-collects the ones
/// that fall idle.
pub struct BatchAggregator {
    batches: RwLock<HashMap<BatchKey, RenderBatch>>,
    min_batch_size: usize,
    max_batch_size: usize,
    idle_timeout: Duration,
}

impl BatchAggregator {
    /// Create an aggregator from batching settings.
    pub fn new(config: &BatchConfig) -> Self {
        Self {
            batches: RwLock::new(HashMap::new()),
            min_batch_size: config.min_batch_size,
            max_batch_size: config.max_batch_size,
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
        }
    }

    fn key_for(world: &dyn WorldQuery, coord: GridCoordinate, material: MaterialId, lod: LodLevel) -> BatchKey {
        BatchKey {
            class: world.material_class(material),
            lod,
            region: coord.region(),
        }
    }

    /// Add a cell to the batch for its key. Returns `false` when the
    /// batch is full or the level is culled; the caller draws the cell
    /// individually (or not at all).
    pub fn insert(
        &self,
        world: &dyn WorldQuery,
        coord: GridCoordinate,
        material: MaterialId,
        lod: LodLevel,
    ) -> bool {
        if !lod.renders() {
            return false;
        }
        let key = Self::key_for(world, coord, material, lod);
        let mut batches = self.batches.write();
        let batch = batches.entry(key).or_insert_with(RenderBatch::new);
        batch.touch();
        if batch.members.iter().any(|(c, _)| *c == coord) {
            return true;
        }
        if batch.members.len() >= self.max_batch_size {
            return false;
        }
        batch.members.push((coord, material));
        batch.dirty = true;
        true
    }

    /// Remove a cell from the batch for its key, if present.
    pub fn remove(
        &self,
        world: &dyn WorldQuery,
        coord: GridCoordinate,
        material: MaterialId,
        lod: LodLevel,
    ) {
        let key = Self::key_for(world, coord, material, lod);
        let mut batches = self.batches.write();
        if let Some(batch) = batches.get_mut(&key) {
            let before = batch.members.len();
            batch.members.retain(|(c, _)| *c != coord);
            if batch.members.len() != before {
                batch.dirty = true;
                batch.touch();
            }
        }
    }

    /// Re-classify every member against the current observer and migrate
    /// those whose detail level changed to their new batch.
    pub fn update(&self, classifier: &LodClassifier, observer: Point3) {
        let mut batches = self.batches.write();
        let mut migrating: Vec<(BatchKey, GridCoordinate, MaterialId)> = Vec::new();
        for (key, batch) in batches.iter_mut() {
            let mut changed = false;
            batch.members.retain(|&(coord, material)| {
                let lod = classifier.classify(coord.center(), observer);
                if lod == key.lod {
                    true
                } else {
                    migrating.push((BatchKey { lod, ..*key }, coord, material));
                    changed = true;
                    false
                }
            });
            if changed {
                batch.dirty = true;
                batch.touch();
            }
        }
        for (key, coord, material) in migrating {
            if key.lod == LodLevel::Culled {
                continue;
            }
            let batch = batches.entry(key).or_insert_with(RenderBatch::new);
            if batch.members.len() < self.max_batch_size {
                batch.members.push((coord, material));
                batch.dirty = true;
                batch.touch();
            }
        }
    }

    /// Evict batches that are empty or have gone untouched past the idle
    /// window. Returns how many were dropped.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut batches = self.batches.write();
        let before = batches.len();
        batches.retain(|_, batch| {
            !batch.members.is_empty() && now.duration_since(batch.last_touched) < self.idle_timeout
        });
        before - batches.len()
    }

    /// Snapshot the drawable set: active batches plus loose members of
    /// under-populated ones.
    pub fn collect_submission(&self) -> RenderSubmission {
        let batches = self.batches.read();
        let mut submission = RenderSubmission::default();
        for (key, batch) in batches.iter() {
            if batch.members.is_empty() {
                continue;
            }
            if batch.members.len() >= self.min_batch_size {
                submission.batches.push((*key, batch.members.clone()));
            } else {
                submission.individual.extend_from_slice(&batch.members);
            }
        }
        submission
    }

    /// Current batching counters.
    pub fn stats(&self) -> BatchStats {
        let batches = self.batches.read();
        let mut stats = BatchStats {
            total_batches: batches.len(),
            ..BatchStats::default()
        };
        for batch in batches.values() {
            stats.total_members += batch.members.len();
            if batch.members.len() >= self.min_batch_size {
                stats.active_batches += 1;
                stats.batched_members += batch.members.len();
            }
        }
        stats
    }

    /// Number of members across every batch whose key matches a filter.
    pub fn members_matching(&self, filter: impl Fn(&BatchKey) -> bool) -> usize {
        self.batches
            .read()
            .iter()
            .filter(|(key, _)| filter(key))
            .map(|(_, batch)| batch.members.len())
            .sum()
    }

    /// Drop every batch.
    pub fn clear(&self) {
        self.batches.write().clear();
    }
}
