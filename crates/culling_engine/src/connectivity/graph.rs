//! Flood-fill room discovery and group maintenance

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::{DisjointSet, GroupId, RoomId};
use crate::world::{GridCoordinate, Passability, WorldQuery};

/// Snapshot of the graph's table sizes
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectivityStats {
    /// Distinct rooms discovered so far
    pub room_count: usize,
    /// Distinct connectivity groups
    pub group_count: usize,
    /// Coordinates with a recorded room assignment
    pub mapped_cells: usize,
    /// Rooms that hit the size cap and are treated as always visible
    pub unbounded_rooms: usize,
}

/// Lazily built map from voxel cells to rooms and rooms to groups.
///
/// Rooms are discovered on first query by a bounded breadth-first flood
/// fill over the 6-connected neighbourhood; the injected [`Passability`]
/// strategy decides which cells the fill may enter. Tables are behind
/// coarse per-table locks so the render and simulation threads can query
/// concurrently (contention is low relative to per-entry cost).
pub struct ConnectivityGraph {
    cell_rooms: RwLock<HashMap<GridCoordinate, RoomId>>,
    groups: Mutex<DisjointSet>,
    unbounded: RwLock<HashSet<RoomId>>,
    passability: Arc<dyn Passability>,
    max_room_size: usize,
    world_key: u64,
}

impl ConnectivityGraph {
    /// Create a graph for one world instance.
    ///
    /// `world_key` distinguishes dimensions/worlds so the same coordinates
    /// in different worlds derive different room ids.
    pub fn new(passability: Arc<dyn Passability>, max_room_size: usize, world_key: u64) -> Self {
        Self {
            cell_rooms: RwLock::new(HashMap::new()),
            groups: Mutex::new(DisjointSet::new()),
            unbounded: RwLock::new(HashSet::new()),
            passability,
            max_room_size,
            world_key,
        }
    }

    /// Room containing a cell, flood-filling on first sight.
    ///
    /// Never fails: if the world query errors mid-fill the partial room is
    /// discarded and the seed becomes a singleton room flagged unbounded,
    /// so downstream visibility fails open.
    pub fn room_of(&self, world: &dyn WorldQuery, coord: GridCoordinate) -> RoomId {
        if let Some(&room) = self.cell_rooms.read().get(&coord) {
            return room;
        }
        self.discover_room(world, coord)
    }

    /// Room already recorded for a cell, without triggering discovery
    pub fn known_room_of(&self, coord: GridCoordinate) -> Option<RoomId> {
        self.cell_rooms.read().get(&coord).copied()
    }

    /// Connectivity group of a room
    pub fn group_of(&self, room: RoomId) -> GroupId {
        self.groups.lock().find(room)
    }

    /// Whether a room hit the size cap (or failed discovery) and must be
    /// treated as always potentially visible
    pub fn is_unbounded(&self, room: RoomId) -> bool {
        self.unbounded.read().contains(&room)
    }

    /// Drop every table (world reload/unload)
    pub fn clear(&self) {
        self.cell_rooms.write().clear();
        self.groups.lock().clear();
        self.unbounded.write().clear();
    }

    /// Current table sizes
    pub fn stats(&self) -> ConnectivityStats {
        let (room_count, group_count) = {
            let mut groups = self.groups.lock();
            (groups.room_count(), groups.group_count())
        };
        ConnectivityStats {
            room_count,
            group_count,
            mapped_cells: self.cell_rooms.read().len(),
            unbounded_rooms: self.unbounded.read().len(),
        }
    }

    /// Deterministic room id: splitmix-style mix of the seed's coarse
    /// partition, the world key, and a disambiguating salt. No wall-clock
    /// or random input.
    fn room_id_for_seed(&self, seed: GridCoordinate, salt: u64) -> RoomId {
        let mut z = seed.partition().packed() ^ self.world_key;
        z = z.wrapping_add(salt.wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15));
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        RoomId(z ^ (z >> 31))
    }

    /// First id derived from the seed's partition that no existing room
    /// holds. Distinct rooms whose seeds share a partition (a walled-off
    /// closet next to a hall) must not collide: a shared id would merge
    /// their groups and silently skip the door-bridge check between them.
    /// The id is registered in the union-find table before the probe lock
    /// is released, so two concurrent discoveries in one partition can
    /// never both see the same salt as free.
    fn reserve_room_id(&self, seed: GridCoordinate) -> RoomId {
        let mut groups = self.groups.lock();
        let mut salt = 0;
        loop {
            let candidate = self.room_id_for_seed(seed, salt);
            if !groups.contains(candidate) {
                groups.make_set(candidate);
                return candidate;
            }
            salt += 1;
        }
    }

    fn discover_room(&self, world: &dyn WorldQuery, seed: GridCoordinate) -> RoomId {
        let mut cells = HashSet::new();
        let mut frontier = VecDeque::new();
        cells.insert(seed);
        frontier.push_back(seed);

        let mut unbounded = false;
        'fill: while let Some(current) = frontier.pop_front() {
            for next in current.neighbours() {
                if cells.contains(&next) {
                    continue;
                }
                match self.passability.is_passable(world, next) {
                    Ok(true) => {
                        cells.insert(next);
                        frontier.push_back(next);
                        if cells.len() >= self.max_room_size {
                            unbounded = true;
                            break 'fill;
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        // Fail open: forget the partial fill, keep only the
                        // seed and flag it so visibility shows its content.
                        log::warn!("world query failed during room discovery at {next:?}: {e}");
                        cells.clear();
                        cells.insert(seed);
                        unbounded = true;
                        break 'fill;
                    }
                }
            }
        }

        // Record membership and collect adjacent known rooms in one pass.
        // Another thread may have mapped the seed since the read in
        // `room_of`; the existing assignment wins so a coordinate never
        // remaps. The id is minted and reserved only after that check, and
        // the unbounded flag lands while the map write lock is still held,
        // so no reader can see a capped room's cells before its flag.
        let mut neighbour_rooms = HashSet::new();
        let room;
        {
            let mut map = self.cell_rooms.write();
            if let Some(&existing) = map.get(&seed) {
                return existing;
            }
            room = self.reserve_room_id(seed);
            if unbounded {
                self.unbounded.write().insert(room);
                log::debug!(
                    "room {room:?} seeded at {seed:?} flagged unbounded ({} cells)",
                    cells.len()
                );
            } else {
                log::trace!("room {room:?} seeded at {seed:?} holds {} cells", cells.len());
            }
            for &cell in &cells {
                map.entry(cell).or_insert(room);
            }
            for &cell in &cells {
                for adjacent in cell.neighbours() {
                    if let Some(&near) = map.get(&adjacent) {
                        if near != room {
                            neighbour_rooms.insert(near);
                        }
                    }
                }
            }
        }

        let mut groups = self.groups.lock();
        for near in neighbour_rooms {
            groups.union(room, near);
        }

        room
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{GridWorld, TransparentPassability};

    fn graph(max_room_size: usize) -> ConnectivityGraph {
        ConnectivityGraph::new(
            Arc::new(TransparentPassability::default()),
            max_room_size,
            0xDEAD_BEEF,
        )
    }

    fn sealed_room(world: &mut GridWorld, min: GridCoordinate, max: GridCoordinate) {
        world.hollow_box(min, max, GridWorld::STONE);
    }

    #[test]
    fn test_room_of_is_idempotent() {
        let mut world = GridWorld::new();
        sealed_room(&mut world, GridCoordinate::new(0, 0, 0), GridCoordinate::new(6, 6, 6));
        let graph = graph(4096);

        let inside = GridCoordinate::new(3, 3, 3);
        let first = graph.room_of(&world, inside);
        let second = graph.room_of(&world, inside);
        assert_eq!(first, second);
    }

    #[test]
    fn test_same_room_for_connected_cells() {
        let mut world = GridWorld::new();
        sealed_room(&mut world, GridCoordinate::new(0, 0, 0), GridCoordinate::new(6, 6, 6));
        let graph = graph(4096);

        let a = graph.room_of(&world, GridCoordinate::new(2, 2, 2));
        let b = graph.room_of(&world, GridCoordinate::new(4, 4, 4));
        assert_eq!(a, b);
        assert_eq!(graph.group_of(a), graph.group_of(b));
    }

    #[test]
    fn test_walled_rooms_get_distinct_groups() {
        let mut world = GridWorld::new();
        // Two sealed 5x5x5 rooms with a shared double wall, far enough
        // apart to land in different coarse partitions.
        sealed_room(&mut world, GridCoordinate::new(0, 0, 0), GridCoordinate::new(6, 6, 6));
        sealed_room(&mut world, GridCoordinate::new(20, 0, 0), GridCoordinate::new(26, 6, 6));
        let graph = graph(4096);

        let a = graph.room_of(&world, GridCoordinate::new(3, 3, 3));
        let b = graph.room_of(&world, GridCoordinate::new(23, 3, 3));
        assert_ne!(a, b);
        assert_ne!(graph.group_of(a), graph.group_of(b));
    }

    #[test]
    fn test_rooms_sharing_a_partition_stay_distinct() {
        let mut world = GridWorld::new();
        // One shell split down the middle: both halves seed in the same
        // coarse partition.
        sealed_room(&mut world, GridCoordinate::new(0, 0, 0), GridCoordinate::new(12, 4, 4));
        world.fill_box(
            GridCoordinate::new(6, 1, 1),
            GridCoordinate::new(6, 3, 3),
            GridWorld::STONE,
        );
        let graph = graph(4096);

        let left = graph.room_of(&world, GridCoordinate::new(3, 2, 2));
        let right = graph.room_of(&world, GridCoordinate::new(9, 2, 2));
        assert_ne!(left, right);
        assert_ne!(graph.group_of(left), graph.group_of(right));
    }

    #[test]
    fn test_concurrent_discovery_in_one_partition_mints_distinct_ids() {
        let mut world = GridWorld::new();
        sealed_room(&mut world, GridCoordinate::new(0, 0, 0), GridCoordinate::new(12, 4, 4));
        world.fill_box(
            GridCoordinate::new(6, 1, 1),
            GridCoordinate::new(6, 3, 3),
            GridWorld::STONE,
        );
        let left = GridCoordinate::new(3, 2, 2);
        let right = GridCoordinate::new(9, 2, 2);

        // Both fills race for the first free salt in the shared partition;
        // the id is reserved under the probe lock, so they must never tie.
        for _ in 0..32 {
            let graph = graph(4096);
            let barrier = std::sync::Barrier::new(2);
            let (a, b) = std::thread::scope(|s| {
                let first = s.spawn(|| {
                    barrier.wait();
                    graph.room_of(&world, left)
                });
                let second = s.spawn(|| {
                    barrier.wait();
                    graph.room_of(&world, right)
                });
                (first.join().unwrap(), second.join().unwrap())
            });
            assert_ne!(a, b);
            assert_ne!(graph.group_of(a), graph.group_of(b));
        }
    }

    #[test]
    fn test_room_never_exceeds_cap() {
        let world = GridWorld::new(); // boundless air
        let cap = 64;
        let graph = graph(cap);

        let room = graph.room_of(&world, GridCoordinate::new(0, 0, 0));
        assert!(graph.is_unbounded(room));
        assert!(graph.stats().mapped_cells <= cap);
    }

    #[test]
    fn test_query_failure_fails_open() {
        let mut world = GridWorld::new();
        world.set_failing(true);
        let graph = graph(4096);

        let seed = GridCoordinate::new(0, 0, 0);
        let room = graph.room_of(&world, seed);
        assert!(graph.is_unbounded(room));
        assert_eq!(graph.known_room_of(seed), Some(room));
    }

    #[test]
    fn test_deterministic_ids_across_instances() {
        let mut world = GridWorld::new();
        sealed_room(&mut world, GridCoordinate::new(0, 0, 0), GridCoordinate::new(6, 6, 6));

        let inside = GridCoordinate::new(3, 3, 3);
        let first = graph(4096).room_of(&world, inside);
        let second = graph(4096).room_of(&world, inside);
        assert_eq!(first, second);

        // A different world key must produce a different identity
        let other = ConnectivityGraph::new(Arc::new(TransparentPassability::default()), 4096, 1);
        assert_ne!(other.room_of(&world, inside), first);
    }

    #[test]
    fn test_clear_forgets_rooms() {
        let mut world = GridWorld::new();
        sealed_room(&mut world, GridCoordinate::new(0, 0, 0), GridCoordinate::new(6, 6, 6));
        let graph = graph(4096);

        let inside = GridCoordinate::new(3, 3, 3);
        graph.room_of(&world, inside);
        assert!(graph.stats().room_count > 0);
        graph.clear();
        assert_eq!(graph.stats().room_count, 0);
        assert_eq!(graph.known_room_of(inside), None);
    }
}
