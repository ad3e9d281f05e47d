//! Disjoint-set (union-find) over room identifiers

use std::collections::HashMap;

use super::{GroupId, RoomId};

/// Union-find with path compression and min-id union.
///
/// The surviving root of a union is always the smaller id, so a group's
/// identity is the minimum [`RoomId`] among its members and never changes
/// when a larger-id room joins.
#[derive(Debug, Default)]
pub struct DisjointSet {
    parent: HashMap<RoomId, RoomId>,
}

impl DisjointSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a room as its own singleton group if unknown
    pub fn make_set(&mut self, room: RoomId) {
        self.parent.entry(room).or_insert(room);
    }

    /// Find the group of a room, compressing the path along the way
    pub fn find(&mut self, room: RoomId) -> GroupId {
        self.make_set(room);

        let mut root = room;
        while self.parent[&root] != root {
            root = self.parent[&root];
        }
        // Path compression: repoint everything on the walk at the root
        let mut current = room;
        while current != root {
            let next = self.parent[&current];
            self.parent.insert(current, root);
            current = next;
        }
        GroupId(root.0)
    }

    /// Union two rooms' groups; the smaller root id survives
    pub fn union(&mut self, a: RoomId, b: RoomId) -> GroupId {
        let root_a = RoomId(self.find(a).0);
        let root_b = RoomId(self.find(b).0);
        if root_a == root_b {
            return GroupId(root_a.0);
        }
        let (winner, loser) = if root_a < root_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        self.parent.insert(loser, winner);
        GroupId(winner.0)
    }

    /// Whether a room is already registered
    pub fn contains(&self, room: RoomId) -> bool {
        self.parent.contains_key(&room)
    }

    /// Number of rooms known to the structure
    pub fn room_count(&self) -> usize {
        self.parent.len()
    }

    /// Number of distinct groups
    pub fn group_count(&mut self) -> usize {
        let rooms: Vec<RoomId> = self.parent.keys().copied().collect();
        let mut roots = std::collections::HashSet::new();
        for room in rooms {
            roots.insert(self.find(room));
        }
        roots.len()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.parent.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_is_idempotent() {
        let mut set = DisjointSet::new();
        let room = RoomId(7);
        assert_eq!(set.find(room), set.find(room));
        assert_eq!(set.find(room), GroupId(7));
    }

    #[test]
    fn test_union_keeps_minimum_id() {
        let mut set = DisjointSet::new();
        let group = set.union(RoomId(20), RoomId(5));
        assert_eq!(group, GroupId(5));
        assert_eq!(set.find(RoomId(20)), GroupId(5));
    }

    #[test]
    fn test_transitive_union_remaps_all_members() {
        let mut set = DisjointSet::new();
        set.union(RoomId(30), RoomId(20));
        set.union(RoomId(20), RoomId(10));
        set.union(RoomId(40), RoomId(30));
        for id in [10, 20, 30, 40] {
            assert_eq!(set.find(RoomId(id)), GroupId(10));
        }
        assert_eq!(set.room_count(), 4);
        assert_eq!(set.group_count(), 1);
    }

    #[test]
    fn test_disjoint_groups_stay_apart() {
        let mut set = DisjointSet::new();
        set.union(RoomId(1), RoomId(2));
        set.union(RoomId(10), RoomId(11));
        assert_ne!(set.find(RoomId(1)), set.find(RoomId(10)));
        assert_eq!(set.group_count(), 2);
    }
}
