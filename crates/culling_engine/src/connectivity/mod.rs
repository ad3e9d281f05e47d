//! Room discovery and connectivity grouping
//!
//! The voxel world is partitioned into flood-filled "rooms" of mutually
//! reachable passable cells; rooms that touch through passable boundaries
//! are unioned into "connectivity groups". Group membership is the coarse
//! first-stage visibility test: content in a group the observer cannot
//! reach is not visible unless an open door bridges the gap.

mod disjoint;
mod graph;

pub use disjoint::DisjointSet;
pub use graph::{ConnectivityGraph, ConnectivityStats};

/// Stable identifier of a flood-filled room.
///
/// Derived deterministically from the coarse partition containing the
/// flood-fill seed plus a world key, so re-deriving the same physical
/// region later reproduces the same id. When several distinct rooms are
/// seeded in one partition, later ones take the next free salted id, so
/// their exact ids depend on discovery order but never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(pub u64);

/// Identifier of a connectivity group: the minimum [`RoomId`] among the
/// unioned rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u64);
