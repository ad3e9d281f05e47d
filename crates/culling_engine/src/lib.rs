//! # Culling Engine
//!
//! A CPU-side spatial visibility engine for voxel worlds. Discovers
//! enclosed rooms by flood fill, unions them into connectivity groups,
//! and answers per-cell occlusion queries through a layered pipeline of
//! frustum tests, distance-based LOD, room-level visibility, cached
//! verdicts, and 3-D line-of-sight traces. Survivors are aggregated into
//! draw batches for the host renderer.
//!
//! ## Design principles
//!
//! - **Fail open**: a wrong "hidden" makes geometry vanish, a wrong
//!   "visible" only costs draw calls. Every error path, capacity
//!   overflow, and stale-state condition resolves to visible.
//! - **Narrow world boundary**: the engine reads the host world only
//!   through [`world::WorldQuery`] and never stores world data itself.
//! - **No global state**: every table lives inside a
//!   [`engine::CullingEngine`] constructed per world instance.
//!
//! ## Quick Start
//!
//! ```rust
//! use culling_engine::prelude::*;
//!
//! let mut world = GridWorld::new();
//! world.hollow_box(
//!     GridCoordinate::new(0, 0, 0),
//!     GridCoordinate::new(10, 4, 10),
//!     GridWorld::STONE,
//! );
//!
//! let engine = CullingEngine::new(CullingConfig::default());
//! let observer_pos = Point3::new(2.5, 2.5, 2.5);
//! let observer = engine.register_observer(GridCoordinate::containing(observer_pos));
//!
//! let target = GridCoordinate::new(8, 2, 8);
//! assert!(engine.should_render(&world, target, observer_pos, observer));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod connectivity;
pub mod culling;
pub mod engine;
pub mod foundation;
pub mod render;
pub mod visibility;
pub mod world;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, CullingConfig},
        connectivity::{ConnectivityGraph, GroupId, RoomId},
        culling::{FrustumCuller, LodClassifier, LodLevel},
        engine::{CullingEngine, StatsSnapshot},
        foundation::math::{Mat4, Point3, Vec3},
        foundation::time::Timer,
        render::{BatchStats, RenderSubmission},
        visibility::{ObserverKey, VisibilityOracle},
        world::{GridCoordinate, GridWorld, MaterialClass, MaterialId, WorldQuery},
    };
}
