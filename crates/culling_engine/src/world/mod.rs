//! World interface boundary
//!
//! The culling engine never touches host world data directly; everything it
//! needs is pulled through the narrow [`WorldQuery`] trait. The host game
//! implements the trait over its own chunk storage; tests and the demo app
//! use the in-memory [`GridWorld`].

mod grid;
mod grid_world;
mod material;
mod passability;

pub use grid::{GridCoordinate, PartitionCoord, RegionCoord, CARDINAL_OFFSETS};
pub use grid_world::GridWorld;
pub use material::{MaterialClass, MaterialId};
pub use passability::{Passability, TransparentPassability};

/// Errors surfaced by a world-query backend
#[derive(Debug, thiserror::Error)]
pub enum WorldQueryError {
    /// The chunk containing the coordinate is not loaded
    #[error("chunk containing {0:?} is not loaded")]
    ChunkNotLoaded(GridCoordinate),

    /// Any other backend failure
    #[error("world query backend error: {0}")]
    Backend(String),
}

/// Point-wise world access consumed by the culling pipeline.
///
/// Implementations must be cheap per call; the pipeline may issue thousands
/// of lookups per frame. Material predicates (`is_opaque`, `is_door_class`,
/// `material_class`) are pure functions of the material and may be table
/// lookups; only `material_at` and `is_door_open` touch dynamic state.
pub trait WorldQuery {
    /// Material occupying the given cell
    fn material_at(&self, coord: GridCoordinate) -> Result<MaterialId, WorldQueryError>;

    /// Whether the material fully occludes sight lines
    fn is_opaque(&self, material: MaterialId) -> bool;

    /// Whether the material is a gated passage (door, gate, trapdoor)
    fn is_door_class(&self, material: MaterialId) -> bool;

    /// Dynamic open/closed state of a door-class cell.
    ///
    /// Re-evaluated on demand and never cached long-term by the engine,
    /// since it can change between queries.
    fn is_door_open(&self, coord: GridCoordinate) -> Result<bool, WorldQueryError>;

    /// Coarse material bucket used for batch grouping
    fn material_class(&self, material: MaterialId) -> MaterialClass;

    /// Current simulation tick, used to stamp cache entries
    fn current_tick(&self) -> u64;

    /// Whether the cell has an unobstructed view of the sky.
    ///
    /// Only consumed by environment heuristics and diagnostics; the
    /// visibility decision itself never depends on it.
    fn can_see_sky(&self, _coord: GridCoordinate) -> bool {
        true
    }
}
