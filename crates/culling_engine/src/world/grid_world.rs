//! In-memory voxel world used by the demo app and the test suite

use std::collections::HashMap;

use super::{GridCoordinate, MaterialClass, MaterialId, WorldQuery, WorldQueryError};

#[derive(Debug, Clone, Copy)]
struct MaterialSpec {
    opaque: bool,
    door: bool,
    class: MaterialClass,
}

/// HashMap-backed world with a small built-in material palette.
///
/// Cells default to air. Door cells carry a per-coordinate open flag, and
/// the simulation tick is advanced explicitly by the caller.
#[derive(Debug, Default)]
pub struct GridWorld {
    cells: HashMap<GridCoordinate, MaterialId>,
    door_open: HashMap<GridCoordinate, bool>,
    tick: u64,
    fail_queries: bool,
}

impl GridWorld {
    /// Empty space
    pub const AIR: MaterialId = MaterialId(0);
    /// Opaque stone
    pub const STONE: MaterialId = MaterialId(1);
    /// Opaque wood
    pub const WOOD: MaterialId = MaterialId(2);
    /// Transparent glass
    pub const GLASS: MaterialId = MaterialId(3);
    /// Gated passage; open state is per-coordinate
    pub const DOOR: MaterialId = MaterialId(4);
    /// Opaque metal
    pub const METAL: MaterialId = MaterialId(5);

    fn spec(material: MaterialId) -> MaterialSpec {
        match material {
            Self::AIR => MaterialSpec {
                opaque: false,
                door: false,
                class: MaterialClass::Other,
            },
            Self::STONE => MaterialSpec {
                opaque: true,
                door: false,
                class: MaterialClass::Stone,
            },
            Self::WOOD => MaterialSpec {
                opaque: true,
                door: false,
                class: MaterialClass::Wood,
            },
            Self::GLASS => MaterialSpec {
                opaque: false,
                door: false,
                class: MaterialClass::Glass,
            },
            Self::DOOR => MaterialSpec {
                opaque: true,
                door: true,
                class: MaterialClass::Wood,
            },
            Self::METAL => MaterialSpec {
                opaque: true,
                door: false,
                class: MaterialClass::Metal,
            },
            _ => MaterialSpec {
                opaque: true,
                door: false,
                class: MaterialClass::Other,
            },
        }
    }

    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a material at a cell (air removes the cell)
    pub fn set_cell(&mut self, coord: GridCoordinate, material: MaterialId) {
        if material == Self::AIR {
            self.cells.remove(&coord);
            self.door_open.remove(&coord);
        } else {
            self.cells.insert(coord, material);
        }
    }

    /// Place a door and set its open state
    pub fn set_door(&mut self, coord: GridCoordinate, open: bool) {
        self.cells.insert(coord, Self::DOOR);
        self.door_open.insert(coord, open);
    }

    /// Toggle an existing door
    pub fn set_door_open(&mut self, coord: GridCoordinate, open: bool) {
        self.door_open.insert(coord, open);
    }

    /// Fill a solid box of cells, inclusive on both corners
    pub fn fill_box(&mut self, min: GridCoordinate, max: GridCoordinate, material: MaterialId) {
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    self.set_cell(GridCoordinate::new(x, y, z), material);
                }
            }
        }
    }

    /// Build the six walls of a hollow box, leaving the interior as air
    pub fn hollow_box(&mut self, min: GridCoordinate, max: GridCoordinate, material: MaterialId) {
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    let on_shell = x == min.x
                        || x == max.x
                        || y == min.y
                        || y == max.y
                        || z == min.z
                        || z == max.z;
                    let coord = GridCoordinate::new(x, y, z);
                    if on_shell {
                        self.set_cell(coord, material);
                    } else {
                        self.set_cell(coord, Self::AIR);
                    }
                }
            }
        }
    }

    /// Advance the simulation tick
    pub fn advance_ticks(&mut self, ticks: u64) {
        self.tick += ticks;
    }

    /// Make every positional query fail, for exercising fail-open paths
    pub fn set_failing(&mut self, failing: bool) {
        self.fail_queries = failing;
    }

    /// Number of non-air cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

impl WorldQuery for GridWorld {
    fn material_at(&self, coord: GridCoordinate) -> Result<MaterialId, WorldQueryError> {
        if self.fail_queries {
            return Err(WorldQueryError::ChunkNotLoaded(coord));
        }
        Ok(self.cells.get(&coord).copied().unwrap_or(Self::AIR))
    }

    fn is_opaque(&self, material: MaterialId) -> bool {
        Self::spec(material).opaque
    }

    fn is_door_class(&self, material: MaterialId) -> bool {
        Self::spec(material).door
    }

    fn is_door_open(&self, coord: GridCoordinate) -> Result<bool, WorldQueryError> {
        if self.fail_queries {
            return Err(WorldQueryError::ChunkNotLoaded(coord));
        }
        Ok(self.door_open.get(&coord).copied().unwrap_or(false))
    }

    fn material_class(&self, material: MaterialId) -> MaterialClass {
        Self::spec(material).class
    }

    fn current_tick(&self) -> u64 {
        self.tick
    }

    fn can_see_sky(&self, coord: GridCoordinate) -> bool {
        // Straight upward scan; fine at test scale
        (1..=64).all(|dy| {
            self.cells
                .get(&coord.offset(0, dy, 0))
                .map_or(true, |&m| !Self::spec(m).opaque)
        })
    }
}
