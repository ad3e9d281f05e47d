//! 3-D digital sight lines over the voxel grid

use crate::world::{GridCoordinate, Passability, WorldQuery};

/// Maximum distance (in cells) at which an open door can bridge two groups
pub const DOOR_BRIDGE_RANGE: i64 = 32;

/// Cells on the digital line between two coordinates, inclusive.
///
/// The result is independent of argument order: the walk always runs from
/// the lexicographically smaller endpoint, so `cells_between(a, b)` and
/// `cells_between(b, a)` return the same set. Endpoint-asymmetric
/// Bresenham variants have historically caused A->B and B->A visibility to
/// disagree; canonicalizing the direction removes that class of bug.
pub fn cells_between(a: GridCoordinate, b: GridCoordinate) -> Vec<GridCoordinate> {
    let (from, to) = if a <= b { (a, b) } else { (b, a) };

    let dx = (to.x - from.x).abs();
    let dy = (to.y - from.y).abs();
    let dz = (to.z - from.z).abs();
    let xs = if to.x > from.x { 1 } else { -1 };
    let ys = if to.y > from.y { 1 } else { -1 };
    let zs = if to.z > from.z { 1 } else { -1 };

    let mut result = Vec::with_capacity((dx.max(dy).max(dz) + 1) as usize);
    let (mut px, mut py, mut pz) = (from.x, from.y, from.z);

    // Dominant axis drives the loop; the two error terms decide when the
    // secondary axes step.
    if dx >= dy && dx >= dz {
        let mut err1 = 2 * dy - dx;
        let mut err2 = 2 * dz - dx;
        for _ in 0..dx {
            result.push(GridCoordinate::new(px, py, pz));
            if err1 > 0 {
                py += ys;
                err1 -= 2 * dx;
            }
            if err2 > 0 {
                pz += zs;
                err2 -= 2 * dx;
            }
            err1 += 2 * dy;
            err2 += 2 * dz;
            px += xs;
        }
    } else if dy >= dx && dy >= dz {
        let mut err1 = 2 * dx - dy;
        let mut err2 = 2 * dz - dy;
        for _ in 0..dy {
            result.push(GridCoordinate::new(px, py, pz));
            if err1 > 0 {
                px += xs;
                err1 -= 2 * dy;
            }
            if err2 > 0 {
                pz += zs;
                err2 -= 2 * dy;
            }
            err1 += 2 * dx;
            err2 += 2 * dz;
            py += ys;
        }
    } else {
        let mut err1 = 2 * dy - dz;
        let mut err2 = 2 * dx - dz;
        for _ in 0..dz {
            result.push(GridCoordinate::new(px, py, pz));
            if err1 > 0 {
                py += ys;
                err1 -= 2 * dz;
            }
            if err2 > 0 {
                px += xs;
                err2 -= 2 * dz;
            }
            err1 += 2 * dy;
            err2 += 2 * dx;
            pz += zs;
        }
    }
    result.push(to);
    result
}

/// Whether an unobstructed sight line exists between two cells.
///
/// Only the interior of the segment is tested; the endpoints themselves may
/// be solid (the observer stands in one, the queried block fills the
/// other). A world-query failure counts as passable (fail open).
pub fn has_line_of_sight(
    world: &dyn WorldQuery,
    passability: &dyn Passability,
    a: GridCoordinate,
    b: GridCoordinate,
) -> bool {
    for cell in cells_between(a, b) {
        if cell == a || cell == b {
            continue;
        }
        match passability.is_passable(world, cell) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                log::warn!("world query failed during sight-line walk at {cell:?}: {e}");
            }
        }
    }
    true
}

/// Whether the straight segment between two cells crosses a door-class
/// cell that is currently open.
///
/// Used to bridge distinct connectivity groups: rooms separated by a door
/// become mutually visible exactly while the door is open. Door state is
/// dynamic and deliberately re-read on every call. Returns `false` beyond
/// [`DOOR_BRIDGE_RANGE`]; returns `true` on query failure (fail open).
pub fn connected_by_door(world: &dyn WorldQuery, a: GridCoordinate, b: GridCoordinate) -> bool {
    if a.distance_squared(b) > DOOR_BRIDGE_RANGE * DOOR_BRIDGE_RANGE {
        return false;
    }
    for cell in cells_between(a, b) {
        let material = match world.material_at(cell) {
            Ok(material) => material,
            Err(e) => {
                log::warn!("world query failed during door-bridge walk at {cell:?}: {e}");
                return true;
            }
        };
        if world.is_door_class(material) {
            match world.is_door_open(cell) {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => {
                    log::warn!("door state query failed at {cell:?}: {e}");
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{GridWorld, TransparentPassability};

    #[test]
    fn test_line_includes_both_endpoints() {
        let a = GridCoordinate::new(0, 0, 0);
        let b = GridCoordinate::new(5, 2, 1);
        let cells = cells_between(a, b);
        assert!(cells.contains(&a));
        assert!(cells.contains(&b));
    }

    #[test]
    fn test_line_is_symmetric() {
        let a = GridCoordinate::new(-3, 7, 2);
        let b = GridCoordinate::new(11, -1, 9);
        assert_eq!(cells_between(a, b), cells_between(b, a));

        // Dominant-y and dominant-z cases as well
        let c = GridCoordinate::new(0, 20, 3);
        let d = GridCoordinate::new(2, 0, -15);
        assert_eq!(cells_between(a, c), cells_between(c, a));
        assert_eq!(cells_between(a, d), cells_between(d, a));
    }

    #[test]
    fn test_clear_sight_line_both_directions() {
        let world = GridWorld::new();
        let rule = TransparentPassability::default();
        let a = GridCoordinate::new(0, 1, 0);
        let b = GridCoordinate::new(9, 1, 4);
        assert!(has_line_of_sight(&world, &rule, a, b));
        assert!(has_line_of_sight(&world, &rule, b, a));
    }

    #[test]
    fn test_wall_blocks_sight_line() {
        let mut world = GridWorld::new();
        // Wall across x=5 in the y/z slab the line passes through
        world.fill_box(
            GridCoordinate::new(5, -2, -2),
            GridCoordinate::new(5, 4, 4),
            GridWorld::STONE,
        );
        let rule = TransparentPassability::default();
        let a = GridCoordinate::new(0, 1, 1);
        let b = GridCoordinate::new(10, 1, 1);
        assert!(!has_line_of_sight(&world, &rule, a, b));
        assert!(!has_line_of_sight(&world, &rule, b, a));
    }

    #[test]
    fn test_solid_endpoints_do_not_block() {
        let mut world = GridWorld::new();
        let a = GridCoordinate::new(0, 0, 0);
        let b = GridCoordinate::new(6, 0, 0);
        world.set_cell(b, GridWorld::STONE);
        let rule = TransparentPassability::default();
        assert!(has_line_of_sight(&world, &rule, a, b));
    }

    #[test]
    fn test_open_door_bridges_closed_door_does_not() {
        let mut world = GridWorld::new();
        let door = GridCoordinate::new(3, 0, 0);
        world.set_door(door, true);
        let a = GridCoordinate::new(0, 0, 0);
        let b = GridCoordinate::new(6, 0, 0);
        assert!(connected_by_door(&world, a, b));

        world.set_door_open(door, false);
        assert!(!connected_by_door(&world, a, b));
    }

    #[test]
    fn test_door_bridge_respects_range_cutoff() {
        let mut world = GridWorld::new();
        world.set_door(GridCoordinate::new(3, 0, 0), true);
        let a = GridCoordinate::new(0, 0, 0);
        let far = GridCoordinate::new(100, 0, 0);
        assert!(!connected_by_door(&world, a, far));
    }

    #[test]
    fn test_query_failure_fails_open() {
        let mut world = GridWorld::new();
        world.set_failing(true);
        let rule = TransparentPassability::default();
        let a = GridCoordinate::new(0, 0, 0);
        let b = GridCoordinate::new(8, 0, 0);
        assert!(has_line_of_sight(&world, &rule, a, b));
        assert!(connected_by_door(&world, a, b));
    }
}
