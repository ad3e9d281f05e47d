//! Integer grid coordinates and the coarse partitions derived from them

use crate::foundation::math::{Aabb, Point3, Vec3};

/// Width/depth of a visibility-cache region in cells (matches world chunking)
pub const REGION_SIZE_SHIFT: i32 = 4;

/// A cell position in the voxel grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoordinate {
    /// East-west cell index
    pub x: i32,
    /// Vertical cell index
    pub y: i32,
    /// North-south cell index
    pub z: i32,
}

/// Face-adjacent neighbour offsets (6-connectivity)
pub const CARDINAL_OFFSETS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

impl GridCoordinate {
    /// Create a coordinate from its components
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Offset by a delta in each axis
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The six face-adjacent neighbours
    pub fn neighbours(self) -> impl Iterator<Item = Self> {
        CARDINAL_OFFSETS
            .iter()
            .map(move |&(dx, dy, dz)| self.offset(dx, dy, dz))
    }

    /// Squared distance to another cell, in cells
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        let dz = i64::from(self.z - other.z);
        dx * dx + dy * dy + dz * dz
    }

    /// Squared distance from the cell center to a world-space point
    pub fn distance_squared_to_point(self, point: Point3) -> f32 {
        (self.center() - point).norm_squared()
    }

    /// Center of the cell in world space
    pub fn center(self) -> Point3 {
        Point3::new(
            self.x as f32 + 0.5,
            self.y as f32 + 0.5,
            self.z as f32 + 0.5,
        )
    }

    /// World-space bounds of the unit cell
    pub fn cell_aabb(self) -> Aabb {
        let min = Vec3::new(self.x as f32, self.y as f32, self.z as f32);
        Aabb::new(min, min + Vec3::new(1.0, 1.0, 1.0))
    }

    /// The cell containing a world-space point
    pub fn containing(point: Point3) -> Self {
        Self::new(
            point.x.floor() as i32,
            point.y.floor() as i32,
            point.z.floor() as i32,
        )
    }

    /// The 16x16 horizontal cache region this cell belongs to
    pub fn region(self) -> RegionCoord {
        RegionCoord {
            x: self.x >> REGION_SIZE_SHIFT,
            z: self.z >> REGION_SIZE_SHIFT,
        }
    }

    /// The coarse 16x8x16 partition used for room identity
    pub fn partition(self) -> PartitionCoord {
        PartitionCoord {
            x: self.x >> 4,
            y: self.y >> 3,
            z: self.z >> 4,
        }
    }
}

/// A 16x16 horizontal column used as visibility-cache granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionCoord {
    /// Region index along x
    pub x: i32,
    /// Region index along z
    pub z: i32,
}

/// A coarse 16x8x16 block of cells; the anchor for deterministic room ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionCoord {
    /// Partition index along x
    pub x: i32,
    /// Partition index along y
    pub y: i32,
    /// Partition index along z
    pub z: i32,
}

impl PartitionCoord {
    /// Pack the partition indices into a single 64-bit value
    pub fn packed(self) -> u64 {
        let x = u64::from(self.x as u32 & 0x00FF_FFFF);
        let y = u64::from(self.y as u32 & 0xFFFF);
        let z = u64::from(self.z as u32 & 0x00FF_FFFF);
        (x << 40) | (y << 24) | z
    }
}
