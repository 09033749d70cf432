//! World-space position types used by the hunt subsystem.

use serde::{Deserialize, Serialize};

/// Integer block position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct BlockPos {
    /// East/west coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
    /// North/south coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Construct a block position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance to another block position.
    pub fn distance_sq(self, other: Self) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        let dz = (self.z - other.z) as f64;
        dx * dx + dy * dy + dz * dz
    }

    /// Horizontal (X/Z plane) distance from this position to the world origin column.
    pub fn horizontal_distance_to_origin(self) -> f64 {
        let dx = self.x as f64;
        let dz = self.z as f64;
        (dx * dx + dz * dz).sqrt()
    }
}

/// Continuous world position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec3 {
    /// East/west coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
    /// North/south coordinate.
    pub z: f64,
}

impl Vec3 {
    /// Construct a continuous position.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Truncate to the containing block position.
    pub fn to_block(self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }
}

impl From<BlockPos> for Vec3 {
    fn from(pos: BlockPos) -> Self {
        Self::new(pos.x as f64 + 0.5, pos.y as f64, pos.z as f64 + 0.5)
    }
}
