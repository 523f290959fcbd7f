use serde::{Deserialize, Serialize};

/// A block position in the world (x, y, z integers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn chunk_pos(&self) -> ChunkPos {
        ChunkPos {
            x: self.x >> 4,
            z: self.z >> 4,
        }
    }
}

/// A chunk position (x, z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// A 3D position with single precision, as sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Prefix a bare name with the `minecraft` namespace, leaving namespaced names alone.
pub fn qualify_name(name: &str) -> String {
    if name.contains(':') {
        name.to_string()
    } else {
        format!("minecraft:{}", name)
    }
}

/// The vertical extent of a world, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub min: i32,
    pub max: i32,
}

impl Range {
    /// The overworld since the 1.18 height change.
    pub const OVERWORLD: Range = Range { min: -64, max: 319 };
    /// The pre-1.18 world height, still used by the legacy chunk framing.
    pub const LEGACY: Range = Range { min: 0, max: 255 };

    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn height(&self) -> i32 {
        self.max - self.min
    }

    /// Number of 16-block vertical slices covering this range.
    pub fn sub_chunk_count(&self) -> usize {
        ((self.height() >> 4) + 1) as usize
    }

    /// Index of the slice holding world coordinate `y`.
    pub fn sub_index(&self, y: i32) -> usize {
        ((y - self.min) >> 4) as usize
    }

    /// Lowest world y of slice `index`.
    pub fn sub_y(&self, index: usize) -> i32 {
        ((index as i32) << 4) + self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_sub_chunks() {
        assert_eq!(Range::OVERWORLD.sub_chunk_count(), 24);
        assert_eq!(Range::LEGACY.sub_chunk_count(), 16);
        assert_eq!(Range::OVERWORLD.sub_index(-64), 0);
        assert_eq!(Range::OVERWORLD.sub_index(0), 4);
        assert_eq!(Range::OVERWORLD.sub_y(4), 0);
    }

    #[test]
    fn test_qualify_name() {
        assert_eq!(qualify_name("stone"), "minecraft:stone");
        assert_eq!(qualify_name("custom:stone"), "custom:stone");
    }
}
