use crate::{PalettedStorage, SubChunk};
use versa_types::Range;

/// A column of sub-chunks covering a world's vertical range, with one biome storage per
/// sub-chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    air: u32,
    range: Range,
    sub: Vec<SubChunk>,
    biomes: Vec<PalettedStorage>,
}

impl Chunk {
    pub fn new(air: u32, range: Range) -> Self {
        let count = range.sub_chunk_count();
        Self {
            air,
            range,
            sub: (0..count).map(|_| SubChunk::new(air)).collect(),
            biomes: (0..count).map(|_| PalettedStorage::empty(0)).collect(),
        }
    }

    pub fn air(&self) -> u32 {
        self.air
    }

    /// Change which runtime ID counts as air in this chunk and all of its sub-chunks.
    pub fn set_air(&mut self, air: u32) {
        self.air = air;
        for sub in &mut self.sub {
            sub.set_air(air);
        }
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn sub(&self) -> &[SubChunk] {
        &self.sub
    }

    pub fn sub_mut(&mut self) -> &mut [SubChunk] {
        &mut self.sub
    }

    pub fn biomes(&self) -> &[PalettedStorage] {
        &self.biomes
    }

    pub fn biomes_mut(&mut self) -> &mut [PalettedStorage] {
        &mut self.biomes
    }

    fn slot(&self, y: i32) -> Option<usize> {
        if y < self.range.min || y > self.range.max {
            return None;
        }
        Some(self.range.sub_index(y))
    }

    /// Block runtime ID at chunk-local x/z and world y. Outside the range this is air.
    pub fn block(&self, x: u8, y: i32, z: u8, layer: usize) -> u32 {
        match self.slot(y).and_then(|i| self.sub.get(i)) {
            Some(sub) => sub.block(x, (y & 15) as u8, z, layer),
            None => self.air,
        }
    }

    pub fn set_block(&mut self, x: u8, y: i32, z: u8, layer: usize, block: u32) {
        if let Some(sub) = self.slot(y).and_then(|i| self.sub.get_mut(i)) {
            sub.set_block(x, (y & 15) as u8, z, layer, block);
        }
    }

    pub fn biome(&self, x: u8, y: i32, z: u8) -> u32 {
        self.slot(y)
            .and_then(|i| self.biomes.get(i))
            .map_or(0, |storage| storage.at(x, (y & 15) as u8, z))
    }

    pub fn set_biome(&mut self, x: u8, y: i32, z: u8, biome: u32) {
        if let Some(storage) = self.slot(y).and_then(|i| self.biomes.get_mut(i)) {
            storage.set(x, (y & 15) as u8, z, biome);
        }
    }

    /// World y of the highest non-air block of a column in layer 0, or the bottom of the range.
    pub fn highest_block(&self, x: u8, z: u8) -> i32 {
        for (index, sub) in self.sub.iter().enumerate().rev() {
            if sub.is_empty() {
                continue;
            }
            for y in (0..16u8).rev() {
                if sub.block(x, y, z, 0) != self.air {
                    return self.range.sub_y(index) + y as i32;
                }
            }
        }
        self.range.min
    }
}
