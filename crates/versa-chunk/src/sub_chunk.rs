use crate::PalettedStorage;

/// A 16x16x16 cube of blocks made of one or more layered storages.
/// Layer 0 holds the main blocks, layer 1 usually liquids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubChunk {
    air: u32,
    storages: Vec<PalettedStorage>,
}

impl SubChunk {
    pub fn new(air: u32) -> Self {
        Self {
            air,
            storages: Vec::new(),
        }
    }

    pub fn with_storages(air: u32, storages: Vec<PalettedStorage>) -> Self {
        Self { air, storages }
    }

    pub fn air(&self) -> u32 {
        self.air
    }

    /// Change which runtime ID counts as air, after the palettes moved to another ID space.
    pub fn set_air(&mut self, air: u32) {
        self.air = air;
    }

    /// No layers, or a single layer of nothing but air.
    pub fn is_empty(&self) -> bool {
        match self.storages.as_slice() {
            [] => true,
            [only] => only.palette().len() == 1 && only.is_uniform(self.air),
            _ => false,
        }
    }

    /// The storage of `layer`, creating it and any layer below it filled with air.
    pub fn layer(&mut self, layer: usize) -> &mut PalettedStorage {
        while self.storages.len() <= layer {
            self.storages.push(PalettedStorage::empty(self.air));
        }
        &mut self.storages[layer]
    }

    pub fn layers(&self) -> &[PalettedStorage] {
        &self.storages
    }

    pub fn layers_mut(&mut self) -> &mut [PalettedStorage] {
        &mut self.storages
    }

    pub fn block(&self, x: u8, y: u8, z: u8, layer: usize) -> u32 {
        self.storages
            .get(layer)
            .map_or(self.air, |storage| storage.at(x, y, z))
    }

    pub fn set_block(&mut self, x: u8, y: u8, z: u8, layer: usize, block: u32) {
        self.layer(layer).set(x, y, z, block);
    }

    /// Compact every layer and drop those that hold nothing but air.
    pub fn compact(&mut self) {
        let air = self.air;
        for storage in &mut self.storages {
            storage.compact();
        }
        self.storages
            .retain(|storage| !(storage.palette().len() == 1 && storage.is_uniform(air)));
    }
}
