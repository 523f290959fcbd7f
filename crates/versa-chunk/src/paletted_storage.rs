use crate::{Palette, PaletteSize};

/// 4096 fixed-width indices into a palette, one per block of a 16x16x16 cube.
///
/// Cells are addressed `(x << 8) | (z << 4) | y` and packed little end first into u32 words.
/// An index never spans two words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalettedStorage {
    words: Vec<u32>,
    palette: Palette,
}

impl PalettedStorage {
    /// `words` must hold `palette.size().words()` entries.
    pub fn new(words: Vec<u32>, palette: Palette) -> Self {
        Self { words, palette }
    }

    /// A storage where every cell holds `value`.
    pub fn empty(value: u32) -> Self {
        Self::new(Vec::new(), Palette::new(PaletteSize::ZERO, vec![value]))
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut Palette {
        &mut self.palette
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn bits_per_index(&self) -> u8 {
        self.palette.size().bits()
    }

    /// True when the palette holds nothing but `value`.
    pub fn is_uniform(&self, value: u32) -> bool {
        self.palette.values().iter().all(|v| *v == value)
    }

    /// The first index that points past the end of the palette, if any.
    pub fn out_of_range_index(&self) -> Option<usize> {
        let len = self.palette.len();
        (0..4096).map(|offset| self.index(offset)).find(|index| *index >= len)
    }

    pub fn at(&self, x: u8, y: u8, z: u8) -> u32 {
        self.palette.value(self.index(offset(x, y, z))).unwrap_or_default()
    }

    pub fn set(&mut self, x: u8, y: u8, z: u8, value: u32) {
        let old_size = self.palette.size();
        let (index, resized) = self.palette.add(value);
        if resized {
            self.resize(old_size);
        }
        self.set_index(offset(x, y, z), index);
    }

    fn index(&self, offset: usize) -> usize {
        let bits = self.bits_per_index() as usize;
        if bits == 0 {
            return 0;
        }
        let per_word = self.palette.size().indices_per_word();
        let word = self.words.get(offset / per_word).copied().unwrap_or_default();
        let shift = (offset % per_word) * bits;
        ((word >> shift) & mask(bits)) as usize
    }

    fn set_index(&mut self, offset: usize, index: usize) {
        let bits = self.bits_per_index() as usize;
        if bits == 0 {
            return;
        }
        let per_word = self.palette.size().indices_per_word();
        let shift = (offset % per_word) * bits;
        if let Some(word) = self.words.get_mut(offset / per_word) {
            *word = (*word & !(mask(bits) << shift)) | ((index as u32 & mask(bits)) << shift);
        }
    }

    /// Repack the indices after the palette grew past `old_size`.
    fn resize(&mut self, old_size: PaletteSize) {
        let new_size = self.palette.size();
        let old = PalettedStorage::new(
            std::mem::take(&mut self.words),
            Palette::new(old_size, Vec::new()),
        );
        self.words = vec![0; new_size.words()];
        for offset in 0..4096 {
            let index = old.index(offset);
            self.set_index(offset, index);
        }
    }

    /// Drop palette entries no cell refers to and shrink the index width to fit.
    pub fn compact(&mut self) {
        let mut used = vec![false; self.palette.len()];
        for offset in 0..4096 {
            let index = self.index(offset);
            let index = if index < used.len() { index } else { 0 };
            if let Some(slot) = used.get_mut(index) {
                *slot = true;
            }
        }
        if used.iter().all(|u| *u) && self.palette.size() == PaletteSize::for_len(self.palette.len()) {
            return;
        }

        let mut remap = vec![0usize; self.palette.len()];
        let mut values = Vec::new();
        for (old, value) in self.palette.values().iter().enumerate() {
            if used[old] {
                remap[old] = values.len();
                values.push(*value);
            }
        }
        let indices: Vec<usize> = (0..4096)
            .map(|offset| remap.get(self.index(offset)).copied().unwrap_or_default())
            .collect();

        let size = PaletteSize::for_len(values.len());
        let mut compacted = PalettedStorage::new(vec![0; size.words()], Palette::new(size, values));
        for (offset, index) in indices.into_iter().enumerate() {
            compacted.set_index(offset, index);
        }
        *self = compacted;
    }
}

fn offset(x: u8, y: u8, z: u8) -> usize {
    ((x as usize & 15) << 8) | ((z as usize & 15) << 4) | (y as usize & 15)
}

fn mask(bits: usize) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let storage = PalettedStorage::empty(3);
        assert_eq!(storage.at(5, 5, 5), 3);
        assert!(storage.words().is_empty());
        assert!(storage.is_uniform(3));
    }

    #[test]
    fn test_set_and_resize() {
        let mut storage = PalettedStorage::empty(0);
        for value in 0..20u32 {
            storage.set(value as u8 % 16, value as u8 / 16, 3, value);
        }
        assert_eq!(storage.bits_per_index(), 5);
        assert_eq!(storage.words().len(), 683);
        for value in 0..20u32 {
            assert_eq!(storage.at(value as u8 % 16, value as u8 / 16, 3), value);
        }
        assert_eq!(storage.at(15, 15, 15), 0);
    }

    #[test]
    fn test_compact() {
        let mut storage = PalettedStorage::empty(0);
        storage.set(1, 1, 1, 5);
        storage.set(2, 2, 2, 6);
        storage.set(2, 2, 2, 0);
        assert_eq!(storage.palette().len(), 3);
        storage.compact();
        assert_eq!(storage.palette().values(), &[0, 5]);
        assert_eq!(storage.bits_per_index(), 1);
        assert_eq!(storage.at(1, 1, 1), 5);
        assert_eq!(storage.at(2, 2, 2), 0);

        storage.set(1, 1, 1, 0);
        storage.compact();
        assert_eq!(storage, PalettedStorage::empty(0));
    }

    #[test]
    fn test_out_of_range_index() {
        let palette = Palette::new(PaletteSize::new(1).unwrap(), vec![7]);
        let mut storage = PalettedStorage::new(vec![u32::MAX; 128], palette);
        assert_eq!(storage.out_of_range_index(), Some(1));
        storage.compact();
        assert_eq!(storage, PalettedStorage::empty(7));

        let mut storage = PalettedStorage::empty(0);
        storage.set(0, 0, 0, 4);
        assert_eq!(storage.out_of_range_index(), None);
    }
}
