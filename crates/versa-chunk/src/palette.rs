use crate::{ChunkError, ChunkResult};

/// Index widths a paletted storage may use, in bits.
const SIZES: [u8; 9] = [0, 1, 2, 3, 4, 5, 6, 8, 16];

/// Bits used per index in a paletted storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PaletteSize(u8);

impl PaletteSize {
    pub const ZERO: PaletteSize = PaletteSize(0);

    pub fn new(bits: u8) -> ChunkResult<Self> {
        if SIZES.contains(&bits) {
            Ok(Self(bits))
        } else {
            Err(ChunkError::InvalidPaletteSize(bits))
        }
    }

    /// Smallest size able to address `len` palette entries.
    pub fn for_len(len: usize) -> Self {
        SIZES
            .iter()
            .copied()
            .find(|bits| len <= 1usize << bits)
            .map_or(Self(16), Self)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Indices are never split across words, so some widths leave padding bits.
    pub fn indices_per_word(self) -> usize {
        if self.0 == 0 {
            0
        } else {
            32 / self.0 as usize
        }
    }

    /// Number of 32-bit words holding 4096 indices.
    pub fn words(self) -> usize {
        match self.indices_per_word() {
            0 => 0,
            per_word => 4096usize.div_ceil(per_word),
        }
    }

    fn next(self) -> Self {
        SIZES
            .iter()
            .copied()
            .find(|bits| *bits > self.0)
            .map_or(self, Self)
    }
}

/// The distinct values a paletted storage's indices point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    size: PaletteSize,
    values: Vec<u32>,
}

impl Palette {
    pub fn new(size: PaletteSize, values: Vec<u32>) -> Self {
        Self { size, values }
    }

    pub fn size(&self) -> PaletteSize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<u32> {
        self.values.get(index).copied()
    }

    pub fn index_of(&self, value: u32) -> Option<usize> {
        self.values.iter().position(|v| *v == value)
    }

    /// Add a value if absent. Returns its index and whether the index width had to grow.
    pub fn add(&mut self, value: u32) -> (usize, bool) {
        if let Some(index) = self.index_of(value) {
            return (index, false);
        }
        self.values.push(value);
        let index = self.values.len() - 1;
        if self.values.len() > 1usize << self.size.bits() {
            self.size = self.size.next();
            return (index, true);
        }
        (index, false)
    }

    /// Rewrite every value in place. Indices keep pointing at the same slots.
    pub fn replace(&mut self, mut f: impl FnMut(u32) -> u32) {
        for value in &mut self.values {
            *value = f(*value);
        }
    }
}
