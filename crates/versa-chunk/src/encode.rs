use crate::{pool, Chunk, Encoding, PaletteKind, PalettedStorage, SubChunk};
use bytes::{BufMut, BytesMut};
use versa_types::Range;

/// Header byte (before the network flag) of a storage equal to the one before it.
pub const DELTA_MARKER: u8 = 0x7f;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubChunkVersion {
    /// A single block storage.
    V1 = 1,
    /// A storage count, then the storages.
    V8 = 8,
    /// Like V8 with the sub-chunk's vertical index after the count.
    V9 = 9,
}

impl SubChunkVersion {
    fn encode_header(self, buf: &mut BytesMut, sub: &SubChunk, range: Range, index: usize) {
        buf.put_u8(self as u8);
        match self {
            SubChunkVersion::V1 => {}
            SubChunkVersion::V8 => buf.put_u8(sub.layers().len() as u8),
            SubChunkVersion::V9 => {
                buf.put_u8(sub.layers().len() as u8);
                buf.put_u8((index as i32 + (range.min >> 4)) as u8);
            }
        }
    }
}

/// Encode one sub-chunk. `index` is its position in the chunk's stack.
pub fn encode_sub_chunk(
    sub: &SubChunk,
    encoding: Encoding<'_>,
    version: SubChunkVersion,
    range: Range,
    index: usize,
) -> Vec<u8> {
    let mut buf = pool::acquire();
    version.encode_header(&mut buf, sub, range, index);
    if version == SubChunkVersion::V1 {
        let air = PalettedStorage::empty(sub.air());
        let storage = sub.layers().first().unwrap_or(&air);
        encode_paletted_storage(&mut buf, storage, None, encoding, PaletteKind::Block);
    } else {
        for storage in sub.layers() {
            encode_paletted_storage(&mut buf, storage, None, encoding, PaletteKind::Block);
        }
    }
    buf.to_vec()
}

/// Encode the biome storages of a chunk. A storage equal to the one below it is written as a
/// single delta marker byte.
pub fn encode_biomes(chunk: &Chunk, encoding: Encoding<'_>) -> Vec<u8> {
    let mut buf = pool::acquire();
    let mut previous = None;
    for storage in chunk.biomes() {
        encode_paletted_storage(&mut buf, storage, previous, encoding, PaletteKind::Biome);
        previous = Some(storage);
    }
    buf.to_vec()
}

pub fn encode_paletted_storage(
    buf: &mut BytesMut,
    storage: &PalettedStorage,
    previous: Option<&PalettedStorage>,
    encoding: Encoding<'_>,
    kind: PaletteKind,
) {
    if previous == Some(storage) {
        buf.put_u8(DELTA_MARKER << 1 | encoding.network_flag());
        return;
    }
    buf.put_u8(storage.bits_per_index() << 1 | encoding.network_flag());
    buf.reserve(storage.words().len() * 4);
    for word in storage.words() {
        buf.put_u32_le(*word);
    }
    encoding.encode_palette(buf, storage.palette(), kind);
}

/// Encode a whole chunk for a level chunk packet.
///
/// The legacy framing writes version 8 sub-chunks followed by a 16x16 biome byte array sampled
/// at each column's highest block. The current framing writes version 9 sub-chunks followed by
/// one biome storage per sub-chunk.
pub fn network_encode(chunk: &Chunk, legacy: bool) -> Vec<u8> {
    let mut buf = pool::acquire();
    let version = if legacy {
        SubChunkVersion::V8
    } else {
        SubChunkVersion::V9
    };
    for (index, sub) in chunk.sub().iter().enumerate() {
        buf.put_slice(&encode_sub_chunk(sub, Encoding::Network, version, chunk.range(), index));
    }
    if legacy {
        let mut biomes = [0u8; 256];
        for x in 0..16u8 {
            for z in 0..16u8 {
                let y = chunk.highest_block(x, z);
                biomes[x as usize | (z as usize) << 4] = chunk.biome(x, y, z) as u8;
            }
        }
        buf.put_slice(&biomes);
    } else {
        buf.put_slice(&encode_biomes(chunk, Encoding::Network));
    }
    buf.to_vec()
}
