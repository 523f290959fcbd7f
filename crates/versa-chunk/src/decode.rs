use crate::{
    Chunk, ChunkError, ChunkResult, Encoding, PaletteKind, PaletteSize, PalettedStorage, SubChunk,
    DELTA_MARKER,
};
use bytes::BytesMut;
use versa_protocol::{read_bytes, read_u8};
use versa_types::Range;

/// Decode one sub-chunk. Returns it with the stack index stored in version 9 headers,
/// already shifted back by the range's lowest sub-chunk.
pub fn decode_sub_chunk(
    buf: &mut BytesMut,
    air: u32,
    range: Range,
    encoding: Encoding<'_>,
) -> ChunkResult<(SubChunk, Option<i32>)> {
    let version = read_u8(buf)?;
    match version {
        1 => {
            let storage = decode_paletted_storage(buf, None, encoding, PaletteKind::Block)?;
            Ok((SubChunk::with_storages(air, vec![storage]), None))
        }
        8 | 9 => {
            let count = read_u8(buf)?;
            let index = if version == 9 {
                Some(read_u8(buf)? as i8 as i32 - (range.min >> 4))
            } else {
                None
            };
            let mut storages = Vec::with_capacity(count as usize);
            for _ in 0..count {
                storages.push(decode_paletted_storage(buf, None, encoding, PaletteKind::Block)?);
            }
            Ok((SubChunk::with_storages(air, storages), index))
        }
        other => Err(ChunkError::UnknownSubChunkVersion(other)),
    }
}

/// Decode one storage. A delta marker yields a copy of `previous`.
pub fn decode_paletted_storage(
    buf: &mut BytesMut,
    previous: Option<&PalettedStorage>,
    encoding: Encoding<'_>,
    kind: PaletteKind,
) -> ChunkResult<PalettedStorage> {
    let bits = read_u8(buf)? >> 1;
    if bits == DELTA_MARKER {
        return previous.cloned().ok_or(ChunkError::DeltaWithoutPrevious);
    }
    let size = PaletteSize::new(bits)?;
    let raw = read_bytes(buf, size.words() * 4)?;
    let words = raw
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    let palette = encoding.decode_palette(buf, size, kind)?;
    let storage = PalettedStorage::new(words, palette);
    if let Some(index) = storage.out_of_range_index() {
        return Err(ChunkError::PaletteIndexOutOfRange {
            index,
            len: storage.palette().len(),
        });
    }
    Ok(storage)
}

/// Decode `count` sub-chunks and the biomes of a level chunk payload.
///
/// Bytes after the biomes (border blocks, block actors) stay in `buf`.
pub fn network_decode(
    air: u32,
    buf: &mut BytesMut,
    count: usize,
    legacy: bool,
    range: Range,
) -> ChunkResult<Chunk> {
    let mut chunk = Chunk::new(air, range);
    let slots = chunk.sub().len();
    for i in 0..count {
        let (sub, index) = decode_sub_chunk(buf, air, range, Encoding::Network)?;
        let slot = index.unwrap_or(i as i32);
        if slot < 0 || slot as usize >= slots {
            return Err(ChunkError::SubChunkIndex(slot));
        }
        chunk.sub_mut()[slot as usize] = sub;
    }

    if legacy {
        let biomes = read_bytes(buf, 256)?;
        for x in 0..16u8 {
            for z in 0..16u8 {
                let id = biomes[x as usize | (z as usize) << 4] as u32;
                if id == 0 {
                    continue;
                }
                for y in range.min..=range.max {
                    chunk.set_biome(x, y, z, id);
                }
            }
        }
    } else {
        let mut previous: Option<PalettedStorage> = None;
        for i in 0..slots {
            let storage =
                decode_paletted_storage(buf, previous.as_ref(), Encoding::Network, PaletteKind::Biome)?;
            chunk.biomes_mut()[i] = storage.clone();
            previous = Some(storage);
        }
    }
    Ok(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encode_biomes, encode_sub_chunk, network_encode, SubChunkVersion};
    use bytes::BufMut;
    use std::sync::Arc;
    use versa_mapping::{BlockRegistry, BlockUpgrader, AIR_BLOCK};
    use versa_protocol::write_varint32;
    use versa_types::BlockState;

    fn registry() -> BlockRegistry {
        BlockRegistry::from_states(
            vec![
                BlockState::new(AIR_BLOCK),
                BlockState::new("minecraft:stone"),
                BlockState::new("minecraft:wool").with_property("color", "red"),
            ],
            Arc::new(BlockUpgrader::empty()),
        )
        .unwrap()
    }

    fn sample_chunk(range: Range) -> Chunk {
        let mut chunk = Chunk::new(0, range);
        chunk.set_block(1, range.min + 2, 3, 0, 1);
        chunk.set_block(4, range.min + 40, 5, 0, 2);
        chunk.set_block(4, range.min + 40, 5, 1, 1);
        chunk
    }

    #[test]
    fn test_zero_palette_length_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u8(1 << 1 | 1);
        buf.put_slice(&[0u8; 128 * 4]);
        write_varint32(&mut buf, 0);
        let result = decode_paletted_storage(&mut buf, None, Encoding::Network, PaletteKind::Block);
        assert!(matches!(result, Err(ChunkError::InvalidPaletteCount(0))));
    }

    #[test]
    fn test_index_past_palette_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u8(8);
        buf.put_u8(1);
        buf.put_u8(1 << 1 | 1);
        for _ in 0..128 {
            buf.put_u32_le(u32::MAX);
        }
        write_varint32(&mut buf, 1);
        write_varint32(&mut buf, 0);
        let result = decode_sub_chunk(&mut buf, 0, Range::OVERWORLD, Encoding::Network);
        assert!(matches!(
            result,
            Err(ChunkError::PaletteIndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_invalid_width_rejected() {
        let mut buf = BytesMut::from(&[7u8 << 1 | 1][..]);
        let result = decode_paletted_storage(&mut buf, None, Encoding::Network, PaletteKind::Block);
        assert!(matches!(result, Err(ChunkError::InvalidPaletteSize(7))));
    }

    #[test]
    fn test_delta_round_trip() {
        let mut storage = PalettedStorage::empty(0);
        storage.set(1, 2, 3, 5);
        let mut chunk = Chunk::new(0, Range::OVERWORLD);
        for biomes in chunk.biomes_mut() {
            *biomes = storage.clone();
        }
        let encoded = encode_biomes(&chunk, Encoding::Network);
        let first_len = encoded.len() - 23;
        assert!(encoded[first_len..].iter().all(|b| *b == 0xff));

        let mut buf = BytesMut::from(&encoded[..]);
        let first = decode_paletted_storage(&mut buf, None, Encoding::Network, PaletteKind::Biome).unwrap();
        let second =
            decode_paletted_storage(&mut buf, Some(&first), Encoding::Network, PaletteKind::Biome).unwrap();
        assert_eq!(first, storage);
        assert_eq!(second, storage);
    }

    #[test]
    fn test_delta_without_previous() {
        let mut buf = BytesMut::from(&[0xffu8][..]);
        let result = decode_paletted_storage(&mut buf, None, Encoding::Network, PaletteKind::Biome);
        assert!(matches!(result, Err(ChunkError::DeltaWithoutPrevious)));
    }

    #[test]
    fn test_sub_chunk_versions() {
        let chunk = sample_chunk(Range::OVERWORLD);
        let sub = &chunk.sub()[2];

        let v9 = encode_sub_chunk(sub, Encoding::Network, SubChunkVersion::V9, Range::OVERWORLD, 2);
        let (decoded, index) =
            decode_sub_chunk(&mut BytesMut::from(&v9[..]), 0, Range::OVERWORLD, Encoding::Network).unwrap();
        assert_eq!(index, Some(2));
        assert_eq!(&decoded, sub);

        let v8 = encode_sub_chunk(sub, Encoding::Network, SubChunkVersion::V8, Range::OVERWORLD, 2);
        let (decoded, index) =
            decode_sub_chunk(&mut BytesMut::from(&v8[..]), 0, Range::OVERWORLD, Encoding::Network).unwrap();
        assert_eq!(index, None);
        assert_eq!(decoded.layers().len(), 2);
        assert_eq!(decoded.block(4, 8, 5, 1), 1);

        let v1 = encode_sub_chunk(sub, Encoding::Network, SubChunkVersion::V1, Range::OVERWORLD, 2);
        let (decoded, _) =
            decode_sub_chunk(&mut BytesMut::from(&v1[..]), 0, Range::OVERWORLD, Encoding::Network).unwrap();
        assert_eq!(decoded.layers().len(), 1);
        assert_eq!(decoded.block(4, 8, 5, 0), 2);

        let mut unknown = BytesMut::from(&[3u8][..]);
        assert!(matches!(
            decode_sub_chunk(&mut unknown, 0, Range::OVERWORLD, Encoding::Network),
            Err(ChunkError::UnknownSubChunkVersion(3))
        ));
    }

    #[test]
    fn test_network_round_trip_leaves_trailer() {
        let mut chunk = sample_chunk(Range::OVERWORLD);
        chunk.set_biome(0, 0, 0, 3);
        let mut buf = BytesMut::from(&network_encode(&chunk, false)[..]);
        buf.put_slice(&[0, 0xaa]);

        let decoded = network_decode(0, &mut buf, 24, false, Range::OVERWORLD).unwrap();
        assert_eq!(decoded, chunk);
        assert_eq!(&buf[..], &[0, 0xaa]);
    }

    #[test]
    fn test_legacy_round_trip() {
        let mut chunk = sample_chunk(Range::LEGACY);
        for y in 0..=255 {
            chunk.set_biome(1, y, 3, 6);
        }
        let mut buf = BytesMut::from(&network_encode(&chunk, true)[..]);
        let decoded = network_decode(0, &mut buf, 16, true, Range::LEGACY).unwrap();
        assert!(buf.is_empty());
        assert_eq!(decoded.block(4, 40, 5, 0), 2);
        assert_eq!(decoded.biome(1, 200, 3), 6);
        assert_eq!(decoded.biome(0, 200, 0), 0);
    }

    #[test]
    fn test_persistent_palette() {
        let registry = registry();
        let mut sub = SubChunk::new(0);
        sub.set_block(0, 0, 0, 0, 2);
        for encoding in [Encoding::NetworkPersistent(&registry), Encoding::Disk(&registry)] {
            let encoded = encode_sub_chunk(&sub, encoding, SubChunkVersion::V9, Range::OVERWORLD, 0);
            let (decoded, _) =
                decode_sub_chunk(&mut BytesMut::from(&encoded[..]), 0, Range::OVERWORLD, encoding).unwrap();
            assert_eq!(decoded, sub);
        }

        // The persistent network form drops the namespace.
        let encoded = encode_sub_chunk(
            &sub,
            Encoding::NetworkPersistent(&registry),
            SubChunkVersion::V9,
            Range::OVERWORLD,
            0,
        );
        let text = String::from_utf8_lossy(&encoded);
        assert!(text.contains("wool"));
        assert!(!text.contains("minecraft:wool"));
    }
}
