use crate::{Direction, TranslateResult};
use bytes::{BufMut, BytesMut};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};
use versa_chunk::{
    decode_sub_chunk, encode_sub_chunk, network_decode, network_encode, Chunk, Encoding, SubChunk,
    SubChunkVersion,
};
use versa_mapping::{BlockRegistry, CustomBlockDefinition};
use versa_nbt::{read_compound, write_compound, NbtEncoding};
use versa_protocol::{
    ConnectionState, EntityMetadata, MetadataValue, Packet, TransactionData, ENTITY_DATA_KEY_VARIANT,
    FALLING_BLOCK_ENTITY, LEVEL_EVENT_PARTICLES_CRACK_BLOCK, LEVEL_EVENT_PARTICLES_DESTROY_BLOCK,
    LEVEL_EVENT_PARTICLES_DESTROY_BLOCK_NO_SOUND, LEVEL_EVENT_TERRAIN_PARTICLE, SOUND_EVENT_BREAK,
    SOUND_EVENT_HIT, SOUND_EVENT_ITEM_USE_ON, SOUND_EVENT_LAND, SOUND_EVENT_PLACE,
    SUB_CHUNK_REQUEST_MODE_LIMITED, SUB_CHUNK_REQUEST_MODE_LIMITLESS, SUB_CHUNK_RESULT_SUCCESS,
};
use versa_types::{BlockEntry, Range};

/// Rewrites block runtime IDs between one version's registry and the latest one.
///
/// Every miss resolves to the destination's air block.
#[derive(Clone)]
pub struct BlockTranslator {
    mapping: Arc<BlockRegistry>,
    latest: Arc<BlockRegistry>,
}

impl BlockTranslator {
    pub fn new(mapping: Arc<BlockRegistry>, latest: Arc<BlockRegistry>) -> Self {
        Self { mapping, latest }
    }

    pub fn mapping(&self) -> &Arc<BlockRegistry> {
        &self.mapping
    }

    pub fn latest(&self) -> &Arc<BlockRegistry> {
        &self.latest
    }

    fn registries(&self, direction: Direction) -> (&BlockRegistry, &BlockRegistry) {
        match direction {
            Direction::Downgrade => (&self.latest, &self.mapping),
            Direction::Upgrade => (&self.mapping, &self.latest),
        }
    }

    pub fn translate_runtime_id(&self, direction: Direction, runtime_id: u32) -> u32 {
        let (source, destination) = self.registries(direction);
        let Some(state) = source.runtime_id_to_state(runtime_id) else {
            trace!("No block state for runtime ID {}", runtime_id);
            return destination.air();
        };
        destination.state_to_runtime_id(&state).unwrap_or_else(|| {
            trace!("Block state {} has no runtime ID after {:?}", state.name, direction);
            destination.air()
        })
    }

    pub fn downgrade_runtime_id(&self, runtime_id: u32) -> u32 {
        self.translate_runtime_id(Direction::Downgrade, runtime_id)
    }

    pub fn upgrade_runtime_id(&self, runtime_id: u32) -> u32 {
        self.translate_runtime_id(Direction::Upgrade, runtime_id)
    }

    /// Rewrite every layer palette of a sub-chunk and move it to the destination's air.
    pub fn translate_sub_chunk(&self, direction: Direction, sub: &mut SubChunk) {
        let (source, destination) = self.registries(direction);
        let (source_air, destination_air) = (source.air(), destination.air());
        for storage in sub.layers_mut() {
            storage.palette_mut().replace(|rid| {
                if rid == source_air {
                    destination_air
                } else {
                    self.translate_runtime_id(direction, rid)
                }
            });
        }
        sub.set_air(destination_air);
    }

    pub fn downgrade_sub_chunk(&self, sub: &mut SubChunk) {
        self.translate_sub_chunk(Direction::Downgrade, sub);
    }

    pub fn upgrade_sub_chunk(&self, sub: &mut SubChunk) {
        self.translate_sub_chunk(Direction::Upgrade, sub);
    }

    /// Rewrite every sub-chunk. Biomes have no crosswalk: a downgrade resets them all to
    /// biome 0 and an upgrade keeps them as they are.
    pub fn translate_chunk(&self, direction: Direction, chunk: &mut Chunk) {
        for sub in chunk.sub_mut() {
            self.translate_sub_chunk(direction, sub);
        }
        if direction == Direction::Downgrade {
            for biomes in chunk.biomes_mut() {
                biomes.palette_mut().replace(|_| 0);
            }
        }
        let (_, destination) = self.registries(direction);
        chunk.set_air(destination.air());
    }

    pub fn downgrade_chunk(&self, chunk: &mut Chunk) {
        self.translate_chunk(Direction::Downgrade, chunk);
    }

    pub fn upgrade_chunk(&self, chunk: &mut Chunk) {
        self.translate_chunk(Direction::Upgrade, chunk);
    }

    /// Expand custom block definitions into both registries.
    pub fn adjust(&self, definitions: &[CustomBlockDefinition]) -> TranslateResult<()> {
        let legacy = self.mapping.adjust(definitions)?;
        let latest = self.latest.adjust(definitions)?;
        if legacy + latest > 0 {
            info!("Custom blocks added {} legacy and {} latest states", legacy, latest);
        }
        Ok(())
    }

    fn adjust_entries(&self, entries: &[BlockEntry]) -> TranslateResult<()> {
        self.mapping.adjust_entries(entries)?;
        self.latest.adjust_entries(entries)?;
        Ok(())
    }

    pub fn downgrade_packets(&self, packets: Vec<Packet>, conn: &ConnectionState) -> Vec<Packet> {
        self.translate_packets(Direction::Downgrade, packets, conn)
    }

    pub fn upgrade_packets(&self, packets: Vec<Packet>, conn: &ConnectionState) -> Vec<Packet> {
        self.translate_packets(Direction::Upgrade, packets, conn)
    }

    fn translate_packets(
        &self,
        direction: Direction,
        packets: Vec<Packet>,
        conn: &ConnectionState,
    ) -> Vec<Packet> {
        packets
            .into_iter()
            .map(|mut packet| {
                self.translate_packet(direction, &mut packet, conn);
                packet
            })
            .collect()
    }

    fn translate_packet(&self, direction: Direction, packet: &mut Packet, conn: &ConnectionState) {
        let legacy = conn.legacy_chunk_format();
        let range = if legacy { Range::LEGACY } else { Range::OVERWORLD };

        match packet {
            Packet::LevelChunk {
                sub_chunk_count,
                cache_enabled,
                raw_payload,
                ..
            } => {
                if *sub_chunk_count == SUB_CHUNK_REQUEST_MODE_LIMITLESS
                    || *sub_chunk_count == SUB_CHUNK_REQUEST_MODE_LIMITED
                {
                    return;
                }
                let cached = *cache_enabled || conn.client_cache_enabled;
                if let Some((payload, count)) =
                    self.translate_level_chunk(direction, raw_payload, *sub_chunk_count, cached, legacy, range)
                {
                    *raw_payload = payload;
                    *sub_chunk_count = count;
                }
            }
            Packet::SubChunk {
                cache_enabled,
                entries,
                ..
            } => {
                let cached = *cache_enabled || conn.client_cache_enabled;
                for (index, entry) in entries.iter_mut().enumerate() {
                    if entry.result != SUB_CHUNK_RESULT_SUCCESS {
                        continue;
                    }
                    let mut buf = BytesMut::from(&entry.raw_payload[..]);
                    let mut out = BytesMut::new();
                    if !cached {
                        match self.translate_encoded_sub_chunk(direction, &mut buf, index, range) {
                            Some(encoded) => out.put_slice(&encoded),
                            None => continue,
                        }
                    }
                    self.remap_block_actors(direction, &mut buf, &mut out);
                    entry.raw_payload = out.to_vec();
                }
            }
            Packet::ClientCacheMissResponse { blobs } => {
                for blob in blobs {
                    let mut buf = BytesMut::from(&blob.payload[..]);
                    // Biome blobs fail to decode and are left alone.
                    if let Some(mut encoded) = self.translate_encoded_sub_chunk(direction, &mut buf, 0, range) {
                        encoded.extend_from_slice(&buf);
                        blob.payload = encoded;
                    }
                }
            }
            Packet::UpdateSubChunkBlocks { blocks, extra, .. } => {
                for entry in blocks.iter_mut().chain(extra.iter_mut()) {
                    entry.block_runtime_id = self.translate_runtime_id(direction, entry.block_runtime_id);
                }
            }
            Packet::UpdateBlock {
                new_block_runtime_id,
                ..
            }
            | Packet::UpdateBlockSynced {
                new_block_runtime_id,
                ..
            } => {
                *new_block_runtime_id = self.translate_runtime_id(direction, *new_block_runtime_id);
            }
            Packet::InventoryTransaction {
                transaction_data: TransactionData::UseItem(data),
                ..
            } => {
                data.block_runtime_id = self.translate_runtime_id(direction, data.block_runtime_id);
            }
            Packet::PlayerAuthInput {
                item_interaction_data: Some(data),
                ..
            } => {
                data.block_runtime_id = self.translate_runtime_id(direction, data.block_runtime_id);
            }
            Packet::LevelEvent {
                event_type,
                event_data,
                ..
            } => match *event_type {
                LEVEL_EVENT_TERRAIN_PARTICLE
                | LEVEL_EVENT_PARTICLES_DESTROY_BLOCK
                | LEVEL_EVENT_PARTICLES_DESTROY_BLOCK_NO_SOUND => {
                    *event_data = self.translate_runtime_id(direction, *event_data as u32) as i32;
                }
                LEVEL_EVENT_PARTICLES_CRACK_BLOCK => {
                    // Face in the top byte, runtime ID in the low 16 bits.
                    let face = *event_data >> 24;
                    let rid = self.translate_runtime_id(direction, (*event_data & 0xffff) as u32);
                    *event_data = rid as i32 | (face << 24);
                }
                _ => {}
            },
            Packet::LevelSoundEvent {
                sound_type,
                extra_data,
                ..
            } => {
                if matches!(
                    *sound_type,
                    SOUND_EVENT_ITEM_USE_ON
                        | SOUND_EVENT_HIT
                        | SOUND_EVENT_BREAK
                        | SOUND_EVENT_PLACE
                        | SOUND_EVENT_LAND
                ) {
                    *extra_data = self.translate_runtime_id(direction, *extra_data as u32) as i32;
                }
            }
            Packet::AddActor {
                entity_type,
                entity_metadata,
                ..
            } if *entity_type == FALLING_BLOCK_ENTITY => {
                self.translate_metadata(direction, entity_metadata);
            }
            Packet::SetActorData {
                entity_metadata, ..
            } => {
                self.translate_metadata(direction, entity_metadata);
            }
            Packet::StartGame { blocks, .. } if !blocks.is_empty() => {
                if let Err(err) = self.adjust_entries(blocks) {
                    warn!("Could not add the start game custom blocks: {}", err);
                }
            }
            _ => {}
        }
    }

    /// Returns the new payload and sub-chunk count, or `None` to leave the packet untouched.
    fn translate_level_chunk(
        &self,
        direction: Direction,
        payload: &[u8],
        count: u32,
        cached: bool,
        legacy: bool,
        range: Range,
    ) -> Option<(Vec<u8>, u32)> {
        let mut buf = BytesMut::from(payload);
        let mut out = BytesMut::new();
        let mut count = count;

        if !cached {
            let (source, _) = self.registries(direction);
            let mut chunk = match network_decode(source.air(), &mut buf, count as usize, legacy, range) {
                Ok(chunk) => chunk,
                Err(err) => {
                    debug!("Passing level chunk through unchanged: {}", err);
                    return None;
                }
            };
            self.translate_chunk(direction, &mut chunk);
            out.put_slice(&network_encode(&chunk, legacy));
            count = chunk.sub().len() as u32;
        }

        // Border blocks: a count byte and that many bytes.
        if let Some(&border) = buf.first() {
            let len = 1 + border as usize;
            if buf.len() < len {
                out.put_slice(&buf);
                return Some((out.to_vec(), count));
            }
            out.put_slice(&buf.split_to(len));
        }
        self.remap_block_actors(direction, &mut buf, &mut out);
        Some((out.to_vec(), count))
    }

    fn translate_encoded_sub_chunk(
        &self,
        direction: Direction,
        buf: &mut BytesMut,
        default_index: usize,
        range: Range,
    ) -> Option<Vec<u8>> {
        let (source, _) = self.registries(direction);
        let (mut sub, index) = match decode_sub_chunk(buf, source.air(), range, Encoding::Network) {
            Ok(decoded) => decoded,
            Err(err) => {
                debug!("Passing sub-chunk through unchanged: {}", err);
                return None;
            }
        };
        let index = match index {
            Some(index) => usize::try_from(index).ok()?,
            None => default_index,
        };
        self.translate_sub_chunk(direction, &mut sub);
        Some(encode_sub_chunk(&sub, Encoding::Network, SubChunkVersion::V9, range, index))
    }

    /// Copy the network NBT block actors in `buf` to `out` through the version's remapper.
    /// Anything that is not a compound is copied as is.
    fn remap_block_actors(&self, direction: Direction, buf: &mut BytesMut, out: &mut BytesMut) {
        while !buf.is_empty() {
            let mut attempt = buf.clone();
            let Ok(mut nbt) = read_compound(&mut attempt, NbtEncoding::NetworkLittleEndian) else {
                break;
            };
            *buf = attempt;
            match direction {
                Direction::Downgrade => self.mapping.downgrade_block_actor_data(&mut nbt),
                Direction::Upgrade => self.mapping.upgrade_block_actor_data(&mut nbt),
            }
            write_compound(&nbt, NbtEncoding::NetworkLittleEndian, out);
        }
        out.put_slice(buf);
    }

    fn translate_metadata(&self, direction: Direction, metadata: &mut EntityMetadata) {
        if let Some(MetadataValue::Int(rid)) = metadata.get_mut(&ENTITY_DATA_KEY_VARIANT) {
            *rid = self.translate_runtime_id(direction, *rid as u32) as i32;
        }
    }
}
