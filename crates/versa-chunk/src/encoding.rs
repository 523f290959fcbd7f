use crate::{ChunkError, ChunkResult, Palette, PaletteSize};
use bytes::{BufMut, BytesMut};
use tracing::trace;
use versa_mapping::{state_from_nbt, state_to_nbt, state_to_nbt_named, BlockRegistry, AIR_BLOCK};
use versa_nbt::{read_compound, write_compound, NbtEncoding};
use versa_protocol::{read_i32_le, read_u32_le, read_varint32, write_varint32};
use versa_types::{qualify_name, BlockState};

/// Palettes never hold more entries than a storage has cells.
const MAX_PALETTE_LEN: i64 = 4096;

/// How palettes are written. Persistent and disk palettes name their block states, so they
/// carry the registry that resolves runtime IDs.
#[derive(Clone, Copy)]
pub enum Encoding<'a> {
    /// Runtime IDs as varints.
    Network,
    /// Network NBT block states without the `minecraft:` prefix.
    NetworkPersistent(&'a BlockRegistry),
    /// Little-endian NBT block states and u32 biome IDs.
    Disk(&'a BlockRegistry),
}

/// What the values of a palette are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKind {
    Block,
    Biome,
}

impl<'a> Encoding<'a> {
    /// Low bit of every storage header.
    pub fn network_flag(&self) -> u8 {
        match self {
            Encoding::Network | Encoding::NetworkPersistent(_) => 1,
            Encoding::Disk(_) => 0,
        }
    }

    pub(crate) fn encode_palette(&self, buf: &mut BytesMut, palette: &Palette, kind: PaletteKind) {
        let sized = palette.size() != PaletteSize::ZERO;
        match self {
            Encoding::Network => {
                if sized {
                    write_varint32(buf, palette.len() as i32);
                }
                for value in palette.values() {
                    write_varint32(buf, *value as i32);
                }
            }
            Encoding::NetworkPersistent(registry) => {
                if sized {
                    write_varint32(buf, palette.len() as i32);
                }
                for value in palette.values() {
                    match kind {
                        PaletteKind::Biome => write_varint32(buf, *value as i32),
                        PaletteKind::Block => {
                            let state = state_or_air(registry, *value);
                            let name = state.name.strip_prefix("minecraft:").unwrap_or(&state.name);
                            write_compound(
                                &state_to_nbt_named(&state, name),
                                NbtEncoding::NetworkLittleEndian,
                                buf,
                            );
                        }
                    }
                }
            }
            Encoding::Disk(registry) => {
                if sized {
                    buf.put_u32_le(palette.len() as u32);
                }
                for value in palette.values() {
                    match kind {
                        PaletteKind::Biome => buf.put_u32_le(*value),
                        PaletteKind::Block => write_compound(
                            &state_to_nbt(&state_or_air(registry, *value)),
                            NbtEncoding::LittleEndian,
                            buf,
                        ),
                    }
                }
            }
        }
    }

    pub(crate) fn decode_palette(
        &self,
        buf: &mut BytesMut,
        size: PaletteSize,
        kind: PaletteKind,
    ) -> ChunkResult<Palette> {
        let count = if size == PaletteSize::ZERO {
            1
        } else {
            let count = match self {
                Encoding::Network | Encoding::NetworkPersistent(_) => read_varint32(buf)? as i64,
                Encoding::Disk(_) => read_i32_le(buf)? as i64,
            };
            if count <= 0 || count > MAX_PALETTE_LEN {
                return Err(ChunkError::InvalidPaletteCount(count));
            }
            count
        };

        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let value = match (self, kind) {
                (Encoding::Network, _) | (Encoding::NetworkPersistent(_), PaletteKind::Biome) => {
                    read_varint32(buf)? as u32
                }
                (Encoding::Disk(_), PaletteKind::Biome) => read_u32_le(buf)?,
                (Encoding::NetworkPersistent(registry), PaletteKind::Block) => {
                    let nbt = read_compound(buf, NbtEncoding::NetworkLittleEndian)?;
                    let mut state = state_from_nbt(&nbt)?;
                    state.name = qualify_name(&state.name);
                    runtime_id(registry, &state)?
                }
                (Encoding::Disk(registry), PaletteKind::Block) => {
                    let nbt = read_compound(buf, NbtEncoding::LittleEndian)?;
                    runtime_id(registry, &state_from_nbt(&nbt)?)?
                }
            };
            values.push(value);
        }
        Ok(Palette::new(size, values))
    }
}

fn runtime_id(registry: &BlockRegistry, state: &BlockState) -> ChunkResult<u32> {
    registry
        .state_to_runtime_id(state)
        .ok_or_else(|| ChunkError::UnknownBlockState(state.name.clone()))
}

fn state_or_air(registry: &BlockRegistry, runtime_id: u32) -> BlockState {
    registry.runtime_id_to_state(runtime_id).unwrap_or_else(|| {
        trace!("Runtime ID {} has no state, writing air", runtime_id);
        registry
            .runtime_id_to_state(registry.air())
            .unwrap_or_else(|| BlockState::new(AIR_BLOCK))
    })
}
