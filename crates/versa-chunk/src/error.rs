use thiserror::Error;
use versa_mapping::MappingError;
use versa_nbt::NbtError;
use versa_protocol::CodecError;

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("Unknown sub-chunk version {0}")]
    UnknownSubChunkVersion(u8),
    #[error("Invalid palette index width {0}")]
    InvalidPaletteSize(u8),
    #[error("Invalid palette entry count {0}")]
    InvalidPaletteCount(i64),
    #[error("No runtime ID for block state {0}")]
    UnknownBlockState(String),
    #[error("Palette index {index} out of range for a palette of {len}")]
    PaletteIndexOutOfRange { index: usize, len: usize },
    #[error("Storage refers to a previous storage but none exists")]
    DeltaWithoutPrevious,
    #[error("Sub-chunk index {0} outside of the chunk")]
    SubChunkIndex(i32),
    #[error("NBT error: {0}")]
    Nbt(#[from] NbtError),
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),
}

pub type ChunkResult<T> = Result<T, ChunkError>;
