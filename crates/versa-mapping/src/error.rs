use std::path::PathBuf;
use thiserror::Error;
use versa_nbt::NbtError;
use versa_protocol::CodecError;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Catalogue has no {0} entry")]
    MissingAir(&'static str),
    #[error("Unsupported value (tag {tag}) for property {property} of {block}")]
    UnsupportedProperty {
        block: String,
        property: String,
        tag: u8,
    },
    #[error("Malformed catalogue entry: {0}")]
    MalformedEntry(String),
    #[error("Invalid schema file name {0}")]
    SchemaFileName(String),
    #[error("NBT error: {0}")]
    Nbt(#[from] NbtError),
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type MappingResult<T> = Result<T, MappingError>;

pub(crate) fn read_file(path: &std::path::Path) -> MappingResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| MappingError::Io {
        path: path.to_path_buf(),
        source,
    })
}
