use thiserror::Error;
use versa_mapping::MappingError;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Replacement item {0} is not in the latest item registry")]
    UnknownReplacement(String),
    #[error("Replacement item {0} already stands in for a custom item")]
    AlreadyMapped(String),
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),
}

pub type TranslateResult<T> = Result<T, TranslateError>;
