use thiserror::Error;

use crate::core::types::{EntityId, KeyParseError};
use crate::sync::codec::DecodeError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Entity not tracked: {0}")]
    EntityNotTracked(EntityId),

    #[error("Entity {0} is authoritative here; replicated update refused")]
    NotReplica(EntityId),

    #[error("Invalid attribute key: {0}")]
    InvalidKey(#[from] KeyParseError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
