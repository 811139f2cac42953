//! Byte encoding for delta messages and persisted records
//!
//! Delta frame: `VERSION(1) || PAYLOAD`, where PAYLOAD is the JSON form of a
//! [`SyncMessage`]. Persisted records are plain pretty-printed JSON so save
//! files stay readable.

use crate::sync::message::{PersistedRecord, SyncMessage};
use thiserror::Error;

/// Delta frame version
pub const WIRE_VERSION: u8 = 1;

/// Reasons a byte buffer could not be turned back into a message
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty frame")]
    Empty,

    #[error("unsupported wire version {0}")]
    UnsupportedVersion(u8),

    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Encode one delta into a versioned frame
pub fn encode(message: &SyncMessage) -> Result<Vec<u8>, serde_json::Error> {
    let mut frame = Vec::with_capacity(64);
    frame.push(WIRE_VERSION);
    serde_json::to_writer(&mut frame, message)?;
    Ok(frame)
}

/// Decode a versioned frame
///
/// Either the whole message decodes or nothing is returned; callers never
/// see a partially decoded delta.
pub fn decode(bytes: &[u8]) -> Result<SyncMessage, DecodeError> {
    let (&version, payload) = bytes.split_first().ok_or(DecodeError::Empty)?;
    if version != WIRE_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }
    Ok(serde_json::from_slice(payload)?)
}

pub fn encode_record(record: &PersistedRecord) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(record)
}

pub fn decode_record(bytes: &[u8]) -> Result<PersistedRecord, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(serde_json::from_slice(bytes)?)
}
