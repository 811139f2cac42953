pub mod config;
pub mod error;
pub mod types;

pub use config::{AttributeDef, RefundPolicyConfig, SyncConfig};
pub use error::{Result, SyncError};
pub use types::{AttributeKey, EntityId, KeyParseError, ModifierIdentity};
