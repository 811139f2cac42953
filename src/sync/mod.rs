//! Delta replication between the authoritative host and its observers
//!
//! Delivery is fire-and-forget and at most once. A replica that missed deltas
//! is repaired by a full-state push when it (re)attaches, never by
//! retransmission.

pub mod codec;
pub mod dispatcher;
pub mod message;
pub mod transport;

use crate::core::types::EntityId;

pub use codec::{decode, encode, DecodeError, WIRE_VERSION};
pub use dispatcher::{Role, SyncDispatcher};
pub use message::{ModifierEntry, PersistedRecord, SyncMessage};
pub use transport::{ChannelTransport, Envelope, ObserverId, Transport};

/// Where an attribute store hands its outgoing deltas
pub trait SyncSink: Send + Sync {
    fn publish(&self, entity: EntityId, message: &SyncMessage);
}
