//! Byte transport boundary and an in-process channel implementation

use crate::core::types::EntityId;
use ahash::AHashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// Endpoint of one observing replica
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub Uuid);

impl ObserverId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObserverId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Encoded delta plus the entity it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub entity: EntityId,
    pub payload: Vec<u8>,
}

/// Reliable, ordered, point-to-point byte delivery
///
/// `send` never reports failure to the caller; implementations log and drop.
pub trait Transport: Send + Sync {
    fn send(&self, observer: ObserverId, envelope: Envelope);
}

/// Transport over unbounded tokio channels, one per connected observer
#[derive(Debug, Default)]
pub struct ChannelTransport {
    peers: RwLock<AHashMap<ObserverId, UnboundedSender<Envelope>>>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an inbox for `observer`, replacing any earlier connection
    pub fn connect(&self, observer: ObserverId) -> UnboundedReceiver<Envelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(observer, tx);
        rx
    }

    /// Close the observer's inbox; its receiver ends once drained
    pub fn disconnect(&self, observer: ObserverId) -> bool {
        self.peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&observer)
            .is_some()
    }

    pub fn is_connected(&self, observer: ObserverId) -> bool {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&observer)
            .is_some_and(|tx| !tx.is_closed())
    }
}

impl Transport for ChannelTransport {
    fn send(&self, observer: ObserverId, envelope: Envelope) {
        let peers = self.peers.read().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = peers.get(&observer) else {
            tracing::warn!(%observer, entity = %envelope.entity, "no connection; delta dropped");
            return;
        };
        if tx.send(envelope).is_err() {
            tracing::warn!(%observer, "observer inbox closed; delta dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(byte: u8) -> Envelope {
        Envelope {
            entity: EntityId::new(),
            payload: vec![byte],
        }
    }

    #[test]
    fn test_send_delivers_in_order() {
        let transport = ChannelTransport::new();
        let observer = ObserverId::new();
        let mut inbox = transport.connect(observer);

        transport.send(observer, envelope(1));
        transport.send(observer, envelope(2));

        assert_eq!(inbox.try_recv().unwrap().payload, vec![1]);
        assert_eq!(inbox.try_recv().unwrap().payload, vec![2]);
        assert!(inbox.try_recv().is_err());
    }

    #[test]
    fn test_send_to_unknown_observer_is_dropped() {
        let transport = ChannelTransport::new();
        transport.send(ObserverId::new(), envelope(1));
    }

    #[test]
    fn test_disconnect_closes_inbox() {
        let transport = ChannelTransport::new();
        let observer = ObserverId::new();
        let mut inbox = transport.connect(observer);
        assert!(transport.is_connected(observer));

        assert!(transport.disconnect(observer));
        assert!(!transport.is_connected(observer));
        assert!(matches!(
            inbox.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_dropped_receiver_is_not_connected() {
        let transport = ChannelTransport::new();
        let observer = ObserverId::new();
        drop(transport.connect(observer));
        assert!(!transport.is_connected(observer));
        transport.send(observer, envelope(3));
    }
}
