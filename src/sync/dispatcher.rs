//! Routes deltas out of authoritative stores and into replicas
//!
//! Each tracked entity has a fixed [`Role`]. Only the authoritative side
//! publishes; only replicas accept incoming deltas, and they apply them to
//! plain state without touching the live attribute system.

use crate::attributes::state::EntityState;
use crate::core::error::{Result, SyncError};
use crate::core::types::EntityId;
use crate::sync::codec;
use crate::sync::message::SyncMessage;
use crate::sync::transport::{Envelope, ObserverId, Transport};
use crate::sync::SyncSink;
use ahash::AHashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Whether this process owns an entity's state or mirrors it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Authoritative,
    Replica,
}

#[derive(Debug)]
struct Route {
    role: Role,
    observers: Vec<ObserverId>,
}

pub struct SyncDispatcher {
    transport: Arc<dyn Transport>,
    routes: RwLock<AHashMap<EntityId, Route>>,
}

impl SyncDispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            routes: RwLock::new(AHashMap::new()),
        }
    }

    /// Start routing for an entity
    ///
    /// The role is fixed for as long as the entity stays tracked; returns
    /// false if the entity was already tracked (its role is left unchanged).
    pub fn track(&self, entity: EntityId, role: Role) -> bool {
        let mut routes = self.write();
        if let Some(route) = routes.get(&entity) {
            if route.role != role {
                tracing::warn!(%entity, current = ?route.role, requested = ?role, "role change refused");
            }
            return false;
        }
        routes.insert(
            entity,
            Route {
                role,
                observers: Vec::new(),
            },
        );
        true
    }

    pub fn untrack(&self, entity: EntityId) -> bool {
        self.write().remove(&entity).is_some()
    }

    pub fn role(&self, entity: EntityId) -> Option<Role> {
        self.read().get(&entity).map(|route| route.role)
    }

    pub fn is_authoritative(&self, entity: EntityId) -> bool {
        self.role(entity) == Some(Role::Authoritative)
    }

    /// Register an observer of an authoritative entity
    pub fn add_observer(&self, entity: EntityId, observer: ObserverId) -> Result<()> {
        let mut routes = self.write();
        let route = routes
            .get_mut(&entity)
            .ok_or(SyncError::EntityNotTracked(entity))?;
        if !route.observers.contains(&observer) {
            route.observers.push(observer);
        }
        Ok(())
    }

    pub fn remove_observer(&self, entity: EntityId, observer: ObserverId) -> bool {
        let mut routes = self.write();
        let Some(route) = routes.get_mut(&entity) else {
            return false;
        };
        let before = route.observers.len();
        route.observers.retain(|o| *o != observer);
        route.observers.len() != before
    }

    pub fn observers(&self, entity: EntityId) -> Vec<ObserverId> {
        self.read()
            .get(&entity)
            .map(|route| route.observers.clone())
            .unwrap_or_default()
    }

    /// Encode and send a delta to every observer, if authoritative
    pub fn publish(&self, entity: EntityId, message: &SyncMessage) {
        let observers = {
            let routes = self.read();
            match routes.get(&entity) {
                Some(route) if route.role == Role::Authoritative => route.observers.clone(),
                _ => return,
            }
        };
        if observers.is_empty() {
            return;
        }

        let Some(payload) = self.encode(entity, message) else {
            return;
        };
        tracing::debug!(%entity, kind = message.kind(), observers = observers.len(), "publishing delta");
        for observer in observers {
            self.transport.send(
                observer,
                Envelope {
                    entity,
                    payload: payload.clone(),
                },
            );
        }
    }

    /// Send a delta to one observer only, if authoritative
    pub fn send_to(&self, entity: EntityId, observer: ObserverId, message: &SyncMessage) {
        if !self.is_authoritative(entity) {
            return;
        }
        if let Some(payload) = self.encode(entity, message) {
            self.transport.send(observer, Envelope { entity, payload });
        }
    }

    /// Decode an incoming delta and apply it to a replica's state
    ///
    /// A malformed buffer or a delta aimed at an authoritative entity is
    /// logged and discarded; `state` is left exactly as it was.
    pub fn on_receive(
        &self,
        entity: EntityId,
        bytes: &[u8],
        state: &mut EntityState,
    ) -> Result<SyncMessage> {
        match self.role(entity) {
            Some(Role::Replica) => {}
            Some(Role::Authoritative) => {
                tracing::warn!(%entity, "delta for authoritative entity discarded");
                return Err(SyncError::NotReplica(entity));
            }
            None => {
                tracing::warn!(%entity, "delta for untracked entity discarded");
                return Err(SyncError::EntityNotTracked(entity));
            }
        }

        let message = codec::decode(bytes).map_err(|e| {
            tracing::warn!(%entity, error = %e, len = bytes.len(), "malformed delta discarded");
            e
        })?;

        state.apply(&message);
        tracing::debug!(%entity, kind = message.kind(), "applied delta");
        Ok(message)
    }

    fn encode(&self, entity: EntityId, message: &SyncMessage) -> Option<Vec<u8>> {
        match codec::encode(message) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(%entity, kind = message.kind(), error = %e, "delta not encodable; dropped");
                None
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, AHashMap<EntityId, Route>> {
        self.routes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AHashMap<EntityId, Route>> {
        self.routes.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SyncSink for SyncDispatcher {
    fn publish(&self, entity: EntityId, message: &SyncMessage) {
        SyncDispatcher::publish(self, entity, message);
    }
}

impl std::fmt::Debug for SyncDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncDispatcher")
            .field("routes", &*self.read())
            .finish()
    }
}
