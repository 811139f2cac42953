//! World - owns the attribute store of every tracked entity

use ahash::AHashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::attributes::{
    AttributeStore, LiveAttributes, ModifierIdentityResolver, RefundPolicyRegistry, SyncContext,
};
use crate::core::error::{Result, SyncError};
use crate::core::types::EntityId;
use crate::persistence::PersistenceStore;
use crate::sync::{Envelope, ObserverId, Role, SyncDispatcher, SyncMessage};

/// All attribute stores of one process, on the host or on a replica
///
/// Stores are only reachable through `&mut World`, which serializes every
/// mutation of a given entity's state.
pub struct World {
    ctx: SyncContext,
    dispatcher: Arc<SyncDispatcher>,
    persistence: Option<Arc<dyn PersistenceStore>>,
    stores: AHashMap<EntityId, AttributeStore>,
}

impl World {
    /// Every store created by this world publishes through `dispatcher`
    pub fn new(
        resolver: Arc<ModifierIdentityResolver>,
        refunds: Arc<RefundPolicyRegistry>,
        live: Arc<dyn LiveAttributes>,
        dispatcher: Arc<SyncDispatcher>,
    ) -> Self {
        Self {
            ctx: SyncContext::new(resolver, refunds, live, dispatcher.clone()),
            dispatcher,
            persistence: None,
            stores: AHashMap::new(),
        }
    }

    pub fn with_persistence(mut self, persistence: Arc<dyn PersistenceStore>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn dispatcher(&self) -> &Arc<SyncDispatcher> {
        &self.dispatcher
    }

    /// Start tracking an entity
    ///
    /// Authoritative entities are restored from persistence when a record
    /// exists. Tracking an entity twice returns the existing store.
    pub fn track(&mut self, entity: EntityId, role: Role) -> Result<&mut AttributeStore> {
        if !self.stores.contains_key(&entity) {
            let mut store = AttributeStore::with_role(entity, role, self.ctx.clone());

            if role == Role::Authoritative {
                if let Some(persistence) = &self.persistence {
                    if let Some(record) = persistence.load_record(entity)? {
                        store.load_record(&record);
                        tracing::info!(
                            %entity,
                            overrides = store.state().len(),
                            "restored attribute state"
                        );
                    }
                }
            }

            self.dispatcher.track(entity, role);
            self.stores.insert(entity, store);
        }

        self.stores
            .get_mut(&entity)
            .ok_or(SyncError::EntityNotTracked(entity))
    }

    /// Stop tracking an entity, saving its final state first if authoritative
    pub fn untrack(&mut self, entity: EntityId) -> Result<Option<AttributeStore>> {
        if !self.stores.contains_key(&entity) {
            return Ok(None);
        }
        self.save(entity)?;
        self.dispatcher.untrack(entity);
        Ok(self.stores.remove(&entity))
    }

    pub fn store(&self, entity: EntityId) -> Option<&AttributeStore> {
        self.stores.get(&entity)
    }

    pub fn store_mut(&mut self, entity: EntityId) -> Option<&mut AttributeStore> {
        self.stores.get_mut(&entity)
    }

    /// Persist one entity; replicas and worlds without persistence skip
    pub fn save(&self, entity: EntityId) -> Result<bool> {
        let Some(persistence) = &self.persistence else {
            return Ok(false);
        };
        if !self.dispatcher.is_authoritative(entity) {
            return Ok(false);
        }
        let store = self
            .stores
            .get(&entity)
            .ok_or(SyncError::EntityNotTracked(entity))?;
        persistence.save_record(entity, &store.to_record())?;
        Ok(true)
    }

    /// Persist every authoritative entity, returning how many were written
    pub fn save_all(&self) -> Result<usize> {
        let mut saved = 0;
        for entity in self.entities() {
            if self.save(entity)? {
                saved += 1;
            }
        }
        tracing::info!(saved, "saved attribute state");
        Ok(saved)
    }

    /// Register an observer and bring it up to date with a full-state push
    pub fn attach_observer(&mut self, entity: EntityId, observer: ObserverId) -> Result<()> {
        let store = self
            .stores
            .get(&entity)
            .ok_or(SyncError::EntityNotTracked(entity))?;
        self.dispatcher.add_observer(entity, observer)?;
        for message in store.full_sync_messages() {
            self.dispatcher.send_to(entity, observer, &message);
        }
        tracing::debug!(%entity, %observer, "observer attached");
        Ok(())
    }

    pub fn detach_observer(&mut self, entity: EntityId, observer: ObserverId) -> bool {
        self.dispatcher.remove_observer(entity, observer)
    }

    /// Apply one incoming delta, tracking the entity as a replica on first sight
    ///
    /// A first delta that is rejected leaves the entity untracked.
    pub fn receive(&mut self, entity: EntityId, bytes: &[u8]) -> Result<SyncMessage> {
        let first_sight = !self.stores.contains_key(&entity);
        if first_sight {
            self.track(entity, Role::Replica)?;
        }
        let store = self
            .stores
            .get_mut(&entity)
            .ok_or(SyncError::EntityNotTracked(entity))?;
        let result = self.dispatcher.on_receive(entity, bytes, store.state_mut());

        match &result {
            Err(_) if first_sight => {
                self.dispatcher.untrack(entity);
                self.stores.remove(&entity);
            }
            Ok(_) if first_sight => {
                tracing::debug!(%entity, "first delta for entity; tracking as replica");
            }
            _ => {}
        }
        result
    }

    /// Apply everything already waiting in an inbox, returning how many applied
    pub fn drain_inbox(&mut self, inbox: &mut UnboundedReceiver<Envelope>) -> usize {
        let mut applied = 0;
        while let Ok(envelope) = inbox.try_recv() {
            if self.receive(envelope.entity, &envelope.payload).is_ok() {
                applied += 1;
            }
        }
        applied
    }

    /// Apply deltas until the sending side disconnects
    pub async fn run_replica(&mut self, mut inbox: UnboundedReceiver<Envelope>) -> usize {
        let mut applied = 0;
        while let Some(envelope) = inbox.recv().await {
            if self.receive(envelope.entity, &envelope.payload).is_ok() {
                applied += 1;
            }
        }
        tracing::info!(applied, "replica inbox closed");
        applied
    }

    pub fn entity_count(&self) -> usize {
        self.stores.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.stores.keys().copied()
    }
}
