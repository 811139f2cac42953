//! Authoritative attribute store of one entity
//!
//! Every mutation follows the same order: resolve the key's modifier identity,
//! reconcile the live attribute system, update the local table, then hand a
//! delta to the sync sink. A key without an identity is inert and every write
//! to it is a silent no-op.
//!
//! A replica store is a read-only mirror: its state changes only through the
//! dispatcher's receive path, and its mutators are logged no-ops.

use crate::attributes::context::{HostContext, SyncContext};
use crate::attributes::state::EntityState;
use crate::core::types::{AttributeKey, EntityId, ModifierIdentity};
use crate::sync::dispatcher::Role;
use crate::sync::message::{ModifierEntry, PersistedRecord, SyncMessage};

pub struct AttributeStore {
    entity: EntityId,
    role: Role,
    state: EntityState,
    ctx: SyncContext,
}

impl AttributeStore {
    /// Fresh authoritative store: no overrides, zero counters, flag cleared
    pub fn new(entity: EntityId, ctx: SyncContext) -> Self {
        Self::with_role(entity, Role::Authoritative, ctx)
    }

    /// Fresh mirror of an entity owned elsewhere
    pub fn replica(entity: EntityId, ctx: SyncContext) -> Self {
        Self::with_role(entity, Role::Replica, ctx)
    }

    pub fn with_role(entity: EntityId, role: Role, ctx: SyncContext) -> Self {
        Self {
            entity,
            role,
            state: EntityState::new(),
            ctx,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn state(&self) -> &EntityState {
        &self.state
    }

    /// Mutable state for the replica apply path, which bypasses the live system
    pub(crate) fn state_mut(&mut self) -> &mut EntityState {
        &mut self.state
    }

    pub fn get(&self, key: &AttributeKey) -> f64 {
        self.state.get(key)
    }

    pub fn set(&mut self, key: &AttributeKey, value: f64) {
        if self.is_replica("set") {
            return;
        }
        if !value.is_finite() {
            tracing::debug!(entity = %self.entity, %key, value, "non-finite value ignored");
            return;
        }

        let value = self.ctx.live.clamp(key, value);
        if !self.try_set(key, value) {
            return;
        }

        self.publish(SyncMessage::Set(ModifierEntry::new(key.clone(), value)));
    }

    pub fn add(&mut self, key: &AttributeKey, delta: f64) {
        let current = self.get(key);
        self.set(key, current + delta);
    }

    pub fn remove(&mut self, key: &AttributeKey) {
        if self.is_replica("remove") {
            return;
        }
        let Some(identity) = self.identity(key) else {
            return;
        };

        self.detach_modifier(identity);
        self.state.erase(key);

        // Sent even when no override existed for the key
        self.publish(SyncMessage::Remove(key.clone()));
    }

    pub fn reset(&mut self) {
        if self.is_replica("reset") {
            return;
        }
        let keys = self.state.drain_keys();
        for key in &keys {
            if let Some(identity) = self.ctx.resolver.identity_for(key) {
                self.detach_modifier(identity);
            }
        }

        self.state.set_refund_points(0);
        self.state.set_skill_points(0);
        self.state.set_notified_level_up(false);

        self.publish(SyncMessage::Reset(keys));
    }

    pub fn add_skill_points(&mut self, points: i32) {
        if self.is_replica("add_skill_points") {
            return;
        }
        let total = self.state.skill_points().saturating_add(points);
        self.state.set_skill_points(total);
        self.publish(SyncMessage::SkillPoints(total));
    }

    /// Add (or remove) refund points within the current budget
    ///
    /// Returns the change actually applied after clamping to
    /// `[0, budget]`, which may be smaller than `points` or zero.
    pub fn add_refund_points(&mut self, points: i32) -> i32 {
        if self.is_replica("add_refund_points") {
            return 0;
        }
        let previous = self.state.refund_points();
        let budget = {
            let host = HostContext::new(self.entity, self.ctx.live.as_ref());
            self.ctx.refunds.total_budget(&self.state, &host)
        };

        let target = previous as f64 + points as f64;
        let clamped = target.min(budget).max(0.0);
        // Round half up, then saturate into i32
        let refund = (clamped + 0.5).floor() as i32;

        self.state.set_refund_points(refund);
        self.publish(SyncMessage::RefundPoints(refund));

        refund.saturating_sub(previous)
    }

    pub fn skill_points(&self) -> i32 {
        self.state.skill_points()
    }

    pub fn refund_points(&self) -> i32 {
        self.state.refund_points()
    }

    pub fn notified_level_up(&self) -> bool {
        self.state.notified_level_up()
    }

    /// Record that the level-up notice was shown; persisted, never replicated
    pub fn mark_level_up_notified(&mut self) {
        if self.is_replica("mark_level_up_notified") {
            return;
        }
        self.state.set_notified_level_up(true);
    }

    pub fn to_record(&self) -> PersistedRecord {
        self.state.to_record()
    }

    /// Restore from a persisted record
    ///
    /// Entries go through the set path so live modifiers are re-created, but
    /// values are taken as stored and nothing is published. Refund points
    /// below zero are raised to zero.
    pub fn load_record(&mut self, record: &PersistedRecord) {
        if self.is_replica("load_record") {
            return;
        }
        for entry in &record.modifiers {
            if !self.try_set(&entry.key, entry.value) {
                tracing::debug!(
                    entity = %self.entity,
                    key = %entry.key,
                    "persisted override for unregistered attribute dropped"
                );
            }
        }
        self.state.set_refund_points(record.refund_points.max(0));
        self.state.set_skill_points(record.skill_points);
        self.state.set_notified_level_up(record.notified_level_up);
    }

    /// Messages that bring a freshly attached observer up to date
    pub fn full_sync_messages(&self) -> Vec<SyncMessage> {
        vec![
            SyncMessage::BulkLoad(self.state.entries()),
            SyncMessage::RefundPoints(self.state.refund_points()),
            SyncMessage::SkillPoints(self.state.skill_points()),
        ]
    }

    fn is_replica(&self, op: &'static str) -> bool {
        let replica = self.role == Role::Replica;
        if replica {
            tracing::warn!(entity = %self.entity, op, "mutation of replica store ignored");
        }
        replica
    }

    fn identity(&self, key: &AttributeKey) -> Option<ModifierIdentity> {
        let identity = self.ctx.resolver.identity_for(key);
        if identity.is_none() {
            tracing::debug!(entity = %self.entity, %key, "no modifier identity; write ignored");
        }
        identity
    }

    fn try_set(&mut self, key: &AttributeKey, value: f64) -> bool {
        let Some(identity) = self.identity(key) else {
            return false;
        };

        if self.ctx.live.has_modifier(self.entity, identity) {
            self.ctx.live.update_modifier(self.entity, identity, value);
        } else {
            self.ctx.live.add_modifier(self.entity, identity, value);
        }

        self.state.insert(key.clone(), value);
        true
    }

    fn detach_modifier(&self, identity: ModifierIdentity) {
        if self.ctx.live.has_modifier(self.entity, identity) {
            self.ctx.live.remove_modifier(self.entity, identity);
        }
    }

    fn publish(&self, message: SyncMessage) {
        self.ctx.sink.publish(self.entity, &message);
    }
}

impl std::fmt::Debug for AttributeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeStore")
            .field("entity", &self.entity)
            .field("role", &self.role)
            .field("state", &self.state)
            .finish()
    }
}
