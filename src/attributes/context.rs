//! Shared handles every attribute store is built with

use crate::attributes::live::LiveAttributes;
use crate::attributes::refund::RefundPolicyRegistry;
use crate::attributes::resolver::ModifierIdentityResolver;
use crate::core::types::{AttributeKey, EntityId};
use crate::sync::SyncSink;
use std::sync::Arc;

/// Read-only view of the host entity handed to refund policies
pub struct HostContext<'a> {
    pub entity: EntityId,
    live: &'a dyn LiveAttributes,
}

impl<'a> HostContext<'a> {
    pub fn new(entity: EntityId, live: &'a dyn LiveAttributes) -> Self {
        Self { entity, live }
    }

    /// Effective live value of an attribute, 0.0 when the host has none
    pub fn attribute(&self, key: &AttributeKey) -> f64 {
        self.live.attribute_value(self.entity, key).unwrap_or(0.0)
    }
}

/// Startup-built collaborators, cloned into each store
///
/// Cloning copies the `Arc`s only; the resolver and refund registry are never
/// mutated once they are in here.
#[derive(Clone)]
pub struct SyncContext {
    pub resolver: Arc<ModifierIdentityResolver>,
    pub refunds: Arc<RefundPolicyRegistry>,
    pub live: Arc<dyn LiveAttributes>,
    pub sink: Arc<dyn SyncSink>,
}

impl SyncContext {
    pub fn new(
        resolver: Arc<ModifierIdentityResolver>,
        refunds: Arc<RefundPolicyRegistry>,
        live: Arc<dyn LiveAttributes>,
        sink: Arc<dyn SyncSink>,
    ) -> Self {
        Self {
            resolver,
            refunds,
            live,
            sink,
        }
    }
}
