//! Boundary to the host's live attribute system
//!
//! The store never owns live modifiers. It tags each one with the key's
//! [`ModifierIdentity`] and finds it again by that identity.

use crate::attributes::resolver::ModifierIdentityResolver;
use crate::core::config::SyncConfig;
use crate::core::types::{AttributeKey, EntityId, ModifierIdentity};
use ahash::AHashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Operations the store needs from the host's attribute system
///
/// Implementations use interior mutability; one instance is shared by every
/// store in the process.
pub trait LiveAttributes: Send + Sync {
    /// Attach a new additive modifier tagged with `identity`
    fn add_modifier(&self, entity: EntityId, identity: ModifierIdentity, magnitude: f64);

    /// Change the magnitude of an existing modifier in place
    fn update_modifier(&self, entity: EntityId, identity: ModifierIdentity, magnitude: f64);

    fn remove_modifier(&self, entity: EntityId, identity: ModifierIdentity);

    fn has_modifier(&self, entity: EntityId, identity: ModifierIdentity) -> bool;

    /// Clamp a proposed value into the attribute's declared range
    fn clamp(&self, key: &AttributeKey, value: f64) -> f64;

    /// Current effective value of an attribute, if the attribute exists
    fn attribute_value(&self, entity: EntityId, key: &AttributeKey) -> Option<f64>;
}

/// Declared range of one attribute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeRange {
    pub min: f64,
    pub max: f64,
    pub base: f64,
}

impl AttributeRange {
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

#[derive(Debug, Default)]
struct EntityModifiers {
    modifiers: AHashMap<ModifierIdentity, f64>,
    bases: AHashMap<AttributeKey, f64>,
}

/// Process-local live attribute table
///
/// Effective value = base + the additive modifier tagged with the key's
/// identity, clamped to the declared range.
#[derive(Debug)]
pub struct InMemoryLiveAttributes {
    ranges: AHashMap<AttributeKey, AttributeRange>,
    resolver: Arc<ModifierIdentityResolver>,
    entities: Mutex<AHashMap<EntityId, EntityModifiers>>,
}

impl InMemoryLiveAttributes {
    pub fn new(resolver: Arc<ModifierIdentityResolver>) -> Self {
        Self {
            ranges: AHashMap::new(),
            resolver,
            entities: Mutex::new(AHashMap::new()),
        }
    }

    /// Declare every configured attribute with its range and base value
    pub fn from_config(config: &SyncConfig, resolver: Arc<ModifierIdentityResolver>) -> Self {
        let mut live = Self::new(resolver);
        for def in &config.attributes {
            live.declare(
                def.key.clone(),
                AttributeRange {
                    min: def.min,
                    max: def.max,
                    base: def.base,
                },
            );
        }
        live
    }

    pub fn declare(&mut self, key: AttributeKey, range: AttributeRange) {
        self.ranges.insert(key, range);
    }

    /// Override the base value of one attribute for one entity
    pub fn set_base_value(&self, entity: EntityId, key: AttributeKey, value: f64) {
        self.lock().entry(entity).or_default().bases.insert(key, value);
    }

    /// Magnitude of the modifier tagged with `identity`, if attached
    pub fn modifier(&self, entity: EntityId, identity: ModifierIdentity) -> Option<f64> {
        self.lock()
            .get(&entity)
            .and_then(|e| e.modifiers.get(&identity).copied())
    }

    pub fn modifier_count(&self, entity: EntityId) -> usize {
        self.lock().get(&entity).map_or(0, |e| e.modifiers.len())
    }

    fn lock(&self) -> MutexGuard<'_, AHashMap<EntityId, EntityModifiers>> {
        self.entities.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LiveAttributes for InMemoryLiveAttributes {
    fn add_modifier(&self, entity: EntityId, identity: ModifierIdentity, magnitude: f64) {
        let previous = self
            .lock()
            .entry(entity)
            .or_default()
            .modifiers
            .insert(identity, magnitude);
        if previous.is_some() {
            tracing::warn!(%entity, %identity, "modifier added twice; replaced existing");
        }
    }

    fn update_modifier(&self, entity: EntityId, identity: ModifierIdentity, magnitude: f64) {
        let mut entities = self.lock();
        match entities
            .get_mut(&entity)
            .and_then(|e| e.modifiers.get_mut(&identity))
        {
            Some(existing) => *existing = magnitude,
            None => tracing::warn!(%entity, %identity, "update of missing modifier ignored"),
        }
    }

    fn remove_modifier(&self, entity: EntityId, identity: ModifierIdentity) {
        if let Some(e) = self.lock().get_mut(&entity) {
            e.modifiers.remove(&identity);
        }
    }

    fn has_modifier(&self, entity: EntityId, identity: ModifierIdentity) -> bool {
        self.lock()
            .get(&entity)
            .is_some_and(|e| e.modifiers.contains_key(&identity))
    }

    fn clamp(&self, key: &AttributeKey, value: f64) -> f64 {
        match self.ranges.get(key) {
            Some(range) => range.clamp(value),
            None => value,
        }
    }

    fn attribute_value(&self, entity: EntityId, key: &AttributeKey) -> Option<f64> {
        let range = self.ranges.get(key)?;
        let identity = self.resolver.identity_for(key);
        let entities = self.lock();
        let held = entities.get(&entity);

        let base = held
            .and_then(|e| e.bases.get(key).copied())
            .unwrap_or(range.base);
        let modifier = match (held, identity) {
            (Some(e), Some(id)) => e.modifiers.get(&id).copied().unwrap_or(0.0),
            _ => 0.0,
        };

        Some(range.clamp(base + modifier))
    }
}
