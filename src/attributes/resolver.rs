//! Attribute key to modifier identity lookup
//!
//! Populated once at startup, then shared behind an `Arc` and only read.

use crate::core::config::SyncConfig;
use crate::core::types::{AttributeKey, ModifierIdentity};
use ahash::AHashMap;

/// Maps attribute keys to the identity tagging their live modifier
#[derive(Debug, Clone, Default)]
pub struct ModifierIdentityResolver {
    identities: AHashMap<AttributeKey, ModifierIdentity>,
}

impl ModifierIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from the configured attributes
    ///
    /// Attributes without an explicit identity get one derived from their key.
    pub fn from_config(config: &SyncConfig) -> Self {
        let mut resolver = Self::new();
        for def in &config.attributes {
            match def.identity {
                Some(uuid) => {
                    resolver.register(def.key.clone(), ModifierIdentity(uuid));
                }
                None => {
                    resolver.register_derived(def.key.clone());
                }
            }
        }
        resolver
    }

    /// Register an explicit identity, returning the one it replaced
    pub fn register(
        &mut self,
        key: AttributeKey,
        identity: ModifierIdentity,
    ) -> Option<ModifierIdentity> {
        self.identities.insert(key, identity)
    }

    /// Register a key under its derived identity
    pub fn register_derived(&mut self, key: AttributeKey) -> ModifierIdentity {
        let identity = ModifierIdentity::derive(&key);
        self.identities.insert(key, identity);
        identity
    }

    pub fn identity_for(&self, key: &AttributeKey) -> Option<ModifierIdentity> {
        self.identities.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &AttributeKey> + '_ {
        self.identities.keys()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
