//! Durable storage of per-entity records
//!
//! Records are always whole-state and always written from authoritative
//! state. The storage medium is behind [`PersistenceStore`].

pub mod file;

use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::sync::message::PersistedRecord;
use ahash::AHashMap;
use std::sync::{Mutex, PoisonError};

pub use file::JsonFileStore;

/// Opaque key/value storage for persisted records
pub trait PersistenceStore: Send + Sync {
    fn load_record(&self, entity: EntityId) -> Result<Option<PersistedRecord>>;
    fn save_record(&self, entity: EntityId, record: &PersistedRecord) -> Result<()>;
}

/// Records held in process memory; lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<AHashMap<EntityId, PersistedRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PersistenceStore for MemoryStore {
    fn load_record(&self, entity: EntityId) -> Result<Option<PersistedRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&entity)
            .cloned())
    }

    fn save_record(&self, entity: EntityId, record: &PersistedRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity, record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::message::ModifierEntry;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let entity = EntityId::new();
        assert!(store.load_record(entity).unwrap().is_none());

        let record = PersistedRecord {
            modifiers: vec![ModifierEntry::new("strength".parse().unwrap(), 3.0)],
            skill_points: 2,
            ..PersistedRecord::default()
        };
        store.save_record(entity, &record).unwrap();

        assert_eq!(store.load_record(entity).unwrap(), Some(record));
        assert_eq!(store.len(), 1);
    }
}
