//! Per-entity override table and counters

use crate::core::types::AttributeKey;
use crate::sync::message::{ModifierEntry, PersistedRecord, SyncMessage};
use ahash::AHashMap;

/// Attribute overrides plus skill/refund counters of one entity
///
/// Only the owning [`AttributeStore`](crate::attributes::AttributeStore) and
/// the replica apply path mutate this.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityState {
    overrides: AHashMap<AttributeKey, f64>,
    skill_points: i32,
    refund_points: i32,
    notified_level_up: bool,
}

impl EntityState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored override, or 0.0 when the key has none
    pub fn get(&self, key: &AttributeKey) -> f64 {
        self.overrides.get(key).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, key: &AttributeKey) -> bool {
        self.overrides.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn skill_points(&self) -> i32 {
        self.skill_points
    }

    pub fn refund_points(&self) -> i32 {
        self.refund_points
    }

    pub fn notified_level_up(&self) -> bool {
        self.notified_level_up
    }

    pub(crate) fn insert(&mut self, key: AttributeKey, value: f64) {
        self.overrides.insert(key, value);
    }

    pub(crate) fn erase(&mut self, key: &AttributeKey) -> Option<f64> {
        self.overrides.remove(key)
    }

    /// Empty the table, returning every key it held
    pub(crate) fn drain_keys(&mut self) -> Vec<AttributeKey> {
        self.overrides.drain().map(|(key, _)| key).collect()
    }

    pub(crate) fn set_skill_points(&mut self, points: i32) {
        self.skill_points = points;
    }

    pub(crate) fn set_refund_points(&mut self, points: i32) {
        self.refund_points = points;
    }

    pub(crate) fn set_notified_level_up(&mut self, notified: bool) {
        self.notified_level_up = notified;
    }

    /// Apply a replicated delta without any live attribute side effects
    pub fn apply(&mut self, message: &SyncMessage) {
        match message {
            SyncMessage::Set(entry) => self.insert(entry.key.clone(), entry.value),
            SyncMessage::Remove(key) => {
                self.erase(key);
            }
            SyncMessage::Reset(keys) => {
                for key in keys {
                    self.erase(key);
                }
                self.skill_points = 0;
                self.refund_points = 0;
                self.notified_level_up = false;
            }
            // Full state from the host; keys it no longer holds are stale
            SyncMessage::BulkLoad(entries) => {
                self.overrides.clear();
                for entry in entries {
                    self.insert(entry.key.clone(), entry.value);
                }
            }
            SyncMessage::RefundPoints(points) => self.refund_points = *points,
            SyncMessage::SkillPoints(points) => self.skill_points = *points,
        }
    }

    /// Override table as wire/disk entries, sorted by key for stable output
    pub fn entries(&self) -> Vec<ModifierEntry> {
        let mut entries: Vec<ModifierEntry> = self
            .overrides
            .iter()
            .map(|(key, value)| ModifierEntry::new(key.clone(), *value))
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    pub fn to_record(&self) -> PersistedRecord {
        PersistedRecord {
            modifiers: self.entries(),
            refund_points: self.refund_points,
            skill_points: self.skill_points,
            notified_level_up: self.notified_level_up,
        }
    }

    /// Plain state from a record, with no live attribute reconciliation
    pub fn from_record(record: &PersistedRecord) -> Self {
        let mut state = Self::new();
        for entry in &record.modifiers {
            state.insert(entry.key.clone(), entry.value);
        }
        state.refund_points = record.refund_points;
        state.skill_points = record.skill_points;
        state.notified_level_up = record.notified_level_up;
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> AttributeKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_absent_key_reads_zero() {
        let state = EntityState::new();
        assert_eq!(state.get(&key("strength")), 0.0);
        assert!(state.is_empty());
    }

    #[test]
    fn test_apply_set_and_remove() {
        let mut state = EntityState::new();
        state.apply(&SyncMessage::Set(ModifierEntry::new(key("strength"), 5.0)));
        assert_eq!(state.get(&key("strength")), 5.0);
        state.apply(&SyncMessage::Remove(key("strength")));
        assert!(!state.contains(&key("strength")));
    }

    #[test]
    fn test_apply_reset_clears_counters_and_flag() {
        let mut state = EntityState::new();
        state.insert(key("strength"), 3.0);
        state.insert(key("dexterity"), 1.0);
        state.set_skill_points(4);
        state.set_refund_points(2);
        state.set_notified_level_up(true);

        state.apply(&SyncMessage::Reset(vec![key("strength"), key("dexterity")]));

        assert!(state.is_empty());
        assert_eq!(state.skill_points(), 0);
        assert_eq!(state.refund_points(), 0);
        assert!(!state.notified_level_up());
    }

    #[test]
    fn test_apply_bulk_load_and_counters() {
        let mut state = EntityState::new();
        state.apply(&SyncMessage::BulkLoad(vec![
            ModifierEntry::new(key("strength"), 2.0),
            ModifierEntry::new(key("luckiness"), 8.0),
        ]));
        state.apply(&SyncMessage::SkillPoints(11));
        state.apply(&SyncMessage::RefundPoints(3));
        assert_eq!(state.len(), 2);
        assert_eq!(state.get(&key("luckiness")), 8.0);
        assert_eq!(state.skill_points(), 11);
        assert_eq!(state.refund_points(), 3);
    }

    #[test]
    fn test_bulk_load_drops_stale_keys() {
        let mut state = EntityState::new();
        state.insert(key("strength"), 3.0);
        state.set_skill_points(2);

        state.apply(&SyncMessage::BulkLoad(vec![ModifierEntry::new(key("dexterity"), 1.0)]));

        assert!(!state.contains(&key("strength")));
        assert_eq!(state.get(&key("dexterity")), 1.0);
        assert_eq!(state.skill_points(), 2);
    }

    #[test]
    fn test_record_round_trip_preserves_state() {
        let mut state = EntityState::new();
        state.insert(key("strength"), 5.0);
        state.insert(key("intelligence"), 1.5);
        state.set_skill_points(-2);
        state.set_refund_points(6);
        state.set_notified_level_up(true);

        let restored = EntityState::from_record(&state.to_record());
        assert_eq!(restored, state);
    }

    #[test]
    fn test_entries_are_sorted() {
        let mut state = EntityState::new();
        state.insert(key("strength"), 1.0);
        state.insert(key("constitution"), 1.0);
        let entries = state.entries();
        assert_eq!(entries[0].key, key("constitution"));
        assert_eq!(entries[1].key, key("strength"));
    }
}
