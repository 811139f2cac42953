//! Delta messages and the persisted full-state record
//!
//! Field names (`Key`, `Value`, `Modifiers`, `RefundPoints`, `SkillPoints`,
//! `NotifiedLevelUp`) are part of the saved-data format and must not change.

use crate::core::types::AttributeKey;
use serde::{Deserialize, Serialize};

/// One attribute override as it appears on the wire and on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierEntry {
    #[serde(rename = "Key")]
    pub key: AttributeKey,
    #[serde(rename = "Value", default)]
    pub value: f64,
}

impl ModifierEntry {
    pub fn new(key: AttributeKey, value: f64) -> Self {
        Self { key, value }
    }
}

/// A single replicated mutation
///
/// Exactly one variant per message. Encoded externally tagged, e.g.
/// `{"Set":{"Key":"core:strength","Value":5.0}}` or `{"SkillPoints":3}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncMessage {
    /// One override assigned
    Set(ModifierEntry),
    /// One override cleared
    Remove(AttributeKey),
    /// Full clear; receivers also zero both counters and the notified flag
    Reset(Vec<AttributeKey>),
    /// Whole override table; a replica replaces its table with these entries
    BulkLoad(Vec<ModifierEntry>),
    /// Absolute refund point count
    RefundPoints(i32),
    /// Absolute skill point count
    SkillPoints(i32),
}

impl SyncMessage {
    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            SyncMessage::Set(_) => "Set",
            SyncMessage::Remove(_) => "Remove",
            SyncMessage::Reset(_) => "Reset",
            SyncMessage::BulkLoad(_) => "BulkLoad",
            SyncMessage::RefundPoints(_) => "RefundPoints",
            SyncMessage::SkillPoints(_) => "SkillPoints",
        }
    }
}

/// Durable whole-state record of one entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PersistedRecord {
    #[serde(default)]
    pub modifiers: Vec<ModifierEntry>,
    #[serde(default)]
    pub refund_points: i32,
    #[serde(default)]
    pub skill_points: i32,
    #[serde(default)]
    pub notified_level_up: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_wire_shape() {
        let msg = SyncMessage::Set(ModifierEntry::new("strength".parse().unwrap(), 5.0));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "Set": { "Key": "core:strength", "Value": 5.0 } })
        );
    }

    #[test]
    fn test_counter_wire_shape() {
        let json = serde_json::to_value(SyncMessage::RefundPoints(4)).unwrap();
        assert_eq!(json, serde_json::json!({ "RefundPoints": 4 }));
    }

    #[test]
    fn test_record_field_names() {
        let record = PersistedRecord {
            modifiers: vec![ModifierEntry::new("dexterity".parse().unwrap(), 2.5)],
            refund_points: 1,
            skill_points: 7,
            notified_level_up: true,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Modifiers": [{ "Key": "core:dexterity", "Value": 2.5 }],
                "RefundPoints": 1,
                "SkillPoints": 7,
                "NotifiedLevelUp": true
            })
        );
    }

    #[test]
    fn test_record_missing_fields_default() {
        let record: PersistedRecord = serde_json::from_str(r#"{"SkillPoints": 3}"#).unwrap();
        assert_eq!(record.skill_points, 3);
        assert!(record.modifiers.is_empty());
        assert_eq!(record.refund_points, 0);
        assert!(!record.notified_level_up);
    }

    #[test]
    fn test_kind_names_match_tags() {
        let msg = SyncMessage::Reset(vec![]);
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get(msg.kind()).is_some());
    }
}
