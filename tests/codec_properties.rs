//! Property tests for the delta codec and the refund clamp

use attribute_sync::attributes::{
    AttributeStore, EntityState, HostContext, InMemoryLiveAttributes, ModifierIdentityResolver,
    RefundPolicyRegistry, SyncContext,
};
use attribute_sync::core::{AttributeKey, EntityId, SyncConfig};
use attribute_sync::sync::{decode, encode, ModifierEntry, SyncMessage, SyncSink};
use proptest::prelude::*;
use std::sync::Arc;

struct NullSink;

impl SyncSink for NullSink {
    fn publish(&self, _entity: EntityId, _message: &SyncMessage) {}
}

fn key_strategy() -> impl Strategy<Value = AttributeKey> {
    ("[a-z][a-z0-9_.-]{0,8}", "[a-z][a-z0-9_./-]{0,16}")
        .prop_map(|(namespace, path)| AttributeKey::new(&namespace, &path).unwrap())
}

fn value_strategy() -> impl Strategy<Value = f64> {
    prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO
}

fn entry_strategy() -> impl Strategy<Value = ModifierEntry> {
    (key_strategy(), value_strategy()).prop_map(|(key, value)| ModifierEntry::new(key, value))
}

fn message_strategy() -> impl Strategy<Value = SyncMessage> {
    prop_oneof![
        entry_strategy().prop_map(SyncMessage::Set),
        key_strategy().prop_map(SyncMessage::Remove),
        prop::collection::vec(key_strategy(), 0..8).prop_map(SyncMessage::Reset),
        prop::collection::vec(entry_strategy(), 0..8).prop_map(SyncMessage::BulkLoad),
        any::<i32>().prop_map(SyncMessage::RefundPoints),
        any::<i32>().prop_map(SyncMessage::SkillPoints),
    ]
}

fn store_with_budget(budget: f64) -> AttributeStore {
    let config = SyncConfig::default();
    let resolver = Arc::new(ModifierIdentityResolver::from_config(&config));
    let live = Arc::new(InMemoryLiveAttributes::from_config(&config, resolver.clone()));
    let mut refunds = RefundPolicyRegistry::new();
    refunds.register(move |_: &EntityState, _: &HostContext<'_>| budget);
    let ctx = SyncContext::new(resolver, Arc::new(refunds), live, Arc::new(NullSink));
    AttributeStore::new(EntityId::new(), ctx)
}

proptest! {
    #[test]
    fn prop_decode_inverts_encode(message in message_strategy()) {
        let bytes = encode(&message).unwrap();
        prop_assert_eq!(decode(&bytes).unwrap(), message);
    }

    #[test]
    fn prop_truncated_frame_never_decodes(message in message_strategy(), cut in 1usize..8) {
        let bytes = encode(&message).unwrap();
        let keep = bytes.len().saturating_sub(cut).max(1);
        prop_assert!(decode(&bytes[..keep]).is_err());
    }

    #[test]
    fn prop_replica_apply_matches_host_table(
        entries in prop::collection::vec(entry_strategy(), 0..16),
    ) {
        // BulkLoad then per-entry Set must leave the same table
        let mut bulk = EntityState::new();
        bulk.apply(&SyncMessage::BulkLoad(entries.clone()));

        let mut incremental = EntityState::new();
        for entry in entries {
            incremental.apply(&SyncMessage::Set(entry));
        }
        prop_assert_eq!(bulk, incremental);
    }

    #[test]
    fn prop_refund_points_stay_within_budget(
        budget in -50.0f64..500.0,
        deltas in prop::collection::vec(-200i32..200, 1..20),
    ) {
        let mut store = store_with_budget(budget);
        let ceiling = (budget.max(0.0) + 0.5).floor() as i32;

        for delta in deltas {
            let before = store.refund_points();
            let applied = store.add_refund_points(delta);
            prop_assert_eq!(store.refund_points(), before + applied);
            prop_assert!(store.refund_points() >= 0);
            prop_assert!(store.refund_points() <= ceiling);
        }
    }
}
