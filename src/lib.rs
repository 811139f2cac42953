//! Attribute Sync - authoritative per-entity attribute overrides
//!
//! The host owns each entity's overrides and counters, reconciles them with a
//! live attribute system, and replicates every change as a compact delta to
//! observing replicas. Whole-state records survive restarts.

pub mod attributes;
pub mod core;
pub mod ecs;
pub mod persistence;
pub mod sync;
