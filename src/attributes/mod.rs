//! Per-entity attribute overrides and their live-system reconciliation
//!
//! An [`AttributeStore`] is the authoritative owner of one entity's
//! [`EntityState`]. It reaches the host only through the identity resolver,
//! the [`LiveAttributes`] boundary and the refund registry handed to it in a
//! [`SyncContext`].

pub mod context;
pub mod live;
pub mod refund;
pub mod resolver;
pub mod state;
pub mod store;

pub use context::{HostContext, SyncContext};
pub use live::{AttributeRange, InMemoryLiveAttributes, LiveAttributes};
pub use refund::{RefundPolicy, RefundPolicyRegistry};
pub use resolver::ModifierIdentityResolver;
pub use state::EntityState;
pub use store::AttributeStore;
