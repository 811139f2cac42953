//! Refund budget policies
//!
//! Policies are registered during startup, before the registry is shared.
//! Each one is a total, read-only function of the entity state and the host
//! view; the budget is their sum.

use crate::attributes::context::HostContext;
use crate::attributes::state::EntityState;
use crate::core::config::RefundPolicyConfig;

/// One contribution to the refund budget
pub type RefundPolicy = Box<dyn Fn(&EntityState, &HostContext<'_>) -> f64 + Send + Sync>;

/// Append-only list of refund policies
#[derive(Default)]
pub struct RefundPolicyRegistry {
    policies: Vec<RefundPolicy>,
}

impl RefundPolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in policies named in config
    pub fn from_config(configs: &[RefundPolicyConfig]) -> Self {
        let mut registry = Self::new();
        for config in configs {
            match config.clone() {
                RefundPolicyConfig::Flat { points } => {
                    registry.register(move |_, _| points);
                }
                RefundPolicyConfig::AttributeScaled { attribute, factor } => {
                    registry.register(move |_, ctx| ctx.attribute(&attribute) * factor);
                }
            }
        }
        registry
    }

    pub fn register<F>(&mut self, policy: F)
    where
        F: Fn(&EntityState, &HostContext<'_>) -> f64 + Send + Sync + 'static,
    {
        self.policies.push(Box::new(policy));
    }

    /// Sum of every policy evaluated against the current state
    pub fn total_budget(&self, state: &EntityState, ctx: &HostContext<'_>) -> f64 {
        self.policies.iter().map(|policy| policy(state, ctx)).sum()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl std::fmt::Debug for RefundPolicyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefundPolicyRegistry")
            .field("policies", &self.policies.len())
            .finish()
    }
}
