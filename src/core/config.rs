//! Attribute sync configuration
//!
//! The attribute table, refund policies and persistence location are read once
//! at startup. Everything built from this config (identity resolver, refund
//! registry, live attribute ranges) is frozen afterwards and shared read-only.

use crate::core::error::{Result, SyncError};
use crate::core::types::AttributeKey;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One attribute the host exposes to the override store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDef {
    /// Namespaced key, e.g. `core:strength`
    pub key: AttributeKey,

    /// Explicit modifier identity
    ///
    /// When absent the identity is derived from the key name, which is
    /// stable across restarts. Set it explicitly only when an identity must
    /// match modifiers written by an older build.
    #[serde(default)]
    pub identity: Option<Uuid>,

    /// Lowest value the live attribute system accepts
    pub min: f64,

    /// Highest value the live attribute system accepts
    pub max: f64,

    /// Base value before any modifier is applied
    #[serde(default)]
    pub base: f64,
}

impl AttributeDef {
    pub fn new(key: AttributeKey, min: f64, max: f64) -> Self {
        Self {
            key,
            identity: None,
            min,
            max,
            base: 0.0,
        }
    }
}

/// Built-in refund budget contributions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefundPolicyConfig {
    /// Constant number of refundable points
    Flat { points: f64 },
    /// Live value of `attribute` multiplied by `factor`
    AttributeScaled { attribute: AttributeKey, factor: f64 },
}

/// Configuration for the attribute sync core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Attributes that accept overrides
    ///
    /// Keys missing from this table have no modifier identity and are inert:
    /// every write to them is a silent no-op.
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,

    /// Refund budget policies, summed at evaluation time
    ///
    /// With no policies the budget is zero and refund points stay at zero.
    #[serde(default)]
    pub refund: Vec<RefundPolicyConfig>,

    /// Directory holding one persisted record per entity
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/attributes")
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            // Level plus the five primary stats
            attributes: vec![
                AttributeDef::new(AttributeKey::builtin("level"), 0.0, 100.0),
                AttributeDef::new(AttributeKey::builtin("constitution"), 0.0, 100.0),
                AttributeDef::new(AttributeKey::builtin("strength"), 0.0, 100.0),
                AttributeDef::new(AttributeKey::builtin("dexterity"), 0.0, 100.0),
                AttributeDef::new(AttributeKey::builtin("intelligence"), 0.0, 100.0),
                AttributeDef::new(AttributeKey::builtin("luckiness"), 0.0, 100.0),
            ],

            // One refundable point per level
            refund: vec![RefundPolicyConfig::AttributeScaled {
                attribute: AttributeKey::builtin("level"),
                factor: 1.0,
            }],

            data_dir: default_data_dir(),
        }
    }
}

impl SyncConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SyncConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file on disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Look up the definition of one attribute
    pub fn attribute(&self, key: &AttributeKey) -> Option<&AttributeDef> {
        self.attributes.iter().find(|def| &def.key == key)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let mut keys = AHashSet::new();
        let mut identities = AHashSet::new();

        for def in &self.attributes {
            if !keys.insert(&def.key) {
                return Err(SyncError::InvalidConfig(format!(
                    "attribute {} is declared twice",
                    def.key
                )));
            }

            if let Some(identity) = def.identity {
                if !identities.insert(identity) {
                    return Err(SyncError::InvalidConfig(format!(
                        "identity {} is shared by more than one attribute",
                        identity
                    )));
                }
            }

            if !def.min.is_finite() || !def.max.is_finite() || def.min > def.max {
                return Err(SyncError::InvalidConfig(format!(
                    "attribute {} has invalid range [{}, {}]",
                    def.key, def.min, def.max
                )));
            }

            if !def.base.is_finite() || def.base < def.min || def.base > def.max {
                return Err(SyncError::InvalidConfig(format!(
                    "attribute {} base {} lies outside [{}, {}]",
                    def.key, def.base, def.min, def.max
                )));
            }
        }

        for policy in &self.refund {
            match policy {
                RefundPolicyConfig::Flat { points } if !points.is_finite() => {
                    return Err(SyncError::InvalidConfig(format!(
                        "flat refund policy has non-finite points {}",
                        points
                    )));
                }
                RefundPolicyConfig::AttributeScaled { attribute, factor } => {
                    if !factor.is_finite() {
                        return Err(SyncError::InvalidConfig(format!(
                            "refund factor for {} is not finite",
                            attribute
                        )));
                    }
                    if self.attribute(attribute).is_none() {
                        return Err(SyncError::InvalidConfig(format!(
                            "refund policy reads undeclared attribute {}",
                            attribute
                        )));
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.attributes.len(), 6);
        assert!(config.attribute(&"strength".parse().unwrap()).is_some());
    }

    #[test]
    fn test_parse_toml() {
        let config = SyncConfig::from_toml_str(
            r#"
            data_dir = "saves"

            [[attributes]]
            key = "playerex:level"
            min = 1.0
            max = 50.0
            base = 1.0

            [[attributes]]
            key = "strength"
            identity = "0f8e2a56-7d3b-4c1e-9a45-3b6f2d1c8e70"
            min = 0.0
            max = 20.0

            [[refund]]
            kind = "flat"
            points = 2.0

            [[refund]]
            kind = "attribute_scaled"
            attribute = "playerex:level"
            factor = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("saves"));
        assert_eq!(config.attributes.len(), 2);
        assert_eq!(config.attributes[0].base, 1.0);
        assert!(config.attributes[1].identity.is_some());
        assert_eq!(config.refund[0], RefundPolicyConfig::Flat { points: 2.0 });
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let mut config = SyncConfig::default();
        config.attributes.push(AttributeDef::new("strength".parse().unwrap(), 0.0, 1.0));
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut config = SyncConfig::default();
        config.attributes[0].min = 10.0;
        config.attributes[0].max = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_refund_policy_must_read_declared_attribute() {
        let mut config = SyncConfig::default();
        config.refund.push(RefundPolicyConfig::AttributeScaled {
            attribute: "core:mana".parse().unwrap(),
            factor: 1.0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shipped_config_matches_default() {
        let config =
            SyncConfig::from_toml_str(include_str!("../../config/attributes.toml")).unwrap();
        assert_eq!(config, SyncConfig::default());
    }

    #[test]
    fn test_bad_key_in_toml_is_error() {
        let result = SyncConfig::from_toml_str(
            r#"
            [[attributes]]
            key = "Not A Key"
            min = 0.0
            max = 1.0
            "#,
        );
        assert!(matches!(result, Err(SyncError::TomlError(_))));
    }
}
