//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for tracked entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Namespace used when a key is written without one (`"strength"` == `"core:strength"`)
pub const DEFAULT_NAMESPACE: &str = "core";

/// Errors produced when parsing an [`AttributeKey`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("attribute key is empty")]
    Empty,
    #[error("invalid character {ch:?} in namespace of {key:?}")]
    BadNamespace { key: String, ch: char },
    #[error("invalid character {ch:?} in path of {key:?}")]
    BadPath { key: String, ch: char },
}

/// Namespaced attribute name, e.g. `core:strength`
///
/// Serializes as its string form so persisted records and wire messages
/// carry plain `"namespace:path"` strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttributeKey {
    namespace: String,
    path: String,
}

impl AttributeKey {
    /// Build a key from its parts, validating both
    pub fn new(namespace: &str, path: &str) -> Result<Self, KeyParseError> {
        let key = format!("{}:{}", namespace, path);
        if namespace.is_empty() || path.is_empty() {
            return Err(KeyParseError::Empty);
        }
        if let Some(ch) = namespace.chars().find(|c| !is_namespace_char(*c)) {
            return Err(KeyParseError::BadNamespace { key, ch });
        }
        if let Some(ch) = path.chars().find(|c| !is_path_char(*c)) {
            return Err(KeyParseError::BadPath { key, ch });
        }
        Ok(Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        })
    }

    /// Key in the default namespace for paths known to be valid at compile time
    pub(crate) fn builtin(path: &'static str) -> Self {
        debug_assert!(path.chars().all(is_path_char));
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            path: path.to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-')
}

fn is_path_char(c: char) -> bool {
    is_namespace_char(c) || c == '/'
}

impl FromStr for AttributeKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(DEFAULT_NAMESPACE, s),
        }
    }
}

impl TryFrom<String> for AttributeKey {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AttributeKey> for String {
    fn from(key: AttributeKey) -> Self {
        key.to_string()
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

/// Fixed namespace for identities derived from key names.
const IDENTITY_NAMESPACE: Uuid = Uuid::from_u128(0x6d1f_4a3c_9b2e_4c71_a8f0_52e3_d7c4_19ab);

/// Stable identity tagging one live attribute modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierIdentity(pub Uuid);

impl ModifierIdentity {
    /// Deterministic identity for a key; identical across processes and restarts
    pub fn derive(key: &AttributeKey) -> Self {
        Self(Uuid::new_v5(&IDENTITY_NAMESPACE, key.to_string().as_bytes()))
    }
}

impl fmt::Display for ModifierIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
