use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid id {value:?}: ids must be a single path segment (no '/', '\\\\', NUL, '.' or '..')")]
pub struct IdError {
    value: String,
}

/// Opaque identifier for stored wallets and balance records.
///
/// File-backed storage uses ids as directory names, so they must be safe
/// path segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl Id {
    const WALLET_NAMESPACE: Uuid = Uuid::from_u128(0x3c1f6a52_8d0e_5b7a_9e44_2f6d0c8b71a9);

    /// Random id, used for ledger records.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Deterministic id for a wallet's natural key.
    ///
    /// Linking the same (address, chain) pair twice always yields the same id.
    pub fn for_wallet_key(natural_key: &str) -> Self {
        Self(Uuid::new_v5(&Self::WALLET_NAMESPACE, natural_key.as_bytes()).to_string())
    }

    /// Parse an id supplied by a user (CLI argument, file name).
    pub fn parse(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        if Self::is_path_safe(&value) {
            Ok(Self(value))
        } else {
            Err(IdError { value })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_path_safe(value: &str) -> bool {
        if value.is_empty() || value == "." || value == ".." {
            return false;
        }
        !value.chars().any(|c| c == '/' || c == '\\' || c == '\0')
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
