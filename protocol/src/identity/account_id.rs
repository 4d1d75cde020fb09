//! # Account Identities
//!
//! An [`AccountId`] is derived by hashing either raw public key bytes or a
//! human-readable label under a domain-separation tag:
//!
//! ```text
//! BLAKE3(domain_tag || input) -> 32 bytes -> hex
//! ```
//!
//! Label-derived identities exist so that replay scripts and fixtures can
//! say `"alice"` instead of pasting 64 hex characters. They are not secret
//! and must never be used as proof of anything.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{ACCOUNT_ID_LENGTH, LABEL_ID_DOMAIN, PUBLIC_KEY_ID_DOMAIN};

/// Errors that can occur when parsing an account identity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountIdError {
    /// The string is not valid hex.
    #[error("invalid account id hex: {0}")]
    InvalidHex(String),

    /// The decoded bytes have the wrong length.
    #[error("invalid account id length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes.
        got: usize,
    },
}

/// A 32-byte account identity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId([u8; ACCOUNT_ID_LENGTH]);

impl AccountId {
    /// Wraps raw identity bytes.
    pub const fn from_bytes(bytes: [u8; ACCOUNT_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derives an identity from raw public key bytes.
    pub fn from_public_key(public_key: &[u8]) -> Self {
        Self::derive(PUBLIC_KEY_ID_DOMAIN, public_key)
    }

    /// Derives an identity from a human-readable label.
    ///
    /// ```
    /// use tvrbo_protocol::identity::AccountId;
    ///
    /// let alice = AccountId::from_label("alice");
    /// assert_eq!(alice, AccountId::from_label("alice"));
    /// assert_ne!(alice, AccountId::from_label("bob"));
    /// ```
    pub fn from_label(label: &str) -> Self {
        Self::derive(LABEL_ID_DOMAIN, label.as_bytes())
    }

    fn derive(domain: &[u8], input: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(domain);
        hasher.update(input);
        Self(*hasher.finalize().as_bytes())
    }

    /// Returns the raw identity bytes.
    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LENGTH] {
        &self.0
    }

    /// Returns the hex-encoded identity.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a hex-encoded identity.
    pub fn from_hex(s: &str) -> Result<Self, AccountIdError> {
        let bytes = hex::decode(s).map_err(|e| AccountIdError::InvalidHex(e.to_string()))?;
        if bytes.len() != ACCOUNT_ID_LENGTH {
            return Err(AccountIdError::InvalidLength {
                expected: ACCOUNT_ID_LENGTH,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; ACCOUNT_ID_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// First eight hex characters, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl FromStr for AccountId {
    type Err = AccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.short())
    }
}

// Hex strings on the wire so identities can be used as JSON map keys.
impl Serialize for AccountId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_and_key_domains_do_not_collide() {
        let from_label = AccountId::from_label("alice");
        let from_key = AccountId::from_public_key(b"alice");
        assert_ne!(from_label, from_key);
    }

    #[test]
    fn hex_parse_accepts_display_output() {
        let id = AccountId::from_label("vault");
        let parsed: AccountId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn hex_parse_rejects_wrong_length() {
        let err = AccountId::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            AccountIdError::InvalidLength {
                expected: 32,
                got: 2
            }
        );
    }

    #[test]
    fn hex_parse_rejects_garbage() {
        assert!(matches!(
            AccountId::from_hex("not-hex"),
            Err(AccountIdError::InvalidHex(_))
        ));
    }

    #[test]
    fn usable_as_json_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(AccountId::from_label("a"), 7u64);
        let json = serde_json::to_string(&map).unwrap();
        let back: std::collections::BTreeMap<AccountId, u64> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn short_form_is_prefix_of_hex() {
        let id = AccountId::from_label("bob");
        assert!(id.to_hex().starts_with(&id.short()));
        assert_eq!(id.short().len(), 8);
    }
}
