//! Core types for the secret lifecycle.
//!
//! This module defines the values that flow between the codec, the store
//! and the service:
//! - [`SecretId`]: The opaque, unguessable handle addressing a stored secret
//! - [`SecretRecord`]: The plaintext-side record that gets sealed
//! - [`SecretHandle`]: What a creator receives (identifier + key)

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::encryption::SecretKey;
use crate::error::{Error, Result};

/// An opaque identifier addressing a stored secret.
///
/// Identifiers carry 128 bits of randomness and are rendered as 32 lowercase
/// hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecretId(String);

impl SecretId {
    /// Number of random bytes behind an identifier.
    pub const RANDOM_BYTES: usize = 16;

    /// Length of the rendered identifier.
    pub const LENGTH: usize = Self::RANDOM_BYTES * 2;

    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; Self::RANDOM_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Parses an identifier, normalising hex digits to lowercase.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] unless the input is exactly
    /// 32 hex characters.
    pub fn parse(id: &str) -> Result<Self> {
        if id.len() != Self::LENGTH {
            return Err(Error::InvalidIdentifier {
                reason: format!(
                    "identifier must be {} characters, got {}",
                    Self::LENGTH,
                    id.len()
                ),
            });
        }

        if let Some(c) = id.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(Error::InvalidIdentifier {
                reason: format!("identifier contains invalid character '{c}'"),
            });
        }

        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SecretId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<SecretId> for String {
    fn from(id: SecretId) -> Self {
        id.0
    }
}

impl AsRef<str> for SecretId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The plaintext record sealed into a stored entry.
///
/// Only ever held in memory while a secret is being created or read; the
/// message is zeroized on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SecretRecord {
    /// The secret text.
    pub message: String,
    /// Whether the secret is deleted after its first successful read.
    pub one_time: bool,
}

impl SecretRecord {
    /// Creates a new record.
    #[must_use]
    pub fn new(message: impl Into<String>, one_time: bool) -> Self {
        Self {
            message: message.into(),
            one_time,
        }
    }

    /// Serializes the record for sealing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptSecret`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::CorruptSecret {
            reason: e.to_string(),
        })
    }

    /// Deserializes a record from opened plaintext.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptSecret`] if the bytes are not a valid record.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::CorruptSecret {
            reason: e.to_string(),
        })
    }

    /// Moves the message out, leaving an empty string behind.
    #[must_use]
    pub fn take_message(&mut self) -> String {
        std::mem::take(&mut self.message)
    }
}

impl fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRecord")
            .field("message", &"[REDACTED]")
            .field("one_time", &self.one_time)
            .finish()
    }
}

/// What the creator of a secret gets back.
///
/// Both halves are needed to read the secret: the identifier locates the
/// ciphertext, the key opens it.
#[derive(Debug, Clone)]
pub struct SecretHandle {
    /// Where the sealed secret is stored.
    pub id: SecretId,
    /// The key that opens it. Never stored server-side.
    pub key: SecretKey,
}

impl SecretHandle {
    /// Returns the identifier token.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the key rendered as hex.
    #[must_use]
    pub fn key_hex(&self) -> String {
        self.key.to_hex()
    }
}
