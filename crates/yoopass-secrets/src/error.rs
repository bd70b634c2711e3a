//! Error types for the secret lifecycle engine.
//!
//! Each layer has its own error enum: [`CipherError`] for the codec,
//! [`StoreError`] for persistence backends and [`Error`] for the service
//! that callers see.

use thiserror::Error;

/// Errors produced by the cipher codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// The key could not be decoded to the required byte length.
    #[error("invalid key format: {reason}")]
    InvalidKeyFormat {
        /// Why the key was rejected.
        reason: String,
    },

    /// The sealed blob is shorter than a nonce.
    #[error("sealed payload truncated: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum number of bytes required.
        expected: usize,
        /// Number of bytes supplied.
        actual: usize,
    },

    /// The authentication tag did not verify.
    ///
    /// Wrong key, corrupted ciphertext and tampering all land here.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The AEAD primitive refused to seal the payload.
    #[error("encryption failed: {reason}")]
    EncryptionFailed {
        /// The reason sealing failed.
        reason: String,
    },
}

/// Errors produced by a [`SecretStore`](crate::store::SecretStore) backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached or rejected the operation.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// The backend's description of the failure.
        reason: String,
    },

    /// The backend did not answer within the configured deadline.
    #[error("store operation '{operation}' timed out")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
    },

    /// A persisted entry could not be decoded.
    #[error("corrupt store entry: {reason}")]
    Corrupt {
        /// What was wrong with the entry.
        reason: String,
    },
}

impl StoreError {
    /// Builds a [`StoreError::Unavailable`] from any displayable backend error.
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            reason: err.to_string(),
        }
    }
}

/// Errors surfaced by the [`SecretService`](crate::service::SecretService).
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied unusable input.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong with the input.
        reason: String,
    },

    /// A secret identifier could not be parsed.
    #[error("invalid secret identifier: {reason}")]
    InvalidIdentifier {
        /// Why the identifier was rejected.
        reason: String,
    },

    /// The secret is unknown, expired, already consumed, or the key is wrong.
    ///
    /// These cases are deliberately indistinguishable to callers.
    #[error("secret not found")]
    NotFound,

    /// Reading from the store failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    /// Writing a freshly sealed secret to the store failed.
    #[error("failed to persist secret: {0}")]
    PersistenceFailed(#[source] StoreError),

    /// A payload decrypted but did not hold a valid secret record.
    #[error("corrupt secret: {reason}")]
    CorruptSecret {
        /// The deserialization failure.
        reason: String,
    },

    /// A one-time secret could not be removed after it was read.
    #[error("failed to delete one-time secret: {0}")]
    DeletionFailed(#[source] StoreError),

    /// Sealing a new secret failed.
    #[error("encryption error: {0}")]
    Encryption(#[source] CipherError),
}

impl Error {
    /// Returns true for the opaque not-found outcome.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Returns true if the error was caused by the caller's input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::InvalidIdentifier { .. })
    }
}

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
