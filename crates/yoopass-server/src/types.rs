//! JSON request and response bodies for the yoopass API.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Envelope status for successful responses.
pub const STATUS_OK: &str = "OK";

/// Envelope status for error responses.
pub const STATUS_ERROR: &str = "ERROR";

/// Body of `POST /add`.
///
/// Every field is optional at the serde level so that missing fields are
/// reported by validation rather than as a parse failure.
#[derive(Clone, Default, Deserialize)]
pub struct CreateSecretRequest {
    /// Plaintext to seal.
    #[serde(default)]
    pub message: Option<String>,
    /// Lifetime in hours; zero or absent means no expiry.
    #[serde(default, alias = "expiration")]
    pub expiration_hours: Option<i64>,
    /// Whether the secret is deleted on first read.
    #[serde(default)]
    pub one_time: bool,
}

impl fmt::Debug for CreateSecretRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateSecretRequest")
            .field("message", &self.message.as_ref().map(|_| "[REDACTED]"))
            .field("expiration_hours", &self.expiration_hours)
            .field("one_time", &self.one_time)
            .finish()
    }
}

/// Successful response to `POST /add`.
#[derive(Clone, Serialize, Deserialize)]
pub struct CreateSecretResponse {
    /// Always [`STATUS_OK`].
    pub status: String,
    /// Identifier half of the share link.
    pub identifier: String,
    /// Hex-encoded decryption key, the other half of the share link.
    pub key: String,
}

impl CreateSecretResponse {
    /// Build a success response.
    #[must_use]
    pub fn new(identifier: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            identifier: identifier.into(),
            key: key.into(),
        }
    }
}

impl fmt::Debug for CreateSecretResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateSecretResponse")
            .field("status", &self.status)
            .field("identifier", &self.identifier)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Successful response to `GET /{identifier}/{key}`.
#[derive(Clone, Serialize, Deserialize)]
pub struct RetrieveSecretResponse {
    /// Always [`STATUS_OK`].
    pub status: String,
    /// The decrypted message.
    pub message: String,
}

impl RetrieveSecretResponse {
    /// Build a success response.
    #[must_use]
    pub fn new(message: String) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            message,
        }
    }
}

impl fmt::Debug for RetrieveSecretResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrieveSecretResponse")
            .field("status", &self.status)
            .field("message", &"[REDACTED]")
            .finish()
    }
}

/// Generic error envelope: `{"status":"ERROR","error":"..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always [`STATUS_ERROR`].
    pub status: String,
    /// Human-readable error.
    pub error: String,
}

impl ErrorResponse {
    /// Build an error envelope.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            error: error.into(),
        }
    }
}

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the offending JSON field.
    pub field: String,
    /// What is wrong with it.
    pub error: String,
}

impl FieldError {
    /// Create a field error.
    #[must_use]
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }

    /// The field is missing or blank.
    #[must_use]
    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, "This field is required")
    }
}

/// Validation error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorResponse {
    /// Always [`STATUS_ERROR`].
    pub status: String,
    /// Always `"validation"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Every failing field.
    pub errors: Vec<FieldError>,
}

impl ValidationErrorResponse {
    /// Build a validation envelope.
    #[must_use]
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            kind: "validation".to_string(),
            errors,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
}
