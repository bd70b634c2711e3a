//! Field validation for create requests.

use std::fmt;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::types::{CreateSecretRequest, FieldError};

const SECONDS_PER_HOUR: u64 = 3600;

/// Limits applied to incoming create requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateLimits {
    /// Largest accepted message, in bytes.
    pub max_message_bytes: usize,
    /// Largest accepted `expiration_hours`.
    pub max_expiration_hours: u64,
}

impl CreateLimits {
    /// Extract the limits from a server configuration.
    #[must_use]
    pub const fn from_config(config: &ServerConfig) -> Self {
        Self {
            max_message_bytes: config.max_message_bytes,
            max_expiration_hours: config.max_expiration_hours,
        }
    }
}

/// A create request that passed validation.
pub struct ValidCreate {
    /// Message exactly as submitted.
    pub message: String,
    /// Lifetime, or `None` for no expiry.
    pub ttl: Option<Duration>,
    /// Delete on first read.
    pub one_time: bool,
}

impl fmt::Debug for ValidCreate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidCreate")
            .field("message", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .field("one_time", &self.one_time)
            .finish()
    }
}

/// Check a create request against `limits`.
///
/// All failing fields are reported together.
///
/// # Errors
///
/// Returns the list of field errors if any rule is violated.
pub fn validate_create(
    request: CreateSecretRequest,
    limits: &CreateLimits,
) -> Result<ValidCreate, Vec<FieldError>> {
    let mut errors = Vec::new();

    let message = match request.message {
        Some(message) if !message.trim().is_empty() => {
            if message.len() > limits.max_message_bytes {
                errors.push(FieldError::new(
                    "message",
                    format!("Value must be at most {} bytes", limits.max_message_bytes),
                ));
            }
            Some(message)
        }
        _ => {
            errors.push(FieldError::required("message"));
            None
        }
    };

    let hours = request.expiration_hours.unwrap_or(0);
    let ttl = match u64::try_from(hours) {
        Err(_) => {
            errors.push(FieldError::new(
                "expiration_hours",
                "Value must be greater than or equal to 0",
            ));
            None
        }
        Ok(hours) if hours > limits.max_expiration_hours => {
            errors.push(FieldError::new(
                "expiration_hours",
                format!(
                    "Value must be less than or equal to {}",
                    limits.max_expiration_hours
                ),
            ));
            None
        }
        Ok(0) => None,
        Ok(hours) => Some(Duration::from_secs(hours.saturating_mul(SECONDS_PER_HOUR))),
    };

    match message {
        Some(message) if errors.is_empty() => Ok(ValidCreate {
            message,
            ttl,
            one_time: request.one_time,
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const LIMITS: CreateLimits = CreateLimits {
        max_message_bytes: 16,
        max_expiration_hours: 24,
    };

    fn request(message: Option<&str>, hours: Option<i64>) -> CreateSecretRequest {
        CreateSecretRequest {
            message: message.map(str::to_string),
            expiration_hours: hours,
            one_time: false,
        }
    }

    #[test]
    fn test_valid_request() {
        let valid = validate_create(request(Some("hello"), Some(2)), &LIMITS).unwrap();

        assert_eq!(valid.message, "hello");
        assert_eq!(valid.ttl, Some(Duration::from_secs(7200)));
        assert!(!valid.one_time);
    }

    #[test_case(None ; "absent")]
    #[test_case(Some(0) ; "zero")]
    fn test_no_expiry(hours: Option<i64>) {
        let valid = validate_create(request(Some("x"), hours), &LIMITS).unwrap();
        assert_eq!(valid.ttl, None);
    }

    #[test]
    fn test_message_is_not_trimmed() {
        let valid = validate_create(request(Some("  padded \n"), None), &LIMITS).unwrap();
        assert_eq!(valid.message, "  padded \n");
    }

    #[test_case(None ; "missing")]
    #[test_case(Some("") ; "empty")]
    #[test_case(Some(" \t\n") ; "whitespace only")]
    fn test_message_required(message: Option<&str>) {
        let errors = validate_create(request(message, None), &LIMITS).unwrap_err();
        assert_eq!(errors, vec![FieldError::required("message")]);
    }

    #[test]
    fn test_message_too_large() {
        let errors = validate_create(request(Some(&"a".repeat(17)), None), &LIMITS).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "message");
        assert_eq!(errors[0].error, "Value must be at most 16 bytes");
    }

    #[test]
    fn test_message_limit_counts_bytes() {
        // 8 two-byte characters fit, 9 do not.
        assert!(validate_create(request(Some(&"é".repeat(8)), None), &LIMITS).is_ok());
        assert!(validate_create(request(Some(&"é".repeat(9)), None), &LIMITS).is_err());
    }

    #[test_case(-1, "Value must be greater than or equal to 0" ; "negative")]
    #[test_case(25, "Value must be less than or equal to 24" ; "above max")]
    fn test_expiration_out_of_range(hours: i64, expected: &str) {
        let errors = validate_create(request(Some("x"), Some(hours)), &LIMITS).unwrap_err();

        assert_eq!(errors, vec![FieldError::new("expiration_hours", expected)]);
    }

    #[test]
    fn test_all_errors_reported() {
        let errors = validate_create(request(None, Some(-5)), &LIMITS).unwrap_err();

        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["message", "expiration_hours"]);
    }

    #[test]
    fn test_limits_from_config() {
        let config = ServerConfig::default()
            .with_max_message_bytes(10)
            .with_max_expiration_hours(3);

        assert_eq!(
            CreateLimits::from_config(&config),
            CreateLimits {
                max_message_bytes: 10,
                max_expiration_hours: 3
            }
        );
    }

    #[test]
    fn test_debug_redacts_message() {
        let valid = validate_create(request(Some("hunter2"), None), &LIMITS).unwrap();
        assert!(!format!("{valid:?}").contains("hunter2"));
    }
}
