//! # Register Error Types
//!
//! What the rendering host sees when a command fails, and what can go
//! wrong while loading `register.toml`.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  host calls session.checkout() / admin.add_batch(...)                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  till-core ── CoreError::CustomerRequired ──┐                           │
//! │             ── CoreError::Validation(..) ───┤                           │
//! │                                             ▼                           │
//! │                                   ApiError { code, message } ──► host  │
//! │                                                                         │
//! │  register.toml ── io / toml / bad value ──► ConfigError                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The host receives:
//! ```json
//! { "code": "CHECKOUT_BLOCKED", "message": "A customer must be selected for credit sales" }
//! ```

use serde::Serialize;
use thiserror::Error;
use till_core::CoreError;

// =============================================================================
// API Error
// =============================================================================

/// Error returned from session and admin commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product, batch, customer or cart line does not exist
    NotFound,

    /// Admin form input failed validation
    ValidationError,

    /// Cart operation failed
    CartError,

    /// Checkout preconditions not met
    CheckoutBlocked,

    /// Register configuration could not be loaded or is invalid
    ConfigError,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            err @ CoreError::BatchNotFound { .. } => {
                ApiError::new(ErrorCode::NotFound, err.to_string())
            }
            err @ CoreError::CartEmpty => ApiError::new(ErrorCode::CartError, err.to_string()),
            err @ CoreError::CustomerRequired { .. } => {
                ApiError::new(ErrorCode::CheckoutBlocked, err.to_string())
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Config Error
// =============================================================================

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Problems loading or validating `register.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or parsed.
    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    /// File could not be written.
    #[error("Failed to save config: {0}")]
    SaveFailed(String),

    /// A value is out of range.
    #[error("Invalid register configuration: {0}")]
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use till_core::ValidationError;

    #[test]
    fn test_core_error_mapping() {
        let err = ApiError::from(CoreError::ProductNotFound("42".into()));
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Product not found: 42");

        let err = ApiError::from(CoreError::CustomerRequired {
            method: "credit".into(),
        });
        assert_eq!(err.code, ErrorCode::CheckoutBlocked);

        let err = ApiError::from(CoreError::Validation(ValidationError::Required {
            field: "name".into(),
        }));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "name is required");
    }

    #[test]
    fn test_config_error_mapping() {
        let err = ApiError::from(ConfigError::Invalid("scanner.interval_ms must be greater than 0".into()));
        assert_eq!(err.code, ErrorCode::ConfigError);
        assert_eq!(
            err.message,
            "Invalid register configuration: scanner.interval_ms must be greater than 0"
        );

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "CONFIG_ERROR");
    }

    #[test]
    fn test_serialized_shape() {
        let err = ApiError::from(CoreError::CartEmpty);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "CART_ERROR");
        assert_eq!(json["message"], "Cart is empty");
    }
}
