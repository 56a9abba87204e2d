//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Lookup misses, blocked checkout                │
//! │  └── ValidationError  - Admin form input failures                      │
//! │                                                                         │
//! │  till-register errors (separate crate)                                 │
//! │  ├── ConfigError      - register.toml / environment problems           │
//! │  └── ApiError         - What the rendering host sees (serialized)      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Host                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Most screen interactions never produce an error at all: an invalid
//! quantity or an unknown barcode is a rejected event, not a failure. These
//! types cover the places where the host asked for something explicit
//! (edit this batch, complete this sale) and deserves a reason.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// Product id is not in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Batch id is not among the product's batches.
    #[error("Batch {batch_id} not found for product {product_id}")]
    BatchNotFound {
        product_id: String,
        batch_id: String,
    },

    /// Checkout attempted with nothing in the cart.
    #[error("Cart is empty")]
    CartEmpty,

    /// Checkout attempted on store credit without a customer.
    ///
    /// ## User Workflow
    /// ```text
    /// Payment method: Store Credit
    ///      │
    ///      ▼
    /// No customer selected
    ///      │
    ///      ▼
    /// CustomerRequired ──► UI: "Please select a customer for credit sales"
    ///                      Complete Sale button disabled
    /// ```
    #[error("A customer must be selected for {method} sales")]
    CustomerRequired { method: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Form input validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Number is above the accepted maximum.
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., not a number, not a date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::BatchNotFound {
            product_id: "1".to_string(),
            batch_id: "1-Z".to_string(),
        };
        assert_eq!(err.to_string(), "Batch 1-Z not found for product 1");

        let err = CoreError::CustomerRequired {
            method: "credit".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "A customer must be selected for credit sales"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::Negative {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "batch number".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
