//! # Validation Module
//!
//! Field validation for the catalog admin forms.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Admin form (strings as typed)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductForm::parse / BatchForm::parse                                  │
//! │       │   calls THIS MODULE field by field                              │
//! │       ├── bad field ──► ValidationError ──► CoreError ──► ApiError      │
//! │       ▼                                                                 │
//! │  Catalog mutation (only ever sees valid values)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! POS-side inputs (quantity dialog, cart edits) are not validated here:
//! an invalid value there is a rejected event, not an error.

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest name or category accepted by the admin forms.
pub const MAX_NAME_LEN: usize = 200;

/// Longest barcode or batch number accepted.
pub const MAX_CODE_LEN: usize = 50;

/// Most units a single batch can hold.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000_000;

// =============================================================================
// String Validators
// =============================================================================

/// Trims a required text field and enforces its maximum length.
fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates a product name.
///
/// ## Example
/// ```rust
/// use till_core::validation::validate_product_name;
///
/// assert_eq!(validate_product_name("  Apples ").unwrap(), "Apples");
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    required_text("name", name, MAX_NAME_LEN)
}

/// Validates a category label. Categories are free-form.
pub fn validate_category(category: &str) -> ValidationResult<String> {
    required_text("category", category, MAX_NAME_LEN)
}

/// Validates a batch number ("A001").
pub fn validate_batch_number(batch_number: &str) -> ValidationResult<String> {
    required_text("batch number", batch_number, MAX_CODE_LEN)
}

/// Validates an optional barcode.
///
/// Blank means "generate one for me" and returns `None`. Anything else must
/// be digits only.
pub fn validate_barcode(barcode: &str) -> ValidationResult<Option<String>> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Ok(None);
    }

    if barcode.len() > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_CODE_LEN,
        });
    }

    if !barcode.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    Ok(Some(barcode.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a batch quantity: a whole, non-negative number of units, at
/// most [`MAX_STOCK_QUANTITY`].
///
/// Zero is allowed (an emptied lot stays on record).
///
/// ## Example
/// ```rust
/// use till_core::validation::validate_stock_quantity;
///
/// assert_eq!(validate_stock_quantity("50").unwrap(), 50);
/// assert_eq!(validate_stock_quantity("0").unwrap(), 0);
/// assert!(validate_stock_quantity("-1").is_err());
/// assert!(validate_stock_quantity("2.5").is_err());
/// assert!(validate_stock_quantity("9223372036854775807").is_err());
/// ```
pub fn validate_stock_quantity(text: &str) -> ValidationResult<i64> {
    let text = text.trim();

    if text.is_empty() {
        return Err(ValidationError::Required {
            field: "quantity".to_string(),
        });
    }

    let quantity: i64 = text.parse().map_err(|_| ValidationError::InvalidFormat {
        field: "quantity".to_string(),
        reason: "must be a whole number".to_string(),
    })?;

    if quantity < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_STOCK_QUANTITY {
        return Err(ValidationError::TooLarge {
            field: "quantity".to_string(),
            max: MAX_STOCK_QUANTITY,
        });
    }

    Ok(quantity)
}

/// Validates a batch price typed as a decimal ("2.99").
///
/// Zero is allowed (free items).
pub fn validate_price(text: &str) -> ValidationResult<Money> {
    if text.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "price".to_string(),
        });
    }

    let price = Money::parse_decimal(text).ok_or_else(|| ValidationError::InvalidFormat {
        field: "price".to_string(),
        reason: "must be an amount with at most two decimals".to_string(),
    })?;

    if price.cents() < 0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    Ok(price)
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates an expiry date in ISO form (`2023-06-15`).
///
/// A blank field takes `default`, which the caller sets to today.
pub fn validate_expiry_date(text: &str, default: NaiveDate) -> ValidationResult<NaiveDate> {
    let text = text.trim();

    if text.is_empty() {
        return Ok(default);
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| ValidationError::InvalidFormat {
        field: "expiry date".to_string(),
        reason: "must be a date like 2023-06-15".to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
