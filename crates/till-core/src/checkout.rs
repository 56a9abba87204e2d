//! # Checkout
//!
//! Sale preconditions and the record of a completed sale.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart + payment method + customer?                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  checkout_blocker()                                                     │
//! │       ├── cart empty ─────────────────► CoreError::CartEmpty            │
//! │       ├── credit without customer ────► CoreError::CustomerRequired     │
//! │       ▼                                                                 │
//! │  complete_sale() ──► CompletedSale (lines, totals, method, customer,    │
//! │                                     timestamp)                          │
//! │                            │                                            │
//! │                            ▼                                            │
//! │                  handed to the sale sink; cart cleared by the caller    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The blocker is also what the host uses to disable the checkout button,
//! so the button state and the checkout result can never disagree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::{Cart, CartLine};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Customer, PaymentMethod, TaxRate};

/// A finished sale, as handed to the sale sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CompletedSale {
    /// Unique identifier for this sale.
    pub id: String,
    pub lines: Vec<CartLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub customer: Option<Customer>,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

/// The reason checkout is unavailable right now, if any.
///
/// ## Example
/// ```rust
/// use till_core::cart::Cart;
/// use till_core::checkout::checkout_blocker;
/// use till_core::{CoreError, PaymentMethod};
///
/// let cart = Cart::new();
/// assert_eq!(
///     checkout_blocker(&cart, PaymentMethod::Cash, None),
///     Some(CoreError::CartEmpty)
/// );
/// ```
pub fn checkout_blocker(
    cart: &Cart,
    method: PaymentMethod,
    customer: Option<&Customer>,
) -> Option<CoreError> {
    if cart.is_empty() {
        return Some(CoreError::CartEmpty);
    }

    if method.requires_customer() && customer.is_none() {
        return Some(CoreError::CustomerRequired {
            method: method.to_string(),
        });
    }

    None
}

/// Builds the sale record if every precondition holds.
///
/// Does not touch the cart; clearing it after a successful sale is the
/// caller's job, so a failed sink never loses the lines.
pub fn complete_sale(
    cart: &Cart,
    method: PaymentMethod,
    customer: Option<&Customer>,
    rate: TaxRate,
    timestamp: DateTime<Utc>,
) -> CoreResult<CompletedSale> {
    if let Some(blocker) = checkout_blocker(cart, method, customer) {
        return Err(blocker);
    }

    let totals = cart.totals(rate);

    Ok(CompletedSale {
        id: Uuid::new_v4().to_string(),
        lines: cart.lines().to_vec(),
        subtotal: totals.subtotal,
        tax: totals.tax,
        total: totals.total,
        payment_method: method,
        customer: customer.cloned(),
        timestamp,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
