//! # Domain Types
//!
//! Core domain types shared by the POS and catalog screens.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐  owns  ┌─────────────────┐                        │
//! │  │    Product      │───────►│     Batch       │                        │
//! │  │  ─────────────  │  1..n  │  ─────────────  │                        │
//! │  │  id             │        │  id             │                        │
//! │  │  name, category │        │  batch_number   │                        │
//! │  │  unit           │        │  expiry_date    │                        │
//! │  │  barcode        │        │  quantity       │                        │
//! │  │  image_url      │        │  price (cents)  │                        │
//! │  └─────────────────┘        └─────────────────┘                        │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │ PaymentMethod   │   │    TaxRate      │       │
//! │  │  id, name,      │   │  Cash           │   │  bps (u32)      │       │
//! │  │  phone          │   │  Card           │   │  1000 = 10%     │       │
//! │  └─────────────────┘   │  Credit         │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Price lives on the batch, not the product: two lots of the same apples
//! can be priced differently, and the cart remembers which lot it sold.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1000 bps = 10%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }
}

// =============================================================================
// Unit of Measure
// =============================================================================

/// How a product is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    #[default]
    Piece,
    Kg,
    G,
    Liter,
    Ml,
    Bottle,
    HalfBottle,
    QuarterBottle,
}

impl Unit {
    pub const ALL: [Unit; 8] = [
        Unit::Piece,
        Unit::Kg,
        Unit::G,
        Unit::Liter,
        Unit::Ml,
        Unit::Bottle,
        Unit::HalfBottle,
        Unit::QuarterBottle,
    ];

    /// Wire name, as stored in catalog data.
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Piece => "piece",
            Unit::Kg => "kg",
            Unit::G => "g",
            Unit::Liter => "liter",
            Unit::Ml => "ml",
            Unit::Bottle => "bottle",
            Unit::HalfBottle => "half_bottle",
            Unit::QuarterBottle => "quarter_bottle",
        }
    }

    /// Whether the unit is counted in whole items.
    #[inline]
    pub fn is_piece(&self) -> bool {
        matches!(self, Unit::Piece)
    }

    /// Increment/decrement step for cart lines of this unit.
    ///
    /// Only pieces step by whole units. Bottles step by 0.1 like weighed
    /// goods do.
    pub fn step(&self) -> Quantity {
        if self.is_piece() {
            Quantity::ONE
        } else {
            Quantity::TENTH
        }
    }

    /// Label shown next to a quantity: `1 piece`, `3 pieces`, `2.5 kg`.
    pub fn label(&self, quantity: Quantity) -> &'static str {
        match self {
            Unit::Piece if quantity > Quantity::ONE => "pieces",
            Unit::Piece => "piece",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Unit::ALL
            .iter()
            .copied()
            .find(|unit| unit.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "unit".to_string(),
                allowed: Unit::ALL.iter().map(|u| u.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Batch
// =============================================================================

/// A priced, dated lot of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// Unique identifier.
    pub id: String,

    /// Lot label printed on the packaging (e.g. "A001").
    pub batch_number: String,

    /// Best-before date.
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,

    /// Units on hand. Never negative.
    pub quantity: i64,

    /// Unit price in cents.
    pub price: Money,
}

impl Batch {
    /// Units on hand as a cart-compatible quantity.
    #[inline]
    pub fn available(&self) -> Quantity {
        Quantity::from_whole(self.quantity)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog, together with every batch of it in stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier.
    pub id: String,

    /// Display name shown to the cashier.
    pub name: String,

    /// Unit of measure.
    pub unit: Unit,

    /// Free-form category ("Fruits", "Dairy").
    pub category: String,

    /// Barcode. Assumed unique across the catalog, not enforced.
    pub barcode: String,

    /// Optional image reference for the product card.
    pub image_url: Option<String>,

    /// Batches in catalog order.
    pub batches: Vec<Batch>,
}

impl Product {
    /// Looks up one of this product's batches.
    pub fn batch(&self, batch_id: &str) -> Option<&Batch> {
        self.batches.iter().find(|b| b.id == batch_id)
    }

    /// The single batch, when there is exactly one.
    ///
    /// This is what lets the selection flow skip the batch dialog.
    pub fn sole_batch(&self) -> Option<&Batch> {
        match self.batches.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer from the read-only directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    #[default]
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Store credit, billed to a named customer.
    Credit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Credit => "credit",
        }
    }

    /// Whether a customer must be selected before the sale can complete.
    #[inline]
    pub fn requires_customer(&self) -> bool {
        matches!(self, PaymentMethod::Credit)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "credit" | "store_credit" => Ok(PaymentMethod::Credit),
            _ => Err(ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: vec!["cash".into(), "card".into(), "credit".into()],
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
