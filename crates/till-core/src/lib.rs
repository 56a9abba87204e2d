//! # till-core: Pure Screen Logic for Till POS
//!
//! This crate holds everything the POS and catalog screens *decide*, with
//! none of what they *draw*. Every module is pure: time comes in as a
//! parameter, output goes back as values.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Till POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Rendering host (webview, terminal)              │   │
//! │  │   keystrokes, clicks, timer ticks ──►   ◄── state to render     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             till-register (PosSession, AdminScreen)             │   │
//! │  │     clock, banners, focus, config, logging, sale sink           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │  catalog ──► search ──► selection ──► cart ──► checkout         │   │
//! │  │     │                      ▲                                    │   │
//! │  │   stock                 scanner                                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK • NO LOGGING • PURE FUNCTIONS               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Batch, Unit, Customer, PaymentMethod)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`quantity`] - Fixed-point quantities (hundredths)
//! - [`stock`] - Batch aggregates and the inventory summary
//! - [`search`] - Catalog filter and the suggestion list
//! - [`selection`] - Product → batch → quantity state machine
//! - [`scanner`] - Keystroke-timing barcode buffer
//! - [`cart`] - Cart lines and totals
//! - [`checkout`] - Sale preconditions and the completed-sale record
//! - [`catalog`] - In-memory catalog store and admin forms
//! - [`validation`] - Form field validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::cart::Cart;
//! use till_core::money::Money;
//! use till_core::quantity::Quantity;
//! use till_core::DEFAULT_TAX_RATE;
//!
//! let mut cart = Cart::new();
//! let apples = till_core::catalog::sample_products().remove(0);
//! let batch = apples.batches[0].clone();
//!
//! assert!(cart.add(&apples, &batch, "2"));
//! let totals = cart.totals(DEFAULT_TAX_RATE);
//! assert_eq!(totals.subtotal, Money::from_cents(598));
//! assert_eq!(cart.lines()[0].quantity, Quantity::from_whole(2));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod money;
pub mod quantity;
pub mod scanner;
pub mod search;
pub mod selection;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use quantity::Quantity;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Flat sales tax applied to every cart (10%).
///
/// There are no per-line tax categories; the whole subtotal is taxed once.
pub const DEFAULT_TAX_RATE: TaxRate = TaxRate::from_bps(1000);

/// Prefix of generated barcodes (`2000000` + 3-digit sequence).
pub const GENERATED_BARCODE_PREFIX: &str = "2000000";

/// Total stock at or below this (but above zero) counts as "low stock".
pub const LOW_STOCK_THRESHOLD: i64 = 20;

/// Batches expiring within this many days count as "expiring soon".
pub const EXPIRY_WARNING_DAYS: i64 = 30;
