//! # Cart Module
//!
//! The lines rung up for the current sale.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation               Effect                                         │
//! │  ─────────               ──────                                         │
//! │  add(p, b, "2")      ──► same (product, batch)? qty += 2 : push line   │
//! │  set_quantity(k, t)  ──► overwrite qty (positive only, no upper bound) │
//! │  increment(k)        ──► qty += step                                    │
//! │  decrement(k)        ──► qty = max(qty - step, step)                    │
//! │  remove(k)           ──► drop line                                      │
//! │  clear()             ──► drop everything                                │
//! │                                                                         │
//! │  step = 1 for piece lines, 0.1 for everything else                      │
//! │  Invalid input (≤ 0, NaN, unknown key) changes nothing.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Price Freezing
//! A line copies the product name, unit, batch number and batch price when
//! it is created. Later catalog edits do not reach lines already in the
//! cart.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{Batch, Product, TaxRate, Unit};

// =============================================================================
// Cart Line
// =============================================================================

/// Identifies a cart line. Two adds merge only when both parts match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineKey {
    pub product_id: String,
    pub batch_id: String,
}

impl LineKey {
    pub fn new(product_id: impl Into<String>, batch_id: impl Into<String>) -> Self {
        LineKey {
            product_id: product_id.into(),
            batch_id: batch_id.into(),
        }
    }
}

/// One line of the sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(flatten)]
    #[ts(flatten)]
    pub key: LineKey,

    /// Product name at time of adding (frozen)
    pub name: String,

    /// Unit at time of adding (frozen)
    pub unit: Unit,

    /// Batch number at time of adding (frozen)
    pub batch_number: String,

    /// Batch price at time of adding (frozen)
    pub price: Money,

    /// Always positive.
    #[ts(type = "number")]
    pub quantity: Quantity,
}

impl CartLine {
    fn from_batch(product: &Product, batch: &Batch, quantity: Quantity) -> Self {
        CartLine {
            key: LineKey::new(&product.id, &batch.id),
            name: product.name.clone(),
            unit: product.unit,
            batch_number: batch.batch_number.clone(),
            price: batch.price,
            quantity,
        }
    }

    /// Price × quantity, rounded to the cent.
    pub fn line_total(&self) -> Money {
        self.price.times(self.quantity)
    }

    /// The +/- step for this line.
    pub fn step(&self) -> Quantity {
        self.unit.step()
    }

    /// `3 pieces`, `1.5 kg`.
    pub fn quantity_label(&self) -> String {
        format!("{} {}", self.quantity, self.unit.label(self.quantity))
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The current sale.
///
/// ## Invariants
/// - At most one line per (product, batch)
/// - Every line quantity is positive
/// - Lines stay in the order they were first added
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.key == key)
    }

    fn line_mut(&mut self, key: &LineKey) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| &l.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of line quantities, mixing units.
    pub fn total_units(&self) -> Quantity {
        self.lines
            .iter()
            .fold(Quantity::ZERO, |acc, line| acc + line.quantity)
    }

    /// Adds a quantity typed by the cashier. Returns whether the cart
    /// changed.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::cart::Cart;
    /// use till_core::catalog::sample_products;
    ///
    /// let milk = sample_products().remove(1);
    /// let mut cart = Cart::new();
    ///
    /// assert!(cart.add(&milk, &milk.batches[0], "1.5"));
    /// assert!(!cart.add(&milk, &milk.batches[0], "abc"));
    /// assert!(!cart.add(&milk, &milk.batches[0], "0"));
    /// assert_eq!(cart.line_count(), 1);
    /// ```
    pub fn add(&mut self, product: &Product, batch: &Batch, quantity: &str) -> bool {
        match Quantity::parse(quantity) {
            Some(quantity) => self.add_quantity(product, batch, quantity),
            None => false,
        }
    }

    /// Adds an already-parsed quantity. Non-positive quantities are ignored,
    /// as is a merge that would push the line past the largest quantity.
    pub fn add_quantity(&mut self, product: &Product, batch: &Batch, quantity: Quantity) -> bool {
        if !quantity.is_positive() {
            return false;
        }

        let key = LineKey::new(&product.id, &batch.id);
        match self.line_mut(&key) {
            Some(line) => match line.quantity.checked_add(quantity) {
                Some(merged) => line.quantity = merged,
                None => return false,
            },
            None => self
                .lines
                .push(CartLine::from_batch(product, batch, quantity)),
        }
        true
    }

    /// Removes a line. Returns whether it was there.
    pub fn remove(&mut self, key: &LineKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.key != key);
        self.lines.len() != before
    }

    /// Overwrites a line's quantity from typed text.
    ///
    /// Rejected if the text is not a positive number. Stock is not checked:
    /// the cashier can override what the system thinks is on hand.
    pub fn set_quantity(&mut self, key: &LineKey, text: &str) -> bool {
        let Some(quantity) = Quantity::parse_positive(text) else {
            return false;
        };
        match self.line_mut(key) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Raises a line by its unit step. Refused at the largest quantity.
    pub fn increment(&mut self, key: &LineKey) -> bool {
        match self.line_mut(key) {
            Some(line) => match line.quantity.checked_add(line.step()) {
                Some(next) => {
                    line.quantity = next;
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    /// Lowers a line by its unit step, never below one step.
    ///
    /// Removing a line is always an explicit [`Cart::remove`].
    pub fn decrement(&mut self, key: &LineKey) -> bool {
        match self.line_mut(key) {
            Some(line) => {
                let step = line.step();
                let next = (line.quantity - step).max(step);
                let changed = next != line.quantity;
                line.quantity = next;
                changed
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of rounded line totals.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Subtotal, tax and grand total at the given rate.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::cart::Cart;
    /// use till_core::catalog::sample_products;
    /// use till_core::DEFAULT_TAX_RATE;
    ///
    /// let products = sample_products();
    /// let (apples, milk) = (&products[0], &products[1]);
    ///
    /// let mut cart = Cart::new();
    /// cart.add(apples, &apples.batches[0], "2"); // 2 × $2.99
    /// cart.add(milk, &milk.batches[0], "1");     // 1 × $3.49
    ///
    /// let totals = cart.totals(DEFAULT_TAX_RATE);
    /// assert_eq!(totals.subtotal.cents(), 947);
    /// assert_eq!(totals.tax.cents(), 95);
    /// assert_eq!(totals.total.cents(), 1042);
    /// ```
    pub fn totals(&self, rate: TaxRate) -> CartTotals {
        let subtotal = self.subtotal();
        let tax = subtotal.calculate_tax(rate);
        CartTotals {
            line_count: self.line_count(),
            total_units: self.total_units(),
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

/// Cart totals summary for the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub line_count: usize,
    #[ts(type = "number")]
    pub total_units: Quantity,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
