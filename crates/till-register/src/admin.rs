//! # Catalog Admin
//!
//! State behind the product management screen: the filtered product list
//! with expandable batch rows, the product/batch forms, and the inventory
//! summary panel.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  🔍 [ dairy        ]                          [+ Add Product]           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  ▼ Milk      liter  Dairy   30 in stock   avg $3.49   latest $3.49     │
//! │      M101   2023-05-10   30   $3.49              [edit] [delete]        │
//! │  ▶ Cheese    kg     Dairy   30 in stock   avg $6.29   latest $6.49     │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  Inventory: 12 products · 19 batches · 0 out of stock · 2 low stock     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every write goes through [`Catalog`], so validation lives in one place
//! and failures reach the host as [`ApiError`]s with the
//! `VALIDATION_ERROR` or `NOT_FOUND` code.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use till_core::catalog::{BatchForm, Catalog, ProductForm};
use till_core::stock::{self, InventorySummary};
use till_core::{Batch, Money, Product, Unit};

use crate::clock::{Clock, SystemClock};
use crate::config::RegisterConfig;
use crate::error::ApiError;

/// Batch row under an expanded product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDto {
    pub id: String,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub quantity: i64,
    pub price: Money,
    /// Expiry date is today or earlier.
    pub expired: bool,
    /// Expires within the configured warning window.
    pub expiring_soon: bool,
}

/// One product row in the admin list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub unit: Unit,
    pub category: String,
    pub barcode: String,
    pub image_url: Option<String>,
    pub batch_count: usize,
    pub total_stock: i64,
    pub average_price: Money,
    pub latest_price: Money,
    pub stock_value: Money,
    pub expanded: bool,
    /// Filled only for expanded rows.
    pub batches: Vec<BatchDto>,
}

/// Product management screen.
pub struct AdminScreen<C: Clock = SystemClock> {
    config: RegisterConfig,
    clock: C,
    catalog: Catalog,
    query: String,
    expanded: HashSet<String>,
}

impl AdminScreen<SystemClock> {
    /// The screen over the sample catalog.
    pub fn open(config: RegisterConfig) -> Self {
        AdminScreen::new(config, Catalog::sample(), SystemClock)
    }
}

impl<C: Clock> AdminScreen<C> {
    pub fn new(config: RegisterConfig, catalog: Catalog, clock: C) -> Self {
        AdminScreen {
            config,
            clock,
            catalog,
            query: String::new(),
            expanded: HashSet::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Hands the edited catalog over (to a POS session, for instance).
    pub fn into_catalog(self) -> Catalog {
        self.catalog
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    // =========================================================================
    // List
    // =========================================================================

    pub fn set_query(&mut self, query: &str) {
        debug!(query, "admin set_query command");
        self.query = query.to_string();
    }

    /// Expands or collapses a product row. Returns the new state.
    pub fn toggle_expanded(&mut self, product_id: &str) -> bool {
        debug!(product_id, "toggle_expanded command");
        if self.expanded.remove(product_id) {
            false
        } else {
            self.expanded.insert(product_id.to_string());
            true
        }
    }

    pub fn is_expanded(&self, product_id: &str) -> bool {
        self.expanded.contains(product_id)
    }

    /// Rows matching the current filter, in catalog order.
    pub fn rows(&self) -> Vec<ProductRow> {
        let today = self.clock.today();
        self.catalog
            .filter(&self.query)
            .into_iter()
            .map(|product| self.row(product, today))
            .collect()
    }

    /// A single row with its batches, for the product detail dialog.
    pub fn product_detail(&self, product_id: &str) -> Result<ProductRow, ApiError> {
        debug!(product_id, "product_detail command");
        let product = self
            .catalog
            .product(product_id)
            .ok_or_else(|| ApiError::not_found("Product", product_id))?;

        let mut row = self.row(product, self.clock.today());
        if row.batches.is_empty() {
            row.batches = self.batch_dtos(product, self.clock.today());
        }
        Ok(row)
    }

    pub fn summary(&self) -> InventorySummary {
        self.catalog
            .summary(self.clock.today(), self.config.summary_thresholds())
    }

    fn row(&self, product: &Product, today: NaiveDate) -> ProductRow {
        let expanded = self.is_expanded(&product.id);

        ProductRow {
            id: product.id.clone(),
            name: product.name.clone(),
            unit: product.unit,
            category: product.category.clone(),
            barcode: product.barcode.clone(),
            image_url: product.image_url.clone(),
            batch_count: product.batches.len(),
            total_stock: stock::total_stock(&product.batches),
            average_price: stock::weighted_average_price(&product.batches),
            latest_price: stock::latest_batch_price(&product.batches),
            stock_value: stock::stock_value(&product.batches),
            expanded,
            batches: if expanded {
                self.batch_dtos(product, today)
            } else {
                Vec::new()
            },
        }
    }

    fn batch_dtos(&self, product: &Product, today: NaiveDate) -> Vec<BatchDto> {
        let window = self.config.inventory.expiry_window_days;
        product
            .batches
            .iter()
            .map(|batch| {
                let days_left = (batch.expiry_date - today).num_days();
                BatchDto {
                    id: batch.id.clone(),
                    batch_number: batch.batch_number.clone(),
                    expiry_date: batch.expiry_date,
                    quantity: batch.quantity,
                    price: batch.price,
                    expired: days_left <= 0,
                    expiring_soon: days_left > 0 && days_left <= window,
                }
            })
            .collect()
    }

    // =========================================================================
    // Product Commands
    // =========================================================================

    pub fn add_product(&mut self, form: &ProductForm) -> Result<Product, ApiError> {
        debug!(name = %form.name, "add_product command");
        let product = self.catalog.add_product(form)?;
        info!(id = %product.id, barcode = %product.barcode, "Product added");
        Ok(product)
    }

    /// The edit dialog, pre-filled.
    pub fn edit_product_form(&self, product_id: &str) -> Result<ProductForm, ApiError> {
        self.catalog
            .product(product_id)
            .map(ProductForm::from_product)
            .ok_or_else(|| ApiError::not_found("Product", product_id))
    }

    pub fn update_product(
        &mut self,
        product_id: &str,
        form: &ProductForm,
    ) -> Result<Product, ApiError> {
        debug!(product_id, "update_product command");
        Ok(self.catalog.update_product(product_id, form)?)
    }

    pub fn delete_product(&mut self, product_id: &str) -> Result<Product, ApiError> {
        debug!(product_id, "delete_product command");
        let product = self.catalog.delete_product(product_id)?;
        self.expanded.remove(product_id);
        info!(id = %product.id, name = %product.name, "Product deleted");
        Ok(product)
    }

    // =========================================================================
    // Batch Commands
    // =========================================================================

    /// A blank batch form with today's date as the expiry.
    pub fn new_batch_form(&self) -> BatchForm {
        BatchForm {
            expiry_date: self.clock.today().format("%Y-%m-%d").to_string(),
            ..BatchForm::default()
        }
    }

    pub fn edit_batch_form(&self, product_id: &str, batch_id: &str) -> Result<BatchForm, ApiError> {
        let product = self
            .catalog
            .product(product_id)
            .ok_or_else(|| ApiError::not_found("Product", product_id))?;
        product
            .batch(batch_id)
            .map(BatchForm::from_batch)
            .ok_or_else(|| ApiError::not_found("Batch", batch_id))
    }

    pub fn add_batch(&mut self, product_id: &str, form: &BatchForm) -> Result<Batch, ApiError> {
        debug!(product_id, batch_number = %form.batch_number, "add_batch command");
        let batch = self
            .catalog
            .add_batch(product_id, form, self.clock.today())?;
        info!(product_id, batch_id = %batch.id, quantity = batch.quantity, "Batch added");
        Ok(batch)
    }

    pub fn update_batch(
        &mut self,
        product_id: &str,
        batch_id: &str,
        form: &BatchForm,
    ) -> Result<Batch, ApiError> {
        debug!(product_id, batch_id, "update_batch command");
        Ok(self
            .catalog
            .update_batch(product_id, batch_id, form, self.clock.today())?)
    }

    pub fn delete_batch(&mut self, product_id: &str, batch_id: &str) -> Result<Batch, ApiError> {
        debug!(product_id, batch_id, "delete_batch command");
        Ok(self.catalog.delete_batch(product_id, batch_id)?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
