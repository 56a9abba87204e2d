//! # Catalog Store
//!
//! The in-memory product list behind both screens, plus the admin forms
//! that edit it.
//!
//! ## Admin Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ProductForm (raw strings)      BatchForm (raw strings)                 │
//! │        │ parse()                      │ parse(today)                    │
//! │        ▼                              ▼                                 │
//! │  ProductDraft                   BatchDraft                              │
//! │        │                              │                                 │
//! │        └──────────────┬───────────────┘                                 │
//! │                       ▼                                                 │
//! │  Catalog::add_product / update_product / add_batch / update_batch ...  │
//! │     ├── new ids: uuid v4                                               │
//! │     ├── blank barcode: 2000000 + 3-digit sequence                      │
//! │     └── blank image: placeholder derived from the name                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The catalog is the only owner of product data. The cart keeps its own
//! snapshots, so editing or deleting a product never rewrites a line that
//! is already rung up.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use urlencoding::encode;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::search;
use crate::stock::{InventorySummary, SummaryThresholds};
use crate::types::{Batch, Customer, Product, Unit};
use crate::validation::{
    validate_barcode, validate_batch_number, validate_category, validate_expiry_date,
    validate_price, validate_product_name, validate_stock_quantity, ValidationResult,
};
use crate::GENERATED_BARCODE_PREFIX;

// =============================================================================
// Forms
// =============================================================================

/// Product fields as typed into the admin dialog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductForm {
    pub name: String,
    pub unit: String,
    pub category: String,
    /// Blank to generate one.
    pub barcode: String,
    /// Blank for a placeholder (or, when editing, to keep the current one).
    pub image_url: String,
}

/// A product form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub unit: Unit,
    pub category: String,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
}

impl ProductForm {
    /// Pre-fills the form from an existing product, for the edit dialog.
    pub fn from_product(product: &Product) -> Self {
        ProductForm {
            name: product.name.clone(),
            unit: product.unit.as_str().to_string(),
            category: product.category.clone(),
            barcode: product.barcode.clone(),
            image_url: product.image_url.clone().unwrap_or_default(),
        }
    }

    pub fn parse(&self) -> ValidationResult<ProductDraft> {
        let unit = if self.unit.trim().is_empty() {
            Unit::default()
        } else {
            self.unit.parse()?
        };

        let image_url = Some(self.image_url.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(ProductDraft {
            name: validate_product_name(&self.name)?,
            unit,
            category: validate_category(&self.category)?,
            barcode: validate_barcode(&self.barcode)?,
            image_url,
        })
    }
}

/// Batch fields as typed into the admin dialog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchForm {
    pub batch_number: String,
    /// ISO date; blank means today.
    pub expiry_date: String,
    pub quantity: String,
    pub price: String,
}

/// A batch form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchDraft {
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub quantity: i64,
    pub price: Money,
}

impl BatchForm {
    /// Pre-fills the form from an existing batch, for the edit dialog.
    pub fn from_batch(batch: &Batch) -> Self {
        BatchForm {
            batch_number: batch.batch_number.clone(),
            expiry_date: batch.expiry_date.format("%Y-%m-%d").to_string(),
            quantity: batch.quantity.to_string(),
            price: format!("{}.{:02}", batch.price.dollars(), batch.price.cents_part()),
        }
    }

    pub fn parse(&self, today: NaiveDate) -> ValidationResult<BatchDraft> {
        Ok(BatchDraft {
            batch_number: validate_batch_number(&self.batch_number)?,
            expiry_date: validate_expiry_date(&self.expiry_date, today)?,
            quantity: validate_stock_quantity(&self.quantity)?,
            price: validate_price(&self.price)?,
        })
    }
}

/// Placeholder image reference for a product without one.
///
/// ## Example
/// ```rust
/// use till_core::catalog::placeholder_image;
///
/// assert_eq!(
///     placeholder_image("Red Wine"),
///     "/placeholder.svg?height=200&width=200&query=Red%20Wine"
/// );
/// ```
pub fn placeholder_image(name: &str) -> String {
    format!(
        "/placeholder.svg?height=200&width=200&query={}",
        encode(name)
    )
}

// =============================================================================
// Catalog
// =============================================================================

/// The product list with its admin operations.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    barcode_seq: u32,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        let barcode_seq = products.len() as u32;
        Catalog {
            products,
            barcode_seq,
        }
    }

    /// The built-in demo catalog.
    pub fn sample() -> Self {
        Catalog::new(sample_products())
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Exact barcode lookup used by the scanner and the manual field.
    pub fn find_by_barcode(&self, code: &str) -> Option<&Product> {
        search::find_by_barcode(&self.products, code)
    }

    pub fn filter(&self, query: &str) -> Vec<&Product> {
        search::filter_products(&self.products, query)
    }

    pub fn summary(&self, today: NaiveDate, thresholds: SummaryThresholds) -> InventorySummary {
        InventorySummary::compute(&self.products, today, thresholds)
    }

    fn product_mut(&mut self, id: &str) -> CoreResult<&mut Product> {
        self.products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))
    }

    /// Next free generated barcode: `2000000` + 3-digit sequence.
    ///
    /// Skips codes already taken by another product. Once all thousand are
    /// taken the next code in sequence is returned anyway.
    pub fn next_barcode(&mut self) -> String {
        let mut code = String::new();
        for _ in 0..1000 {
            self.barcode_seq += 1;
            code = format!("{}{:03}", GENERATED_BARCODE_PREFIX, self.barcode_seq % 1000);
            if self.find_by_barcode(&code).is_none() {
                break;
            }
        }
        code
    }

    // =========================================================================
    // Product Operations
    // =========================================================================

    /// Adds a product with no batches.
    pub fn add_product(&mut self, form: &ProductForm) -> CoreResult<Product> {
        let draft = form.parse()?;

        let barcode = match draft.barcode {
            Some(code) => code,
            None => self.next_barcode(),
        };
        let image_url = draft
            .image_url
            .unwrap_or_else(|| placeholder_image(&draft.name));

        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            unit: draft.unit,
            category: draft.category,
            barcode,
            image_url: Some(image_url),
            batches: Vec::new(),
        };

        self.products.push(product.clone());
        Ok(product)
    }

    /// Replaces a product's fields. Batches are untouched, and a blank
    /// barcode or image keeps the current one.
    pub fn update_product(&mut self, id: &str, form: &ProductForm) -> CoreResult<Product> {
        let draft = form.parse()?;

        let product = self.product_mut(id)?;
        product.name = draft.name;
        product.unit = draft.unit;
        product.category = draft.category;
        if let Some(barcode) = draft.barcode {
            product.barcode = barcode;
        }
        if let Some(image_url) = draft.image_url {
            product.image_url = Some(image_url);
        }

        Ok(product.clone())
    }

    /// Removes a product and all its batches.
    pub fn delete_product(&mut self, id: &str) -> CoreResult<Product> {
        let index = self
            .products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        Ok(self.products.remove(index))
    }

    // =========================================================================
    // Batch Operations
    // =========================================================================

    /// Appends a new batch to a product.
    pub fn add_batch(
        &mut self,
        product_id: &str,
        form: &BatchForm,
        today: NaiveDate,
    ) -> CoreResult<Batch> {
        let draft = form.parse(today)?;
        let product = self.product_mut(product_id)?;

        let batch = Batch {
            id: Uuid::new_v4().to_string(),
            batch_number: draft.batch_number,
            expiry_date: draft.expiry_date,
            quantity: draft.quantity,
            price: draft.price,
        };

        product.batches.push(batch.clone());
        Ok(batch)
    }

    pub fn update_batch(
        &mut self,
        product_id: &str,
        batch_id: &str,
        form: &BatchForm,
        today: NaiveDate,
    ) -> CoreResult<Batch> {
        let draft = form.parse(today)?;
        let product = self.product_mut(product_id)?;

        let batch = product
            .batches
            .iter_mut()
            .find(|b| b.id == batch_id)
            .ok_or_else(|| CoreError::BatchNotFound {
                product_id: product_id.to_string(),
                batch_id: batch_id.to_string(),
            })?;

        batch.batch_number = draft.batch_number;
        batch.expiry_date = draft.expiry_date;
        batch.quantity = draft.quantity;
        batch.price = draft.price;

        Ok(batch.clone())
    }

    pub fn delete_batch(&mut self, product_id: &str, batch_id: &str) -> CoreResult<Batch> {
        let product = self.product_mut(product_id)?;

        let index = product
            .batches
            .iter()
            .position(|b| b.id == batch_id)
            .ok_or_else(|| CoreError::BatchNotFound {
                product_id: product_id.to_string(),
                batch_id: batch_id.to_string(),
            })?;

        Ok(product.batches.remove(index))
    }
}

// =============================================================================
// Sample Data
// =============================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn batch(id: &str, number: &str, expiry: NaiveDate, quantity: i64, cents: i64) -> Batch {
    Batch {
        id: id.to_string(),
        batch_number: number.to_string(),
        expiry_date: expiry,
        quantity,
        price: Money::from_cents(cents),
    }
}

fn product(
    id: &str,
    name: &str,
    unit: Unit,
    category: &str,
    barcode: &str,
    image: &str,
    batches: Vec<Batch>,
) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        unit,
        category: category.to_string(),
        barcode: barcode.to_string(),
        image_url: Some(image.to_string()),
        batches,
    }
}

/// The demo catalog: twelve products, most with two batches.
pub fn sample_products() -> Vec<Product> {
    vec![
        product("1", "Apples", Unit::Kg, "Fruits", "2000000001", "/single-red-apple.png", vec![
            batch("1-A", "A001", date(2023, 6, 15), 50, 299),
            batch("1-B", "A002", date(2023, 6, 20), 75, 329),
        ]),
        product("2", "Milk", Unit::Liter, "Dairy", "4796026408192", "/classic-milk-carton.png", vec![
            batch("2-A", "M101", date(2023, 5, 10), 30, 349),
        ]),
        product("3", "Bread", Unit::Piece, "Bakery", "2000000003", "/golden-crust-loaf.png", vec![
            batch("3-A", "B201", date(2023, 5, 5), 20, 229),
            batch("3-B", "B202", date(2023, 5, 7), 25, 219),
        ]),
        product("4", "Chicken Breast", Unit::Kg, "Meat", "2000000004", "/pan-seared-chicken.png", vec![
            batch("4-A", "C301", date(2023, 5, 8), 15, 899),
            batch("4-B", "C302", date(2023, 5, 12), 20, 949),
        ]),
        product("5", "Red Wine", Unit::Bottle, "Beverages", "2000000005", "/elegant-red-wine.png", vec![
            batch("5-A", "W401", date(2024, 12, 31), 10, 1299),
        ]),
        product("6", "Cheese", Unit::Kg, "Dairy", "2000000006", "/cheese-board-variety.png", vec![
            batch("6-A", "CH501", date(2023, 6, 1), 12, 599),
            batch("6-B", "CH502", date(2023, 6, 15), 18, 649),
        ]),
        product("7", "Tomatoes", Unit::Kg, "Vegetables", "2000000007", "/ripe-red-tomatoes.png", vec![
            batch("7-A", "T601", date(2023, 5, 10), 30, 399),
            batch("7-B", "T602", date(2023, 5, 15), 40, 349),
        ]),
        product("8", "Orange Juice", Unit::Liter, "Beverages", "2000000008", "/refreshing-orange-juice.png", vec![
            batch("8-A", "OJ701", date(2023, 5, 20), 25, 449),
        ]),
        product("9", "Chocolate Bar", Unit::Piece, "Snacks", "2000000009", "/decadent-chocolate-bar.png", vec![
            batch("9-A", "CB801", date(2023, 8, 15), 50, 199),
        ]),
        product("10", "Bananas", Unit::Kg, "Fruits", "2000000010", "/bunch-of-bananas.png", vec![
            batch("10-A", "BN901", date(2023, 5, 7), 40, 149),
            batch("10-B", "BN902", date(2023, 5, 10), 60, 129),
        ]),
        product("11", "Coffee Beans", Unit::Kg, "Beverages", "2000000011", "/roasted-coffee-pile.png", vec![
            batch("11-A", "CF101", date(2023, 12, 31), 15, 999),
        ]),
        product("12", "Yogurt", Unit::Piece, "Dairy", "2000000012", "/creamy-yogurt-with-berries.png", vec![
            batch("12-A", "YG111", date(2023, 5, 15), 30, 249),
            batch("12-B", "YG112", date(2023, 5, 20), 45, 229),
        ]),
    ]
}

/// The demo customer directory.
pub fn sample_customers() -> Vec<Customer> {
    [
        ("1", "John Doe", "555-1234"),
        ("2", "Jane Smith", "555-5678"),
        ("3", "Bob Johnson", "555-9012"),
    ]
    .into_iter()
    .map(|(id, name, phone)| Customer {
        id: id.to_string(),
        name: name.to_string(),
        phone: phone.to_string(),
    })
    .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
