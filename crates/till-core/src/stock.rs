//! # Stock Aggregates
//!
//! Derived values over a product's batches, and the catalog-wide inventory
//! summary shown on the admin dashboard.
//!
//! None of these are stored: they are recomputed from the batch list on
//! every call. Catalogs here are a few dozen products, so there is nothing
//! to cache.
//!
//! ## Derived Values
//! ```text
//! batches: [A001: 50 @ $2.99, exp 06-15]  [A002: 75 @ $3.29, exp 06-20]
//!
//! total_stock             = 50 + 75                          = 125
//! weighted_average_price  = (50×2.99 + 75×3.29) / 125        = $3.17
//! latest_batch_price      = price of furthest expiry (A002)  = $3.29
//! price_range             = ($2.99, $3.29)
//! ```

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{Batch, Product};
use crate::{EXPIRY_WARNING_DAYS, LOW_STOCK_THRESHOLD};

// =============================================================================
// Per-Product Queries
// =============================================================================

/// Sum of on-hand quantities across batches.
pub fn total_stock(batches: &[Batch]) -> i64 {
    batches.iter().map(|b| b.quantity).sum()
}

/// Batch prices averaged with batch quantity as the weight.
///
/// Returns zero when there are no batches or no stock at all.
///
/// ## Example
/// ```rust
/// use till_core::catalog::sample_products;
/// use till_core::stock::weighted_average_price;
///
/// let apples = &sample_products()[0];
/// assert_eq!(weighted_average_price(&apples.batches).cents(), 317);
/// ```
pub fn weighted_average_price(batches: &[Batch]) -> Money {
    let total_quantity = total_stock(batches);
    if total_quantity <= 0 {
        return Money::zero();
    }

    let total_value: i128 = batches
        .iter()
        .map(|b| b.price.cents() as i128 * b.quantity as i128)
        .sum();

    let q = total_quantity as i128;
    Money::from_cents(((total_value * 2 + q) / (q * 2)) as i64)
}

/// Price of the batch with the furthest-future expiry date.
///
/// This is a display convention for the admin list, not a pricing rule:
/// the cart always charges the price of the batch actually sold. Ties keep
/// the earlier batch in catalog order. Zero when there are no batches.
pub fn latest_batch_price(batches: &[Batch]) -> Money {
    batches
        .iter()
        .rev()
        .max_by_key(|b| b.expiry_date)
        .map(|b| b.price)
        .unwrap_or_default()
}

/// Cheapest and dearest batch price, for the suggestion row.
pub fn price_range(batches: &[Batch]) -> Option<(Money, Money)> {
    let min = batches.iter().map(|b| b.price).min()?;
    let max = batches.iter().map(|b| b.price).max()?;
    Some((min, max))
}

/// Value of the stock on hand at batch prices.
pub fn stock_value(batches: &[Batch]) -> Money {
    batches
        .iter()
        .map(|b| b.price.times(Quantity::from_whole(b.quantity)))
        .sum()
}

// =============================================================================
// Inventory Summary
// =============================================================================

/// Thresholds for the dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryThresholds {
    /// Stock at or below this (and above zero) is "low".
    pub low_stock: i64,
    /// Batches expiring within this many days are "expiring soon".
    pub expiry_window_days: i64,
}

impl Default for SummaryThresholds {
    fn default() -> Self {
        SummaryThresholds {
            low_stock: LOW_STOCK_THRESHOLD,
            expiry_window_days: EXPIRY_WARNING_DAYS,
        }
    }
}

/// Product count for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    pub products: usize,
}

/// Counters shown in the admin dashboard's inventory panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub total_products: usize,
    pub total_batches: usize,
    /// Products whose total stock is zero.
    pub out_of_stock: usize,
    /// Products with some stock, but not more than the low-stock threshold.
    pub low_stock: usize,
    /// Batches expiring after `today` and no later than the warning window.
    pub expiring_soon: usize,
    /// Categories in first-seen catalog order.
    pub categories: Vec<CategoryCount>,
}

impl InventorySummary {
    /// Computes the summary as of `today`.
    ///
    /// A window reaching past the last representable date counts every
    /// future batch; a negative window counts none.
    pub fn compute(products: &[Product], today: NaiveDate, thresholds: SummaryThresholds) -> Self {
        let horizon = match u64::try_from(thresholds.expiry_window_days) {
            Ok(days) => today.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX),
            Err(_) => today,
        };

        let mut out_of_stock = 0;
        let mut low_stock = 0;
        let mut expiring_soon = 0;
        let mut categories: Vec<CategoryCount> = Vec::new();

        for product in products {
            let stock = total_stock(&product.batches);
            if stock == 0 {
                out_of_stock += 1;
            } else if stock > 0 && stock <= thresholds.low_stock {
                low_stock += 1;
            }

            expiring_soon += product
                .batches
                .iter()
                .filter(|b| b.expiry_date > today && b.expiry_date <= horizon)
                .count();

            match categories.iter_mut().find(|c| c.category == product.category) {
                Some(entry) => entry.products += 1,
                None => categories.push(CategoryCount {
                    category: product.category.clone(),
                    products: 1,
                }),
            }
        }

        InventorySummary {
            total_products: products.len(),
            total_batches: products.iter().map(|p| p.batches.len()).sum(),
            out_of_stock,
            low_stock,
            expiring_soon,
            categories,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::sample_products;
    use crate::types::Unit;

    fn batch(id: &str, expiry: (i32, u32, u32), quantity: i64, cents: i64) -> Batch {
        Batch {
            id: id.to_string(),
            batch_number: id.to_string(),
            expiry_date: NaiveDate::from_ymd_opt(expiry.0, expiry.1, expiry.2).unwrap(),
            quantity,
            price: Money::from_cents(cents),
        }
    }

    fn product(id: &str, category: &str, batches: Vec<Batch>) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            unit: Unit::Piece,
            category: category.to_string(),
            barcode: format!("2000000{:0>3}", id),
            image_url: None,
            batches,
        }
    }

    #[test]
    fn test_total_stock() {
        let apples = &sample_products()[0];
        assert_eq!(total_stock(&apples.batches), 125);
        assert_eq!(total_stock(&[]), 0);
    }

    #[test]
    fn test_weighted_average_price() {
        // (50 × 2.99 + 75 × 3.29) / 125 = 3.17
        let apples = &sample_products()[0];
        assert_eq!(weighted_average_price(&apples.batches), Money::from_cents(317));
    }

    #[test]
    fn test_weighted_average_price_without_stock() {
        assert_eq!(weighted_average_price(&[]), Money::zero());
        let empty = [batch("x", (2023, 1, 1), 0, 500)];
        assert_eq!(weighted_average_price(&empty), Money::zero());
    }

    #[test]
    fn test_latest_batch_price_uses_furthest_expiry() {
        // Later-expiring batch listed first and cheaper: still wins
        let batches = vec![
            batch("late", (2024, 1, 1), 1, 100),
            batch("early", (2023, 1, 1), 500, 900),
        ];
        assert_eq!(latest_batch_price(&batches), Money::from_cents(100));
        assert_eq!(latest_batch_price(&[]), Money::zero());
    }

    #[test]
    fn test_latest_batch_price_tie_keeps_catalog_order() {
        let batches = vec![
            batch("first", (2024, 1, 1), 1, 100),
            batch("second", (2024, 1, 1), 1, 200),
        ];
        assert_eq!(latest_batch_price(&batches), Money::from_cents(100));
    }

    #[test]
    fn test_price_range() {
        let bread = &sample_products()[2];
        assert_eq!(
            price_range(&bread.batches),
            Some((Money::from_cents(219), Money::from_cents(229)))
        );
        assert_eq!(price_range(&[]), None);
    }

    #[test]
    fn test_stock_value() {
        let batches = vec![batch("a", (2024, 1, 1), 3, 250)];
        assert_eq!(stock_value(&batches), Money::from_cents(750));
    }

    #[test]
    fn test_inventory_summary() {
        let today = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        let products = vec![
            product("1", "Dairy", vec![batch("a", (2023, 5, 10), 0, 100)]),
            product("2", "Fruits", vec![batch("b", (2023, 5, 31), 12, 100)]),
            product(
                "3",
                "Dairy",
                vec![
                    batch("c", (2023, 6, 1), 50, 100), // day 31: outside window
                    batch("d", (2023, 5, 1), 5, 100),  // expires today: not counted
                ],
            ),
            product("4", "Bakery", vec![]),
        ];

        let summary = InventorySummary::compute(&products, today, SummaryThresholds::default());

        assert_eq!(summary.total_products, 4);
        assert_eq!(summary.total_batches, 4);
        assert_eq!(summary.out_of_stock, 2); // product 1 and the batchless product 4
        assert_eq!(summary.low_stock, 1); // product 2 (12 ≤ 20)
        assert_eq!(summary.expiring_soon, 2); // a and b
        assert_eq!(
            summary.categories,
            vec![
                CategoryCount { category: "Dairy".into(), products: 2 },
                CategoryCount { category: "Fruits".into(), products: 1 },
                CategoryCount { category: "Bakery".into(), products: 1 },
            ]
        );
    }

    #[test]
    fn test_inventory_summary_with_extreme_windows() {
        let today = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        let products = vec![product(
            "1",
            "Dairy",
            vec![
                batch("a", (2023, 5, 10), 10, 100),
                batch("b", (2099, 1, 1), 10, 100),
                batch("c", (2023, 4, 1), 10, 100),
            ],
        )];

        let wide = SummaryThresholds {
            expiry_window_days: 100_000_000_000_000,
            ..SummaryThresholds::default()
        };
        assert_eq!(InventorySummary::compute(&products, today, wide).expiring_soon, 2);

        let negative = SummaryThresholds {
            expiry_window_days: -5,
            ..SummaryThresholds::default()
        };
        assert_eq!(InventorySummary::compute(&products, today, negative).expiring_soon, 0);
    }
}
