//! # Sale Sink
//!
//! Where completed sales go. The register has no database, so the default
//! sink writes each sale to the log as JSON; hosts that keep a journal
//! plug in their own [`SaleSink`].

use std::cell::RefCell;
use std::rc::Rc;

use till_core::checkout::CompletedSale;
use tracing::{info, warn};

/// Receives every completed sale.
pub trait SaleSink {
    fn record(&mut self, sale: &CompletedSale);
}

/// Logs each sale as structured JSON through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSaleSink;

impl SaleSink for LogSaleSink {
    fn record(&mut self, sale: &CompletedSale) {
        match serde_json::to_string(sale) {
            Ok(json) => info!(
                sale_id = %sale.id,
                total_cents = sale.total.cents(),
                payment_method = %sale.payment_method,
                sale = %json,
                "Sale completed"
            ),
            Err(e) => warn!(sale_id = %sale.id, error = %e, "Failed to serialize sale"),
        }
    }
}

/// Keeps sales in memory. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct MemorySaleSink {
    sales: Rc<RefCell<Vec<CompletedSale>>>,
}

impl MemorySaleSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sales(&self) -> Vec<CompletedSale> {
        self.sales.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.sales.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sales.borrow().is_empty()
    }
}

impl SaleSink for MemorySaleSink {
    fn record(&mut self, sale: &CompletedSale) {
        self.sales.borrow_mut().push(sale.clone());
    }
}
