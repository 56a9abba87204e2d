//! # POS Session
//!
//! The whole point-of-sale screen as one state container. The rendering
//! host owns a [`PosSession`], forwards user input to its command methods,
//! calls [`PosSession::tick`] from its timer loop, and redraws from the
//! view methods.
//!
//! ## Event Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         PosSession                                      │
//! │                                                                         │
//! │  search box ──► set_search_query / search_key ──┐                       │
//! │  keyboard ────► global_key ──► ScanBuffer ──────┤  product chosen       │
//! │  barcode field ► submit_barcode_input ──────────┤                       │
//! │                                                 ▼                       │
//! │                              dispatch(SelectionEvent) ──► Selection     │
//! │                                                 │                       │
//! │                                       commit    ▼                       │
//! │                                               Cart ──► cart_view()      │
//! │                                                 │                       │
//! │                                     checkout()  ▼                       │
//! │                                          CompletedSale ──► SaleSink     │
//! │                                                                         │
//! │  tick() ──► expires banners, abandons scans, fires focus restores       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Deadlines
//! Nothing here spawns a timer. Banners, the scanner buffer and deferred
//! focus each store a deadline in milliseconds from the session's
//! [`Clock`]; re-arming one replaces the old deadline. The host asks for
//! [`PosSession::next_deadline`] to know when to tick next.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use till_core::cart::{Cart, CartLine, CartTotals, LineKey};
use till_core::catalog::{sample_customers, Catalog};
use till_core::checkout::{self, CompletedSale};
use till_core::scanner::{ScanBuffer, ScanKey, ScanOutcome};
use till_core::search::{SuggestionKey, SuggestionList};
use till_core::selection::{PendingLine, Selection, SelectionEvent, Step};
use till_core::stock;
use till_core::{CoreError, Customer, Money, PaymentMethod, Quantity, Unit};

use crate::clock::{Clock, SystemClock};
use crate::config::RegisterConfig;
use crate::error::ApiError;
use crate::sink::{LogSaleSink, SaleSink};

// =============================================================================
// Transient UI State
// =============================================================================

/// A message shown at the top of the screen until its deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub message: String,
    pub expires_at_ms: u64,
}

/// Input the host should move keyboard focus to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusTarget {
    BarcodeInput,
    QuantityInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingFocus {
    target: FocusTarget,
    due_ms: u64,
}

/// What one [`PosSession::tick`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub success_cleared: bool,
    pub error_cleared: bool,
    pub scan_reset: bool,
    /// A deferred focus restore fired.
    pub focus: Option<FocusTarget>,
}

impl TickReport {
    /// Whether the host needs to redraw.
    pub fn changed(&self) -> bool {
        self.success_cleared || self.error_cleared || self.scan_reset || self.focus.is_some()
    }
}

// =============================================================================
// Views
// =============================================================================

/// One row of the search dropdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub barcode: String,
    pub unit: Unit,
    pub batch_count: usize,
    pub total_stock: i64,
    /// Cheapest and dearest batch price, absent when there are no batches.
    pub price_range: Option<(Money, Money)>,
    pub highlighted: bool,
}

/// One row of the batch dialog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRow {
    pub id: String,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub quantity: i64,
    pub price: Money,
    pub highlighted: bool,
}

/// The quantity dialog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityPrompt {
    pub product_name: String,
    pub unit: Unit,
    pub batch_number: String,
    pub price: Money,
    pub available: Quantity,
    pub input: String,
    /// Drives the "Add to Cart" button.
    pub can_commit: bool,
}

/// A cart line with its display values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub line_total: Money,
    pub quantity_label: String,
}

/// Cart panel: lines, totals and checkout state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub totals: CartTotals,
    pub payment_method: PaymentMethod,
    pub customer: Option<Customer>,
    pub can_checkout: bool,
    /// Why checkout is disabled, for the hint under the button.
    pub checkout_blocker: Option<String>,
}

// =============================================================================
// Session
// =============================================================================

/// State of one point-of-sale screen.
pub struct PosSession<C: Clock = SystemClock, S: SaleSink = LogSaleSink> {
    config: RegisterConfig,
    clock: C,
    sink: S,

    catalog: Catalog,
    customers: Vec<Customer>,

    cart: Cart,
    selection: Selection,
    suggestions: SuggestionList,
    scanner: ScanBuffer,
    barcode_input: String,

    success: Option<Banner>,
    error: Option<Banner>,
    focus_request: Option<FocusTarget>,
    pending_focus: Option<PendingFocus>,

    payment_method: PaymentMethod,
    customer_id: Option<String>,
    customer_picker_open: bool,
    last_sale: Option<CompletedSale>,
}

impl PosSession<SystemClock, LogSaleSink> {
    /// A session over the sample catalog, on the system clock, logging sales.
    pub fn open(config: RegisterConfig) -> Self {
        PosSession::new(
            config,
            Catalog::sample(),
            sample_customers(),
            SystemClock,
            LogSaleSink,
        )
    }
}

impl<C: Clock, S: SaleSink> PosSession<C, S> {
    pub fn new(
        config: RegisterConfig,
        catalog: Catalog,
        customers: Vec<Customer>,
        clock: C,
        sink: S,
    ) -> Self {
        info!(
            store = %config.store.name,
            products = catalog.len(),
            customers = customers.len(),
            "POS session opened"
        );

        let mut suggestions = SuggestionList::new();
        suggestions.refresh(catalog.products());

        PosSession {
            scanner: ScanBuffer::new(config.scan_timing()),
            config,
            clock,
            sink,
            catalog,
            customers,
            cart: Cart::new(),
            selection: Selection::Idle,
            suggestions,
            barcode_input: String::new(),
            success: None,
            error: None,
            focus_request: Some(FocusTarget::BarcodeInput),
            pending_focus: None,
            payment_method: PaymentMethod::default(),
            customer_id: None,
            customer_picker_open: false,
            last_sale: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &RegisterConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn suggestions(&self) -> &SuggestionList {
        &self.suggestions
    }

    pub fn scan_buffer(&self) -> &str {
        self.scanner.buffer()
    }

    pub fn barcode_input(&self) -> &str {
        &self.barcode_input
    }

    pub fn success_banner(&self) -> Option<&Banner> {
        self.success.as_ref()
    }

    pub fn error_banner(&self) -> Option<&Banner> {
        self.error.as_ref()
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn selected_customer(&self) -> Option<&Customer> {
        let id = self.customer_id.as_deref()?;
        self.customers.iter().find(|c| c.id == id)
    }

    pub fn is_customer_picker_open(&self) -> bool {
        self.customer_picker_open
    }

    pub fn last_sale(&self) -> Option<&CompletedSale> {
        self.last_sale.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Takes the pending immediate focus request, if any.
    pub fn take_focus_request(&mut self) -> Option<FocusTarget> {
        self.focus_request.take()
    }

    /// Re-reads the register config and applies it. A file that fails to
    /// load or validate leaves the current settings in place.
    ///
    /// An in-progress scan is dropped because the keystroke timing may change.
    pub fn reload_config(&mut self, path: Option<PathBuf>) -> Result<(), ApiError> {
        debug!(?path, "reload_config command");
        let config = match RegisterConfig::load(path) {
            Ok(config) => config,
            Err(err) => return Err(self.report_error(err.into())),
        };

        self.scanner = ScanBuffer::new(config.scan_timing());
        self.config = config;
        info!(store = %self.config.store.name, "Register config reloaded");
        Ok(())
    }

    /// Swaps in a new catalog (after admin edits). The cart keeps its
    /// snapshots; an open dialog keeps its product copy.
    pub fn replace_catalog(&mut self, catalog: Catalog) {
        debug!(products = catalog.len(), "replace_catalog command");
        self.catalog = catalog;
        self.suggestions.refresh(self.catalog.products());
    }

    // =========================================================================
    // Search
    // =========================================================================

    pub fn set_search_query(&mut self, query: &str) {
        debug!(query, "set_search_query command");
        self.suggestions.set_query(query, self.catalog.products());
    }

    /// Arrow keys, Enter and Escape in the search box.
    pub fn search_key(&mut self, key: SuggestionKey) -> Result<(), ApiError> {
        debug!(?key, "search_key command");
        match self.suggestions.handle_key(key) {
            Some(id) => self.choose_product(&id),
            None => Ok(()),
        }
    }

    pub fn hover_suggestion(&mut self, index: usize) {
        self.suggestions.hover(index);
    }

    pub fn pick_suggestion(&mut self, index: usize) -> Result<(), ApiError> {
        debug!(index, "pick_suggestion command");
        match self.suggestions.pick(index) {
            Some(id) => self.choose_product(&id),
            None => Ok(()),
        }
    }

    /// Search form submitted.
    pub fn submit_search(&mut self) -> Result<(), ApiError> {
        debug!(query = %self.suggestions.query(), "submit_search command");
        match self.suggestions.submit(self.catalog.products()) {
            Some(id) => self.choose_product(&id),
            None => Ok(()),
        }
    }

    pub fn focus_search(&mut self) {
        self.suggestions.focus();
    }

    /// Click outside the dropdown.
    pub fn close_suggestions(&mut self) {
        self.suggestions.close();
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Starts the batch/quantity flow for a catalog product.
    pub fn choose_product(&mut self, product_id: &str) -> Result<(), ApiError> {
        debug!(product_id, "choose_product command");
        let Some(product) = self.catalog.product(product_id).cloned() else {
            return Err(self.report_error(ApiError::not_found("Product", product_id)));
        };
        self.dispatch(SelectionEvent::Choose(product));
        Ok(())
    }

    /// Feeds one event to the batch/quantity dialogs.
    ///
    /// Returns the cart line as it stands after a successful commit.
    pub fn dispatch(&mut self, event: SelectionEvent) -> Option<CartLine> {
        debug!(event = event_name(&event), "selection event");

        let was_idle = self.selection.is_idle();
        let was_entering_quantity = self.selection.quantity_input().is_some();

        let Step { next, commit } = std::mem::take(&mut self.selection).apply(event);
        self.selection = next;

        let added = commit.and_then(|pending| self.add_pending(pending));

        if !was_idle && self.selection.is_idle() {
            self.restore_focus_after_dialog();
        } else if !was_entering_quantity && self.selection.quantity_input().is_some() {
            self.schedule_focus(FocusTarget::QuantityInput);
        }

        added
    }

    fn add_pending(&mut self, pending: PendingLine) -> Option<CartLine> {
        let PendingLine {
            product,
            batch,
            quantity,
        } = pending;

        if !self.cart.add_quantity(&product, &batch, quantity) {
            return None;
        }

        let message = format!(
            "Added: {} (Batch {}) at {}",
            product.name,
            batch.batch_number,
            self.config.format_currency(batch.price)
        );
        self.show_success(message);
        self.focus_request = Some(FocusTarget::BarcodeInput);

        self.cart.line(&LineKey::new(&product.id, &batch.id)).cloned()
    }

    // =========================================================================
    // Barcode
    // =========================================================================

    /// Every keystroke on the screen, by DOM key name.
    pub fn global_key(&mut self, key_name: &str) -> ScanOutcome {
        let Some(key) = ScanKey::from_key_name(key_name) else {
            return ScanOutcome::Ignored;
        };

        let outcome = self.scanner.key(key, self.clock.now_ms());
        if let ScanOutcome::Flushed(code) = &outcome {
            debug!(barcode = %code, "Scanned barcode");
            self.barcode_input = code.clone();
            self.lookup_barcode(code);
        }
        outcome
    }

    pub fn set_barcode_input(&mut self, text: &str) {
        self.barcode_input = text.to_string();
    }

    /// Manual barcode field submitted. Returns whether a product matched.
    pub fn submit_barcode_input(&mut self) -> bool {
        let code = self.barcode_input.trim().to_string();
        debug!(barcode = %code, "submit_barcode_input command");

        if code.is_empty() {
            return false;
        }

        self.barcode_input.clear();
        self.lookup_barcode(&code)
    }

    fn lookup_barcode(&mut self, code: &str) -> bool {
        match self.catalog.find_by_barcode(code).cloned() {
            Some(product) => {
                self.dispatch(SelectionEvent::Choose(product));
                true
            }
            None => {
                debug!(barcode = %code, "Barcode not in catalog");
                let message = format!("Product with barcode {} not found", code);
                self.show_error(message, self.config.timing.scan_error_banner_ms);
                false
            }
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Adds a batch straight to the cart, bypassing the dialogs.
    pub fn add_to_cart(
        &mut self,
        product_id: &str,
        batch_id: &str,
        quantity: &str,
    ) -> Result<bool, ApiError> {
        debug!(product_id, batch_id, quantity, "add_to_cart command");

        let Some(product) = self.catalog.product(product_id).cloned() else {
            return Err(self.report_error(ApiError::not_found("Product", product_id)));
        };
        let Some(batch) = product.batch(batch_id).cloned() else {
            let err = CoreError::BatchNotFound {
                product_id: product_id.to_string(),
                batch_id: batch_id.to_string(),
            };
            return Err(self.report_error(err.into()));
        };

        let Some(quantity) = Quantity::parse(quantity) else {
            return Ok(false);
        };

        Ok(self
            .add_pending(PendingLine {
                product,
                batch,
                quantity,
            })
            .is_some())
    }

    pub fn remove_line(&mut self, key: &LineKey) -> bool {
        debug!(product_id = %key.product_id, batch_id = %key.batch_id, "remove_line command");
        let removed = self.cart.remove(key);
        self.focus_request = Some(FocusTarget::BarcodeInput);
        removed
    }

    pub fn set_line_quantity(&mut self, key: &LineKey, text: &str) -> bool {
        debug!(product_id = %key.product_id, batch_id = %key.batch_id, text, "set_line_quantity command");
        self.cart.set_quantity(key, text)
    }

    pub fn increment_line(&mut self, key: &LineKey) -> bool {
        debug!(product_id = %key.product_id, batch_id = %key.batch_id, "increment_line command");
        self.cart.increment(key)
    }

    pub fn decrement_line(&mut self, key: &LineKey) -> bool {
        debug!(product_id = %key.product_id, batch_id = %key.batch_id, "decrement_line command");
        self.cart.decrement(key)
    }

    /// "Clear" button. Returns false when there was nothing to clear.
    pub fn clear_cart(&mut self) -> bool {
        debug!(lines = self.cart.line_count(), "clear_cart command");
        if self.cart.is_empty() {
            return false;
        }
        self.cart.clear();
        true
    }

    // =========================================================================
    // Payment
    // =========================================================================

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        debug!(%method, "set_payment_method command");
        self.payment_method = method;
    }

    pub fn open_customer_picker(&mut self) {
        debug!("open_customer_picker command");
        self.customer_picker_open = true;
    }

    pub fn close_customer_picker(&mut self) {
        debug!("close_customer_picker command");
        if self.customer_picker_open {
            self.customer_picker_open = false;
            self.restore_focus_after_dialog();
        }
    }

    /// Picks a customer, or `None` to continue as a guest. Closes the picker.
    pub fn select_customer(&mut self, customer_id: Option<&str>) -> Result<(), ApiError> {
        debug!(?customer_id, "select_customer command");

        if let Some(id) = customer_id {
            if !self.customers.iter().any(|c| c.id == id) {
                return Err(self.report_error(ApiError::not_found("Customer", id)));
            }
        }

        self.customer_id = customer_id.map(str::to_string);
        self.close_customer_picker();
        Ok(())
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Why checkout is unavailable, if it is.
    pub fn checkout_blocker(&self) -> Option<ApiError> {
        checkout::checkout_blocker(&self.cart, self.payment_method, self.selected_customer())
            .map(ApiError::from)
    }

    pub fn can_checkout(&self) -> bool {
        self.checkout_blocker().is_none()
    }

    /// Completes the sale: records it, clears the cart, confirms.
    ///
    /// A blocked checkout shows the reason as an error banner, returns it
    /// and leaves the cart alone.
    pub fn checkout(&mut self) -> Result<CompletedSale, ApiError> {
        debug!(
            payment_method = %self.payment_method,
            lines = self.cart.line_count(),
            "checkout command"
        );

        let result = checkout::complete_sale(
            &self.cart,
            self.payment_method,
            self.selected_customer(),
            self.config.tax_rate(),
            self.clock.now_utc(),
        );
        let sale = match result {
            Ok(sale) => sale,
            Err(err) => return Err(self.report_error(err.into())),
        };

        self.sink.record(&sale);
        self.cart.clear();

        let message = format!("Sale completed: {}", self.config.format_currency(sale.total));
        self.show_success(message);
        self.focus_request = Some(FocusTarget::BarcodeInput);

        info!(sale_id = %sale.id, total = %sale.total, "Checkout complete");
        self.last_sale = Some(sale.clone());
        Ok(sale)
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Fires every deadline that has passed.
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now_ms();
        let mut report = TickReport::default();

        if self.success.as_ref().is_some_and(|b| now >= b.expires_at_ms) {
            self.success = None;
            report.success_cleared = true;
        }

        if self.error.as_ref().is_some_and(|b| now >= b.expires_at_ms) {
            self.error = None;
            report.error_cleared = true;
        }

        report.scan_reset = self.scanner.tick(now);

        if let Some(pending) = self.pending_focus {
            if now >= pending.due_ms {
                self.pending_focus = None;
                self.focus_request = Some(pending.target);
                report.focus = Some(pending.target);
            }
        }

        report
    }

    /// The earliest pending deadline, for scheduling the next tick.
    pub fn next_deadline(&self) -> Option<u64> {
        [
            self.success.as_ref().map(|b| b.expires_at_ms),
            self.error.as_ref().map(|b| b.expires_at_ms),
            self.scanner.reset_deadline(),
            self.pending_focus.map(|p| p.due_ms),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn show_success(&mut self, message: String) {
        self.success = Some(Banner {
            message,
            expires_at_ms: self.clock.now_ms() + self.config.timing.success_banner_ms,
        });
    }

    fn show_error(&mut self, message: String, duration_ms: u64) {
        self.error = Some(Banner {
            message,
            expires_at_ms: self.clock.now_ms() + duration_ms,
        });
    }

    /// Shows a failed command's message and hands the error back.
    fn report_error(&mut self, err: ApiError) -> ApiError {
        warn!(code = ?err.code, message = %err.message, "Command failed");
        self.show_error(err.message.clone(), self.config.timing.error_banner_ms);
        err
    }

    fn schedule_focus(&mut self, target: FocusTarget) {
        self.pending_focus = Some(PendingFocus {
            target,
            due_ms: self.clock.now_ms() + self.config.timing.focus_restore_ms,
        });
    }

    /// Focus returns to the barcode field once no dialog is left open.
    fn restore_focus_after_dialog(&mut self) {
        if self.selection.is_idle() && !self.customer_picker_open {
            self.schedule_focus(FocusTarget::BarcodeInput);
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Dropdown rows, empty while the dropdown is hidden.
    pub fn suggestion_rows(&self) -> Vec<SuggestionRow> {
        if !self.suggestions.is_visible() {
            return Vec::new();
        }

        self.suggestions
            .results()
            .iter()
            .enumerate()
            .filter_map(|(index, id)| {
                let product = self.catalog.product(id)?;
                Some(SuggestionRow {
                    id: product.id.clone(),
                    name: product.name.clone(),
                    category: product.category.clone(),
                    barcode: product.barcode.clone(),
                    unit: product.unit,
                    batch_count: product.batches.len(),
                    total_stock: stock::total_stock(&product.batches),
                    price_range: stock::price_range(&product.batches),
                    highlighted: index == self.suggestions.highlighted(),
                })
            })
            .collect()
    }

    /// Batch dialog rows, empty unless the batch dialog is open.
    pub fn batch_rows(&self) -> Vec<BatchRow> {
        let Selection::ChoosingBatch {
            product,
            highlighted,
        } = &self.selection
        else {
            return Vec::new();
        };

        product
            .batches
            .iter()
            .enumerate()
            .map(|(index, batch)| BatchRow {
                id: batch.id.clone(),
                batch_number: batch.batch_number.clone(),
                expiry_date: batch.expiry_date,
                quantity: batch.quantity,
                price: batch.price,
                highlighted: index == *highlighted,
            })
            .collect()
    }

    /// The quantity dialog, if open.
    pub fn quantity_prompt(&self) -> Option<QuantityPrompt> {
        let Selection::EnteringQuantity {
            product,
            batch,
            input,
        } = &self.selection
        else {
            return None;
        };

        Some(QuantityPrompt {
            product_name: product.name.clone(),
            unit: product.unit,
            batch_number: batch.batch_number.clone(),
            price: batch.price,
            available: batch.available(),
            input: input.clone(),
            can_commit: self.selection.can_commit(),
        })
    }

    pub fn cart_view(&self) -> CartView {
        let blocker = self.checkout_blocker();

        CartView {
            lines: self
                .cart
                .lines()
                .iter()
                .map(|line| CartLineView {
                    line: line.clone(),
                    line_total: line.line_total(),
                    quantity_label: line.quantity_label(),
                })
                .collect(),
            totals: self.cart.totals(self.config.tax_rate()),
            payment_method: self.payment_method,
            customer: self.selected_customer().cloned(),
            can_checkout: blocker.is_none(),
            checkout_blocker: blocker.map(|e| e.message),
        }
    }
}

fn event_name(event: &SelectionEvent) -> &'static str {
    match event {
        SelectionEvent::Choose(_) => "choose",
        SelectionEvent::Up => "up",
        SelectionEvent::Down => "down",
        SelectionEvent::Highlight(_) => "highlight",
        SelectionEvent::ConfirmBatch => "confirm_batch",
        SelectionEvent::PickBatch(_) => "pick_batch",
        SelectionEvent::EditQuantity(_) => "edit_quantity",
        SelectionEvent::Commit => "commit",
        SelectionEvent::Cancel => "cancel",
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ErrorCode;
    use crate::sink::MemorySaleSink;

    type TestSession = PosSession<ManualClock, MemorySaleSink>;

    fn session() -> (TestSession, ManualClock, MemorySaleSink) {
        let clock = ManualClock::default();
        let sink = MemorySaleSink::new();
        let session = PosSession::new(
            RegisterConfig::default(),
            Catalog::sample(),
            sample_customers(),
            clock.clone(),
            sink.clone(),
        );
        (session, clock, sink)
    }

    /// Types like a scanner: 8 ms between keys, then Enter.
    fn scan(session: &mut TestSession, clock: &ManualClock, code: &str) -> ScanOutcome {
        for c in code.chars() {
            session.global_key(&c.to_string());
            clock.advance(8);
        }
        session.global_key("Enter")
    }

    #[test]
    fn test_scanned_barcode_opens_batch_dialog() {
        let (mut session, clock, _) = session();

        let outcome = scan(&mut session, &clock, "2000000001");

        assert_eq!(outcome, ScanOutcome::Flushed("2000000001".to_string()));
        assert_eq!(session.barcode_input(), "2000000001");
        assert_eq!(session.selection().highlighted(), Some(0));
        assert_eq!(session.batch_rows().len(), 2);
        assert!(session.batch_rows()[0].highlighted);
    }

    #[test]
    fn test_scanned_single_batch_product_goes_to_quantity() {
        let (mut session, clock, _) = session();
        scan(&mut session, &clock, "4796026408192");

        let prompt = session.quantity_prompt().unwrap();
        assert_eq!(prompt.product_name, "Milk");
        assert_eq!(prompt.batch_number, "M101");
        assert_eq!(prompt.input, "1");
        assert!(prompt.can_commit);

        let line = session.dispatch(SelectionEvent::Commit).unwrap();
        assert_eq!(line.quantity, Quantity::ONE);
        assert!(session.selection().is_idle());
        assert_eq!(
            session.success_banner().unwrap().message,
            "Added: Milk (Batch M101) at $3.49"
        );
        assert_eq!(session.take_focus_request(), Some(FocusTarget::BarcodeInput));
    }

    #[test]
    fn test_unknown_barcode_shows_error_for_three_seconds() {
        let (mut session, clock, _) = session();
        scan(&mut session, &clock, "999");

        assert!(session.selection().is_idle());
        assert_eq!(
            session.error_banner().unwrap().message,
            "Product with barcode 999 not found"
        );

        clock.advance(2_999);
        assert!(!session.tick().error_cleared);
        clock.advance(1);
        assert!(session.tick().error_cleared);
        assert!(session.error_banner().is_none());
    }

    #[test]
    fn test_slow_final_digit_loses_scanned_prefix() {
        let (mut session, clock, _) = session();

        for c in "200000000".chars() {
            session.global_key(&c.to_string());
            clock.advance(8);
        }
        clock.advance(150);
        assert!(session.tick().scan_reset);

        session.global_key("1");
        clock.advance(8);
        session.global_key("Enter");

        assert!(session.selection().is_idle());
        assert_eq!(
            session.error_banner().unwrap().message,
            "Product with barcode 1 not found"
        );
    }

    #[test]
    fn test_non_character_keys_are_ignored() {
        let (mut session, _, _) = session();
        assert_eq!(session.global_key("Shift"), ScanOutcome::Ignored);
        assert_eq!(session.scan_buffer(), "");
    }

    #[test]
    fn test_search_enter_chooses_highlighted_product() {
        let (mut session, _, _) = session();

        session.set_search_query("milk");
        assert_eq!(session.suggestion_rows().len(), 1);
        assert_eq!(session.suggestion_rows()[0].batch_count, 1);

        session.search_key(SuggestionKey::Enter).unwrap();

        assert_eq!(session.suggestions().query(), "");
        assert!(session.suggestion_rows().is_empty());
        assert_eq!(session.quantity_prompt().unwrap().product_name, "Milk");
    }

    #[test]
    fn test_suggestion_rows_show_price_range() {
        let (mut session, _, _) = session();
        session.set_search_query("apples");

        let row = &session.suggestion_rows()[0];
        assert_eq!(row.total_stock, 125);
        assert_eq!(
            row.price_range,
            Some((Money::from_cents(299), Money::from_cents(329)))
        );
    }

    #[test]
    fn test_batch_then_quantity_flow() {
        let (mut session, _, _) = session();
        session.choose_product("1").unwrap();

        session.dispatch(SelectionEvent::Down);
        session.dispatch(SelectionEvent::Down);
        assert_eq!(session.selection().highlighted(), Some(1));

        session.dispatch(SelectionEvent::ConfirmBatch);
        assert_eq!(session.selection().batch().unwrap().id, "1-B");

        session.dispatch(SelectionEvent::EditQuantity("2.5".into()));
        let line = session.dispatch(SelectionEvent::Commit).unwrap();

        assert_eq!(line.key, LineKey::new("1", "1-B"));
        assert_eq!(line.quantity, Quantity::from_hundredths(250));
        assert_eq!(session.cart().line_count(), 1);
    }

    #[test]
    fn test_quantity_over_stock_is_rejected() {
        let (mut session, _, _) = session();
        session.choose_product("2").unwrap();

        session.dispatch(SelectionEvent::EditQuantity("31".into()));
        assert!(!session.quantity_prompt().unwrap().can_commit);
        assert!(session.dispatch(SelectionEvent::Commit).is_none());

        assert!(session.quantity_prompt().is_some());
        assert!(session.cart().is_empty());
        assert!(session.success_banner().is_none());
    }

    #[test]
    fn test_cancel_restores_focus_after_delay() {
        let (mut session, clock, _) = session();
        session.take_focus_request();
        session.choose_product("2").unwrap();

        clock.advance(100);
        assert_eq!(session.tick().focus, Some(FocusTarget::QuantityInput));
        session.take_focus_request();

        session.dispatch(SelectionEvent::Cancel);
        assert!(session.cart().is_empty());
        assert_eq!(session.take_focus_request(), None);

        clock.advance(99);
        assert_eq!(session.tick().focus, None);
        clock.advance(1);
        assert_eq!(session.tick().focus, Some(FocusTarget::BarcodeInput));
        assert_eq!(session.take_focus_request(), Some(FocusTarget::BarcodeInput));
    }

    #[test]
    fn test_unknown_product_is_not_found() {
        let (mut session, _, _) = session();
        let err = session.choose_product("nope").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_manual_barcode_field() {
        let (mut session, _, _) = session();

        session.set_barcode_input("   ");
        assert!(!session.submit_barcode_input());
        assert!(session.error_banner().is_none());

        session.set_barcode_input(" 2000000009 ");
        assert!(session.submit_barcode_input());
        assert_eq!(session.barcode_input(), "");
        assert_eq!(session.quantity_prompt().unwrap().product_name, "Chocolate Bar");

        session.dispatch(SelectionEvent::Cancel);
        session.set_barcode_input("123");
        assert!(!session.submit_barcode_input());
        assert_eq!(session.barcode_input(), "");
        assert!(session.error_banner().is_some());
    }

    #[test]
    fn test_cart_line_commands() {
        let (mut session, _, _) = session();
        session.add_to_cart("1", "1-A", "1").unwrap();
        session.add_to_cart("3", "3-A", "2").unwrap();

        let apples = LineKey::new("1", "1-A");
        let bread = LineKey::new("3", "3-A");

        assert!(session.increment_line(&apples));
        assert!(session.increment_line(&bread));
        assert_eq!(session.cart().line(&apples).unwrap().quantity, Quantity::from_hundredths(110));
        assert_eq!(session.cart().line(&bread).unwrap().quantity, Quantity::from_whole(3));

        assert!(session.set_line_quantity(&bread, "1"));
        assert!(!session.decrement_line(&bread));
        assert!(!session.set_line_quantity(&bread, "-2"));

        session.take_focus_request();
        assert!(session.remove_line(&apples));
        assert_eq!(session.take_focus_request(), Some(FocusTarget::BarcodeInput));
        assert!(!session.remove_line(&apples));
    }

    #[test]
    fn test_add_to_cart_rejects_bad_input() {
        let (mut session, _, _) = session();
        assert_eq!(session.add_to_cart("1", "1-A", "abc"), Ok(false));
        assert_eq!(session.add_to_cart("1", "1-A", "0"), Ok(false));

        let err = session.add_to_cart("1", "9-Z", "1").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(session.cart().is_empty());
    }

    #[test]
    fn test_clear_cart() {
        let (mut session, _, _) = session();
        assert!(!session.clear_cart());

        session.add_to_cart("2", "2-A", "1").unwrap();
        assert!(session.clear_cart());
        assert!(session.cart().is_empty());
    }

    #[test]
    fn test_credit_checkout_needs_customer() {
        let (mut session, _, sink) = session();
        session.add_to_cart("1", "1-A", "2").unwrap();
        session.set_payment_method(PaymentMethod::Credit);

        assert!(!session.can_checkout());
        let err = session.checkout().unwrap_err();
        assert_eq!(err.code, ErrorCode::CheckoutBlocked);
        assert_eq!(session.cart().line_count(), 1);
        assert!(sink.is_empty());

        let view = session.cart_view();
        assert!(!view.can_checkout);
        assert!(view.checkout_blocker.is_some());
    }

    #[test]
    fn test_checkout_records_sale_and_clears_cart() {
        let (mut session, clock, sink) = session();
        session.add_to_cart("1", "1-A", "2").unwrap();
        session.add_to_cart("2", "2-A", "1").unwrap();

        session.set_payment_method(PaymentMethod::Credit);
        session.open_customer_picker();
        session.select_customer(Some("2")).unwrap();
        assert!(!session.is_customer_picker_open());

        let sale = session.checkout().unwrap();

        assert_eq!(sale.total.cents(), 1042);
        assert_eq!(sale.customer.unwrap().name, "Jane Smith");
        assert_eq!(sale.timestamp, clock.now_utc());
        assert!(session.cart().is_empty());
        assert_eq!(sink.len(), 1);
        assert_eq!(session.last_sale().unwrap().lines.len(), 2);
        assert_eq!(
            session.success_banner().unwrap().message,
            "Sale completed: $10.42"
        );
    }

    #[test]
    fn test_empty_cart_checkout_is_blocked() {
        let (mut session, _, sink) = session();
        let err = session.checkout().unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_customer_selection() {
        let (mut session, _, _) = session();

        let err = session.select_customer(Some("42")).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        session.select_customer(Some("1")).unwrap();
        assert_eq!(session.selected_customer().unwrap().name, "John Doe");

        session.select_customer(None).unwrap();
        assert!(session.selected_customer().is_none());
    }

    #[test]
    fn test_new_banner_supersedes_old_deadline() {
        let (mut session, clock, _) = session();
        session.add_to_cart("2", "2-A", "1").unwrap();

        clock.advance(2_000);
        session.add_to_cart("9", "9-A", "1").unwrap();

        clock.advance(1_500);
        assert!(!session.tick().success_cleared);
        assert!(session
            .success_banner()
            .unwrap()
            .message
            .starts_with("Added: Chocolate Bar"));

        clock.advance(1_500);
        assert!(session.tick().success_cleared);
    }

    #[test]
    fn test_next_deadline_is_earliest() {
        let (mut session, clock, _) = session();
        assert_eq!(session.next_deadline(), None);

        let start = clock.now_ms();
        session.global_key("7");
        assert_eq!(session.next_deadline(), Some(start + 100));

        session.add_to_cart("2", "2-A", "1").unwrap();
        assert_eq!(session.next_deadline(), Some(start + 100));

        clock.advance(100);
        session.tick();
        assert_eq!(session.next_deadline(), Some(start + 3_000));
    }

    #[test]
    fn test_cart_view_totals() {
        let (mut session, _, _) = session();
        session.add_to_cart("1", "1-A", "2").unwrap();
        session.add_to_cart("2", "2-A", "1").unwrap();

        let view = session.cart_view();
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.lines[0].line_total.cents(), 598);
        assert_eq!(view.totals.subtotal.cents(), 947);
        assert_eq!(view.totals.total.cents(), 1042);
        assert!(view.can_checkout);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["lines"][0]["productId"], "1");
        assert_eq!(json["paymentMethod"], "cash");
    }

    #[test]
    fn test_replace_catalog_refreshes_suggestions() {
        let (mut session, _, _) = session();
        session.set_search_query("dairy");
        assert_eq!(session.suggestion_rows().len(), 3);

        session.replace_catalog(Catalog::new(Vec::new()));
        assert!(session.suggestion_rows().is_empty());
    }

    #[test]
    fn test_submit_search_on_fresh_session_chooses_first_product() {
        let (mut session, _, _) = session();

        session.submit_search().unwrap();

        assert_eq!(session.selection().product().unwrap().name, "Apples");
        assert_eq!(session.batch_rows().len(), 2);
    }

    #[test]
    fn test_failed_commands_show_error_for_five_seconds() {
        let (mut session, clock, _) = session();

        session.checkout().unwrap_err();
        assert_eq!(session.error_banner().unwrap().message, "Cart is empty");

        clock.advance(4_999);
        assert!(!session.tick().error_cleared);
        clock.advance(1);
        assert!(session.tick().error_cleared);

        session.choose_product("nope").unwrap_err();
        assert_eq!(
            session.error_banner().unwrap().message,
            "Product not found: nope"
        );
        assert_eq!(
            session.error_banner().unwrap().expires_at_ms,
            clock.now_ms() + 5_000
        );
    }

    fn scratch_config(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("till-session-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_reload_config_applies_new_settings() {
        let (mut session, _, _) = session();
        let path = scratch_config("[store]\nname = \"Reloaded\"\ntax_rate_bps = 500\n");

        session.reload_config(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(session.config().store.name, "Reloaded");
        session.add_to_cart("1", "1-A", "2").unwrap();
        assert_eq!(session.cart_view().totals.tax.cents(), 30);
    }

    #[test]
    fn test_reload_config_keeps_settings_on_invalid_file() {
        let (mut session, _, _) = session();
        let path = scratch_config("[store]\ntax_rate_bps = 20000\n");

        let err = session.reload_config(Some(path.clone())).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.code, ErrorCode::ConfigError);
        assert_eq!(session.config(), &RegisterConfig::default());
        assert!(session.error_banner().is_some());
    }
}
