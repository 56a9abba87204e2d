//! # Selection State Machine
//!
//! Takes a chosen product through batch choice and quantity entry, ending
//! in a cart insertion.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            Choose(product)                                              │
//! │   ┌──────┐ ── 1 batch ──────────────────────────┐                      │
//! │   │ Idle │                                      ▼                      │
//! │   └──────┘ ── n batches ──► ┌───────────────┐  ┌──────────────────┐    │
//! │      ▲                      │ ChoosingBatch │─►│ EnteringQuantity │    │
//! │      │                      │  highlighted  │  │  input text      │    │
//! │      │                      └───────────────┘  └────────┬─────────┘    │
//! │      │                             │ Cancel             │ Commit       │
//! │      ├─────────────────────────────┘                    │ (valid qty)  │
//! │      │                                                  ▼              │
//! │      └──────────────── PendingLine handed to the cart ──┘              │
//! │                                                                         │
//! │  Cancel from any state returns to Idle and never touches the cart.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transitions are pure: [`Selection::apply`] consumes the current state and
//! an event and returns the next state, plus the line to add when a commit
//! succeeds. A quantity dialog without a batch cannot be represented.

use crate::quantity::Quantity;
use crate::types::{Batch, Product};

/// Text the quantity field starts with, whatever the unit.
pub const DEFAULT_QUANTITY_TEXT: &str = "1";

/// Arrow-key step in the quantity dialog.
pub const QUANTITY_STEP: Quantity = Quantity::TENTH;

/// Where the selection flow currently is.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selection {
    /// No dialog open.
    #[default]
    Idle,

    /// Batch dialog open for a product with several batches.
    ChoosingBatch { product: Product, highlighted: usize },

    /// Quantity dialog open for a bound batch. `input` is the raw field text.
    EnteringQuantity {
        product: Product,
        batch: Batch,
        input: String,
    },
}

/// Things the cashier can do while the flow is running.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    /// A product was picked by search, suggestion click or barcode.
    Choose(Product),
    /// Arrow up in either dialog.
    Up,
    /// Arrow down in either dialog.
    Down,
    /// Single click on a batch row: highlight only.
    Highlight(usize),
    /// Enter or the "Select Batch" button: take the highlighted batch.
    ConfirmBatch,
    /// Double-click on a batch row.
    PickBatch(usize),
    /// The quantity field was edited.
    EditQuantity(String),
    /// Enter or the "Add to Cart" button in the quantity dialog.
    Commit,
    /// Escape, the Cancel button, or the dialog being dismissed.
    Cancel,
}

/// A validated (product, batch, quantity) triple ready for the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLine {
    pub product: Product,
    pub batch: Batch,
    pub quantity: Quantity,
}

/// Result of one transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub next: Selection,
    pub commit: Option<PendingLine>,
}

impl Step {
    fn stay(next: Selection) -> Self {
        Step { next, commit: None }
    }
}

impl Selection {
    /// Enters the flow for a product.
    ///
    /// A product with exactly one batch skips straight to quantity entry.
    pub fn start(product: Product) -> Selection {
        match product.sole_batch().cloned() {
            Some(batch) => Selection::EnteringQuantity {
                product,
                batch,
                input: DEFAULT_QUANTITY_TEXT.to_string(),
            },
            None => Selection::ChoosingBatch {
                product,
                highlighted: 0,
            },
        }
    }

    /// Applies one event.
    ///
    /// Events that make no sense in the current state (arrow keys while
    /// idle, an out-of-range row, a rejected quantity) leave the state as
    /// it was.
    pub fn apply(self, event: SelectionEvent) -> Step {
        match (self, event) {
            (_, SelectionEvent::Choose(product)) => Step::stay(Selection::start(product)),
            (_, SelectionEvent::Cancel) => Step::stay(Selection::Idle),

            (Selection::ChoosingBatch { product, highlighted }, event) => {
                Self::on_batch_event(product, highlighted, event)
            }

            (
                Selection::EnteringQuantity {
                    product,
                    batch,
                    input,
                },
                event,
            ) => Self::on_quantity_event(product, batch, input, event),

            (Selection::Idle, _) => Step::stay(Selection::Idle),
        }
    }

    fn on_batch_event(product: Product, highlighted: usize, event: SelectionEvent) -> Step {
        let last = product.batches.len().saturating_sub(1);

        let pick = |product: Product, index: usize| match product.batches.get(index).cloned() {
            Some(batch) => Selection::EnteringQuantity {
                product,
                batch,
                input: DEFAULT_QUANTITY_TEXT.to_string(),
            },
            None => Selection::ChoosingBatch {
                product,
                highlighted,
            },
        };

        let next = match event {
            SelectionEvent::Up => Selection::ChoosingBatch {
                product,
                highlighted: highlighted.saturating_sub(1),
            },
            SelectionEvent::Down => Selection::ChoosingBatch {
                product,
                highlighted: (highlighted + 1).min(last),
            },
            SelectionEvent::Highlight(index) if index < product.batches.len() => {
                Selection::ChoosingBatch {
                    product,
                    highlighted: index,
                }
            }
            SelectionEvent::ConfirmBatch => pick(product, highlighted),
            SelectionEvent::PickBatch(index) => pick(product, index),
            _ => Selection::ChoosingBatch {
                product,
                highlighted,
            },
        };

        Step::stay(next)
    }

    fn on_quantity_event(
        product: Product,
        batch: Batch,
        input: String,
        event: SelectionEvent,
    ) -> Step {
        let available = batch.available();

        match event {
            SelectionEvent::EditQuantity(text) => Step::stay(Selection::EnteringQuantity {
                product,
                batch,
                input: text,
            }),
            SelectionEvent::Up => {
                let input = match Quantity::parse(&input) {
                    Some(current) => (current + QUANTITY_STEP)
                        .clamp_to(QUANTITY_STEP, available)
                        .round_to_tenth()
                        .to_input_text(),
                    None => QUANTITY_STEP.to_input_text(),
                };
                Step::stay(Selection::EnteringQuantity {
                    product,
                    batch,
                    input,
                })
            }
            SelectionEvent::Down => {
                let input = match Quantity::parse(&input) {
                    Some(current) => (current - QUANTITY_STEP)
                        .clamp_to(QUANTITY_STEP, available)
                        .round_to_tenth()
                        .to_input_text(),
                    None => input,
                };
                Step::stay(Selection::EnteringQuantity {
                    product,
                    batch,
                    input,
                })
            }
            SelectionEvent::Commit => match validate_quantity(&input, &batch) {
                Some(quantity) => Step {
                    next: Selection::Idle,
                    commit: Some(PendingLine {
                        product,
                        batch,
                        quantity,
                    }),
                },
                None => Step::stay(Selection::EnteringQuantity {
                    product,
                    batch,
                    input,
                }),
            },
            _ => Step::stay(Selection::EnteringQuantity {
                product,
                batch,
                input,
            }),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn is_idle(&self) -> bool {
        matches!(self, Selection::Idle)
    }

    /// The product being sold, if a dialog is open.
    pub fn product(&self) -> Option<&Product> {
        match self {
            Selection::Idle => None,
            Selection::ChoosingBatch { product, .. }
            | Selection::EnteringQuantity { product, .. } => Some(product),
        }
    }

    /// The bound batch, once the quantity dialog is open.
    pub fn batch(&self) -> Option<&Batch> {
        match self {
            Selection::EnteringQuantity { batch, .. } => Some(batch),
            _ => None,
        }
    }

    /// The highlighted row index in the batch dialog.
    pub fn highlighted(&self) -> Option<usize> {
        match self {
            Selection::ChoosingBatch { highlighted, .. } => Some(*highlighted),
            _ => None,
        }
    }

    /// Raw text of the quantity field.
    pub fn quantity_input(&self) -> Option<&str> {
        match self {
            Selection::EnteringQuantity { input, .. } => Some(input),
            _ => None,
        }
    }

    /// Whether Commit would succeed right now (drives the button state).
    pub fn can_commit(&self) -> bool {
        match self {
            Selection::EnteringQuantity { batch, input, .. } => {
                validate_quantity(input, batch).is_some()
            }
            _ => false,
        }
    }
}

/// Positive and no more than the batch has on hand.
fn validate_quantity(input: &str, batch: &Batch) -> Option<Quantity> {
    Quantity::parse_positive(input).filter(|q| *q <= batch.available())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::sample_products;

    fn product_named(name: &str) -> Product {
        sample_products()
            .into_iter()
            .find(|p| p.name == name)
            .unwrap()
    }

    fn run(events: Vec<SelectionEvent>) -> Step {
        let mut step = Step::stay(Selection::Idle);
        for event in events {
            step = step.next.apply(event);
        }
        step
    }

    #[test]
    fn test_single_batch_skips_batch_dialog() {
        let milk = product_named("Milk");
        let state = Selection::start(milk.clone());

        assert_eq!(state.batch(), Some(&milk.batches[0]));
        assert_eq!(state.quantity_input(), Some("1"));
        assert_eq!(state.highlighted(), None);
    }

    #[test]
    fn test_every_single_batch_product_skips_batch_dialog() {
        for product in sample_products().into_iter().filter(|p| p.batches.len() == 1) {
            let state = Selection::start(product);
            assert!(matches!(state, Selection::EnteringQuantity { .. }));
        }
    }

    #[test]
    fn test_multi_batch_starts_at_zero_and_clamps() {
        let apples = product_named("Apples");
        let n = apples.batches.len();

        let mut state = Selection::start(apples);
        assert_eq!(state.highlighted(), Some(0));

        for _ in 0..n - 1 {
            state = state.apply(SelectionEvent::Down).next;
        }
        assert_eq!(state.highlighted(), Some(n - 1));

        state = state.apply(SelectionEvent::Down).next;
        assert_eq!(state.highlighted(), Some(n - 1));

        for _ in 0..5 {
            state = state.apply(SelectionEvent::Up).next;
        }
        assert_eq!(state.highlighted(), Some(0));
    }

    #[test]
    fn test_confirm_binds_highlighted_batch() {
        let apples = product_named("Apples");
        let step = run(vec![
            SelectionEvent::Choose(apples.clone()),
            SelectionEvent::Down,
            SelectionEvent::ConfirmBatch,
        ]);

        assert_eq!(step.next.batch(), Some(&apples.batches[1]));
        assert_eq!(step.next.quantity_input(), Some("1"));
        assert!(step.commit.is_none());
    }

    #[test]
    fn test_click_highlights_and_double_click_picks() {
        let bread = product_named("Bread");

        let state = Selection::start(bread.clone())
            .apply(SelectionEvent::Highlight(1))
            .next;
        assert_eq!(state.highlighted(), Some(1));

        let state = state.apply(SelectionEvent::Highlight(7)).next;
        assert_eq!(state.highlighted(), Some(1));

        let state = state.apply(SelectionEvent::PickBatch(0)).next;
        assert_eq!(state.batch(), Some(&bread.batches[0]));
    }

    #[test]
    fn test_product_without_batches_cannot_progress() {
        let mut empty = product_named("Apples");
        empty.batches.clear();

        let step = run(vec![
            SelectionEvent::Choose(empty),
            SelectionEvent::Down,
            SelectionEvent::ConfirmBatch,
        ]);
        assert_eq!(step.next.highlighted(), Some(0));
        assert!(step.commit.is_none());
    }

    #[test]
    fn test_commit_produces_pending_line_and_returns_to_idle() {
        let milk = product_named("Milk");
        let step = run(vec![
            SelectionEvent::Choose(milk.clone()),
            SelectionEvent::EditQuantity("2.5".into()),
            SelectionEvent::Commit,
        ]);

        assert!(step.next.is_idle());
        let line = step.commit.unwrap();
        assert_eq!(line.product.id, milk.id);
        assert_eq!(line.batch.id, "2-A");
        assert_eq!(line.quantity, Quantity::from_hundredths(250));
    }

    #[test]
    fn test_commit_rejects_invalid_quantities() {
        let milk = product_named("Milk"); // 30 on hand
        for text in ["0", "-1", "abc", "", "30.01"] {
            let step = run(vec![
                SelectionEvent::Choose(milk.clone()),
                SelectionEvent::EditQuantity(text.into()),
                SelectionEvent::Commit,
            ]);
            assert!(step.commit.is_none(), "{text} should be rejected");
            assert_eq!(step.next.quantity_input(), Some(text));
            assert!(!step.next.can_commit());
        }

        let step = run(vec![
            SelectionEvent::Choose(milk),
            SelectionEvent::EditQuantity("30".into()),
        ]);
        assert!(step.next.can_commit());
    }

    #[test]
    fn test_arrow_keys_step_by_tenth_within_bounds() {
        let milk = product_named("Milk");
        let mut state = Selection::start(milk);

        state = state.apply(SelectionEvent::Up).next;
        state = state.apply(SelectionEvent::Up).next;
        assert_eq!(state.quantity_input(), Some("1.2"));

        for _ in 0..20 {
            state = state.apply(SelectionEvent::Down).next;
        }
        assert_eq!(state.quantity_input(), Some("0.1"));

        state = state.apply(SelectionEvent::EditQuantity("29.95".into())).next;
        state = state.apply(SelectionEvent::Up).next;
        assert_eq!(state.quantity_input(), Some("30.0"));
        state = state.apply(SelectionEvent::Up).next;
        assert_eq!(state.quantity_input(), Some("30.0"));
    }

    #[test]
    fn test_arrow_keys_land_on_tenths() {
        let milk = product_named("Milk");
        let state = Selection::start(milk)
            .apply(SelectionEvent::EditQuantity("1.25".into()))
            .next;
        let up = state.apply(SelectionEvent::Up).next;
        assert_eq!(up.quantity_input(), Some("1.4"));

        let state = up.apply(SelectionEvent::EditQuantity("1.27".into())).next;
        let down = state.apply(SelectionEvent::Down).next;
        assert_eq!(down.quantity_input(), Some("1.2"));
    }

    #[test]
    fn test_huge_batch_stock_does_not_overflow() {
        let mut milk = product_named("Milk");
        milk.batches[0].quantity = i64::MAX;
        let state = Selection::start(milk);

        assert!(state.can_commit());
        let up = state.apply(SelectionEvent::Up).next;
        assert_eq!(up.quantity_input(), Some("1.1"));
    }

    #[test]
    fn test_arrow_up_on_garbage_resets_to_step() {
        let milk = product_named("Milk");
        let state = Selection::start(milk)
            .apply(SelectionEvent::EditQuantity("abc".into()))
            .next;

        let down = state.clone().apply(SelectionEvent::Down).next;
        assert_eq!(down.quantity_input(), Some("abc"));

        let up = state.apply(SelectionEvent::Up).next;
        assert_eq!(up.quantity_input(), Some("0.1"));
    }

    #[test]
    fn test_cancel_from_any_state_returns_to_idle() {
        let apples = product_named("Apples");

        let from_batch = run(vec![
            SelectionEvent::Choose(apples.clone()),
            SelectionEvent::Cancel,
        ]);
        assert!(from_batch.next.is_idle());
        assert!(from_batch.commit.is_none());

        let from_quantity = run(vec![
            SelectionEvent::Choose(apples),
            SelectionEvent::ConfirmBatch,
            SelectionEvent::EditQuantity("3".into()),
            SelectionEvent::Cancel,
        ]);
        assert!(from_quantity.next.is_idle());
        assert!(from_quantity.commit.is_none());
    }

    #[test]
    fn test_choose_while_open_restarts_flow() {
        let apples = product_named("Apples");
        let milk = product_named("Milk");

        let step = run(vec![
            SelectionEvent::Choose(apples),
            SelectionEvent::Down,
            SelectionEvent::Choose(milk.clone()),
        ]);
        assert_eq!(step.next.product().map(|p| p.id.as_str()), Some("2"));
        assert_eq!(step.next.batch(), Some(&milk.batches[0]));
    }

    #[test]
    fn test_idle_ignores_dialog_events() {
        let step = run(vec![
            SelectionEvent::Down,
            SelectionEvent::ConfirmBatch,
            SelectionEvent::Commit,
        ]);
        assert!(step.next.is_idle());
        assert!(step.commit.is_none());
    }
}
