//! # Catalog Search
//!
//! Substring filter over the catalog, and the keyboard-driven suggestion
//! list that sits under the POS search box.
//!
//! ## Matching Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  query "dai"                                                            │
//! │                                                                         │
//! │  name      "Milk"          lowercase contains "dai"?   no              │
//! │  category  "Dairy"         lowercase contains "dai"?   YES ──► match   │
//! │  barcode   "4796026408192" contains "dai" exactly?     no              │
//! │                                                                         │
//! │  Empty query matches everything. Order is catalog order, no ranking.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::types::Product;

/// Whether a product matches the search query.
///
/// Name and category match case-insensitively; the barcode must contain the
/// query verbatim.
pub fn matches(product: &Product, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    let needle = query.to_lowercase();
    product.name.to_lowercase().contains(&needle)
        || product.category.to_lowercase().contains(&needle)
        || product.barcode.contains(query)
}

/// Filters the catalog down to matching products, in catalog order.
///
/// ## Example
/// ```rust
/// use till_core::catalog::sample_products;
/// use till_core::search::filter_products;
///
/// let products = sample_products();
/// let dairy: Vec<_> = filter_products(&products, "DAIRY")
///     .iter()
///     .map(|p| p.name.as_str())
///     .collect();
/// assert_eq!(dairy, vec!["Milk", "Cheese", "Yogurt"]);
/// ```
pub fn filter_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    products.iter().filter(|p| matches(p, query)).collect()
}

/// Finds the product whose barcode is exactly `code`.
///
/// First match wins; barcode uniqueness is assumed, not enforced.
pub fn find_by_barcode<'a>(products: &'a [Product], code: &str) -> Option<&'a Product> {
    products.iter().find(|p| p.barcode == code)
}

// =============================================================================
// Suggestion List
// =============================================================================

/// Keys the suggestion list reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKey {
    Up,
    Down,
    Enter,
    Escape,
}

/// The dropdown of matching products under the search box.
///
/// Holds product ids rather than references so the catalog can change
/// underneath it; call [`SuggestionList::refresh`] when it does.
///
/// ## Invariants
/// - `highlighted` is always within `[0, len-1]` (0 when empty)
/// - `highlighted` resets to 0 whenever the result set changes
#[derive(Debug, Clone, Default)]
pub struct SuggestionList {
    query: String,
    results: Vec<String>,
    highlighted: usize,
    open: bool,
}

impl SuggestionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Product ids currently matching, in catalog order.
    pub fn results(&self) -> &[String] {
        &self.results
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    pub fn highlighted_id(&self) -> Option<&str> {
        self.results.get(self.highlighted).map(String::as_str)
    }

    /// Whether the dropdown should be drawn.
    pub fn is_visible(&self) -> bool {
        self.open && !self.results.is_empty()
    }

    /// Updates the query as the user types.
    ///
    /// The dropdown opens for any non-empty query and closes when the box
    /// is cleared.
    pub fn set_query(&mut self, query: &str, products: &[Product]) {
        self.query = query.to_string();
        self.open = !self.query.is_empty();
        self.refresh(products);
    }

    /// Re-runs the filter against the (possibly changed) catalog.
    pub fn refresh(&mut self, products: &[Product]) {
        let results: Vec<String> = filter_products(products, &self.query)
            .into_iter()
            .map(|p| p.id.clone())
            .collect();

        if results != self.results {
            self.results = results;
            self.highlighted = 0;
        }
    }

    /// The search box regained focus: reopen if there is something typed.
    pub fn focus(&mut self) {
        if !self.query.is_empty() {
            self.open = true;
        }
    }

    /// Closes the dropdown without touching the query.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Mouse hover over a row moves the highlight there.
    pub fn hover(&mut self, index: usize) {
        if index < self.results.len() {
            self.highlighted = index;
        }
    }

    /// Handles a key pressed in the search box.
    ///
    /// Returns the id of the chosen product on Enter. Keys are ignored while
    /// the dropdown is hidden.
    pub fn handle_key(&mut self, key: SuggestionKey) -> Option<String> {
        if !self.is_visible() {
            return None;
        }

        match key {
            SuggestionKey::Down => {
                if self.highlighted + 1 < self.results.len() {
                    self.highlighted += 1;
                }
                None
            }
            SuggestionKey::Up => {
                self.highlighted = self.highlighted.saturating_sub(1);
                None
            }
            SuggestionKey::Enter => self.take_highlighted(),
            SuggestionKey::Escape => {
                self.close();
                None
            }
        }
    }

    /// Clicking a row picks it directly.
    pub fn pick(&mut self, index: usize) -> Option<String> {
        let id = self.results.get(index)?.clone();
        self.reset();
        Some(id)
    }

    /// Search form submitted: picks the highlighted product if any match.
    ///
    /// Unlike Enter, this works with the dropdown closed. The results are
    /// brought up to date first, so an empty box submits the first product
    /// in the catalog.
    pub fn submit(&mut self, products: &[Product]) -> Option<String> {
        self.open = false;
        self.refresh(products);
        let id = self.highlighted_id()?.to_string();
        Some(id)
    }

    fn take_highlighted(&mut self) -> Option<String> {
        let id = self.highlighted_id()?.to_string();
        self.reset();
        Some(id)
    }

    /// Clears the query and closes the dropdown after a pick.
    fn reset(&mut self) {
        self.query.clear();
        self.open = false;
        self.results.clear();
        self.highlighted = 0;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::sample_products;

    fn names<'a>(products: &'a [Product], ids: &[String]) -> Vec<&'a str> {
        ids.iter()
            .filter_map(|id| products.iter().find(|p| &p.id == id))
            .map(|p| p.name.as_str())
            .collect()
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let products = sample_products();
        assert_eq!(filter_products(&products, "").len(), products.len());
    }

    #[test]
    fn test_name_match_is_case_insensitive() {
        let products = sample_products();
        let hits = filter_products(&products, "aPPle");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Apples");
    }

    #[test]
    fn test_barcode_match_is_substring() {
        let products = sample_products();
        let hits = filter_products(&products, "47960");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Milk");
    }

    #[test]
    fn test_find_by_barcode_is_exact() {
        let products = sample_products();
        assert_eq!(
            find_by_barcode(&products, "2000000001").map(|p| p.name.as_str()),
            Some("Apples")
        );
        assert!(find_by_barcode(&products, "200000000").is_none());
    }

    #[test]
    fn test_typing_opens_and_clearing_closes() {
        let products = sample_products();
        let mut list = SuggestionList::new();

        list.set_query("ch", &products);
        assert!(list.is_visible());
        assert_eq!(
            names(&products, list.results()),
            vec!["Chicken Breast", "Cheese", "Chocolate Bar"]
        );

        list.set_query("", &products);
        assert!(!list.is_visible());
    }

    #[test]
    fn test_highlight_is_clamped_without_wraparound() {
        let products = sample_products();
        let mut list = SuggestionList::new();
        list.set_query("ch", &products);

        list.handle_key(SuggestionKey::Up);
        assert_eq!(list.highlighted(), 0);

        for _ in 0..10 {
            list.handle_key(SuggestionKey::Down);
        }
        assert_eq!(list.highlighted(), 2);
    }

    #[test]
    fn test_highlight_resets_when_results_change() {
        let products = sample_products();
        let mut list = SuggestionList::new();
        list.set_query("ch", &products);
        list.handle_key(SuggestionKey::Down);
        assert_eq!(list.highlighted(), 1);

        // Same result set: highlight survives
        list.set_query("cH", &products);
        assert_eq!(list.highlighted(), 1);

        list.set_query("che", &products);
        assert_eq!(list.highlighted(), 0);
    }

    #[test]
    fn test_enter_picks_and_resets() {
        let products = sample_products();
        let mut list = SuggestionList::new();
        list.set_query("ch", &products);
        list.handle_key(SuggestionKey::Down);

        let picked = list.handle_key(SuggestionKey::Enter);
        assert_eq!(picked.as_deref(), Some("6")); // Cheese
        assert_eq!(list.query(), "");
        assert!(!list.is_visible());
    }

    #[test]
    fn test_keys_ignored_while_hidden() {
        let products = sample_products();
        let mut list = SuggestionList::new();
        list.set_query("ch", &products);
        list.handle_key(SuggestionKey::Escape);
        assert!(!list.is_visible());

        assert_eq!(list.handle_key(SuggestionKey::Enter), None);

        list.focus();
        assert!(list.is_visible());
    }

    #[test]
    fn test_hover_and_pick() {
        let products = sample_products();
        let mut list = SuggestionList::new();
        list.set_query("ch", &products);

        list.hover(2);
        assert_eq!(list.highlighted(), 2);
        list.hover(99);
        assert_eq!(list.highlighted(), 2);

        assert_eq!(list.pick(0).as_deref(), Some("4"));
        assert!(list.pick(0).is_none());
    }

    #[test]
    fn test_submit_works_when_closed() {
        let products = sample_products();
        let mut list = SuggestionList::new();
        list.set_query("milk", &products);
        list.close();

        assert_eq!(list.submit(&products).as_deref(), Some("2"));
    }

    #[test]
    fn test_submit_keeps_highlight_on_unchanged_results() {
        let products = sample_products();
        let mut list = SuggestionList::new();
        list.set_query("ch", &products);
        list.handle_key(SuggestionKey::Down);

        assert_eq!(list.submit(&products).as_deref(), Some("6"));
    }

    #[test]
    fn test_submit_with_empty_box_picks_first_product() {
        let products = sample_products();

        let mut fresh = SuggestionList::new();
        assert_eq!(fresh.submit(&products).as_deref(), Some("1"));

        let mut picked = SuggestionList::new();
        picked.set_query("milk", &products);
        picked.pick(0);
        assert_eq!(picked.submit(&products).as_deref(), Some("1"));

        assert_eq!(SuggestionList::new().submit(&[]), None);
    }
}
