//! Client-held cart and the consistency monitor.
//!
//! The cart is ephemeral, client-side state. Its `max_stock` ceilings are
//! advisory; the ledger enforces nothing until reservation time. The
//! consistency monitor compares cart quantities against freshly synced
//! levels, classifies discrepancies as stock issues, and offers the three
//! resolutions: update (clamp), remove, keep.

use crate::types::{CartItem, ProductId, StockIssue, StockIssueKind, StockLevel};

/// How to resolve a single stock issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Clamp the line's quantity down to the available stock.
    Update,
    /// Delete the line entirely.
    Remove,
    /// Accept the discrepancy; the next reservation attempt will fail for
    /// the excess quantity.
    Keep,
}

/// What an auto-resolve pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AutoResolveReport {
    /// Lines clamped down to available stock.
    pub updated: Vec<ProductId>,
    /// Lines removed because stock hit zero.
    pub removed: Vec<ProductId>,
}

impl AutoResolveReport {
    /// Whether the pass took no action at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.removed.is_empty()
    }
}

/// A client-held cart.
#[derive(Clone, Debug, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Creates an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cart from existing lines.
    #[must_use]
    pub fn with_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Current lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Identifiers of every product in the cart, for the batch sync read.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.items.iter().map(|i| i.product_id.clone()).collect()
    }

    /// Add a line. Adding a product already present merges quantities.
    pub fn add(&mut self, item: CartItem) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }
    }

    /// Set a line's quantity. Quantity zero removes the line.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| &i.product_id == product_id) {
            item.quantity = quantity;
        }
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.product_id != product_id);
        self.items.len() != before
    }

    /// Fold freshly synced levels into the cart's advisory fields
    /// (`max_stock`, display name, price). Quantities are left alone.
    pub fn apply_levels(&mut self, levels: &[StockLevel]) {
        for item in &mut self.items {
            if let Some(level) = levels.iter().find(|l| l.id == item.product_id) {
                item.max_stock = level.stock;
                item.name.clone_from(&level.name);
                item.price = level.price;
            }
        }
    }

    /// Classify every cart/ledger discrepancy against fresh levels.
    ///
    /// Lines whose product is absent from `levels` produce no issue: the
    /// batch read omits missing products by design, and a transiently
    /// missing record must not look like an out-of-stock.
    #[must_use]
    pub fn stock_issues(&self, levels: &[StockLevel]) -> Vec<StockIssue> {
        self.items
            .iter()
            .filter_map(|item| {
                let level = levels.iter().find(|l| l.id == item.product_id)?;
                let kind = if level.stock == 0 {
                    StockIssueKind::OutOfStock
                } else if level.stock < item.quantity {
                    StockIssueKind::InsufficientStock
                } else {
                    return None;
                };
                Some(StockIssue {
                    product_id: item.product_id.clone(),
                    name: level.name.clone(),
                    kind,
                    available_stock: level.stock,
                    requested_quantity: item.quantity,
                })
            })
            .collect()
    }

    /// Apply one resolution to one issue. Operates purely on local state;
    /// no reservation or release is performed.
    pub fn resolve(&mut self, issue: &StockIssue, resolution: Resolution) {
        match resolution {
            Resolution::Update => {
                self.set_quantity(&issue.product_id, issue.available_stock);
            }
            Resolution::Remove => {
                self.remove(&issue.product_id);
            }
            Resolution::Keep => {}
        }
    }

    /// Resolve every issue in one batch: out-of-stock lines are removed,
    /// insufficient lines are clamped.
    ///
    /// Idempotent: with no outstanding issues the report is empty and the
    /// cart untouched.
    pub fn auto_resolve_stock_issues(&mut self, issues: &[StockIssue]) -> AutoResolveReport {
        let mut report = AutoResolveReport::default();
        for issue in issues {
            match issue.kind {
                StockIssueKind::OutOfStock => {
                    if self.remove(&issue.product_id) {
                        report.removed.push(issue.product_id.clone());
                    }
                }
                StockIssueKind::InsufficientStock => {
                    let needs_clamp = self
                        .items
                        .iter()
                        .any(|i| i.product_id == issue.product_id
                            && i.quantity > issue.available_stock);
                    if needs_clamp {
                        self.set_quantity(&issue.product_id, issue.available_stock);
                        report.updated.push(issue.product_id.clone());
                    }
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Money;

    fn line(id: &str, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::from(id),
            quantity,
            max_stock: quantity,
            name: id.to_string(),
            price: Money::from_cents(1000),
            image: None,
        }
    }

    fn level(id: &str, stock: u32) -> StockLevel {
        StockLevel {
            id: ProductId::from(id),
            name: id.to_string(),
            stock,
            price: Money::from_cents(1000),
            discount: 0,
            available: stock > 0,
        }
    }

    #[test]
    fn insufficient_stock_is_detected() {
        // P1 has stock 3, cart holds 5.
        let cart = Cart::with_items([line("P1", 5)]);
        let issues = cart.stock_issues(&[level("P1", 3)]);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, StockIssueKind::InsufficientStock);
        assert_eq!(issues[0].available_stock, 3);
        assert_eq!(issues[0].requested_quantity, 5);
    }

    #[test]
    fn out_of_stock_is_detected() {
        let cart = Cart::with_items([line("P2", 1)]);
        let issues = cart.stock_issues(&[level("P2", 0)]);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, StockIssueKind::OutOfStock);
    }

    #[test]
    fn satisfied_lines_produce_no_issue() {
        let cart = Cart::with_items([line("P1", 3)]);
        assert!(cart.stock_issues(&[level("P1", 3)]).is_empty());
    }

    #[test]
    fn missing_levels_produce_no_issue() {
        let cart = Cart::with_items([line("P1", 3)]);
        assert!(cart.stock_issues(&[]).is_empty());
    }

    #[test]
    fn auto_resolve_clamps_insufficient_lines() {
        let mut cart = Cart::with_items([line("P1", 5)]);
        let issues = cart.stock_issues(&[level("P1", 3)]);

        let report = cart.auto_resolve_stock_issues(&issues);
        assert_eq!(report.updated, vec![ProductId::from("P1")]);
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn auto_resolve_removes_out_of_stock_lines() {
        let mut cart = Cart::with_items([line("P2", 1)]);
        let issues = cart.stock_issues(&[level("P2", 0)]);

        let report = cart.auto_resolve_stock_issues(&issues);
        assert_eq!(report.removed, vec![ProductId::from("P2")]);
        assert!(cart.is_empty());
    }

    #[test]
    fn auto_resolve_is_idempotent() {
        let mut cart = Cart::with_items([line("P1", 5)]);
        let levels = [level("P1", 3)];
        let issues = cart.stock_issues(&levels);

        let first = cart.auto_resolve_stock_issues(&issues);
        assert!(!first.is_empty());

        // After resolution there are no outstanding issues; re-running with
        // the fresh issue list takes no action.
        let issues = cart.stock_issues(&levels);
        assert!(issues.is_empty());
        let second = cart.auto_resolve_stock_issues(&issues);
        assert!(second.is_empty());
        assert_eq!(cart.items()[0].quantity, 3);

        // Even re-running with the stale issue list changes nothing.
        let stale = [StockIssue {
            product_id: ProductId::from("P1"),
            name: "P1".to_string(),
            kind: StockIssueKind::InsufficientStock,
            available_stock: 3,
            requested_quantity: 5,
        }];
        let third = cart.auto_resolve_stock_issues(&stale);
        assert!(third.is_empty());
    }

    #[test]
    fn keep_resolution_changes_nothing() {
        let mut cart = Cart::with_items([line("P1", 5)]);
        let issues = cart.stock_issues(&[level("P1", 3)]);

        cart.resolve(&issues[0], Resolution::Keep);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn apply_levels_updates_advisory_ceiling_only() {
        let mut cart = Cart::with_items([line("P1", 5)]);
        cart.apply_levels(&[level("P1", 2)]);

        assert_eq!(cart.items()[0].max_stock, 2);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn add_merges_duplicate_products() {
        let mut cart = Cart::new();
        cart.add(line("P1", 2));
        cart.add(line("P1", 3));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
    }
}
