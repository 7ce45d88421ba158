//! Shopping cart line items.
//!
//! A cart holds at most one line per `(product_id, color)` pair. Adding an
//! existing pair merges into the line instead of appending a duplicate. The
//! cart does not consult stock; callers go through the [`StockLedger`] first.
//!
//! [`StockLedger`]: super::ledger::StockLedger

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vitrine_core::{Product, ProductId};

use super::error::CommerceError;

/// Product fields copied into a cart line when it is first created.
///
/// These are not refreshed when the product later changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub name: String,
    pub price: Decimal,
    pub image: String,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price,
            image: product.default_image().unwrap_or_default().to_owned(),
        }
    }
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub color: String,
    pub quantity: u32,
    pub name: String,
    pub price: Decimal,
    pub image: String,
}

impl CartLine {
    /// `price * quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    fn is(&self, product_id: &ProductId, color: &str) -> bool {
        self.product_id == *product_id && self.color == color
    }
}

/// Ordered collection of cart lines, unique per product/colour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add units of a product colour.
    ///
    /// Merges into an existing line (keeping its original snapshot) or
    /// appends a new line built from `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` if `quantity` is zero or the merged quantity
    /// would overflow.
    pub fn add(
        &mut self,
        product_id: &ProductId,
        color: &str,
        quantity: u32,
        snapshot: ProductSnapshot,
    ) -> Result<&CartLine, CommerceError> {
        if quantity == 0 {
            return Err(CommerceError::InvalidQuantity { quantity: 0 });
        }

        let index = match self.position(product_id, color) {
            Some(index) => {
                let line = self
                    .lines
                    .get_mut(index)
                    .ok_or_else(|| line_not_found(product_id, color))?;
                line.quantity = line.quantity.checked_add(quantity).ok_or(
                    CommerceError::InvalidQuantity {
                        quantity: i64::from(line.quantity) + i64::from(quantity),
                    },
                )?;
                index
            }
            None => {
                self.lines.push(CartLine {
                    product_id: product_id.clone(),
                    color: color.to_owned(),
                    quantity,
                    name: snapshot.name,
                    price: snapshot.price,
                    image: snapshot.image,
                });
                self.lines.len() - 1
            }
        };

        self.lines
            .get(index)
            .ok_or_else(|| line_not_found(product_id, color))
    }

    /// Replace the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if no line matches, or `InvalidQuantity` if
    /// `new_quantity` is zero (use [`Cart::remove`] instead).
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        color: &str,
        new_quantity: u32,
    ) -> Result<&CartLine, CommerceError> {
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.is(product_id, color))
            .ok_or_else(|| line_not_found(product_id, color))?;

        if new_quantity == 0 {
            return Err(CommerceError::InvalidQuantity { quantity: 0 });
        }

        line.quantity = new_quantity;
        Ok(line)
    }

    /// Remove a line. Removing a missing line is a no-op.
    pub fn remove(&mut self, product_id: &ProductId, color: &str) -> Option<CartLine> {
        self.position(product_id, color)
            .map(|index| self.lines.remove(index))
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities over all lines (not the number of lines).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Find the line for a product colour.
    #[must_use]
    pub fn line(&self, product_id: &ProductId, color: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.is(product_id, color))
    }

    /// Units of a product colour already held by this cart.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId, color: &str) -> u32 {
        self.line(product_id, color).map_or(0, |line| line.quantity)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn position(&self, product_id: &ProductId, color: &str) -> Option<usize> {
        self.lines.iter().position(|line| line.is(product_id, color))
    }
}

fn line_not_found(product_id: &ProductId, color: &str) -> CommerceError {
    CommerceError::LineNotFound {
        product_id: product_id.clone(),
        color: color.to_owned(),
    }
}

impl From<Vec<CartLine>> for Cart {
    /// Rebuild a cart from stored lines, merging duplicate keys and dropping
    /// empty lines so a persisted cart always satisfies the uniqueness rule.
    fn from(stored: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in stored {
            if line.quantity == 0 {
                continue;
            }
            let product_id = line.product_id.clone();
            let color = line.color.clone();
            let quantity = line.quantity;
            let snapshot = ProductSnapshot {
                name: line.name,
                price: line.price,
                image: line.image,
            };
            if cart.add(&product_id, &color, quantity, snapshot).is_err() {
                tracing::warn!(%product_id, %color, "dropping stored cart line that overflows");
            }
        }
        cart
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn snapshot(name: &str, price: i64) -> ProductSnapshot {
        ProductSnapshot {
            name: name.to_owned(),
            price: Decimal::new(price, 0),
            image: format!("https://cdn.example/{name}.jpg"),
        }
    }

    fn pid(id: &str) -> ProductId {
        ProductId::new(id)
    }

    #[test]
    fn test_add_rejects_zero_quantity() {
        let mut cart = Cart::new();
        let err = cart.add(&pid("p1"), "Azul", 0, snapshot("Top", 20));
        assert_eq!(err, Err(CommerceError::InvalidQuantity { quantity: 0 }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_merges_existing_line_and_keeps_snapshot() {
        let mut cart = Cart::new();
        cart.add(&pid("p1"), "Azul", 3, snapshot("Top", 20)).unwrap();
        cart.add(&pid("p1"), "Azul", 2, snapshot("Top Renamed", 99))
            .unwrap();

        assert_eq!(cart.lines().len(), 1);
        let line = cart.line(&pid("p1"), "Azul").unwrap();
        assert_eq!(line.quantity, 5);
        assert_eq!(line.name, "Top");
        assert_eq!(line.price, Decimal::new(20, 0));
    }

    #[test]
    fn test_same_product_different_color_is_separate_line() {
        let mut cart = Cart::new();
        cart.add(&pid("p1"), "Azul", 1, snapshot("Top", 20)).unwrap();
        cart.add(&pid("p1"), "Preto", 1, snapshot("Top", 20)).unwrap();
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_update_quantity_missing_line() {
        let mut cart = Cart::new();
        let err = cart.update_quantity(&pid("p1"), "Azul", 4);
        assert!(matches!(err, Err(CommerceError::LineNotFound { .. })));
    }

    #[test]
    fn test_update_quantity_zero_leaves_cart_unchanged() {
        let mut cart = Cart::new();
        cart.add(&pid("p1"), "Azul", 3, snapshot("Top", 20)).unwrap();
        let before = cart.clone();

        let err = cart.update_quantity(&pid("p1"), "Azul", 0);
        assert_eq!(err, Err(CommerceError::InvalidQuantity { quantity: 0 }));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_update_quantity_replaces() {
        let mut cart = Cart::new();
        cart.add(&pid("p1"), "Azul", 3, snapshot("Top", 20)).unwrap();
        cart.update_quantity(&pid("p1"), "Azul", 7).unwrap();
        assert_eq!(cart.quantity_of(&pid("p1"), "Azul"), 7);
    }

    #[test]
    fn test_remove_missing_line_is_noop() {
        let mut cart = Cart::new();
        cart.add(&pid("p1"), "Azul", 3, snapshot("Top", 20)).unwrap();
        let before = cart.clone();

        assert!(cart.remove(&pid("p2"), "Azul").is_none());
        assert_eq!(cart, before);
    }

    #[test]
    fn test_two_line_scenario_totals() {
        let mut cart = Cart::new();
        cart.add(&pid("p1"), "Azul", 3, snapshot("Conjunto", 20))
            .unwrap();
        cart.add(&pid("p2"), "Preto", 7, snapshot("Short", 10))
            .unwrap();

        assert_eq!(cart.total(), Decimal::new(130, 0));
        assert_eq!(cart.item_count(), 10);
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn test_clear_empties_cart() {
        let mut cart = Cart::new();
        cart.add(&pid("p1"), "Azul", 3, snapshot("Top", 20)).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_stored_duplicates_are_merged_on_load() {
        let json = r#"[
            {"product_id":"p1","color":"Azul","quantity":2,"name":"Top","price":"20","image":"a.jpg"},
            {"product_id":"p1","color":"Azul","quantity":3,"name":"Top","price":"20","image":"a.jpg"},
            {"product_id":"p2","color":"Rosa","quantity":0,"name":"Short","price":"10","image":"b.jpg"}
        ]"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of(&pid("p1"), "Azul"), 5);
    }

    #[test]
    fn test_cart_serializes_as_line_list() {
        let mut cart = Cart::new();
        cart.add(&pid("p1"), "Azul", 1, snapshot("Top", 20)).unwrap();
        let value = serde_json::to_value(&cart).unwrap();
        assert!(value.is_array());
        let restored: Cart = serde_json::from_value(value).unwrap();
        assert_eq!(restored, cart);
    }

    fn add_op() -> impl Strategy<Value = (u8, u8, u32)> {
        (0u8..4, 0u8..3, 1u32..20)
    }

    const COLORS: [&str; 3] = ["Azul", "Preto", "Rosa"];

    fn color(index: u8) -> &'static str {
        COLORS.get(usize::from(index)).copied().unwrap_or("Azul")
    }

    proptest! {
        #[test]
        fn prop_add_never_duplicates_keys(ops in prop::collection::vec(add_op(), 0..40)) {
            let mut cart = Cart::new();
            for (product, color_index, quantity) in &ops {
                let product_id = pid(&format!("p{product}"));
                cart.add(&product_id, color(*color_index), *quantity, snapshot("X", 5)).unwrap();
            }

            let mut keys: Vec<(String, String)> = cart
                .lines()
                .iter()
                .map(|line| (line.product_id.to_string(), line.color.clone()))
                .collect();
            let total_lines = keys.len();
            keys.sort();
            keys.dedup();
            prop_assert_eq!(keys.len(), total_lines);

            let expected: u64 = ops.iter().map(|(_, _, q)| u64::from(*q)).sum();
            prop_assert_eq!(cart.item_count(), expected);
        }

        #[test]
        fn prop_add_merge_law(q1 in 1u32..10_000, q2 in 1u32..10_000) {
            let mut cart = Cart::new();
            cart.add(&pid("p1"), "Azul", q1, snapshot("Top", 20)).unwrap();
            cart.add(&pid("p1"), "Azul", q2, snapshot("Top", 20)).unwrap();
            prop_assert_eq!(cart.lines().len(), 1);
            prop_assert_eq!(cart.quantity_of(&pid("p1"), "Azul"), q1 + q2);
        }

        #[test]
        fn prop_total_is_order_independent(
            lines in prop::collection::vec((0u8..6, 1u32..50), 1..8)
        ) {
            let unit_price = |product: u8| i64::from(product) * 10 + 5;
            let mut forward = Cart::new();
            let mut backward = Cart::new();
            for (product, quantity) in &lines {
                forward.add(&pid(&format!("p{product}")), "Azul", *quantity, snapshot("X", unit_price(*product))).unwrap();
            }
            for (product, quantity) in lines.iter().rev() {
                backward.add(&pid(&format!("p{product}")), "Azul", *quantity, snapshot("X", unit_price(*product))).unwrap();
            }

            let expected: Decimal = lines
                .iter()
                .map(|(product, quantity)| Decimal::new(unit_price(*product), 0) * Decimal::from(*quantity))
                .sum();
            prop_assert_eq!(forward.total(), expected);
            prop_assert_eq!(backward.total(), expected);
            prop_assert_eq!(forward.item_count(), backward.item_count());
        }
    }
}
