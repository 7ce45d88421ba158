//! Session-local view of purchasable stock.
//!
//! The ledger is a pure projection of a catalog snapshot and one cart. It is
//! not a lock: two sessions can both see the same free units, and the store
//! stays the only authority on what was actually sold.

use vitrine_core::{ColorStock, Product, ProductId};

use super::cart::Cart;
use super::error::CommerceError;

/// Available stock per product colour for the owner of `cart`.
#[derive(Debug, Clone, Copy)]
pub struct StockLedger<'a> {
    products: &'a [Product],
    cart: &'a Cart,
}

impl<'a> StockLedger<'a> {
    #[must_use]
    pub const fn new(products: &'a [Product], cart: &'a Cart) -> Self {
        Self { products, cart }
    }

    /// Units of `(product_id, color)` this session can still add.
    ///
    /// Unknown products or colours have no stock.
    #[must_use]
    pub fn available_stock(&self, product_id: &ProductId, color: &str) -> u32 {
        let raw = self
            .products
            .iter()
            .find(|product| product.id == *product_id)
            .and_then(|product| product.color(color))
            .map_or(0, ColorStock::unreserved);

        raw.saturating_sub(self.cart.quantity_of(product_id, color))
    }

    /// Whether `requested` more units fit in the available stock.
    #[must_use]
    pub fn can_reserve(&self, product_id: &ProductId, color: &str, requested: u32) -> bool {
        requested <= self.available_stock(product_id, color)
    }

    /// Like [`StockLedger::can_reserve`], but reports the shortfall.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientStock` when `requested` exceeds availability.
    pub fn ensure_can_reserve(
        &self,
        product_id: &ProductId,
        color: &str,
        requested: u32,
    ) -> Result<(), CommerceError> {
        let available = self.available_stock(product_id, color);
        if requested <= available {
            Ok(())
        } else {
            Err(CommerceError::InsufficientStock {
                product_id: product_id.clone(),
                color: color.to_owned(),
                requested: u64::from(requested),
                available,
            })
        }
    }
}
