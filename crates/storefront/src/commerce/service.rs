//! Shop operations over a cart and the catalog.

use std::slice;

use tracing::{error, info, instrument};
use vitrine_core::{Product, ProductId};

use super::cart::{Cart, CartLine, ProductSnapshot};
use super::checkout::{CustomerInfo, build_order};
use super::dispatch::{DispatchReceipt, OrderDispatcher};
use super::error::{CommerceError, positive_quantity};
use super::ledger::StockLedger;
use crate::catalog::CatalogStore;

/// Cart mutations and checkout backed by the catalog.
///
/// Every operation validates before touching the cart, so a failed call
/// leaves the cart unchanged.
#[derive(Debug, Clone)]
pub struct ShopService {
    catalog: CatalogStore,
    dispatcher: OrderDispatcher,
    fresh_stock_check: bool,
}

impl ShopService {
    /// `fresh_stock_check` re-reads the product from the store before every
    /// stock check instead of trusting the cached snapshot.
    #[must_use]
    pub const fn new(
        catalog: CatalogStore,
        dispatcher: OrderDispatcher,
        fresh_stock_check: bool,
    ) -> Self {
        Self {
            catalog,
            dispatcher,
            fresh_stock_check,
        }
    }

    #[must_use]
    pub const fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    async fn product_for_stock_check(&self, id: &ProductId) -> Result<Product, CommerceError> {
        let product = if self.fresh_stock_check {
            self.catalog.fresh_product(id).await?
        } else {
            self.catalog.product(id).await?
        };

        if product.active {
            Ok(product)
        } else {
            Err(CommerceError::ProductNotFound(id.clone()))
        }
    }

    /// Add units of a product colour, merging into an existing line.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity`, `ProductNotFound` (missing or inactive),
    /// `ColorNotFound`, `InsufficientStock`, or `RemoteUnavailable`.
    #[instrument(skip(self, cart), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        cart: &mut Cart,
        product_id: &ProductId,
        color: &str,
        quantity: i64,
    ) -> Result<CartLine, CommerceError> {
        let quantity = positive_quantity(quantity)?;
        let product = self.product_for_stock_check(product_id).await?;
        if product.color(color).is_none() {
            return Err(CommerceError::ColorNotFound {
                product_id: product_id.clone(),
                color: color.to_owned(),
            });
        }

        StockLedger::new(slice::from_ref(&product), cart).ensure_can_reserve(
            product_id,
            color,
            quantity,
        )?;

        cart.add(product_id, color, quantity, ProductSnapshot::from(&product))
            .cloned()
    }

    /// Replace a line's quantity. Increases are checked against stock.
    ///
    /// # Errors
    ///
    /// `LineNotFound`, `InvalidQuantity`, `InsufficientStock`, or the
    /// catalog errors of [`ShopService::add_to_cart`] when increasing.
    #[instrument(skip(self, cart), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        cart: &mut Cart,
        product_id: &ProductId,
        color: &str,
        quantity: i64,
    ) -> Result<CartLine, CommerceError> {
        let current = cart
            .line(product_id, color)
            .map(|line| line.quantity)
            .ok_or_else(|| CommerceError::LineNotFound {
                product_id: product_id.clone(),
                color: color.to_owned(),
            })?;
        let quantity = positive_quantity(quantity)?;

        if quantity > current {
            let product = self.product_for_stock_check(product_id).await?;
            StockLedger::new(slice::from_ref(&product), cart).ensure_can_reserve(
                product_id,
                color,
                quantity - current,
            )?;
        }

        cart.update_quantity(product_id, color, quantity).cloned()
    }

    /// Remove a line. Absent lines are ignored.
    #[allow(clippy::unused_self)]
    pub fn remove(&self, cart: &mut Cart, product_id: &ProductId, color: &str) -> Option<CartLine> {
        cart.remove(product_id, color)
    }

    /// Submit the cart: build the order, hand it to the messaging channel,
    /// then decrement stock for each line.
    ///
    /// Stock decrements run after the cart is cleared. A failed decrement is
    /// logged and counted in the receipt; the order is not rolled back.
    ///
    /// # Errors
    ///
    /// Any `build_order` error, `ChannelUnconfigured`, or `RemoteUnavailable`
    /// if the settings cannot be read. The cart is unchanged on error.
    #[instrument(skip(self, cart, customer), fields(items = cart.item_count()))]
    pub async fn checkout(
        &self,
        cart: &mut Cart,
        customer: &CustomerInfo,
    ) -> Result<DispatchReceipt, CommerceError> {
        let order = build_order(cart, customer)?;
        let settings = self.catalog.settings().await?;
        let recipient = settings.order_recipient();

        let mut receipt = self.dispatcher.dispatch(&order, recipient.as_deref(), cart)?;

        for item in &order.items {
            if let Err(e) = self
                .catalog
                .source()
                .decrement_stock(&item.product_id, &item.color, item.quantity)
                .await
            {
                error!(
                    error = %e,
                    product_id = %item.product_id,
                    color = %item.color,
                    quantity = item.quantity,
                    "Stock decrement failed after order dispatch"
                );
                receipt.stock_sync_failures += 1;
            }
        }

        self.catalog.refresh().await;
        info!(
            total = %order.total,
            stock_sync_failures = receipt.stock_sync_failures,
            "Checkout complete"
        );

        Ok(receipt)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::FixedOffset;
    use vitrine_core::{Category, SiteSettings};

    use super::*;
    use crate::catalog::{CatalogSource, InMemoryCatalog};
    use crate::catalog::memory::sample_product;
    use crate::commerce::DEFAULT_CHANNEL_TEMPLATE;
    use crate::commerce::checkout::tests::customer;

    async fn service_with(catalog: &InMemoryCatalog, fresh: bool) -> ShopService {
        catalog
            .set_settings(SiteSettings {
                whatsapp_number: "+55 11 99999-9999".to_owned(),
                ..SiteSettings::default()
            })
            .await;
        let store = CatalogStore::new(
            Arc::new(catalog.clone()),
            crate::catalog::DEFAULT_CACHE_TTL,
        );
        let dispatcher = OrderDispatcher::new(
            "Hellen Moda Fitness",
            DEFAULT_CHANNEL_TEMPLATE,
            FixedOffset::west_opt(3 * 3600).unwrap(),
        );
        ShopService::new(store, dispatcher, fresh)
    }

    async fn catalog_with(stock: u32) -> InMemoryCatalog {
        let catalog = InMemoryCatalog::default();
        catalog.insert(sample_product("p1", Category::Tops, stock)).await;
        catalog
    }

    fn p1() -> ProductId {
        ProductId::new("p1")
    }

    #[tokio::test]
    async fn test_add_merges_repeated_adds() {
        let catalog = catalog_with(20).await;
        let shop = service_with(&catalog, true).await;
        let mut cart = Cart::new();

        shop.add_to_cart(&mut cart, &p1(), "Azul", 2).await.unwrap();
        let line = shop.add_to_cart(&mut cart, &p1(), "Azul", 3).await.unwrap();

        assert_eq!(line.quantity, 5);
        assert_eq!(cart.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_add_rejects_more_than_available() {
        let catalog = catalog_with(5).await;
        let shop = service_with(&catalog, true).await;
        let mut cart = Cart::new();

        shop.add_to_cart(&mut cart, &p1(), "Azul", 5).await.unwrap();
        let err = shop.add_to_cart(&mut cart, &p1(), "Azul", 1).await.unwrap_err();

        assert!(matches!(err, CommerceError::InsufficientStock { available: 0, .. }));
        assert_eq!(cart.item_count(), 5);
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_quantity_before_reading_catalog() {
        let catalog = catalog_with(5).await;
        let shop = service_with(&catalog, true).await;
        catalog.set_unavailable(true);
        let mut cart = Cart::new();

        let err = shop.add_to_cart(&mut cart, &p1(), "Azul", 0).await.unwrap_err();
        assert_eq!(err, CommerceError::InvalidQuantity { quantity: 0 });
        let err = shop.add_to_cart(&mut cart, &p1(), "Azul", -2).await.unwrap_err();
        assert_eq!(err, CommerceError::InvalidQuantity { quantity: -2 });
    }

    #[tokio::test]
    async fn test_add_unknown_color_and_product() {
        let catalog = catalog_with(5).await;
        let shop = service_with(&catalog, true).await;
        let mut cart = Cart::new();

        assert!(matches!(
            shop.add_to_cart(&mut cart, &p1(), "Verde", 1).await,
            Err(CommerceError::ColorNotFound { .. })
        ));
        assert_eq!(
            shop.add_to_cart(&mut cart, &ProductId::new("p9"), "Azul", 1)
                .await
                .unwrap_err(),
            CommerceError::ProductNotFound(ProductId::new("p9"))
        );
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_add_inactive_product_is_not_found() {
        let catalog = InMemoryCatalog::default();
        let mut product = sample_product("p1", Category::Tops, 5);
        product.active = false;
        catalog.insert(product).await;
        let shop = service_with(&catalog, true).await;

        let err = shop
            .add_to_cart(&mut Cart::new(), &p1(), "Azul", 1)
            .await
            .unwrap_err();
        assert_eq!(err, CommerceError::ProductNotFound(p1()));
    }

    #[tokio::test]
    async fn test_add_while_store_down_leaves_cart_unchanged() {
        let catalog = catalog_with(5).await;
        let shop = service_with(&catalog, true).await;
        let mut cart = Cart::new();
        shop.add_to_cart(&mut cart, &p1(), "Azul", 1).await.unwrap();

        catalog.set_unavailable(true);
        let err = shop.add_to_cart(&mut cart, &p1(), "Azul", 1).await.unwrap_err();

        assert!(matches!(err, CommerceError::RemoteUnavailable(_)));
        assert_eq!(cart.item_count(), 1);
    }

    #[tokio::test]
    async fn test_fresh_check_sees_stock_sold_elsewhere() {
        let catalog = catalog_with(5).await;
        let shop = service_with(&catalog, true).await;
        shop.catalog().product(&p1()).await.unwrap();

        // Another session's order went through.
        catalog.decrement_stock(&p1(), "Azul", 4).await.unwrap();

        let err = shop
            .add_to_cart(&mut Cart::new(), &p1(), "Azul", 2)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::InsufficientStock { available: 1, .. }));
    }

    #[tokio::test]
    async fn test_update_checks_only_increases() {
        let catalog = catalog_with(6).await;
        let shop = service_with(&catalog, true).await;
        let mut cart = Cart::new();
        shop.add_to_cart(&mut cart, &p1(), "Azul", 4).await.unwrap();

        assert!(matches!(
            shop.update_quantity(&mut cart, &p1(), "Azul", 7).await,
            Err(CommerceError::InsufficientStock { requested: 3, available: 2, .. })
        ));
        assert_eq!(
            shop.update_quantity(&mut cart, &p1(), "Azul", 6).await.unwrap().quantity,
            6
        );

        catalog.set_unavailable(true);
        assert_eq!(
            shop.update_quantity(&mut cart, &p1(), "Azul", 2).await.unwrap().quantity,
            2
        );
    }

    #[tokio::test]
    async fn test_update_missing_line_before_quantity() {
        let catalog = catalog_with(6).await;
        let shop = service_with(&catalog, true).await;

        let err = shop
            .update_quantity(&mut Cart::new(), &p1(), "Azul", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::LineNotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let catalog = catalog_with(6).await;
        let shop = service_with(&catalog, true).await;
        let mut cart = Cart::new();
        shop.add_to_cart(&mut cart, &p1(), "Azul", 1).await.unwrap();

        assert!(shop.remove(&mut cart, &p1(), "Azul").is_some());
        assert!(shop.remove(&mut cart, &p1(), "Azul").is_none());
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_dispatches_and_decrements_stock() {
        let catalog = catalog_with(12).await;
        let shop = service_with(&catalog, true).await;
        let mut cart = Cart::new();
        shop.add_to_cart(&mut cart, &p1(), "Azul", 10).await.unwrap();

        let receipt = shop.checkout(&mut cart, &customer()).await.unwrap();

        assert!(cart.is_empty());
        assert!(receipt.redirect_url.starts_with("https://wa.me/5511999999999?text="));
        assert_eq!(receipt.stock_sync_failures, 0);
        assert_eq!(catalog.stock_of(&p1(), "Azul").await, Some(2));
    }

    #[tokio::test]
    async fn test_checkout_below_minimum_keeps_cart() {
        let catalog = catalog_with(12).await;
        let shop = service_with(&catalog, true).await;
        let mut cart = Cart::new();
        shop.add_to_cart(&mut cart, &p1(), "Azul", 9).await.unwrap();

        let err = shop.checkout(&mut cart, &customer()).await.unwrap_err();
        assert!(matches!(err, CommerceError::BelowMinimum { item_count: 9, .. }));
        assert_eq!(cart.item_count(), 9);
        assert_eq!(catalog.decrement_count(), 0);
    }

    #[tokio::test]
    async fn test_checkout_without_recipient_keeps_cart() {
        let catalog = catalog_with(12).await;
        let shop = service_with(&catalog, true).await;
        catalog.set_settings(SiteSettings::default()).await;
        shop.catalog().refresh().await;
        let mut cart = Cart::new();
        shop.add_to_cart(&mut cart, &p1(), "Azul", 10).await.unwrap();

        let err = shop.checkout(&mut cart, &customer()).await.unwrap_err();
        assert_eq!(err, CommerceError::ChannelUnconfigured);
        assert_eq!(cart.item_count(), 10);
    }

    #[tokio::test]
    async fn test_failed_decrement_does_not_undo_order() {
        let catalog = catalog_with(12).await;
        let shop = service_with(&catalog, true).await;
        let mut cart = Cart::new();
        shop.add_to_cart(&mut cart, &p1(), "Azul", 10).await.unwrap();
        catalog.set_fail_decrements(true);

        let receipt = shop.checkout(&mut cart, &customer()).await.unwrap();

        assert_eq!(receipt.stock_sync_failures, 1);
        assert!(cart.is_empty());
        assert_eq!(catalog.stock_of(&p1(), "Azul").await, Some(12));
    }
}
