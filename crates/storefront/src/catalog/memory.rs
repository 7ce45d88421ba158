//! In-process catalog, used by tests and local development.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use vitrine_core::{Category, ColorStock, Product, ProductId, SiteSettings};

use super::{CatalogError, CatalogSource};

/// A [`CatalogSource`] backed by in-memory maps.
///
/// Clones share state. Failures can be switched on to exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    products: RwLock<BTreeMap<ProductId, Product>>,
    settings: RwLock<SiteSettings>,
    unavailable: AtomicBool,
    fail_decrements: AtomicBool,
    decrements: AtomicUsize,
}

impl InMemoryCatalog {
    /// Insert or replace a product.
    pub async fn insert(&self, product: Product) {
        self.inner
            .products
            .write()
            .await
            .insert(product.id.clone(), product);
    }

    /// Replace the site settings.
    pub async fn set_settings(&self, settings: SiteSettings) {
        *self.inner.settings.write().await = settings;
    }

    /// Make every call fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make only stock decrements fail.
    pub fn set_fail_decrements(&self, fail: bool) {
        self.inner.fail_decrements.store(fail, Ordering::SeqCst);
    }

    /// Number of successful stock decrements.
    #[must_use]
    pub fn decrement_count(&self) -> usize {
        self.inner.decrements.load(Ordering::SeqCst)
    }

    /// Current stock of a colour, if the product and colour exist.
    pub async fn stock_of(&self, id: &ProductId, color: &str) -> Option<u32> {
        self.inner
            .products
            .read()
            .await
            .get(id)
            .and_then(|product| product.color(color))
            .map(ColorStock::stock)
    }

    fn check_available(&self) -> Result<(), CatalogError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            Err(CatalogError::Unavailable("in-memory catalog offline".to_owned()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn list_active_products(
        &self,
        category: Option<&Category>,
    ) -> Result<Vec<Product>, CatalogError> {
        self.check_available()?;
        let products = self.inner.products.read().await;
        Ok(products
            .values()
            .filter(|product| product.active)
            .filter(|product| category.is_none_or(|c| product.category == *c))
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        self.check_available()?;
        self.inner
            .products
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }

    async fn decrement_stock(
        &self,
        id: &ProductId,
        color: &str,
        quantity: u32,
    ) -> Result<(), CatalogError> {
        self.check_available()?;
        if self.inner.fail_decrements.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable("stock write rejected".to_owned()));
        }

        let mut products = self.inner.products.write().await;
        let product = products
            .get_mut(id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;
        let current = product
            .colors
            .get_mut(color)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;

        let remaining = current.stock().saturating_sub(quantity);
        *current = ColorStock::new(current.code.clone(), remaining, current.reserved());
        self.inner.decrements.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_site_settings(&self) -> Result<SiteSettings, CatalogError> {
        self.check_available()?;
        Ok(self.inner.settings.read().await.clone())
    }
}

/// Active product with one `Azul` colour holding `stock` units.
#[cfg(test)]
pub(crate) fn sample_product(id: &str, category: Category, stock: u32) -> Product {
    let mut colors = BTreeMap::new();
    colors.insert("Azul".to_owned(), ColorStock::new("#0000ff", stock, 0));
    Product {
        id: ProductId::new(id),
        name: format!("Produto {id}"),
        price: rust_decimal::Decimal::new(15, 0),
        category,
        images: vec![format!("https://cdn.example/{id}.jpg")],
        colors,
        active: true,
    }
}
