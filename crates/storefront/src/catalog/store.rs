//! Cached read access to the catalog.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};
use vitrine_core::{Category, Product, ProductId, SiteSettings};

use super::cache::{CacheKey, CacheValue};
use super::{CatalogError, CatalogSource};

/// Default lifetime of cached catalog reads.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

const CACHE_CAPACITY: u64 = 1000;

/// Read-mostly catalog cache in front of a [`CatalogSource`].
///
/// Cheap to clone; all clones share one cache.
#[derive(Clone)]
pub struct CatalogStore {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn CatalogSource>,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("cached_entries", &self.inner.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl CatalogStore {
    /// Create a store whose cached reads expire after `ttl`.
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(Inner { source, cache }),
        }
    }

    /// The underlying source, for writes that bypass the cache.
    #[must_use]
    pub fn source(&self) -> &Arc<dyn CatalogSource> {
        &self.inner.source
    }

    /// Active products, optionally filtered by category.
    ///
    /// # Errors
    ///
    /// Returns the source error when the cache is cold and the fetch fails.
    #[instrument(skip(self))]
    pub async fn products(
        &self,
        category: Option<&Category>,
    ) -> Result<Arc<[Product]>, CatalogError> {
        let cache_key = CacheKey::Products {
            category: category.cloned(),
        };

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let products: Arc<[Product]> = self
            .inner
            .source
            .list_active_products(category)
            .await?
            .into();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// One product by ID, served from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist, or the source error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        self.fresh_product(id).await
    }

    /// One product read straight from the source, refreshing its cache entry.
    ///
    /// Used before stock checks so availability is not computed from a
    /// stale snapshot.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist, or the source error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn fresh_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let product = self.inner.source.get_product(id).await?;

        self.inner
            .cache
            .insert(
                CacheKey::Product(id.clone()),
                CacheValue::Product(Box::new(product.clone())),
            )
            .await;

        Ok(product)
    }

    /// Site settings, served from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns the source error when the cache is cold and the fetch fails.
    #[instrument(skip(self))]
    pub async fn settings(&self) -> Result<Arc<SiteSettings>, CatalogError> {
        if let Some(CacheValue::Settings(settings)) = self.inner.cache.get(&CacheKey::Settings).await
        {
            debug!("Cache hit for site settings");
            return Ok(settings);
        }

        let settings = Arc::new(self.inner.source.get_site_settings().await?);

        self.inner
            .cache
            .insert(CacheKey::Settings, CacheValue::Settings(Arc::clone(&settings)))
            .await;

        Ok(settings)
    }

    /// Drop every cached entry so the next reads hit the source.
    pub async fn refresh(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
        debug!("Catalog cache invalidated");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::catalog::memory::sample_product;

    fn store_over(catalog: &InMemoryCatalog) -> CatalogStore {
        CatalogStore::new(Arc::new(catalog.clone()), DEFAULT_CACHE_TTL)
    }

    #[tokio::test]
    async fn test_products_are_cached_until_refresh() {
        let catalog = InMemoryCatalog::default();
        catalog.insert(sample_product("p1", Category::Tops, 5)).await;
        let store = store_over(&catalog);

        assert_eq!(store.products(None).await.unwrap().len(), 1);

        catalog.insert(sample_product("p2", Category::Shorts, 5)).await;
        assert_eq!(store.products(None).await.unwrap().len(), 1);

        store.refresh().await;
        assert_eq!(store.products(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_category_lists_are_cached_separately() {
        let catalog = InMemoryCatalog::default();
        catalog.insert(sample_product("p1", Category::Tops, 5)).await;
        catalog.insert(sample_product("p2", Category::Shorts, 5)).await;
        let store = store_over(&catalog);

        let tops = store.products(Some(&Category::Tops)).await.unwrap();
        assert_eq!(tops.len(), 1);
        assert_eq!(store.products(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fresh_product_bypasses_cache() {
        let catalog = InMemoryCatalog::default();
        catalog.insert(sample_product("p1", Category::Tops, 5)).await;
        let store = store_over(&catalog);
        let id = ProductId::new("p1");

        assert_eq!(store.product(&id).await.unwrap().colors["Azul"].stock(), 5);

        catalog.decrement_stock(&id, "Azul", 2).await.unwrap();
        assert_eq!(store.product(&id).await.unwrap().colors["Azul"].stock(), 5);
        assert_eq!(store.fresh_product(&id).await.unwrap().colors["Azul"].stock(), 3);
        // The fresh read also refreshed the cached entry.
        assert_eq!(store.product(&id).await.unwrap().colors["Azul"].stock(), 3);
    }

    #[tokio::test]
    async fn test_cached_reads_survive_source_outage() {
        let catalog = InMemoryCatalog::default();
        catalog.insert(sample_product("p1", Category::Tops, 5)).await;
        let store = store_over(&catalog);
        store.products(None).await.unwrap();
        store.settings().await.unwrap();

        catalog.set_unavailable(true);
        assert!(store.products(None).await.is_ok());
        assert!(store.settings().await.is_ok());

        store.refresh().await;
        assert!(matches!(
            store.products(None).await,
            Err(CatalogError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let store = store_over(&InMemoryCatalog::default());
        let err = store.product(&ProductId::new("nope")).await.unwrap_err();
        assert_eq!(err, CatalogError::NotFound(ProductId::new("nope")));
    }
}
