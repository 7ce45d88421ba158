//! Catalog Store and the collaborator interface behind it.
//!
//! # Architecture
//!
//! - The external document store is the source of truth for products,
//!   stock and site settings
//! - [`CatalogSource`] is the narrow interface the shop core needs from it
//! - [`CatalogStore`] is a read-mostly cache in front of a source, refreshed
//!   on demand or when its entries expire
//!
//! # Example
//!
//! ```rust,ignore
//! use vitrine_storefront::catalog::{CatalogStore, InMemoryCatalog};
//!
//! let store = CatalogStore::new(Arc::new(InMemoryCatalog::default()), Duration::from_secs(60));
//! let tops = store.products(Some(&Category::Tops)).await?;
//! ```

mod cache;
pub(crate) mod memory;
mod store;

pub use memory::InMemoryCatalog;
pub use store::{CatalogStore, DEFAULT_CACHE_TTL};

use async_trait::async_trait;
use thiserror::Error;
use vitrine_core::{Category, Product, ProductId, SiteSettings};

/// Errors returned by catalog collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The product does not exist.
    #[error("product not found: {0}")]
    NotFound(ProductId),

    /// The store could not be reached or answered with a failure.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    /// A stored document could not be normalized into the typed schema.
    #[error("invalid document {id}: {reason}")]
    InvalidDocument { id: String, reason: String },
}

/// Read and stock operations the shop core needs from the product store.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Active products, optionally restricted to one category.
    async fn list_active_products(
        &self,
        category: Option<&Category>,
    ) -> Result<Vec<Product>, CatalogError>;

    /// One product by ID, active or not.
    async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogError>;

    /// Authoritatively remove sold units of a colour. Stock never drops below zero.
    async fn decrement_stock(
        &self,
        id: &ProductId,
        color: &str,
        quantity: u32,
    ) -> Result<(), CatalogError>;

    /// Site settings, with defaults for anything unset.
    async fn get_site_settings(&self) -> Result<SiteSettings, CatalogError>;
}
