//! Cache types for catalog reads.

use std::sync::Arc;

use vitrine_core::{Category, Product, ProductId, SiteSettings};

/// Cache key for products and settings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products { category: Option<Category> },
    Settings,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Arc<[Product]>),
    Settings(Arc<SiteSettings>),
}
