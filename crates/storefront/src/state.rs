//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::commerce::{OrderDispatcher, ShopService};
use crate::config::ShopConfig;
use crate::models::CartLocks;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, the shop operations and the per-session cart locks.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    shop: ShopService,
    cart_locks: CartLocks,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Shop behaviour settings
    /// * `catalog` - Cached catalog in front of the product store
    #[must_use]
    pub fn new(config: &ShopConfig, catalog: CatalogStore) -> Self {
        let dispatcher = OrderDispatcher::new(
            config.store_name.clone(),
            config.order_channel_template.clone(),
            config.utc_offset,
        );
        let shop = ShopService::new(catalog, dispatcher, config.fresh_stock_check);

        Self {
            inner: Arc::new(AppStateInner {
                shop,
                cart_locks: CartLocks::default(),
            }),
        }
    }

    /// Get a reference to the shop operations.
    #[must_use]
    pub fn shop(&self) -> &ShopService {
        &self.inner.shop
    }

    /// Get a reference to the cached catalog.
    #[must_use]
    pub fn catalog(&self) -> &CatalogStore {
        self.inner.shop.catalog()
    }

    /// Get a reference to the per-session cart locks.
    #[must_use]
    pub fn cart_locks(&self) -> &CartLocks {
        &self.inner.cart_locks
    }
}
