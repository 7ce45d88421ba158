//! Integration tests for Vitrine.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p vitrine-integration-tests
//! ```
//!
//! Each test spawns the full storefront router on an ephemeral port, backed
//! by an in-memory catalog and an in-memory session store, and talks to it
//! over real HTTP with a cookie-keeping client. No database or document
//! store is needed.
//!
//! # Test Categories
//!
//! - `storefront_cart` - Catalog reads, cart mutations, stock limits
//! - `storefront_checkout` - Minimum order gate, dispatch, stock decrements

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use rust_decimal::Decimal;
use tower_sessions::MemoryStore;
use vitrine_core::{Category, ColorStock, Product, ProductId, SiteSettings};
use vitrine_storefront::catalog::{CatalogStore, InMemoryCatalog};
use vitrine_storefront::config::ShopConfig;
use vitrine_storefront::middleware::session_layer;
use vitrine_storefront::state::AppState;

/// Order recipient configured by [`TestApp::spawn`].
pub const RECIPIENT: &str = "5511999999999";

/// A running storefront with its backing catalog.
pub struct TestApp {
    pub base_url: String,
    pub catalog: InMemoryCatalog,
}

impl TestApp {
    /// Start a storefront with an empty catalog and a configured recipient.
    pub async fn spawn() -> Self {
        let catalog = InMemoryCatalog::default();
        catalog
            .set_settings(SiteSettings {
                whatsapp_number: format!("+{RECIPIENT}"),
                ..SiteSettings::default()
            })
            .await;

        let config = ShopConfig {
            store_name: "Loja Teste".to_owned(),
            catalog_ttl: Duration::from_secs(60),
            ..ShopConfig::default()
        };
        let store = CatalogStore::new(std::sync::Arc::new(catalog.clone()), config.catalog_ttl);
        let state = AppState::new(&config, store);
        let app = vitrine_storefront::app(state, session_layer(MemoryStore::default(), false));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            catalog,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A new visitor with its own cookie jar, and so its own cart.
    #[must_use]
    pub fn visitor(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }
}

/// Build an active product with one colour per `(name, stock)` pair.
#[must_use]
pub fn product(id: &str, category: Category, price: i64, colors: &[(&str, u32)]) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Produto {id}"),
        price: Decimal::new(price, 0),
        category,
        images: vec![format!("https://cdn.example/{id}.jpg")],
        colors: colors
            .iter()
            .map(|(name, stock)| ((*name).to_owned(), ColorStock::new("#123456", *stock, 0)))
            .collect::<BTreeMap<_, _>>(),
        active: true,
    }
}
