//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (document store reachable)
//!
//! # Catalog
//! GET  /api/settings           - Site settings
//! GET  /api/products           - Active products (?category=tops|...|all)
//! GET  /api/products/{id}      - Product detail with available stock per colour
//!
//! # Cart (session-backed)
//! GET  /api/cart               - Cart with totals and checkout gate
//! POST /api/cart/add           - Add units of a product colour
//! POST /api/cart/update        - Replace a line's quantity
//! POST /api/cart/remove        - Remove a line
//!
//! # Checkout
//! POST /api/checkout           - Submit the order, returns the messaging link
//! ```

pub mod cart;
pub mod checkout;
pub mod health;
pub mod products;
pub mod settings;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(settings::show))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::submit))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}
