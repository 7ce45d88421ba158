//! Cart route handlers.
//!
//! The cart is stored in the visitor's session. Mutations run under the
//! session's cart lock, taken by `cart_lock_middleware`, so overlapping
//! requests apply one after another.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use vitrine_core::{Price, ProductId};

use crate::commerce::{Cart, CartLine, MINIMUM_ORDER_QUANTITY, can_checkout};
use crate::error::{Result, add_breadcrumb};
use crate::models::CartStorage;
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub color: String,
    pub quantity: u32,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub line_total: Decimal,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            color: line.color.clone(),
            quantity: line.quantity,
            name: line.name.clone(),
            price: line.price,
            image: line.image.clone(),
            line_total: line.line_total(),
        }
    }
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: Decimal,
    pub total_display: String,
    pub item_count: u64,
    pub can_checkout: bool,
    pub minimum: u64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.lines().iter().map(CartLineView::from).collect(),
            total: cart.total(),
            total_display: Price::brl(cart.total()).display(),
            item_count: cart.item_count(),
            can_checkout: can_checkout(cart),
            minimum: MINIMUM_ORDER_QUANTITY,
        }
    }
}

const fn default_quantity() -> i64 {
    1
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub color: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub color: String,
    pub quantity: i64,
}

/// Remove from cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
    pub color: String,
}

/// Show the current cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = session.load_cart().await?;
    Ok(Json(CartView::from(&cart)))
}

/// Add units of a product colour.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = session.load_cart().await?;

    let line = state
        .shop()
        .add_to_cart(&mut cart, &request.product_id, &request.color, request.quantity)
        .await?;
    session.save_cart(&cart).await?;

    let line_quantity = line.quantity.to_string();
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[
            ("product_id", request.product_id.as_str()),
            ("color", request.color.as_str()),
            ("line_quantity", line_quantity.as_str()),
        ]),
    );
    Ok(Json(CartView::from(&cart)))
}

/// Replace the quantity of a line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = session.load_cart().await?;

    state
        .shop()
        .update_quantity(&mut cart, &request.product_id, &request.color, request.quantity)
        .await?;
    session.save_cart(&cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Remove a line. Removing an absent line succeeds.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = session.load_cart().await?;

    if state
        .shop()
        .remove(&mut cart, &request.product_id, &request.color)
        .is_some()
    {
        session.save_cart(&cart).await?;
    }

    Ok(Json(CartView::from(&cart)))
}
