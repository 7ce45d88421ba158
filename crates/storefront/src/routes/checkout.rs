//! Checkout route handler.

use axum::{Json, extract::State};
use tower_sessions::Session;
use tracing::instrument;

use crate::commerce::{CustomerInfo, DispatchReceipt};
use crate::error::Result;
use crate::models::CartStorage;
use crate::state::AppState;

/// Submit the cart and return the messaging-app link for the order.
///
/// The client is expected to navigate to `redirect_url`. The cart is
/// cleared once the link has been built.
#[instrument(skip(state, session, customer))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Json(customer): Json<CustomerInfo>,
) -> Result<Json<DispatchReceipt>> {
    let mut cart = session.load_cart().await?;

    let receipt = state.shop().checkout(&mut cart, &customer).await?;
    session.save_cart(&cart).await?;

    Ok(Json(receipt))
}
