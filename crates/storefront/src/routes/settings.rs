//! Site settings route handler.

use axum::{Json, extract::State};
use tracing::instrument;
use vitrine_core::SiteSettings;

use crate::error::Result;
use crate::state::AppState;

/// Presentation settings for the client to render with.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Result<Json<SiteSettings>> {
    let settings = state.catalog().settings().await?;
    Ok(Json(SiteSettings::clone(&settings)))
}
