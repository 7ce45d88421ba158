//! Product and catalog route handlers.

use std::slice;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use vitrine_core::{Category, Product, ProductId};

use crate::commerce::{Cart, StockLedger};
use crate::error::Result;
use crate::models::CartStorage;
use crate::state::AppState;

/// Title of the unfiltered product grid.
const ALL_PRODUCTS_TITLE: &str = "Todos os Produtos";

/// Colour option with the stock this visitor can still add.
#[derive(Debug, Clone, Serialize)]
pub struct ColorView {
    pub name: String,
    pub code: String,
    pub available: u32,
}

/// Product display data.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub price_display: String,
    pub category: Category,
    pub images: Vec<String>,
    pub colors: Vec<ColorView>,
    /// False when no colour has stock left for this visitor.
    pub in_stock: bool,
}

impl ProductView {
    fn new(product: &Product, ledger: &StockLedger<'_>) -> Self {
        let colors: Vec<ColorView> = product
            .colors
            .iter()
            .map(|(name, color)| ColorView {
                name: name.clone(),
                code: color.code.clone(),
                available: ledger.available_stock(&product.id, name),
            })
            .collect();

        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            price_display: product.unit_price().display(),
            category: product.category.clone(),
            images: product.images.clone(),
            in_stock: colors.iter().any(|c| c.available > 0),
            colors,
        }
    }
}

/// Product listing response.
#[derive(Debug, Clone, Serialize)]
pub struct ProductListView {
    pub title: String,
    pub products: Vec<ProductView>,
}

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

/// List active products, optionally filtered by category.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<ProductListView>> {
    let category = query.category.as_deref().and_then(Category::parse_filter);
    let products = state.catalog().products(category.as_ref()).await?;
    let cart = session.load_cart().await?;
    let ledger = StockLedger::new(&products, &cart);

    Ok(Json(ProductListView {
        title: category
            .as_ref()
            .map_or(ALL_PRODUCTS_TITLE, Category::display_name)
            .to_string(),
        products: products
            .iter()
            .map(|product| ProductView::new(product, &ledger))
            .collect(),
    }))
}

/// Show one active product.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    let product = state.catalog().product(&id).await?;
    if !product.active {
        return Err(crate::catalog::CatalogError::NotFound(id).into());
    }
    let cart: Cart = session.load_cart().await?;
    let ledger = StockLedger::new(slice::from_ref(&product), &cart);

    Ok(Json(ProductView::new(&product, &ledger)))
}
