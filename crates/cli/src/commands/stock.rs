//! Stock management commands.
//!
//! # Usage
//!
//! ```bash
//! # Restock an existing colour
//! vt-cli stock set <product-id> Azul 20
//!
//! # Add a new colour with its swatch
//! vt-cli stock set <product-id> Verde 6 --code "#2e7d32"
//!
//! # Drop a colour entirely
//! vt-cli stock remove-color <product-id> Verde
//! ```

use tracing::info;
use vitrine_core::ProductId;

use super::docstore_client;

/// Set the stock count of one colour.
///
/// A new colour added without `code` is read back with the neutral swatch.
///
/// # Errors
///
/// Returns an error if the product does not exist or the write fails.
pub async fn set(
    product: &str,
    color: &str,
    stock: u32,
    code: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = docstore_client()?;
    client
        .set_color_stock(&ProductId::new(product), color, stock, code)
        .await?;

    info!(product_id = %product, color, stock, "Stock updated");
    Ok(())
}

/// Remove a colour from a product.
///
/// # Errors
///
/// Returns an error if the product does not exist or the write fails.
pub async fn remove_color(product: &str, color: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = docstore_client()?;
    client.remove_color(&ProductId::new(product), color).await?;

    info!(product_id = %product, color, "Colour removed");
    Ok(())
}
