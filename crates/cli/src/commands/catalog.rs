//! Catalog management commands.
//!
//! # Usage
//!
//! ```bash
//! # Active products, all categories
//! vt-cli catalog list
//!
//! # Every product in a category, including inactive ones
//! vt-cli catalog list --category shorts --all
//!
//! # Create products from YAML
//! vt-cli catalog import products.yaml
//!
//! # Edit existing products in place (every entry needs an `id`)
//! vt-cli catalog update products.yaml
//!
//! # Hide a product
//! vt-cli catalog deactivate <product-id>
//! ```
//!
//! # Import Format
//!
//! ```yaml
//! - name: Conjunto Aurora
//!   price: "89.90"
//!   category: conjuntos
//!   images:
//!     - https://cdn.example/aurora-1.jpg
//!   colors:
//!     Azul: { code: "#1e3a8a", stock: 12 }
//!     Preto: { code: "#000000", stock: 4 }
//! ```
//!
//! # Environment Variables
//!
//! - `DOCSTORE_PROJECT_ID` - Document store project
//! - `DOCSTORE_API_KEY` - Document store API key

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};
use vitrine_core::{Category, ColorStock, MAX_PRODUCT_IMAGES, Product, ProductId, format_amount};
use vitrine_storefront::catalog::CatalogSource;

use super::docstore_client;

/// A product entry that failed validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("{0}: name is blank")]
    BlankName(usize),

    #[error("{index}: price {price} is negative")]
    NegativePrice { index: usize, price: Decimal },

    #[error("{index}: expected 1 to {MAX_PRODUCT_IMAGES} images, got {count}")]
    ImageCount { index: usize, count: usize },

    #[error("{0}: at least one colour is required")]
    NoColors(usize),

    #[error("{0}: id is required to update a product")]
    MissingId(usize),
}

#[derive(Debug, Deserialize)]
struct ColorEntry {
    code: String,
    stock: u32,
}

/// One product in an import file.
#[derive(Debug, Deserialize)]
struct ProductEntry {
    /// Optional fixed ID; the store assigns one when omitted.
    #[serde(default)]
    id: Option<String>,
    name: String,
    price: Decimal,
    category: Category,
    images: Vec<String>,
    colors: BTreeMap<String, ColorEntry>,
    #[serde(default = "default_active")]
    active: bool,
}

const fn default_active() -> bool {
    true
}

impl ProductEntry {
    fn into_product(self, index: usize) -> Result<Product, EntryError> {
        if self.name.trim().is_empty() {
            return Err(EntryError::BlankName(index));
        }
        if self.price.is_sign_negative() {
            return Err(EntryError::NegativePrice {
                index,
                price: self.price,
            });
        }
        if self.images.is_empty() || self.images.len() > MAX_PRODUCT_IMAGES {
            return Err(EntryError::ImageCount {
                index,
                count: self.images.len(),
            });
        }
        if self.colors.is_empty() {
            return Err(EntryError::NoColors(index));
        }

        Ok(Product {
            id: ProductId::new(self.id.unwrap_or_default()),
            name: self.name.trim().to_owned(),
            price: self.price,
            category: self.category,
            images: self.images,
            colors: self
                .colors
                .into_iter()
                .map(|(name, entry)| (name, ColorStock::new(entry.code, entry.stock, 0)))
                .collect(),
            active: self.active,
        })
    }
}

/// Parse and validate an import file, reporting every bad entry.
fn parse_entries(content: &str) -> Result<Vec<Product>, Box<dyn std::error::Error>> {
    let entries: Vec<ProductEntry> = serde_yaml::from_str(content)?;

    let mut products = Vec::with_capacity(entries.len());
    let mut errors = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        match entry.into_product(index) {
            Ok(product) => products.push(product),
            Err(e) => errors.push(e),
        }
    }

    if !errors.is_empty() {
        error!("Import file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }
    Ok(products)
}

/// Parse an update file: like an import file, but every entry names its ID.
fn parse_updates(content: &str) -> Result<Vec<Product>, Box<dyn std::error::Error>> {
    let products = parse_entries(content)?;
    let missing: Vec<EntryError> = products
        .iter()
        .enumerate()
        .filter(|(_, product)| product.id.as_str().trim().is_empty())
        .map(|(index, _)| EntryError::MissingId(index))
        .collect();

    if !missing.is_empty() {
        error!("Update file validation failed:");
        for err in &missing {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", missing.len()).into());
    }
    Ok(products)
}

async fn read_file(file_path: &str) -> Result<String, Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");
    Ok(tokio::fs::read_to_string(path).await?)
}

/// Print products, optionally filtered by category.
///
/// # Errors
///
/// Returns an error if configuration is missing or the store is unreachable.
pub async fn list(
    category: Option<&str>,
    include_inactive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = docstore_client()?;
    let category = category.and_then(Category::parse_filter);

    let products = if include_inactive {
        let mut all = client.list_all_products().await?;
        if let Some(category) = &category {
            all.retain(|p| &p.category == category);
        }
        all
    } else {
        client.list_active_products(category.as_ref()).await?
    };

    #[allow(clippy::print_stdout)]
    {
        for product in &products {
            let colors: Vec<String> = product
                .colors
                .iter()
                .map(|(name, stock)| format!("{name}={}/{}", stock.stock(), stock.reserved()))
                .collect();
            println!(
                "{}\t{}\tR$ {}\t{}\t{}{}",
                product.id,
                product.name,
                format_amount(product.price),
                product.category,
                colors.join(", "),
                if product.active { "" } else { "\t(inactive)" }
            );
        }
    }

    info!(count = products.len(), "Listed products");
    Ok(())
}

/// Create every product in a YAML file.
///
/// The whole file is validated before anything is written.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or a write fails.
pub async fn import(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let content = read_file(file_path).await?;
    let products = parse_entries(&content)?;
    info!(products = products.len(), "Import file validated");

    let client = docstore_client()?;
    for product in &products {
        let id = client.create_product(product).await?;
        info!(product_id = %id, name = %product.name, "Created product");
    }

    info!("Import complete!");
    Ok(())
}

/// Overwrite existing products from a YAML file.
///
/// Name, price, category, images, colours and the active flag are replaced
/// as listed. Products missing from the store are reported, not created.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or a write fails.
pub async fn update(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let content = read_file(file_path).await?;
    let products = parse_updates(&content)?;
    info!(products = products.len(), "Update file validated");

    let client = docstore_client()?;
    for product in &products {
        client.update_product(product).await?;
        info!(product_id = %product.id, name = %product.name, "Updated product");
    }

    info!("Update complete!");
    Ok(())
}

/// Mark a product inactive so the storefront stops listing it.
///
/// # Errors
///
/// Returns an error if the product does not exist or the write fails.
pub async fn deactivate(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = docstore_client()?;
    client.deactivate_product(&ProductId::new(id)).await?;
    info!(product_id = %id, "Product deactivated");
    Ok(())
}
