//! Client for the hosted document database that holds the catalog.
//!
//! # Architecture
//!
//! - REST API with typed field values (see [`value`])
//! - The store is the source of truth; reads are cached by
//!   [`CatalogStore`](crate::catalog::CatalogStore), not here
//! - Documents are normalized into the typed schema at this boundary
//!   (see [`conversions`])
//!
//! # Example
//!
//! ```rust,ignore
//! use vitrine_storefront::docstore::DocumentStoreClient;
//!
//! let client = DocumentStoreClient::new(&config.docstore)?;
//! let product = client.get_product(&ProductId::new("abc123")).await?;
//! client.decrement_stock(&product.id, "Rosa", 2).await?;
//! ```

mod client;
pub mod conversions;
pub mod queries;
pub mod value;

pub use client::DocumentStoreClient;

use thiserror::Error;
use vitrine_core::ProductId;

use crate::catalog::CatalogError;
use value::ValueError;

/// Errors that can occur when talking to the document store.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A write precondition (document exists, unchanged since read) did not hold.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Store answered with a non-success status.
    #[error("Store returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A typed field value could not be decoded.
    #[error("Value error: {0}")]
    Value(#[from] ValueError),
}

impl From<DocumentStoreError> for CatalogError {
    fn from(err: DocumentStoreError) -> Self {
        match err {
            DocumentStoreError::NotFound(path) => {
                let id = path.rsplit('/').next().unwrap_or(&path);
                Self::NotFound(ProductId::new(id))
            }
            other => Self::Unavailable(other.to_string()),
        }
    }
}
