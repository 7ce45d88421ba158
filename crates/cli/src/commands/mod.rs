//! Subcommand implementations.

pub mod catalog;
pub mod migrate;
pub mod settings;
pub mod stock;

use vitrine_storefront::config::DocStoreConfig;
use vitrine_storefront::docstore::DocumentStoreClient;

/// Build a document store client from `DOCSTORE_*` environment variables.
pub(crate) fn docstore_client() -> Result<DocumentStoreClient, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = DocStoreConfig::from_env()?;
    Ok(DocumentStoreClient::new(&config)?)
}
