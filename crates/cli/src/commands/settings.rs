//! Site settings commands.
//!
//! # Usage
//!
//! ```bash
//! # Print the current settings as YAML
//! vt-cli settings show > settings.yaml
//!
//! # Edit, then write them back
//! vt-cli settings set settings.yaml
//! ```
//!
//! Missing keys in the file fall back to the storefront defaults.

use std::path::Path;

use tracing::{info, warn};
use vitrine_core::SiteSettings;
use vitrine_storefront::catalog::CatalogSource;

use super::docstore_client;

/// Print the stored site settings as YAML.
///
/// # Errors
///
/// Returns an error if the store is unreachable.
pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let client = docstore_client()?;
    let settings = client.get_site_settings().await?;
    let yaml = serde_yaml::to_string(&settings)?;

    #[allow(clippy::print_stdout)]
    {
        print!("{yaml}");
    }
    Ok(())
}

/// Replace the site settings with the contents of a YAML file.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or the write fails.
pub async fn set(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    let content = tokio::fs::read_to_string(path).await?;
    let settings: SiteSettings = serde_yaml::from_str(&content)?;
    if settings.order_recipient().is_none() {
        warn!("whatsappNumber is empty; checkout will be unavailable");
    }

    let client = docstore_client()?;
    client.save_site_settings(&settings).await?;

    info!("Site settings saved");
    Ok(())
}
