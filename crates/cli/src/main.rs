//! Vitrine CLI - Session migrations and catalog management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table
//! vt-cli migrate
//!
//! # List active products in a category
//! vt-cli catalog list --category tops
//!
//! # Import products from a YAML file
//! vt-cli catalog import products.yaml
//!
//! # Set the stock of one colour
//! vt-cli stock set <product-id> Azul 12
//! ```
//!
//! # Commands
//!
//! - `migrate` - Create the `tower_sessions` schema
//! - `catalog` - List, import, update and deactivate products
//! - `stock` - Set or remove colour stock
//! - `settings` - Show or replace the site settings

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vt-cli")]
#[command(author, version, about = "Vitrine CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run session store migrations
    Migrate,
    /// Manage catalog products
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Manage per-colour stock
    Stock {
        #[command(subcommand)]
        action: StockAction,
    },
    /// Manage site settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products
    List {
        /// Only show this category (`all` for every category)
        #[arg(short, long)]
        category: Option<String>,

        /// Include inactive products
        #[arg(short, long)]
        all: bool,
    },
    /// Create products from a YAML file
    Import {
        /// Path to the YAML product list
        file: String,
    },
    /// Overwrite existing products from a YAML file
    Update {
        /// Path to the YAML product list; every entry needs an `id`
        file: String,
    },
    /// Hide a product from the storefront
    Deactivate {
        /// Product ID
        id: String,
    },
}

#[derive(Subcommand)]
enum StockAction {
    /// Set the stock of one colour
    Set {
        /// Product ID
        product: String,

        /// Colour name (exact match)
        color: String,

        /// New stock count
        stock: u32,

        /// Swatch code, required when adding a new colour
        #[arg(long)]
        code: Option<String>,
    },
    /// Remove a colour from a product
    RemoveColor {
        /// Product ID
        product: String,

        /// Colour name (exact match)
        color: String,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current site settings as YAML
    Show,
    /// Replace the site settings from a YAML file
    Set {
        /// Path to the YAML settings file
        file: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::sessions().await?,
        Commands::Catalog { action } => match action {
            CatalogAction::List { category, all } => {
                commands::catalog::list(category.as_deref(), all).await?;
            }
            CatalogAction::Import { file } => commands::catalog::import(&file).await?,
            CatalogAction::Update { file } => commands::catalog::update(&file).await?,
            CatalogAction::Deactivate { id } => commands::catalog::deactivate(&id).await?,
        },
        Commands::Stock { action } => match action {
            StockAction::Set {
                product,
                color,
                stock,
                code,
            } => commands::stock::set(&product, &color, stock, code.as_deref()).await?,
            StockAction::RemoveColor { product, color } => {
                commands::stock::remove_color(&product, &color).await?;
            }
        },
        Commands::Settings { action } => match action {
            SettingsAction::Show => commands::settings::show().await?,
            SettingsAction::Set { file } => commands::settings::set(&file).await?,
        },
    }
    Ok(())
}
