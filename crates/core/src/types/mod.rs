//! Core types for Vitrine.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod id;
pub mod price;
pub mod product;
pub mod settings;

pub use category::{ALL_CATEGORIES, Category};
pub use id::*;
pub use price::{CurrencyCode, Price, format_amount};
pub use product::{ColorStock, MAX_PRODUCT_IMAGES, Product};
pub use settings::SiteSettings;
