//! Vitrine Core - Shared types library.
//!
//! This crate provides common types used across all Vitrine components:
//! - `storefront` - Public-facing shop API (catalog, cart, checkout)
//! - `cli` - Operator tools for sessions, catalog and stock management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, decimal prices, categories, products and site settings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
