//! Session-scoped models for storefront.

pub mod session;

pub use session::{CartLocks, CartStorage, CartStorageError, keys as session_keys};
