//! Session-related types.
//!
//! The cart lives in the visitor's session. It survives reloads and server
//! restarts for as long as the session cookie does.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;

use crate::commerce::Cart;

/// Session keys for storefront data.
pub mod keys {
    /// Key for the visitor's cart lines.
    pub const CART: &str = "cart";
}

/// How long an idle session keeps its cart lock around.
const LOCK_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const LOCK_CAPACITY: u64 = 10_000;

/// Failure reading or writing the stored cart.
#[derive(Debug, Error)]
#[error("cart storage error: {0}")]
pub struct CartStorageError(String);

impl From<SessionError> for CartStorageError {
    fn from(err: SessionError) -> Self {
        Self(err.to_string())
    }
}

/// Durable per-visitor cart storage.
#[async_trait]
pub trait CartStorage: Send + Sync {
    /// Load the stored cart. A missing or unreadable cart loads as empty.
    async fn load_cart(&self) -> Result<Cart, CartStorageError>;

    /// Persist the cart.
    async fn save_cart(&self, cart: &Cart) -> Result<(), CartStorageError>;

    /// Drop the stored cart.
    async fn clear_cart(&self) -> Result<(), CartStorageError>;
}

#[async_trait]
impl CartStorage for Session {
    async fn load_cart(&self) -> Result<Cart, CartStorageError> {
        match self.get::<Cart>(keys::CART).await {
            Ok(cart) => Ok(cart.unwrap_or_default()),
            Err(SessionError::SerdeJson(e)) => {
                tracing::warn!(error = %e, "Discarding unreadable stored cart");
                Ok(Cart::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), CartStorageError> {
        if cart.is_empty() {
            return self.clear_cart().await;
        }
        self.insert(keys::CART, cart).await?;
        Ok(())
    }

    async fn clear_cart(&self) -> Result<(), CartStorageError> {
        self.remove_value(keys::CART).await?;
        Ok(())
    }
}

/// Per-session locks that serialize cart mutations.
///
/// A load-mutate-save cycle spans an await on the catalog, and the session
/// layer writes the record back only after the handler returns. The lock is
/// taken outside the session layer (see `cart_lock_middleware`) so that both
/// the handler and the store write happen while it is held.
#[derive(Clone)]
pub struct CartLocks {
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl Default for CartLocks {
    fn default() -> Self {
        Self {
            locks: Cache::builder()
                .max_capacity(LOCK_CAPACITY)
                .time_to_idle(LOCK_IDLE_TIMEOUT)
                .build(),
        }
    }
}

impl std::fmt::Debug for CartLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartLocks")
            .field("sessions", &self.locks.entry_count())
            .finish()
    }
}

impl CartLocks {
    /// Wait for exclusive access to the cart stored under `session_id`.
    pub async fn lock(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .get_with_by_ref(session_id, async { Arc::new(Mutex::new(())) })
            .await;
        mutex.lock_owned().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use tower_sessions::MemoryStore;
    use vitrine_core::ProductId;

    use super::*;
    use crate::commerce::ProductSnapshot;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn one_line_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(
            &ProductId::new("p1"),
            "Azul",
            2,
            ProductSnapshot {
                name: "Top X".to_owned(),
                price: Decimal::new(15, 0),
                image: "a.jpg".to_owned(),
            },
        )
        .unwrap();
        cart
    }

    #[tokio::test]
    async fn test_new_session_loads_empty_cart() {
        assert!(session().load_cart().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_saved_cart_loads_back() {
        let session = session();
        let cart = one_line_cart();
        session.save_cart(&cart).await.unwrap();
        assert_eq!(session.load_cart().await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_unreadable_cart_loads_empty() {
        let session = session();
        session.insert(keys::CART, "not a cart").await.unwrap();
        assert!(session.load_cart().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_saving_empty_cart_clears_key() {
        let session = session();
        session.save_cart(&one_line_cart()).await.unwrap();
        session.save_cart(&Cart::new()).await.unwrap();
        assert!(session.get::<Cart>(keys::CART).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lock_is_exclusive_per_session() {
        let locks = CartLocks::default();
        let held = locks.lock("visitor-a").await;

        let same = tokio::time::timeout(Duration::from_millis(50), locks.lock("visitor-a")).await;
        assert!(same.is_err());

        let other = tokio::time::timeout(Duration::from_millis(50), locks.lock("visitor-b")).await;
        assert!(other.is_ok());

        drop(held);
        let reacquired =
            tokio::time::timeout(Duration::from_millis(50), locks.lock("visitor-a")).await;
        assert!(reacquired.is_ok());
    }
}
