//! Injected cart capability.
//!
//! The cart/wishlist stores live outside this core. Checkout only needs two
//! things from them: a read-only snapshot at the start of an attempt, and a
//! `clear` once payment has succeeded. Modeling both as a trait keeps the
//! core free of process-wide singletons.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::CheckoutError;
use crate::models::CartSnapshot;

#[async_trait]
pub trait CartAccess: Send + Sync {
    /// Current cart contents. Taken once when a checkout session begins and
    /// held immutable for the duration of the attempt.
    async fn snapshot(&self) -> CartSnapshot;

    /// Empties the cart. Called only after the gateway has reported a
    /// successful payment.
    async fn clear(&self) -> Result<(), CheckoutError>;
}

/// Lock-backed cart, used in tests and single-process composition.
#[derive(Debug, Default)]
pub struct InMemoryCart {
    inner: RwLock<CartSnapshot>,
}

impl InMemoryCart {
    pub fn new(snapshot: CartSnapshot) -> Self {
        Self {
            inner: RwLock::new(snapshot),
        }
    }
}

#[async_trait]
impl CartAccess for InMemoryCart {
    async fn snapshot(&self) -> CartSnapshot {
        self.inner.read().await.clone()
    }

    async fn clear(&self) -> Result<(), CheckoutError> {
        *self.inner.write().await = CartSnapshot::default();
        Ok(())
    }
}
