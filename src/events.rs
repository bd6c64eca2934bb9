//! Checkout lifecycle events.
//!
//! Consumers (audit logging, analytics, the order-history surface) subscribe
//! to the receiving half of the channel; the checkout core only emits. A full
//! or closed channel is logged and otherwise ignored so eventing can never
//! fail a checkout.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Events emitted by the checkout core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CheckoutStarted { session_id: Uuid },
    OrderCreated(Uuid),
    PaymentIntentCreated { order_id: Uuid },
    PaymentConfirmed { order_id: Uuid },
    CheckoutCompleted { order_id: Uuid },
    OrderCancelled(Uuid),
    CartCleared,
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a bounded event channel and the sender half wrapped for the
    /// checkout core.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Sends an event, reporting (not panicking on) a closed channel.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}
