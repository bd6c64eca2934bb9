use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CheckoutError;
use crate::models::{CartSnapshot, ShippingDetails, ShippingMethod};

/// Where the session currently sits. `Shipping` and `Payment` are the
/// user-editable steps; `Awaiting` and `Complete` are reached only after the
/// gateway has reported on a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutStep {
    Shipping,
    Payment,
    Awaiting,
    Complete,
}

/// One user's attempt to convert a cart into a paid order.
///
/// Created for a non-empty cart and a verified identity; abandoned by
/// dropping it; completed when the confirmation handler marks the order
/// paid. `order_id` is the idempotency anchor: it is assigned exactly once
/// and never reassigned, no matter how many times the user retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: Uuid,
    /// Cart contents frozen at session start.
    pub cart: CartSnapshot,
    pub shipping: ShippingDetails,
    pub shipping_method: ShippingMethod,
    pub step: CheckoutStep,
    order_id: Option<Uuid>,
    /// Gateway token for the current payment attempt. Discarded on a failed
    /// attempt or when backing out to shipping; the order id is not.
    pub client_secret: Option<String>,
    /// Message for the dismissible error banner, if the last action failed.
    pub last_error: Option<String>,
    /// True while a network call is outstanding; the triggering UI action is
    /// disabled, and the flow refuses a second call regardless.
    pub busy: bool,
}

impl CheckoutSession {
    pub fn new(cart: CartSnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            cart,
            shipping: ShippingDetails::default(),
            shipping_method: ShippingMethod::default(),
            step: CheckoutStep::Shipping,
            order_id: None,
            client_secret: None,
            last_error: None,
            busy: false,
        }
    }

    pub fn order_id(&self) -> Option<Uuid> {
        self.order_id
    }

    /// Sets the order id exactly once. A second assignment means the
    /// idempotency guard was bypassed and is rejected.
    pub fn assign_order_id(&mut self, order_id: Uuid) -> Result<(), CheckoutError> {
        if let Some(existing) = self.order_id {
            return Err(CheckoutError::InvalidOperation(format!(
                "session already has order {}; refusing to assign {}",
                existing, order_id
            )));
        }
        self.order_id = Some(order_id);
        Ok(())
    }
}
