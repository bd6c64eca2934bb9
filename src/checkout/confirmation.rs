//! Confirmation handler: the second entry point into the checkout core,
//! reached when the gateway's payment UI returns control (redirect or
//! embedded-widget completion). It reconciles the gateway's view of the
//! payment with the backend's view of the order.
//!
//! The one rule that must never bend: if the gateway says the payment
//! succeeded, the user is never told it failed, even when the backend
//! confirmation call itself fails.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::cart::CartAccess;
use crate::clients::orders::OrderApi;
use crate::clients::payments::PaymentGateway;
use crate::errors::CheckoutError;
use crate::events::{Event, EventSender};
use crate::models::PaymentIntentStatus;

/// What the gateway redirect (or widget callback) carried back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnContext {
    pub order_id: Uuid,
    pub client_secret: Option<String>,
}

/// User-visible result of reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationOutcome {
    /// Payment captured and order marked paid. Cart has been cleared.
    Completed { order_id: Uuid },
    /// Payment captured, but the backend confirmation failed. Cart has been
    /// cleared anyway; the user is pointed at support, never told the
    /// payment failed.
    CompletedNeedsSupport { order_id: Uuid, message: String },
    /// Gateway still processing. Non-terminal; cart untouched; the user
    /// should check order status later.
    Processing { order_id: Uuid },
    /// Terminal failure. Cart preserved so checkout can be retried without
    /// re-entering shipping.
    Failed { message: String },
}

#[derive(Clone)]
pub struct ConfirmationHandler {
    orders: Arc<dyn OrderApi>,
    gateway: Arc<dyn PaymentGateway>,
    cart: Arc<dyn CartAccess>,
    events: EventSender,
}

impl ConfirmationHandler {
    pub fn new(
        orders: Arc<dyn OrderApi>,
        gateway: Arc<dyn PaymentGateway>,
        cart: Arc<dyn CartAccess>,
        events: EventSender,
    ) -> Self {
        Self {
            orders,
            gateway,
            cart,
            events,
        }
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.events.send(event).await {
            warn!(error = %e, "failed to send confirmation event");
        }
    }

    /// Funds were captured; an unclearable cart must not block the success
    /// path.
    async fn clear_cart(&self) {
        match self.cart.clear().await {
            Ok(()) => self.emit(Event::CartCleared).await,
            Err(e) => warn!(error = %e, "failed to clear cart after successful payment"),
        }
    }

    /// Reconciles one returned payment attempt.
    ///
    /// The status poll happens exactly once; a transport failure here is
    /// returned as an error for the user to see, not silently retried — the
    /// gateway-side outcome is already decided and re-polling cannot change
    /// it.
    #[instrument(skip(self, ctx), fields(order_id = %ctx.order_id))]
    pub async fn handle(&self, ctx: ReturnContext) -> Result<ConfirmationOutcome, CheckoutError> {
        let client_secret = match ctx.client_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => secret.to_string(),
            _ => {
                warn!("return context carried no client secret");
                return Ok(ConfirmationOutcome::Failed {
                    message: "Invalid payment session.".to_string(),
                });
            }
        };

        let status = self.gateway.retrieve_intent_status(&client_secret).await?;
        info!(?status, "gateway reported intent status");

        match status {
            PaymentIntentStatus::Succeeded => {
                match self.orders.confirm_payment(ctx.order_id).await {
                    Ok(()) => {
                        self.emit(Event::PaymentConfirmed {
                            order_id: ctx.order_id,
                        })
                        .await;
                        self.clear_cart().await;
                        self.emit(Event::CheckoutCompleted {
                            order_id: ctx.order_id,
                        })
                        .await;
                        Ok(ConfirmationOutcome::Completed {
                            order_id: ctx.order_id,
                        })
                    }
                    Err(e) => {
                        // Funds were captured. The cart is still cleared and
                        // the user is never shown a payment failure.
                        error!(error = %e, "backend confirmation failed after gateway success");
                        self.clear_cart().await;
                        Ok(ConfirmationOutcome::CompletedNeedsSupport {
                            order_id: ctx.order_id,
                            message: "Your payment was received, but we couldn't finalize \
                                      your order. Please contact support."
                                .to_string(),
                        })
                    }
                }
            }
            PaymentIntentStatus::Processing => Ok(ConfirmationOutcome::Processing {
                order_id: ctx.order_id,
            }),
            PaymentIntentStatus::RequiresPaymentMethod | PaymentIntentStatus::Failed => {
                Ok(ConfirmationOutcome::Failed {
                    message: "Payment was not completed. Your cart has been kept so you \
                              can try again."
                        .to_string(),
                })
            }
        }
    }
}
