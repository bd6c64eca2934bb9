//! The checkout state machine.
//!
//! ```text
//! Shipping --(validate ok, create/reuse order, fresh intent)--> Payment
//! Payment  --(user backs out)--> Shipping      [secret discarded, order kept]
//! Payment  --(gateway: succeeded)--> Complete
//! Payment  --(gateway: processing)--> Awaiting
//! Payment  --(gateway: failure)--> Payment     [secret cleared, retry allowed]
//! ```
//!
//! The load-bearing guarantee: one session never creates more than one
//! backend order. Retrying "proceed to payment" re-validates shipping and
//! requests a fresh intent, but reuses the stored order id.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::cart::CartAccess;
use crate::checkout::confirmation::{ConfirmationOutcome, ReturnContext};
use crate::checkout::session::{CheckoutSession, CheckoutStep};
use crate::clients::orders::{NewOrder, OrderApi};
use crate::clients::payments::PaymentGateway;
use crate::config::StoreSettings;
use crate::errors::CheckoutError;
use crate::events::{Event, EventSender};
use crate::models::{CostBreakdown, PaymentIntentStatus, ShippingDetails, ShippingMethod};
use crate::pricing::compute_totals;
use crate::validation::validate_shipping;

#[derive(Clone)]
pub struct CheckoutFlow {
    orders: Arc<dyn OrderApi>,
    gateway: Arc<dyn PaymentGateway>,
    cart: Arc<dyn CartAccess>,
    settings: StoreSettings,
    events: EventSender,
}

impl CheckoutFlow {
    pub fn new(
        orders: Arc<dyn OrderApi>,
        gateway: Arc<dyn PaymentGateway>,
        cart: Arc<dyn CartAccess>,
        settings: StoreSettings,
        events: EventSender,
    ) -> Self {
        Self {
            orders,
            gateway,
            cart,
            settings,
            events,
        }
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.events.send(event).await {
            warn!(error = %e, "failed to send checkout event");
        }
    }

    /// Starts a session from the current cart. Refuses an empty cart.
    #[instrument(skip(self))]
    pub async fn begin(&self) -> Result<CheckoutSession, CheckoutError> {
        let snapshot = self.cart.snapshot().await;
        if snapshot.is_empty() {
            return Err(CheckoutError::InvalidOperation(
                "cannot start checkout with an empty cart".to_string(),
            ));
        }

        let session = CheckoutSession::new(snapshot);
        info!(session_id = %session.id, "checkout session started");
        self.emit(Event::CheckoutStarted {
            session_id: session.id,
        })
        .await;
        Ok(session)
    }

    /// Applies shipping form input. Only legal on the shipping step.
    pub fn update_shipping(
        &self,
        session: &mut CheckoutSession,
        details: ShippingDetails,
        method: ShippingMethod,
    ) -> Result<(), CheckoutError> {
        if session.step != CheckoutStep::Shipping {
            return Err(CheckoutError::InvalidOperation(
                "shipping details can only be edited on the shipping step".to_string(),
            ));
        }
        session.shipping = details;
        session.shipping_method = method;
        Ok(())
    }

    /// Current cost breakdown for the session's cart and shipping method.
    pub fn totals(&self, session: &CheckoutSession) -> CostBreakdown {
        compute_totals(&session.cart, session.shipping_method, &self.settings)
    }

    /// Shipping -> Payment.
    ///
    /// Creates the backend order only if the session has none yet, then
    /// always requests a fresh payment intent (a previous one may have
    /// expired, or the total may have changed with the shipping method).
    /// Any failure sets `last_error` and leaves the step unchanged; shipping
    /// fields are never cleared.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub async fn proceed_to_payment(
        &self,
        session: &mut CheckoutSession,
    ) -> Result<(), CheckoutError> {
        if session.busy {
            return Err(CheckoutError::RequestInFlight);
        }
        if session.step != CheckoutStep::Shipping {
            return Err(CheckoutError::InvalidOperation(format!(
                "cannot proceed to payment from {:?}",
                session.step
            )));
        }

        // Validation happens before any network call and before the busy
        // flag, so a rejected form never blocks a retry.
        if let Err(errors) = validate_shipping(&session.shipping) {
            let err = CheckoutError::Validation(errors);
            session.last_error = Some(err.user_message());
            return Err(err);
        }

        session.busy = true;
        let result = self.advance_to_payment(session).await;
        session.busy = false;

        match result {
            Ok(()) => {
                session.step = CheckoutStep::Payment;
                session.last_error = None;
                Ok(())
            }
            Err(err) => {
                session.last_error = Some(err.user_message());
                Err(err)
            }
        }
    }

    async fn advance_to_payment(
        &self,
        session: &mut CheckoutSession,
    ) -> Result<(), CheckoutError> {
        let totals = self.totals(session);

        let order_id = match session.order_id() {
            Some(existing) => {
                debug!(order_id = %existing, "reusing existing order for retry");
                existing
            }
            None => {
                let order = NewOrder {
                    items: session.cart.lines.clone(),
                    shipping_cost: totals.shipping,
                    total_amount: totals.total,
                    shipping_method: session.shipping_method,
                    shipping_details: session.shipping.clone(),
                };
                let id = self.orders.create_order(order).await?;
                session.assign_order_id(id)?;
                self.emit(Event::OrderCreated(id)).await;
                id
            }
        };

        // Always a fresh intent on (re)entry to payment.
        let secret = self.gateway.create_payment_intent(order_id).await?;
        session.client_secret = Some(secret);
        self.emit(Event::PaymentIntentCreated { order_id }).await;
        Ok(())
    }

    /// Payment -> Shipping. The client secret is discarded; the order id is
    /// retained so a later retry reuses it.
    pub fn back_to_shipping(&self, session: &mut CheckoutSession) -> Result<(), CheckoutError> {
        if session.step != CheckoutStep::Payment {
            return Err(CheckoutError::InvalidOperation(format!(
                "cannot return to shipping from {:?}",
                session.step
            )));
        }
        session.client_secret = None;
        session.last_error = None;
        session.step = CheckoutStep::Shipping;
        Ok(())
    }

    /// Applies a gateway-reported payment result to the session step.
    pub fn apply_gateway_outcome(
        &self,
        session: &mut CheckoutSession,
        status: PaymentIntentStatus,
    ) -> Result<(), CheckoutError> {
        if !matches!(session.step, CheckoutStep::Payment | CheckoutStep::Awaiting) {
            return Err(CheckoutError::InvalidOperation(format!(
                "no payment attempt to resolve from {:?}",
                session.step
            )));
        }
        match status {
            PaymentIntentStatus::Succeeded => {
                session.step = CheckoutStep::Complete;
                session.last_error = None;
            }
            PaymentIntentStatus::Processing => {
                session.step = CheckoutStep::Awaiting;
            }
            PaymentIntentStatus::RequiresPaymentMethod | PaymentIntentStatus::Failed => {
                session.client_secret = None;
                session.last_error =
                    Some("Payment was not completed. Please try again.".to_string());
            }
        }
        Ok(())
    }

    /// Builds the return context the confirmation handler expects, from the
    /// session's own order id and client secret (embedded-widget path).
    pub fn return_context(&self, session: &CheckoutSession) -> Result<ReturnContext, CheckoutError> {
        let order_id = session.order_id().ok_or_else(|| {
            CheckoutError::InvalidOperation("no order exists for this session".to_string())
        })?;
        Ok(ReturnContext {
            order_id,
            client_secret: session.client_secret.clone(),
        })
    }

    /// Applies a confirmation outcome to the session step.
    pub fn apply_confirmation(&self, session: &mut CheckoutSession, outcome: &ConfirmationOutcome) {
        match outcome {
            ConfirmationOutcome::Completed { .. }
            | ConfirmationOutcome::CompletedNeedsSupport { .. } => {
                session.step = CheckoutStep::Complete;
                session.last_error = None;
            }
            ConfirmationOutcome::Processing { .. } => {
                session.step = CheckoutStep::Awaiting;
            }
            ConfirmationOutcome::Failed { message } => {
                session.client_secret = None;
                session.last_error = Some(message.clone());
            }
        }
    }

    /// Cancels the session's order. The backend enforces that only orders
    /// still in a cancellable status (PENDING/CONFIRMED) can be cancelled.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub async fn cancel_order(&self, session: &CheckoutSession) -> Result<(), CheckoutError> {
        let order_id = session.order_id().ok_or_else(|| {
            CheckoutError::NotFound("no order exists for this session".to_string())
        })?;
        self.orders.cancel_order(order_id).await?;
        self.emit(Event::OrderCancelled(order_id)).await;
        Ok(())
    }
}
