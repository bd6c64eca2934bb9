//! Composition root.
//!
//! Wires the HTTP clients, picks the gateway implementation (real or
//! simulated) exactly once, and hands out the state machine plus the
//! confirmation handler sharing the same collaborators.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cart::CartAccess;
use crate::checkout::{
    CheckoutFlow, CheckoutSession, ConfirmationHandler, ConfirmationOutcome,
};
use crate::clients::orders::{OrderApi, OrderApiClient};
use crate::clients::payments::select_gateway;
use crate::config::AppConfig;
use crate::errors::CheckoutError;
use crate::events::{Event, EventSender};

pub struct CheckoutApp {
    pub flow: CheckoutFlow,
    pub handler: ConfirmationHandler,
}

impl CheckoutApp {
    /// Builds the checkout core from configuration. Returns the receiving
    /// half of the event channel for downstream consumers.
    pub fn from_config(
        config: &AppConfig,
        cart: Arc<dyn CartAccess>,
    ) -> Result<(Self, mpsc::Receiver<Event>), CheckoutError> {
        let (events, receiver) = EventSender::channel(64);

        let orders: Arc<dyn OrderApi> = Arc::new(OrderApiClient::new(&config.order_api)?);
        let gateway = select_gateway(&config.gateway, &config.order_api.base_url)?;

        let flow = CheckoutFlow::new(
            Arc::clone(&orders),
            Arc::clone(&gateway),
            Arc::clone(&cart),
            config.store.clone(),
            events.clone(),
        );
        let handler = ConfirmationHandler::new(orders, gateway, cart, events);

        Ok((Self { flow, handler }, receiver))
    }

    /// Embedded-widget completion path: reconciles the session's own payment
    /// attempt and moves the session step accordingly.
    pub async fn complete_payment(
        &self,
        session: &mut CheckoutSession,
    ) -> Result<ConfirmationOutcome, CheckoutError> {
        let ctx = self.flow.return_context(session)?;
        let outcome = self.handler.handle(ctx).await?;
        self.flow.apply_confirmation(session, &outcome);
        Ok(outcome)
    }
}
