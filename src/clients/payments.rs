//! Payment gateway client.
//!
//! Two implementations of the same trait, selected once at composition time:
//! the hosted gateway (real credentials) and a simulated gateway (no usable
//! credentials, development only). The state machine never branches on which
//! one it holds.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::errors::{CheckoutError, PaymentInitError};
use crate::models::PaymentIntentStatus;

/// Operations the checkout core needs from the payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Requests one authorization token (client secret) scoped to the
    /// order's current total. Intent creation goes through the backend,
    /// which holds the gateway's secret key.
    async fn create_payment_intent(&self, order_id: Uuid) -> Result<String, CheckoutError>;

    /// Polls the intent status once, after the payment UI returns control.
    /// No retry loop: the gateway-side outcome is already decided.
    async fn retrieve_intent_status(
        &self,
        client_secret: &str,
    ) -> Result<PaymentIntentStatus, CheckoutError>;

    /// True only for the development stub.
    fn is_simulated(&self) -> bool {
        false
    }
}

#[derive(Debug, Deserialize)]
struct CreatedIntent {
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct IntentState {
    status: PaymentIntentStatus,
}

/// Client for a hosted payment gateway with a Stripe-shaped API.
///
/// Intent creation is proxied through the backend (`POST /payment-intents`);
/// status retrieval goes straight to the gateway using the publishable key
/// and the client secret.
#[derive(Debug)]
pub struct HostedGateway {
    http: reqwest::Client,
    api_base: String,
    gateway_base: String,
    publishable_key: String,
}

impl HostedGateway {
    pub fn new(config: &GatewayConfig, order_api_base: &str) -> Result<Self, CheckoutError> {
        let key = config
            .usable_key()
            .ok_or(CheckoutError::PaymentInit(PaymentInitError::Misconfigured))?
            .to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                CheckoutError::PaymentInit(PaymentInitError::Transient(format!(
                    "failed to build HTTP client: {}",
                    e
                )))
            })?;

        Ok(Self {
            http,
            api_base: order_api_base.trim_end_matches('/').to_string(),
            gateway_base: config.base_url.trim_end_matches('/').to_string(),
            publishable_key: key,
        })
    }

    /// The intent id is the client-secret prefix before `_secret_`.
    fn intent_id(client_secret: &str) -> Result<&str, CheckoutError> {
        client_secret
            .split("_secret_")
            .next()
            .filter(|id| !id.is_empty() && *id != client_secret)
            .ok_or_else(|| {
                CheckoutError::ExternalApi("client secret has no intent id prefix".to_string())
            })
    }
}

#[async_trait]
impl PaymentGateway for HostedGateway {
    #[instrument(skip(self))]
    async fn create_payment_intent(&self, order_id: Uuid) -> Result<String, CheckoutError> {
        let response = self
            .http
            .post(format!("{}/payment-intents", self.api_base))
            .json(&json!({ "order_id": order_id }))
            .send()
            .await
            .map_err(|e| {
                CheckoutError::PaymentInit(PaymentInitError::Transient(format!(
                    "payment service unreachable: {}",
                    e
                )))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CheckoutError::PaymentInit(PaymentInitError::Transient(
                format!("intent creation rejected (status {}): {}", status, body),
            )));
        }

        let created: CreatedIntent = response.json().await.map_err(|e| {
            CheckoutError::PaymentInit(PaymentInitError::Transient(format!(
                "malformed intent response: {}",
                e
            )))
        })?;

        info!(%order_id, "payment intent created");
        Ok(created.client_secret)
    }

    #[instrument(skip(self, client_secret))]
    async fn retrieve_intent_status(
        &self,
        client_secret: &str,
    ) -> Result<PaymentIntentStatus, CheckoutError> {
        let intent_id = Self::intent_id(client_secret)?;

        let response = self
            .http
            .get(format!("{}/v1/payment_intents/{}", self.gateway_base, intent_id))
            .query(&[("client_secret", client_secret)])
            .basic_auth(&self.publishable_key, Option::<&str>::None)
            .send()
            .await
            .map_err(|e| CheckoutError::ExternalApi(format!("gateway unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(CheckoutError::ExternalApi(format!(
                "payment status check failed (status {})",
                status
            )));
        }

        let state: IntentState = response
            .json()
            .await
            .map_err(|e| CheckoutError::ExternalApi(format!("malformed status response: {}", e)))?;

        Ok(state.status)
    }
}

/// Development stub: issues synthetic secrets and reports every payment as
/// succeeded, so the confirmation path marks the order paid without touching
/// a real gateway. Selected only when no usable credentials exist.
#[derive(Debug, Default)]
pub struct SimulatedGateway;

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn create_payment_intent(&self, order_id: Uuid) -> Result<String, CheckoutError> {
        let secret = format!(
            "sim_{}_secret_{}",
            order_id.simple(),
            Uuid::new_v4().simple()
        );
        info!(%order_id, "issued simulated payment intent");
        Ok(secret)
    }

    async fn retrieve_intent_status(
        &self,
        _client_secret: &str,
    ) -> Result<PaymentIntentStatus, CheckoutError> {
        Ok(PaymentIntentStatus::Succeeded)
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Picks the gateway implementation once, at composition time. Simulation is
/// reachable only when no usable credentials are present.
pub fn select_gateway(
    config: &GatewayConfig,
    order_api_base: &str,
) -> Result<std::sync::Arc<dyn PaymentGateway>, CheckoutError> {
    match config.usable_key() {
        Some(_) => Ok(std::sync::Arc::new(HostedGateway::new(config, order_api_base)?)),
        None => {
            warn!("no payment gateway credentials configured; payments will be simulated");
            Ok(std::sync::Arc::new(SimulatedGateway))
        }
    }
}
