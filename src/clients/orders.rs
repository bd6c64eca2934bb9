//! Backend order API client.
//!
//! The backend owns the authoritative order record. This client creates the
//! order (at most once per session, guarded by the checkout flow), confirms
//! or cancels it, and reads it back.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::OrderApiConfig;
use crate::errors::CheckoutError;
use crate::models::{CartLine, Order, ShippingDetails, ShippingMethod};

/// Payload for order creation. Totals are computed by the cost calculator
/// before any network call is made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub items: Vec<CartLine>,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub shipping_method: ShippingMethod,
    pub shipping_details: ShippingDetails,
}

#[derive(Debug, Deserialize)]
struct CreatedOrder {
    // the id is the only field the core relies on; everything else in the
    // response is advisory
    id: Uuid,
}

/// Operations the checkout core needs from the order backend.
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// Creates the order and returns the backend-assigned id.
    async fn create_order(&self, order: NewOrder) -> Result<Uuid, CheckoutError>;

    /// Marks the order paid. Idempotent on the backend; safe to call again.
    async fn confirm_payment(&self, order_id: Uuid) -> Result<(), CheckoutError>;

    /// Cancels the order. The backend rejects this unless the order is still
    /// in a cancellable status (PENDING or CONFIRMED).
    async fn cancel_order(&self, order_id: Uuid) -> Result<(), CheckoutError>;

    /// Reads the order back.
    async fn get_order(&self, order_id: Uuid) -> Result<Order, CheckoutError>;
}

/// HTTP implementation over the backend order endpoints.
#[derive(Clone)]
pub struct OrderApiClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl OrderApiClient {
    pub fn new(config: &OrderApiConfig) -> Result<Self, CheckoutError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CheckoutError::ExternalApi(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }
}

async fn rejection_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if body.is_empty() {
        format!("status {}", status)
    } else {
        format!("status {}: {}", status, body)
    }
}

#[async_trait]
impl OrderApi for OrderApiClient {
    #[instrument(skip(self, order), fields(total = %order.total_amount, items = order.items.len()))]
    async fn create_order(&self, order: NewOrder) -> Result<Uuid, CheckoutError> {
        let response = self
            .request(Method::POST, "/orders")
            .json(&order)
            .send()
            .await
            .map_err(|e| CheckoutError::OrderCreation(format!("order service unreachable: {}", e)))?;

        if !response.status().is_success() {
            let detail = rejection_detail(response).await;
            error!(%detail, "order service rejected the order");
            return Err(CheckoutError::OrderCreation(detail));
        }

        let created: CreatedOrder = response
            .json()
            .await
            .map_err(|e| CheckoutError::OrderCreation(format!("malformed create response: {}", e)))?;

        info!(order_id = %created.id, "order created");
        Ok(created.id)
    }

    #[instrument(skip(self))]
    async fn confirm_payment(&self, order_id: Uuid) -> Result<(), CheckoutError> {
        let response = self
            .request(Method::PATCH, &format!("/orders/{}/confirm-payment", order_id))
            .send()
            .await
            .map_err(|e| CheckoutError::Reconciliation(format!("order service unreachable: {}", e)))?;

        if !response.status().is_success() {
            let detail = rejection_detail(response).await;
            error!(%order_id, %detail, "payment confirmation rejected");
            return Err(CheckoutError::Reconciliation(detail));
        }

        info!(%order_id, "order marked paid");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn cancel_order(&self, order_id: Uuid) -> Result<(), CheckoutError> {
        let response = self
            .request(Method::PATCH, &format!("/orders/{}/cancel", order_id))
            .send()
            .await
            .map_err(|e| CheckoutError::ExternalApi(format!("order service unreachable: {}", e)))?;

        match response.status() {
            status if status.is_success() => {
                info!(%order_id, "order cancelled");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(CheckoutError::NotFound(format!(
                "order {} not found",
                order_id
            ))),
            _ => {
                let detail = rejection_detail(response).await;
                Err(CheckoutError::InvalidOperation(format!(
                    "order {} cannot be cancelled ({})",
                    order_id, detail
                )))
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_order(&self, order_id: Uuid) -> Result<Order, CheckoutError> {
        let response = self
            .request(Method::GET, &format!("/orders/{}", order_id))
            .send()
            .await
            .map_err(|e| CheckoutError::ExternalApi(format!("order service unreachable: {}", e)))?;

        match response.status() {
            status if status.is_success() => response
                .json()
                .await
                .map_err(|e| CheckoutError::ExternalApi(format!("malformed order response: {}", e))),
            StatusCode::NOT_FOUND => Err(CheckoutError::NotFound(format!(
                "order {} not found",
                order_id
            ))),
            _ => {
                let detail = rejection_detail(response).await;
                Err(CheckoutError::ExternalApi(detail))
            }
        }
    }
}
