//! Shared test doubles for the checkout suites: a recording order API, a
//! scriptable gateway, and cart/shipping fixtures.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use storefront_checkout::clients::orders::{NewOrder, OrderApi};
use storefront_checkout::clients::payments::PaymentGateway;
use storefront_checkout::errors::{CheckoutError, PaymentInitError};
use storefront_checkout::models::{
    CartLine, CartSnapshot, Order, OrderStatus, PaymentIntentStatus, ShippingDetails,
};
use storefront_checkout::{EventSender, StoreSettings};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("storefront_checkout=debug")
        .with_test_writer()
        .try_init();
}

pub fn test_settings() -> StoreSettings {
    StoreSettings::default()
}

pub fn test_events() -> EventSender {
    // capacity large enough that unconsumed events never block a test
    let (events, receiver) = EventSender::channel(256);
    // keep the receiver alive for the lifetime of the test process
    Box::leak(Box::new(receiver));
    events
}

pub fn cart_with_subtotal(subtotal: Decimal) -> CartSnapshot {
    CartSnapshot {
        lines: vec![CartLine {
            product_id: Uuid::new_v4(),
            name: "Linen Shirt".to_string(),
            unit_price: subtotal,
            quantity: 1,
            size: Some("M".to_string()),
            color: Some("white".to_string()),
            line_subtotal: subtotal,
        }],
        total_amount: subtotal,
    }
}

pub fn sample_cart() -> CartSnapshot {
    cart_with_subtotal(dec!(45))
}

pub fn valid_shipping() -> ShippingDetails {
    ShippingDetails {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: "jane.doe@example.com".to_string(),
        address: "123 Main Street".to_string(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        zip_code: "62704".to_string(),
        phone: "+1 (217) 555-0142".to_string(),
    }
}

/// Order API double that records every call and can be told to fail.
pub struct RecordingOrderApi {
    pub created: Mutex<Vec<NewOrder>>,
    pub confirmed: Mutex<Vec<Uuid>>,
    pub cancelled: Mutex<Vec<Uuid>>,
    pub fail_create: AtomicBool,
    pub fail_confirm: AtomicBool,
    pub status: Mutex<OrderStatus>,
}

impl RecordingOrderApi {
    pub fn new() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            confirmed: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            fail_create: AtomicBool::new(false),
            fail_confirm: AtomicBool::new(false),
            status: Mutex::new(OrderStatus::Pending),
        }
    }

    pub fn with_status(status: OrderStatus) -> Self {
        let api = Self::new();
        *api.status.lock().unwrap() = status;
        api
    }

    pub fn create_calls(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn confirm_calls(&self) -> usize {
        self.confirmed.lock().unwrap().len()
    }

    pub fn current_status(&self) -> OrderStatus {
        *self.status.lock().unwrap()
    }
}

#[async_trait]
impl OrderApi for RecordingOrderApi {
    async fn create_order(&self, order: NewOrder) -> Result<Uuid, CheckoutError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(CheckoutError::OrderCreation(
                "stock no longer available".to_string(),
            ));
        }
        self.created.lock().unwrap().push(order);
        Ok(Uuid::new_v4())
    }

    async fn confirm_payment(&self, order_id: Uuid) -> Result<(), CheckoutError> {
        if self.fail_confirm.load(Ordering::SeqCst) {
            return Err(CheckoutError::Reconciliation(
                "order service unavailable".to_string(),
            ));
        }
        self.confirmed.lock().unwrap().push(order_id);
        *self.status.lock().unwrap() = OrderStatus::Confirmed;
        Ok(())
    }

    async fn cancel_order(&self, order_id: Uuid) -> Result<(), CheckoutError> {
        let mut status = self.status.lock().unwrap();
        if !status.is_cancellable() {
            return Err(CheckoutError::InvalidOperation(format!(
                "order {} cannot be cancelled from {}",
                order_id, status
            )));
        }
        *status = OrderStatus::Cancelled;
        self.cancelled.lock().unwrap().push(order_id);
        Ok(())
    }

    async fn get_order(&self, order_id: Uuid) -> Result<Order, CheckoutError> {
        Ok(Order {
            id: order_id,
            status: *self.status.lock().unwrap(),
            total_amount: dec!(53.59),
            currency: "USD".to_string(),
            created_at: Utc::now(),
        })
    }
}

/// Gateway double: counts intents and serves a scripted status.
pub struct ScriptedGateway {
    pub intents: AtomicUsize,
    pub fail_create: AtomicBool,
    pub fail_retrieve: AtomicBool,
    pub next_status: Mutex<PaymentIntentStatus>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self {
            intents: AtomicUsize::new(0),
            fail_create: AtomicBool::new(false),
            fail_retrieve: AtomicBool::new(false),
            next_status: Mutex::new(PaymentIntentStatus::Succeeded),
        }
    }
}

impl ScriptedGateway {
    pub fn reporting(status: PaymentIntentStatus) -> Self {
        let gateway = Self::default();
        *gateway.next_status.lock().unwrap() = status;
        gateway
    }

    pub fn intent_calls(&self) -> usize {
        self.intents.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_payment_intent(&self, order_id: Uuid) -> Result<String, CheckoutError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(CheckoutError::PaymentInit(PaymentInitError::Transient(
                "gateway timed out".to_string(),
            )));
        }
        let n = self.intents.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("pi_{}_{}_secret_test", order_id.simple(), n))
    }

    async fn retrieve_intent_status(
        &self,
        _client_secret: &str,
    ) -> Result<PaymentIntentStatus, CheckoutError> {
        if self.fail_retrieve.load(Ordering::SeqCst) {
            return Err(CheckoutError::ExternalApi(
                "payment status check failed".to_string(),
            ));
        }
        Ok(*self.next_status.lock().unwrap())
    }
}
