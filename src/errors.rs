use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Per-field validation failures, keyed by the form field name.
///
/// Every violated field is present; the map is ordered so error lists render
/// deterministically in the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// Failure to initialize a payment intent.
///
/// `Misconfigured` means no usable gateway credentials exist; the composition
/// root reacts by selecting the simulated gateway, so this never reaches the
/// user as an error. `Transient` is a retryable gateway/network failure; the
/// session's `order_id` is preserved across the retry.
#[derive(Debug, Error)]
pub enum PaymentInitError {
    #[error("payment gateway is not configured")]
    Misconfigured,

    #[error("payment gateway unavailable: {0}")]
    Transient(String),
}

/// Error taxonomy for the checkout core.
///
/// No variant is fatal: every error leaves the session in a state the user
/// can retry from without losing entered data.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Field-level validation failure. Recovered locally; never sent to the
    /// network layer.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// The backend rejected or failed the order-creation call. Retryable
    /// from the shipping step; no partial state is retained.
    #[error("order creation failed: {0}")]
    OrderCreation(String),

    /// Payment-intent initialization failed.
    #[error(transparent)]
    PaymentInit(#[from] PaymentInitError),

    /// Backend confirmation failed after the gateway reported success. Never
    /// surfaced to the user as a payment failure.
    #[error("payment reconciliation failed: {0}")]
    Reconciliation(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("external API error: {0}")]
    ExternalApi(String),

    /// A checkout request is already in flight for this session; the
    /// triggering action should have been disabled.
    #[error("another checkout request is already in flight")]
    RequestInFlight,
}

impl CheckoutError {
    /// Message for the dismissible error banner. Field-level detail travels
    /// separately via [`FieldErrors`].
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::Validation(_) => {
                "Please correct the highlighted fields.".to_string()
            }
            CheckoutError::OrderCreation(_) => {
                "We couldn't create your order. Please try again.".to_string()
            }
            CheckoutError::PaymentInit(_) => {
                "We couldn't start the payment. Please try again.".to_string()
            }
            CheckoutError::Reconciliation(_) => {
                "Your payment was received, but we couldn't finalize your order. \
                 Please contact support."
                    .to_string()
            }
            CheckoutError::RequestInFlight => {
                "Your previous request is still being processed.".to_string()
            }
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}
