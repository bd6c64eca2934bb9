use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{RE_CITY, RE_NAME, RE_PHONE, RE_STATE, RE_ZIP};

/// One line of the cart snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub line_subtotal: Decimal,
}

impl CartLine {
    /// Line subtotal, recomputed from price and quantity when the stored
    /// value is non-positive.
    pub fn effective_subtotal(&self) -> Decimal {
        if self.line_subtotal > Decimal::ZERO {
            self.line_subtotal
        } else {
            self.unit_price * Decimal::from(self.quantity)
        }
    }
}

/// Read-only view of the cart, owned by the cart collaborator. Immutable for
/// the duration of one checkout attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub total_amount: Decimal,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Subtotal rebuilt from the line items. Used when the cart collaborator
    /// left a stale zero in `total_amount` while lines exist.
    pub fn recomputed_subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::effective_subtotal).sum()
    }
}

/// Shipping form fields, mutated only by user input on the shipping step.
///
/// The regex/length rules collect errors across all fields, so the UI can
/// render the complete violation list in one pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ShippingDetails {
    #[validate(
        length(min = 2, message = "First name must be at least 2 characters"),
        regex(
            path = "RE_NAME",
            message = "First name may only contain letters, spaces, apostrophes and hyphens"
        )
    )]
    pub first_name: String,

    #[validate(
        length(min = 2, message = "Last name must be at least 2 characters"),
        regex(
            path = "RE_NAME",
            message = "Last name may only contain letters, spaces, apostrophes and hyphens"
        )
    )]
    pub last_name: String,

    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,

    #[validate(length(min = 5, message = "Address must be at least 5 characters"))]
    pub address: String,

    #[validate(
        length(min = 1, message = "City is required"),
        regex(
            path = "RE_CITY",
            message = "City may only contain letters, spaces, periods, apostrophes and hyphens"
        )
    )]
    pub city: String,

    #[validate(regex(
        path = "RE_STATE",
        message = "State must be a 2-letter postal abbreviation"
    ))]
    pub state: String,

    #[validate(regex(
        path = "RE_ZIP",
        message = "ZIP code must be 5 digits, optionally followed by -NNNN"
    ))]
    pub zip_code: String,

    #[validate(regex(
        path = "RE_PHONE",
        message = "Phone must be 7-20 digits, spaces, +, - or parentheses"
    ))]
    pub phone: String,
}

/// Shipping methods offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ShippingMethod {
    Standard,
    Express,
}

impl Default for ShippingMethod {
    fn default() -> Self {
        ShippingMethod::Standard
    }
}

/// Order statuses observable by this core. The backend owns the record; only
/// `Pending` and `Confirmed` are cancellable from this surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn is_cancellable(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }
}

/// Read-back view of a backend order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// Gateway-side state of a payment intent, polled once when control returns
/// from the payment UI. Unknown statuses collapse to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    Succeeded,
    Processing,
    RequiresPaymentMethod,
    #[serde(other)]
    Failed,
}

/// Cost breakdown displayed on the payment step and sent with the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}
