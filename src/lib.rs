//! Checkout and payment orchestration core for the storefront.
//!
//! Turns a cart snapshot into a durable backend order, coordinates with the
//! external payment gateway, and reconciles the three independent truths
//! (UI state, backend order record, gateway payment state) into a single
//! consistent outcome — without double-charging or double-creating an order,
//! even under retries, reloads, or partial network failure.
//!
//! The catalog, cart/wishlist stores, authentication, and rendering are
//! external collaborators: the cart is an injected [`cart::CartAccess`]
//! capability, and auth is a bearer token carried by the order API client.
//!
//! Layout, leaves first:
//! - [`validation`] — shipping form rules, all violations reported together
//! - [`pricing`] — exact-decimal cost breakdown
//! - [`clients`] — order API and payment gateway clients
//! - [`checkout`] — the session, the state machine, and the confirmation
//!   handler that owns gateway/backend reconciliation
//! - [`app`] — composition root; decides real-vs-simulated gateway once

pub mod app;
pub mod cart;
pub mod checkout;
pub mod clients;
pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod pricing;
pub mod validation;

pub use app::CheckoutApp;
pub use cart::{CartAccess, InMemoryCart};
pub use checkout::{
    CheckoutFlow, CheckoutSession, CheckoutStep, ConfirmationHandler, ConfirmationOutcome,
    ReturnContext,
};
pub use clients::{NewOrder, OrderApi, OrderApiClient, PaymentGateway, SimulatedGateway};
pub use config::{load_config, AppConfig, GatewayConfig, OrderApiConfig, StoreSettings};
pub use errors::{CheckoutError, FieldErrors, PaymentInitError};
pub use events::{Event, EventSender};
pub use models::{
    CartLine, CartSnapshot, CostBreakdown, Order, OrderStatus, PaymentIntentStatus,
    ShippingDetails, ShippingMethod,
};
pub use pricing::compute_totals;
pub use validation::validate_shipping;
