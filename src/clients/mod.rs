//! Clients for the two external collaborators: the backend order API and the
//! payment gateway.

pub mod orders;
pub mod payments;

pub use orders::{NewOrder, OrderApi, OrderApiClient};
pub use payments::{select_gateway, HostedGateway, PaymentGateway, SimulatedGateway};
