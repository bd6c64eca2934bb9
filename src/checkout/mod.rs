//! Checkout orchestration: the session, the state machine driving it, and
//! the confirmation handler that reconciles the gateway outcome with the
//! backend order record.

pub mod confirmation;
pub mod flow;
pub mod session;

pub use confirmation::{ConfirmationHandler, ConfirmationOutcome, ReturnContext};
pub use flow::CheckoutFlow;
pub use session::{CheckoutSession, CheckoutStep};
