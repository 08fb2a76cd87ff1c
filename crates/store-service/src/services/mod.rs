//! Service layer for the music store gateway.
//!
//! - `payments` - Payment provider client and its mock

pub mod payments;

pub use payments::mock::MockPaymentProvider;
pub use payments::{PaymentProvider, StripeClient};
