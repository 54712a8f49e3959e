//! Hosted payment processor abstraction.
//!
//! Checkout talks to the processor through [`PaymentGateway`] so the HTTP
//! client can be swapped for a mock in tests.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod stripe;

pub use stripe::StripeGateway;

/// Currency every charge is made in.
pub const CHARGE_CURRENCY: &str = "usd";

/// Description attached to every storefront charge.
pub const CHARGE_DESCRIPTION: &str = "Z-Store - New Order";

/// Processor-side customer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

/// Customer registration payload: the buyer's email and a card token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub email: String,
    pub source: String,
}

/// A charge against an already registered customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    /// Amount in minor currency units (cents).
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub customer: CustomerId,
}

/// Confirmed charge as reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Charge {
    pub id: String,
    pub amount: i64,
    #[serde(default)]
    pub paid: bool,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    /// The card was rejected (declined, expired, bad CVC, ...).
    #[error("card error: {message}")]
    Card {
        code: Option<String>,
        message: String,
    },

    #[error("payment processor returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("payment processor unreachable")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected payment processor response: {0}")]
    Decode(String),
}

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register a customer with the processor from an email and a card token.
    async fn create_customer(&self, customer: NewCustomer) -> Result<CustomerId, PaymentError>;

    /// Charge a registered customer.
    async fn create_charge(&self, charge: ChargeRequest) -> Result<Charge, PaymentError>;
}
