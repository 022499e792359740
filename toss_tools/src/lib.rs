//! # Toss Payments client
//!
//! A thin REST client for the card-payment gateway. It knows the gateway's request/response contract and nothing
//! about orders or receipts: callers hand it a payment key, an order id and an amount, and get back the gateway's
//! confirmation or cancellation payload.
//!
//! * [`TossApi`] issues the calls. Every request carries a Basic-Auth header derived from the configured secret key.
//! * [`TossConfig`] is loaded from the environment (see [`TossConfig::new_from_env_or_default`]).
//! * [`PaymentConfirmation`] and [`PaymentCancellation`] are the wire DTOs.
mod api;
mod config;
mod error;
mod payment_cancellation;
mod payment_confirmation;

pub use api::TossApi;
pub use config::TossConfig;
pub use error::TossApiError;
pub use payment_cancellation::{CancelDetail, PaymentCancellation};
pub use payment_confirmation::{CardDetails, PaymentConfirmation};
