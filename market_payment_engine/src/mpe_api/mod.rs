//! # Marketplace payment engine public API
//!
//! Each API is a thin, stateless object wrapped around a backend that implements the traits in [`crate::traits`]:
//!
//! * [`order_api`] manages the order lifecycle: creation, lookups, listings, status changes and soft deletion.
//! * [`payment_flow_api`] is the payment state machine: intent registration, gateway confirmation, failure and
//!   cancellation.
//! * [`receipt_api`] gives read access to the receipts written by successful confirmations.
//!
//! ```rust,ignore
//! use market_payment_engine::{events::EventProducers, PaymentFlowApi, SqliteDatabase};
//! use toss_tools::{TossApi, TossConfig};
//! let db = SqliteDatabase::new().await?;
//! let gateway = TossApi::new(TossConfig::new_from_env_or_default())?;
//! let api = PaymentFlowApi::new(db, gateway, EventProducers::default());
//! let intent = api.start_payment(&articles, &users, "article-1", "bob").await?;
//! ```
pub mod errors;
pub mod order_api;
pub mod order_objects;
pub mod payment_flow_api;
pub mod payment_objects;
pub mod receipt_api;
