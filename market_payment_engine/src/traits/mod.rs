//! # Backend and collaborator contracts
//!
//! The public APIs are generic over these traits, so the workflow never depends on a particular database, gateway,
//! article catalogue or user directory.
//!
//! * [`MarketplaceDatabase`] stores orders and payments and performs every state transition atomically.
//! * [`ReceiptManagement`] provides read access to the immutable receipt records.
//! * [`PaymentGatewayClient`] is the outbound boundary to the card-payment provider. It is implemented for
//!   [`toss_tools::TossApi`].
//! * [`ArticleProvider`] and [`UserProvider`] are lookups into subsystems that live outside the engine.
mod collaborators;
mod marketplace_database;
mod payment_gateway;
mod receipt_management;

pub use collaborators::{ArticleProvider, UserProvider};
pub use marketplace_database::MarketplaceDatabase;
pub use payment_gateway::PaymentGatewayClient;
pub use receipt_management::ReceiptManagement;
