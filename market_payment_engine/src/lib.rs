//! Marketplace Payment Engine
//!
//! The order, payment and receipt workflow of the marketplace backend. Buyers place orders against articles, pay
//! through an external card-payment gateway, and can later view their receipts or cancel. The engine keeps the local
//! database consistent with the gateway across partial failures: mismatched amounts, gateway errors and duplicate
//! confirmations.
//!
//! The library is divided into:
//! 1. Storage ([`SqliteDatabase`] and the low-level functions in [`sqlite::db`]). The public APIs only talk to the
//!    database through the traits in [`traits`], so other backends can be plugged in.
//! 2. The public API: [`OrderApi`], [`PaymentFlowApi`] and [`ReceiptApi`]. These are the operations the excluded
//!    HTTP layer calls.
//! 3. [`events`], a set of hooks that are notified after payments are confirmed or cancelled and after orders change
//!    status.
//!
//! All failures are reported as a [`MarketplaceError`].
pub mod db_types;
pub mod events;
mod mpe_api;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use mpe_api::{
    errors::{ErrorKind, MarketplaceError},
    order_api::{OrderApi, ORDER_CANCELLED_CODE},
    order_objects,
    payment_flow_api::{PaymentFlowApi, UNRECORDED_CHARGE_REASON},
    payment_objects,
    receipt_api::ReceiptApi,
};
pub use traits::{ArticleProvider, MarketplaceDatabase, PaymentGatewayClient, ReceiptManagement, UserProvider};
