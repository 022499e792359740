use crate::{
    db_types::{CardReceipt, Receipt},
    MarketplaceError,
};

/// Read access to receipts. Receipts are only ever written by [`crate::MarketplaceDatabase::complete_payment`].
#[allow(async_fn_in_trait)]
pub trait ReceiptManagement: Clone {
    async fn fetch_receipt_by_api_id(&self, api_id: &str) -> Result<Option<Receipt>, MarketplaceError>;

    async fn fetch_receipt_for_payment(&self, payment_id: i64) -> Result<Option<Receipt>, MarketplaceError>;

    async fn fetch_card_receipt(&self, receipt_id: i64) -> Result<Option<CardReceipt>, MarketplaceError>;

    /// The number of receipts recorded against the gateway-facing order id.
    async fn count_receipts_for_order(&self, order_key: &str) -> Result<i64, MarketplaceError>;
}
