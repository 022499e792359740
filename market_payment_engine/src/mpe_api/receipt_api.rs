use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{CardReceipt, OrderId, Receipt},
    payment_objects::ReceiptDetail,
    traits::{MarketplaceDatabase, ReceiptManagement},
    MarketplaceError,
};

/// Read access to receipts. There are two ways in: directly by the receipt's api id, or through the order it paid
/// for (order -> payment -> receipt). Each missing link fails with its own not-found error.
pub struct ReceiptApi<B> {
    db: B,
}

impl<B> Debug for ReceiptApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReceiptApi")
    }
}

impl<B> ReceiptApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ReceiptApi<B>
where B: MarketplaceDatabase + ReceiptManagement
{
    pub async fn receipt_by_api_id(&self, receipt_id: &str) -> Result<Receipt, MarketplaceError> {
        self.db
            .fetch_receipt_by_api_id(receipt_id)
            .await?
            .ok_or_else(|| MarketplaceError::ReceiptNotFound(receipt_id.to_string()))
    }

    pub async fn receipt_for_order(&self, order_id: &OrderId) -> Result<Receipt, MarketplaceError> {
        let order = self
            .db
            .fetch_order_by_api_id(order_id, false)
            .await?
            .ok_or_else(|| MarketplaceError::OrderNotFound(order_id.as_str().to_string()))?;
        let payment = self
            .db
            .fetch_payment_for_order(order.id)
            .await?
            .ok_or_else(|| MarketplaceError::PaymentNotFound(order_id.as_str().to_string()))?;
        self.db
            .fetch_receipt_for_payment(payment.id)
            .await?
            .ok_or_else(|| MarketplaceError::ReceiptNotFound(order_id.as_str().to_string()))
    }

    /// The api id of the order's receipt, or `None` if the order has not been paid. A missing order is still an
    /// error.
    pub async fn receipt_api_id_for_order(&self, order_id: &OrderId) -> Result<Option<String>, MarketplaceError> {
        match self.receipt_for_order(order_id).await {
            Ok(receipt) => Ok(Some(receipt.api_id)),
            Err(MarketplaceError::PaymentNotFound(_) | MarketplaceError::ReceiptNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn card_receipt(&self, receipt: &Receipt) -> Result<CardReceipt, MarketplaceError> {
        self.db.fetch_card_receipt(receipt.id).await?.ok_or_else(|| {
            error!("🧾️ Receipt {} has no card receipt. This should never happen and indicates data corruption", receipt.api_id);
            MarketplaceError::CardReceiptNotFound(receipt.api_id.clone())
        })
    }

    /// The caller-facing "get receipt": the receipt together with its card details.
    pub async fn receipt_detail(&self, receipt_id: &str) -> Result<ReceiptDetail, MarketplaceError> {
        let receipt = self.receipt_by_api_id(receipt_id).await?;
        let card_receipt = self.card_receipt(&receipt).await?;
        trace!("🧾️ Fetched receipt {receipt_id} for order {}", receipt.order_id);
        Ok(ReceiptDetail { receipt, card_receipt })
    }
}
