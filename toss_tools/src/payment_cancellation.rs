use market_common::Won;
use serde::{Deserialize, Serialize};

use crate::CardDetails;

/// The gateway's answer to a cancellation request. The payment object is echoed back with its new status, and the
/// history of cancellations applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCancellation {
    pub payment_key: String,
    pub order_id: String,
    #[serde(default)]
    pub order_name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub total_amount: Won,
    #[serde(default)]
    pub balance_amount: Won,
    #[serde(default)]
    pub cancels: Vec<CancelDetail>,
    #[serde(default)]
    pub card: Option<CardDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelDetail {
    pub cancel_reason: String,
    pub canceled_at: String,
    pub cancel_amount: Won,
    #[serde(default)]
    pub tax_free_amount: Won,
    #[serde(default)]
    pub tax_exemption_amount: Won,
    #[serde(default)]
    pub refundable_amount: Won,
    #[serde(default)]
    pub easy_pay_discount_amount: Won,
    pub transaction_key: String,
    #[serde(default)]
    pub receipt_key: Option<String>,
}

impl PaymentCancellation {
    /// The most recent cancellation, if the gateway reported any.
    pub fn last_cancel(&self) -> Option<&CancelDetail> {
        self.cancels.last()
    }
}
