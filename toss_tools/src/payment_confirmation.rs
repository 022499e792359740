use market_common::Won;
use serde::{Deserialize, Serialize};

/// The gateway's answer to a successful confirmation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    /// Merchant id
    #[serde(rename = "mId", default)]
    pub mid: Option<String>,
    pub version: String,
    pub payment_key: String,
    pub order_id: String,
    pub order_name: String,
    pub currency: String,
    pub method: String,
    pub total_amount: Won,
    pub balance_amount: Won,
    pub supplied_amount: Won,
    pub vat: Won,
    pub status: String,
    pub requested_at: String,
    #[serde(default)]
    pub approved_at: Option<String>,
    #[serde(default)]
    pub use_escrow: bool,
    #[serde(default)]
    pub culture_expense: bool,
    #[serde(rename = "type")]
    pub payment_type: String,
    #[serde(default)]
    pub card: Option<CardDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetails {
    #[serde(default)]
    pub company: Option<String>,
    /// Masked card number
    pub number: String,
    #[serde(default)]
    pub installment_plan_months: i64,
    #[serde(default)]
    pub is_interest_free: bool,
    pub approve_no: String,
    #[serde(default)]
    pub use_card_point: bool,
    pub card_type: String,
    pub owner_type: String,
    pub acquire_status: String,
    #[serde(default)]
    pub receipt_url: Option<String>,
}
