use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use market_common::Won;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use toss_tools::{CardDetails, PaymentConfirmation};

/// Generates a fresh externally visible identifier.
pub fn new_api_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(String);

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The order's external identifier. The same value is used as the payment's `order_key`, i.e. the order reference
/// that the gateway sees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new_random() -> Self {
        Self(new_api_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been placed and is neither fulfilled nor withdrawn.
    Progress,
    /// The order was fulfilled. Only ended orders are eligible for reviews.
    End,
    /// The order was withdrawn or refunded.
    Cancel,
}

impl OrderStatusType {
    pub fn can_transition_to(&self, new_status: OrderStatusType) -> bool {
        matches!((self, new_status), (Self::Progress, Self::End) | (Self::Progress, Self::Cancel))
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Progress => write!(f, "PROGRESS"),
            OrderStatusType::End => write!(f, "END"),
            OrderStatusType::Cancel => write!(f, "CANCEL"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROGRESS" => Ok(Self::Progress),
            "END" => Ok(Self::End),
            "CANCEL" => Ok(Self::Cancel),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus     ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    /// Intent registered, waiting for the buyer to finish the checkout.
    Pending,
    /// Confirmed by the gateway. A receipt exists.
    Success,
    /// Terminal. The gateway rejected the payment or the checkout was abandoned.
    Failed,
    /// Terminal. A successful payment that was refunded through the gateway.
    Canceled,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Success => write!(f, "SUCCESS"),
            PaymentStatus::Failed => write!(f, "FAILED"),
            PaymentStatus::Canceled => write!(f, "CANCELED"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            "CANCELED" => Ok(Self::Canceled),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PayType {
    #[default]
    Card,
}

impl Display for PayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayType::Card => write!(f, "CARD"),
        }
    }
}

//--------------------------------------  Collaborator data   ---------------------------------------------------------
/// What the article subsystem tells us about the thing being bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub api_id: String,
    pub title: String,
    pub price: Won,
    /// Username of the article's owner
    pub seller: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub api_id: String,
    pub username: String,
    pub email: String,
    pub display_name: String,
}

//--------------------------------------        Order         ----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub api_id: OrderId,
    pub article_id: String,
    pub article_title: String,
    pub price: Won,
    pub seller: String,
    pub consumer: String,
}

impl NewOrder {
    pub fn new(article: &Article, consumer: &str) -> Self {
        Self {
            api_id: OrderId::new_random(),
            article_id: article.api_id.clone(),
            article_title: article.title.clone(),
            price: article.price,
            seller: article.seller.clone(),
            consumer: consumer.to_string(),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: i64,
    pub api_id: OrderId,
    pub article_id: String,
    pub article_title: String,
    pub price: Won,
    pub seller: String,
    pub consumer: String,
    pub status: OrderStatusType,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// True if `username` is either side of the trade.
    pub fn is_party(&self, username: &str) -> bool {
        self.seller == username || self.consumer == username
    }
}

//--------------------------------------       Payment        ----------------------------------------------------------
/// The payment half of a new intent. The owning order and the order key are filled in by the backend once the order
/// row exists.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub pay_type: PayType,
    pub amount: Won,
    pub order_name: String,
    pub customer_name: String,
    pub customer_email: String,
}

impl NewPayment {
    pub fn new(article: &Article, customer: &Customer) -> Self {
        Self {
            pay_type: PayType::Card,
            amount: article.price,
            order_name: article.title.clone(),
            customer_name: customer.display_name.clone(),
            customer_email: customer.email.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub order_key: OrderId,
    pub pay_type: PayType,
    pub amount: Won,
    pub order_name: String,
    pub customer_name: String,
    pub customer_email: String,
    pub payment_key: Option<String>,
    pub status: PaymentStatus,
    pub fail_code: Option<String>,
    pub fail_message: Option<String>,
    pub cancel_reason: Option<String>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       Receipt        ----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub api_id: String,
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
    pub approved_at: Option<String>,
    pub use_escrow: bool,
    pub culture_expense: bool,
    pub payment_type: String,
}

impl From<&PaymentConfirmation> for NewReceipt {
    fn from(c: &PaymentConfirmation) -> Self {
        Self {
            api_id: new_api_id(),
            mid: c.mid.clone(),
            version: c.version.clone(),
            payment_key: c.payment_key.clone(),
            order_id: c.order_id.clone(),
            order_name: c.order_name.clone(),
            currency: c.currency.clone(),
            method: c.method.clone(),
            total_amount: c.total_amount,
            balance_amount: c.balance_amount,
            supplied_amount: c.supplied_amount,
            vat: c.vat,
            status: c.status.clone(),
            requested_at: c.requested_at.clone(),
            approved_at: c.approved_at.clone(),
            use_escrow: c.use_escrow,
            culture_expense: c.culture_expense,
            payment_type: c.payment_type.clone(),
        }
    }
}

/// Snapshot of the gateway's confirmation. Rows are never updated once written.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receipt {
    pub id: i64,
    pub api_id: String,
    pub payment_id: i64,
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
    pub approved_at: Option<String>,
    pub use_escrow: bool,
    pub culture_expense: bool,
    pub payment_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCardReceipt {
    pub api_id: String,
    pub company: Option<String>,
    pub number: String,
    pub installment_plan_months: i64,
    pub is_interest_free: bool,
    pub approve_no: String,
    pub use_card_point: bool,
    pub card_type: String,
    pub owner_type: String,
    pub acquire_status: String,
    pub receipt_url: Option<String>,
}

impl From<&CardDetails> for NewCardReceipt {
    fn from(card: &CardDetails) -> Self {
        Self {
            api_id: new_api_id(),
            company: card.company.clone(),
            number: card.number.clone(),
            installment_plan_months: card.installment_plan_months,
            is_interest_free: card.is_interest_free,
            approve_no: card.approve_no.clone(),
            use_card_point: card.use_card_point,
            card_type: card.card_type.clone(),
            owner_type: card.owner_type.clone(),
            acquire_status: card.acquire_status.clone(),
            receipt_url: card.receipt_url.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardReceipt {
    pub id: i64,
    pub api_id: String,
    pub receipt_id: i64,
    pub company: Option<String>,
    pub number: String,
    pub installment_plan_months: i64,
    pub is_interest_free: bool,
    pub approve_no: String,
    pub use_card_point: bool,
    pub card_type: String,
    pub owner_type: String,
    pub acquire_status: String,
    pub receipt_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&CardReceipt> for CardDetails {
    fn from(card: &CardReceipt) -> Self {
        Self {
            company: card.company.clone(),
            number: card.number.clone(),
            installment_plan_months: card.installment_plan_months,
            is_interest_free: card.is_interest_free,
            approve_no: card.approve_no.clone(),
            use_card_point: card.use_card_point,
            card_type: card.card_type.clone(),
            owner_type: card.owner_type.clone(),
            acquire_status: card.acquire_status.clone(),
            receipt_url: card.receipt_url.clone(),
        }
    }
}

/// Rebuilds the gateway payload from what was stored at confirmation time.
pub fn confirmation_from_receipt(receipt: &Receipt, card: &CardReceipt) -> PaymentConfirmation {
    PaymentConfirmation {
        mid: receipt.mid.clone(),
        version: receipt.version.clone(),
        payment_key: receipt.payment_key.clone(),
        order_id: receipt.order_id.clone(),
        order_name: receipt.order_name.clone(),
        currency: receipt.currency.clone(),
        method: receipt.method.clone(),
        total_amount: receipt.total_amount,
        balance_amount: receipt.balance_amount,
        supplied_amount: receipt.supplied_amount,
        vat: receipt.vat,
        status: receipt.status.clone(),
        requested_at: receipt.requested_at.clone(),
        approved_at: receipt.approved_at.clone(),
        use_escrow: receipt.use_escrow,
        culture_expense: receipt.culture_expense,
        payment_type: receipt.payment_type.clone(),
        card: Some(CardDetails::from(card)),
    }
}
