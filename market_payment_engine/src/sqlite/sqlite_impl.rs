//! `SqliteDatabase` is the SQLite implementation of the engine's storage traits.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;
use toss_tools::PaymentConfirmation;

use super::db::{card_receipts, db_url, max_connections, new_pool, orders, payments, receipts};
use crate::{
    db_types::{CardReceipt, NewOrder, NewPayment, Order, OrderId, OrderStatusType, Payment, PaymentStatus, Receipt},
    order_objects::{OrderQueryFilter, Paging},
    payment_objects::CompletedPayment,
    traits::{MarketplaceDatabase, ReceiptManagement},
    MarketplaceError,
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::insert_order(order, &mut conn).await?;
        Ok(order)
    }

    async fn insert_order_with_payment(
        &self,
        order: NewOrder,
        payment: NewPayment,
    ) -> Result<(Order, Payment), MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        let payment = payments::insert_payment(&order, payment, &mut tx).await?;
        tx.commit().await?;
        Ok((order, payment))
    }

    async fn fetch_order_by_api_id(
        &self,
        api_id: &OrderId,
        include_deleted: bool,
    ) -> Result<Option<Order>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_api_id(api_id, include_deleted, &mut conn).await?;
        Ok(order)
    }

    async fn search_orders(
        &self,
        query: OrderQueryFilter,
        paging: Paging,
    ) -> Result<(Vec<Order>, i64), MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::search_orders(&query, paging, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_payment_by_order_key(&self, order_key: &OrderId) -> Result<Option<Payment>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_by_order_key(order_key, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_for_order(order_id, &mut conn).await?;
        Ok(payment)
    }

    async fn update_order_status(
        &self,
        order: &Order,
        new_status: OrderStatusType,
        fail_pending_payment: Option<(&str, &str)>,
    ) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let updated = orders::update_order_status(order.id, OrderStatusType::Progress, new_status, &mut tx)
            .await?
            .ok_or_else(|| {
                MarketplaceError::InvalidStateTransition(format!(
                    "Order {} is no longer in PROGRESS, so it cannot become {new_status}",
                    order.api_id
                ))
            })?;
        if let Some((code, message)) = fail_pending_payment {
            if let Some(payment) = payments::fetch_payment_for_order(order.id, &mut tx).await? {
                match payment.status {
                    PaymentStatus::Pending => {
                        payments::mark_failed(payment.id, code, message, &mut tx).await?.ok_or_else(|| {
                            MarketplaceError::InvalidStateTransition(format!(
                                "Payment for order {} changed state concurrently",
                                order.api_id
                            ))
                        })?;
                        debug!(
                            "🗃️ Pending payment #{} for order {} marked as FAILED ({code})",
                            payment.id, order.api_id
                        );
                    },
                    PaymentStatus::Failed => {},
                    status => {
                        warn!("🗃️ Payment for order {} became {status} before the order could change", order.api_id);
                        return Err(MarketplaceError::InvalidStateTransition(format!(
                            "Payment for order {} changed state concurrently and is now {status}",
                            order.api_id
                        )));
                    },
                }
            }
        }
        tx.commit().await?;
        debug!("🗃️ Order {} moved from {} to {new_status}", order.api_id, order.status);
        Ok(updated)
    }

    async fn soft_delete_order(&self, order: &Order) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let deleted = orders::soft_delete_order(order.id, &mut tx)
            .await?
            .ok_or_else(|| MarketplaceError::OrderNotFound(order.api_id.as_str().to_string()))?;
        let n = payments::soft_delete_unsettled(order.id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} deleted. {n} unsettled payment(s) deleted with it", order.api_id);
        Ok(deleted)
    }

    async fn mark_payment_failed(
        &self,
        order_key: &OrderId,
        code: &str,
        message: &str,
    ) -> Result<Payment, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::fetch_payment_by_order_key(order_key, &mut tx)
            .await?
            .ok_or_else(|| MarketplaceError::PaymentNotFound(order_key.as_str().to_string()))?;
        let failed = match payment.status {
            PaymentStatus::Pending => payments::mark_failed(payment.id, code, message, &mut tx).await?,
            PaymentStatus::Failed => {
                return Err(MarketplaceError::AlreadyProcessed(format!("Payment for order {order_key} already failed")))
            },
            status => {
                return Err(MarketplaceError::InvalidStateTransition(format!(
                    "Payment for order {order_key} is {status} and cannot be marked as failed"
                )))
            },
        };
        let failed = failed.ok_or_else(|| {
            MarketplaceError::AlreadyProcessed(format!("Payment for order {order_key} changed state concurrently"))
        })?;
        tx.commit().await?;
        Ok(failed)
    }

    async fn complete_payment(
        &self,
        order_key: &OrderId,
        payment_key: &str,
        confirmation: &PaymentConfirmation,
    ) -> Result<CompletedPayment, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::fetch_payment_by_order_key(order_key, &mut tx)
            .await?
            .ok_or_else(|| MarketplaceError::PaymentNotFound(order_key.as_str().to_string()))?;
        match payment.status {
            PaymentStatus::Pending => {},
            PaymentStatus::Success if payment.payment_key.as_deref() == Some(payment_key) => {
                debug!("🗃️ Payment for order {order_key} was confirmed concurrently with the same key");
                let receipt = receipts::fetch_receipt_for_payment(payment.id, &mut tx)
                    .await?
                    .ok_or_else(|| MarketplaceError::ReceiptNotFound(order_key.as_str().to_string()))?;
                let card_receipt = card_receipts::fetch_card_receipt_for_receipt(receipt.id, &mut tx)
                    .await?
                    .ok_or_else(|| MarketplaceError::CardReceiptNotFound(receipt.api_id.clone()))?;
                return Ok(CompletedPayment { payment, receipt, card_receipt, inserted: false });
            },
            status => {
                return Err(MarketplaceError::AlreadyProcessed(format!(
                    "Payment for order {order_key} is already {status}"
                )))
            },
        }
        let (receipt, card_receipt) =
            receipts::save_receipt(payment.id, confirmation, &mut tx).await?.ok_or_else(|| {
                MarketplaceError::ExternalServiceError("The confirmation carries no card details".to_string())
            })?;
        let payment = payments::mark_success(payment.id, payment_key, &mut tx).await?.ok_or_else(|| {
            MarketplaceError::AlreadyProcessed(format!("Payment for order {order_key} changed state concurrently"))
        })?;
        tx.commit().await?;
        debug!("🗃️ Payment for order {order_key} is SUCCESS. Receipt {} stored", receipt.api_id);
        Ok(CompletedPayment { payment, receipt, card_receipt, inserted: true })
    }

    async fn record_payment_cancellation(
        &self,
        order_key: &OrderId,
        cancel_reason: &str,
    ) -> Result<Payment, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::fetch_payment_by_order_key(order_key, &mut tx)
            .await?
            .ok_or_else(|| MarketplaceError::PaymentNotFound(order_key.as_str().to_string()))?;
        let canceled = payments::mark_canceled(payment.id, cancel_reason, &mut tx).await?.ok_or_else(|| {
            MarketplaceError::AlreadyProcessed(format!("Payment for order {order_key} is {}", payment.status))
        })?;
        tx.commit().await?;
        debug!("🗃️ Payment for order {order_key} is CANCELED");
        Ok(canceled)
    }

    async fn close(&mut self) -> Result<(), MarketplaceError> {
        self.pool.close().await;
        Ok(())
    }
}

impl ReceiptManagement for SqliteDatabase {
    async fn fetch_receipt_by_api_id(&self, api_id: &str) -> Result<Option<Receipt>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let receipt = receipts::fetch_receipt_by_api_id(api_id, &mut conn).await?;
        Ok(receipt)
    }

    async fn fetch_receipt_for_payment(&self, payment_id: i64) -> Result<Option<Receipt>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let receipt = receipts::fetch_receipt_for_payment(payment_id, &mut conn).await?;
        Ok(receipt)
    }

    async fn fetch_card_receipt(&self, receipt_id: i64) -> Result<Option<CardReceipt>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let card = card_receipts::fetch_card_receipt_for_receipt(receipt_id, &mut conn).await?;
        Ok(card)
    }

    async fn count_receipts_for_order(&self, order_key: &str) -> Result<i64, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let count = receipts::count_receipts_for_order_key(order_key, &mut conn).await?;
        Ok(count)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using `MPG_DATABASE_URL` and `MPG_DB_MAX_CONNECTIONS`.
    pub async fn new() -> Result<Self, MarketplaceError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections()).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, MarketplaceError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), MarketplaceError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
