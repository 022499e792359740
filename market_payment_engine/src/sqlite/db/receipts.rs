use log::debug;
use sqlx::SqliteConnection;
use toss_tools::PaymentConfirmation;

use super::card_receipts;
use crate::db_types::{CardReceipt, NewCardReceipt, NewReceipt, Receipt};

/// Stores the receipt for `payment_id` and its card receipt, built field by field from the gateway's confirmation.
/// Call it on the same transaction as the payment's status change.
///
/// Returns `None` if the confirmation carries no card details. Nothing is written in that case.
pub async fn save_receipt(
    payment_id: i64,
    confirmation: &PaymentConfirmation,
    conn: &mut SqliteConnection,
) -> Result<Option<(Receipt, CardReceipt)>, sqlx::Error> {
    let Some(card) = confirmation.card.as_ref() else {
        return Ok(None);
    };
    let receipt = insert_receipt(payment_id, NewReceipt::from(confirmation), &mut *conn).await?;
    let card_receipt = card_receipts::insert_card_receipt(receipt.id, NewCardReceipt::from(card), conn).await?;
    Ok(Some((receipt, card_receipt)))
}

pub async fn insert_receipt(
    payment_id: i64,
    receipt: NewReceipt,
    conn: &mut SqliteConnection,
) -> Result<Receipt, sqlx::Error> {
    let receipt: Receipt = sqlx::query_as(
        r#"
            INSERT INTO receipts (
                api_id,
                payment_id,
                mid,
                version,
                payment_key,
                order_id,
                order_name,
                currency,
                method,
                total_amount,
                balance_amount,
                supplied_amount,
                vat,
                status,
                requested_at,
                approved_at,
                use_escrow,
                culture_expense,
                payment_type
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING *;
        "#,
    )
    .bind(receipt.api_id)
    .bind(payment_id)
    .bind(receipt.mid)
    .bind(receipt.version)
    .bind(receipt.payment_key)
    .bind(receipt.order_id)
    .bind(receipt.order_name)
    .bind(receipt.currency)
    .bind(receipt.method)
    .bind(receipt.total_amount)
    .bind(receipt.balance_amount)
    .bind(receipt.supplied_amount)
    .bind(receipt.vat)
    .bind(receipt.status)
    .bind(receipt.requested_at)
    .bind(receipt.approved_at)
    .bind(receipt.use_escrow)
    .bind(receipt.culture_expense)
    .bind(receipt.payment_type)
    .fetch_one(conn)
    .await?;
    debug!("🧾️ Receipt {} stored for payment #{payment_id}", receipt.api_id);
    Ok(receipt)
}

pub async fn fetch_receipt_by_api_id(
    api_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Receipt>, sqlx::Error> {
    let receipt =
        sqlx::query_as("SELECT * FROM receipts WHERE api_id = $1").bind(api_id).fetch_optional(conn).await?;
    Ok(receipt)
}

pub async fn fetch_receipt_for_payment(
    payment_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Receipt>, sqlx::Error> {
    let receipt =
        sqlx::query_as("SELECT * FROM receipts WHERE payment_id = $1").bind(payment_id).fetch_optional(conn).await?;
    Ok(receipt)
}

pub async fn count_receipts_for_order_key(order_key: &str, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM receipts WHERE order_id = $1")
        .bind(order_key)
        .fetch_one(conn)
        .await?;
    Ok(count)
}
