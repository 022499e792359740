use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{CardReceipt, NewCardReceipt};

pub async fn insert_card_receipt(
    receipt_id: i64,
    card: NewCardReceipt,
    conn: &mut SqliteConnection,
) -> Result<CardReceipt, sqlx::Error> {
    let card_receipt: CardReceipt = sqlx::query_as(
        r#"
            INSERT INTO card_receipts (
                api_id,
                receipt_id,
                company,
                number,
                installment_plan_months,
                is_interest_free,
                approve_no,
                use_card_point,
                card_type,
                owner_type,
                acquire_status,
                receipt_url
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *;
        "#,
    )
    .bind(card.api_id)
    .bind(receipt_id)
    .bind(card.company)
    .bind(card.number)
    .bind(card.installment_plan_months)
    .bind(card.is_interest_free)
    .bind(card.approve_no)
    .bind(card.use_card_point)
    .bind(card.card_type)
    .bind(card.owner_type)
    .bind(card.acquire_status)
    .bind(card.receipt_url)
    .fetch_one(conn)
    .await?;
    debug!("🧾️ Card receipt {} stored for receipt #{receipt_id}", card_receipt.api_id);
    Ok(card_receipt)
}

pub async fn fetch_card_receipt_for_receipt(
    receipt_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CardReceipt>, sqlx::Error> {
    let card = sqlx::query_as("SELECT * FROM card_receipts WHERE receipt_id = $1")
        .bind(receipt_id)
        .fetch_optional(conn)
        .await?;
    Ok(card)
}
