use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewPayment, Order, OrderId, Payment, PaymentStatus};

/// Inserts the PENDING payment owned by `order`. The order's api id becomes the payment's order key.
pub async fn insert_payment(
    order: &Order,
    payment: NewPayment,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let payment: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (
                order_id,
                order_key,
                pay_type,
                amount,
                order_name,
                customer_name,
                customer_email
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order.id)
    .bind(order.api_id.as_str())
    .bind(payment.pay_type)
    .bind(payment.amount)
    .bind(payment.order_name)
    .bind(payment.customer_name)
    .bind(payment.customer_email)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Payment #{} ({}) created for order {}", payment.id, payment.amount, order.api_id);
    Ok(payment)
}

/// Deleted payments are invisible to every lookup.
pub async fn fetch_payment_by_order_key(
    order_key: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE order_key = $1 AND deleted_at IS NULL")
        .bind(order_key.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

pub async fn fetch_payment_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 AND deleted_at IS NULL")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

/// PENDING -> SUCCESS. Returns `None` if the payment was no longer pending.
pub async fn mark_success(
    id: i64,
    payment_key: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        "UPDATE payments SET status = 'SUCCESS', payment_key = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND \
         status = 'PENDING' RETURNING *",
    )
    .bind(payment_key)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

/// PENDING -> FAILED. Returns `None` if the payment was no longer pending.
pub async fn mark_failed(
    id: i64,
    code: &str,
    message: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        "UPDATE payments SET status = 'FAILED', fail_code = $1, fail_message = $2, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $3 AND status = 'PENDING' RETURNING *",
    )
    .bind(code)
    .bind(message)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

/// SUCCESS -> CANCELED. Returns `None` if the payment was not in SUCCESS.
pub async fn mark_canceled(id: i64, reason: &str, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        "UPDATE payments SET status = 'CANCELED', cancel_reason = $1, canceled_at = CURRENT_TIMESTAMP, updated_at = \
         CURRENT_TIMESTAMP WHERE id = $2 AND status = 'SUCCESS' RETURNING *",
    )
    .bind(reason)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

/// Hides the order's payment from lookups, unless money has moved (SUCCESS or CANCELED). Returns the number of
/// payments that were deleted.
pub async fn soft_delete_unsettled(order_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payments SET deleted_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP WHERE order_id = $1 AND \
         deleted_at IS NULL AND status IN ($2, $3)",
    )
    .bind(order_id)
    .bind(PaymentStatus::Pending)
    .bind(PaymentStatus::Failed)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
