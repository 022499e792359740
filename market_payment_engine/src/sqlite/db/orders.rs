use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    order_objects::{OrderQueryFilter, Paging},
};

pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                api_id,
                article_id,
                article_title,
                price,
                seller,
                consumer
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order.api_id)
    .bind(order.article_id)
    .bind(order.article_title)
    .bind(order.price)
    .bind(order.seller)
    .bind(order.consumer)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order {} inserted with id {}", order.api_id, order.id);
    Ok(order)
}

/// Soft-deleted orders are only returned if `include_deleted` is set.
pub async fn fetch_order_by_api_id(
    api_id: &OrderId,
    include_deleted: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = if include_deleted {
        "SELECT * FROM orders WHERE api_id = $1"
    } else {
        "SELECT * FROM orders WHERE api_id = $1 AND deleted_at IS NULL"
    };
    let order = sqlx::query_as(sql).bind(api_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

fn push_where_clause(builder: &mut QueryBuilder<'_, Sqlite>, query: &OrderQueryFilter) {
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    where_clause.push("deleted_at IS NULL");
    if let Some(seller) = &query.seller {
        where_clause.push("seller = ");
        where_clause.push_bind_unseparated(seller.clone());
    }
    if let Some(consumer) = &query.consumer {
        where_clause.push("consumer = ");
        where_clause.push_bind_unseparated(consumer.clone());
    }
    if let Some(article_id) = &query.article_id {
        where_clause.push("article_id = ");
        where_clause.push_bind_unseparated(article_id.clone());
    }
    if let Some(statuses) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status_clause = statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(text) = &query.search_text {
        where_clause.push("article_title LIKE ");
        where_clause.push_bind_unseparated(format!("%{text}%"));
    }
}

/// Fetches one page of orders matching `query`, sorted by id, together with the total number of matches.
pub async fn search_orders(
    query: &OrderQueryFilter,
    paging: Paging,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Order>, i64), sqlx::Error> {
    let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_where_clause(&mut count_builder, query);
    trace!("🗃️ Executing query: {}", count_builder.sql());
    let total: i64 = count_builder.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM orders");
    push_where_clause(&mut builder, query);
    builder.push(if paging.ascending { " ORDER BY id ASC" } else { " ORDER BY id DESC" });
    builder.push(" LIMIT ");
    builder.push_bind(i64::from(paging.limit));
    builder.push(" OFFSET ");
    builder.push_bind(paging.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {} of {total}", orders.len());
    Ok((orders, total))
}

/// Moves the order to `new_status`, but only if it is currently `from` and not deleted. Returns `None` if no row
/// qualified.
pub async fn update_order_status(
    id: i64,
    from: OrderStatusType,
    new_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let result = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3 AND deleted_at \
         IS NULL RETURNING *",
    )
    .bind(new_status)
    .bind(id)
    .bind(from)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

pub async fn soft_delete_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let result = sqlx::query_as(
        "UPDATE orders SET deleted_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND \
         deleted_at IS NULL RETURNING *",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}
