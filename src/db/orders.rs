use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Order, OrderItem, ProductId, UserId},
};

/// Read access to customers' paid order history
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait OrderHistory: Send + Sync {
    /// Paid orders placed by `user`, oldest first
    async fn get_paid_orders_for_user(&self, user: UserId) -> AppResult<Vec<Order>>;

    /// Paid orders of every user except `user`, oldest first
    async fn get_all_paid_orders_excluding_user(&self, user: UserId) -> AppResult<Vec<Order>>;
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    paid_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: Uuid,
    product_id: Option<Uuid>,
    quantity: i32,
    price: f64,
}

/// Order history backed by the `orders` and `order_items` tables
pub struct PgOrderHistory {
    pool: Arc<PgPool>,
}

impl PgOrderHistory {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Loads the lines of `rows` and assembles full orders, keeping row order
    async fn attach_items(&self, rows: Vec<OrderRow>) -> AppResult<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT order_id, product_id, quantity, price FROM order_items \
             WHERE order_id = ANY($1) ORDER BY order_id, line_no",
        )
        .bind(&order_ids)
        .fetch_all(self.pool.as_ref())
        .await?;

        let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            items_by_order.entry(row.order_id).or_default().push(OrderItem {
                product: row.product_id.map(ProductId),
                quantity: row.quantity,
                price: row.price,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| Order {
                id: row.id,
                user: UserId(row.user_id),
                items: items_by_order.remove(&row.id).unwrap_or_default(),
                is_paid: true,
                paid_at: row.paid_at,
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl OrderHistory for PgOrderHistory {
    async fn get_paid_orders_for_user(&self, user: UserId) -> AppResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, paid_at FROM orders \
             WHERE user_id = $1 AND is_paid ORDER BY paid_at, id",
        )
        .bind(user.0)
        .fetch_all(self.pool.as_ref())
        .await?;

        self.attach_items(rows).await
    }

    async fn get_all_paid_orders_excluding_user(&self, user: UserId) -> AppResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, paid_at FROM orders \
             WHERE user_id <> $1 AND is_paid ORDER BY paid_at, id",
        )
        .bind(user.0)
        .fetch_all(self.pool.as_ref())
        .await?;

        tracing::debug!(orders = rows.len(), "Loaded paid orders of other users");
        self.attach_items(rows).await
    }
}
