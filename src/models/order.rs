use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProductId, UserId};

/// One line of an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    /// `None` when the referenced product record is missing
    pub product: Option<ProductId>,
    pub quantity: i32,
    /// Unit price at purchase time
    pub price: f64,
}

/// A customer order, read-only input to the recommenders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub user: UserId,
    pub items: Vec<OrderItem>,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Product references of every well-formed line, in line order
    ///
    /// Lines without a product reference are logged and skipped.
    pub fn product_ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.items.iter().filter_map(move |item| {
            if item.product.is_none() {
                tracing::warn!(order_id = %self.id, "Skipping order line without product reference");
            }
            item.product
        })
    }
}
