use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{Order, Product, ProductFilter, ProductId, UserId},
};

use super::{Catalog, OrderHistory};

/// Catalog held in process memory, in insertion order
#[derive(Default)]
pub struct MemoryCatalog {
    products: RwLock<Vec<Product>>,
}

impl MemoryCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
        }
    }

    /// Adds a product, replacing any existing product with the same id
    pub async fn upsert(&self, product: Product) {
        let mut products = self.products.write().await;
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => products.push(product),
        }
    }
}

#[async_trait::async_trait]
impl Catalog for MemoryCatalog {
    async fn get_product(&self, id: ProductId) -> AppResult<Product> {
        self.products
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
    }

    async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<Product>> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn list_products_by_category(
        &self,
        categories: &[String],
        exclude_ids: &[ProductId],
    ) -> AppResult<Vec<Product>> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .filter(|p| categories.contains(&p.category) && !exclude_ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

/// Order history held in process memory, in insertion order
#[derive(Default)]
pub struct MemoryOrderHistory {
    orders: RwLock<Vec<Order>>,
}

impl MemoryOrderHistory {
    pub fn new(orders: Vec<Order>) -> Self {
        Self {
            orders: RwLock::new(orders),
        }
    }
}

#[async_trait::async_trait]
impl OrderHistory for MemoryOrderHistory {
    async fn get_paid_orders_for_user(&self, user: UserId) -> AppResult<Vec<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .iter()
            .filter(|o| o.is_paid && o.user == user)
            .cloned()
            .collect())
    }

    async fn get_all_paid_orders_excluding_user(&self, user: UserId) -> AppResult<Vec<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .iter()
            .filter(|o| o.is_paid && o.user != user)
            .cloned()
            .collect())
    }
}
