use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Product, ProductFilter, ProductId},
};

/// Read access to the product catalog
///
/// Listings come back in a stable catalog order; recommenders rely on it to
/// break score ties deterministically.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch one product, `AppError::NotFound` if it does not exist
    async fn get_product(&self, id: ProductId) -> AppResult<Product>;

    /// List products matching the filter
    async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<Product>>;

    /// List products in any of `categories`, leaving out `exclude_ids`
    async fn list_products_by_category(
        &self,
        categories: &[String],
        exclude_ids: &[ProductId],
    ) -> AppResult<Vec<Product>>;
}

const PRODUCT_COLUMNS: &str = "id, name, description, category, brand, price, rating, \
     num_reviews, count_in_stock";

fn raw_ids(ids: &[ProductId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.0).collect()
}

/// Catalog backed by the `products` table
pub struct PgCatalog {
    pool: Arc<PgPool>,
}

impl PgCatalog {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Catalog for PgCatalog {
    async fn get_product(&self, id: ProductId) -> AppResult<Product> {
        let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);

        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
    }

    async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE NOT (id = ANY($1)) ORDER BY created_at, id",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(raw_ids(&filter.exclude_ids))
            .fetch_all(self.pool.as_ref())
            .await?;

        tracing::debug!(count = products.len(), "Listed catalog products");
        Ok(products)
    }

    async fn list_products_by_category(
        &self,
        categories: &[String],
        exclude_ids: &[ProductId],
    ) -> AppResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products \
             WHERE category = ANY($1) AND NOT (id = ANY($2)) \
             ORDER BY created_at, id",
            PRODUCT_COLUMNS
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(categories.to_vec())
            .bind(raw_ids(exclude_ids))
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(products)
    }
}
