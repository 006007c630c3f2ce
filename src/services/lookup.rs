use std::sync::Arc;

use crate::{
    db::Catalog,
    error::{AppError, AppResult},
    models::{Product, ProductId},
};

/// Fetches several products from the catalog in parallel, preserving `ids` order
///
/// Products the catalog no longer knows are skipped with a warning; any other
/// catalog failure aborts the whole lookup and cancels the lookups still in
/// flight.
pub async fn fetch_products(
    catalog: &Arc<dyn Catalog>,
    ids: impl IntoIterator<Item = ProductId>,
) -> AppResult<Vec<Product>> {
    let mut tasks = Vec::new();

    for id in ids {
        let catalog = Arc::clone(catalog);
        let task = tokio::spawn(async move { catalog.get_product(id).await });
        tasks.push((id, task));
    }

    let mut products = Vec::with_capacity(tasks.len());
    let mut pending = tasks.into_iter();

    while let Some((id, task)) = pending.next() {
        let failure = match task.await {
            Ok(Ok(product)) => {
                products.push(product);
                continue;
            }
            Ok(Err(AppError::NotFound(_))) => {
                tracing::warn!(product_id = %id, "Referenced product missing from catalog, skipping");
                continue;
            }
            Ok(Err(e)) => e,
            Err(e) => {
                tracing::error!(error = %e, "Task join error");
                AppError::Internal(e.to_string())
            }
        };

        let cancelled = pending.by_ref().map(|(_, rest)| rest.abort()).count();
        if cancelled > 0 {
            tracing::debug!(cancelled, "Cancelled remaining product lookups");
        }
        return Err(failure);
    }

    Ok(products)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::catalog::MockCatalog;
    use crate::db::MemoryCatalog;
    use crate::models::ProductFilter;

    /// Fails one product immediately and never answers for any other
    struct StallingCatalog {
        failing: ProductId,
    }

    #[async_trait::async_trait]
    impl Catalog for StallingCatalog {
        async fn get_product(&self, id: ProductId) -> AppResult<Product> {
            if id == self.failing {
                return Err(AppError::Collaborator("catalog unavailable".to_string()));
            }
            std::future::pending().await
        }

        async fn list_products(&self, _filter: &ProductFilter) -> AppResult<Vec<Product>> {
            Ok(vec![])
        }

        async fn list_products_by_category(
            &self,
            _categories: &[String],
            _exclude_ids: &[ProductId],
        ) -> AppResult<Vec<Product>> {
            Ok(vec![])
        }
    }

    fn product(name: &str) -> Product {
        Product {
            id: ProductId::new(),
            name: name.to_string(),
            description: String::new(),
            category: "Books".to_string(),
            brand: "Penguin".to_string(),
            price: 10.0,
            rating: 4.0,
            num_reviews: 2,
            count_in_stock: 1,
        }
    }

    #[tokio::test]
    async fn test_preserves_order_and_skips_missing() {
        let first = product("first");
        let second = product("second");
        let catalog: Arc<dyn Catalog> =
            Arc::new(MemoryCatalog::new(vec![first.clone(), second.clone()]));

        let fetched = fetch_products(&catalog, vec![second.id, ProductId::new(), first.id])
            .await
            .unwrap();

        assert_eq!(fetched, vec![second, first]);
    }

    #[tokio::test]
    async fn test_catalog_failure_propagates() {
        let mut mock = MockCatalog::new();
        mock.expect_get_product()
            .returning(|_| Err(AppError::Collaborator("catalog unavailable".to_string())));
        let catalog: Arc<dyn Catalog> = Arc::new(mock);

        let result = fetch_products(&catalog, vec![ProductId::new()]).await;
        assert!(matches!(result, Err(AppError::Collaborator(_))));
    }

    #[tokio::test]
    async fn test_failure_cancels_outstanding_lookups() {
        let failing = ProductId::new();
        let catalog: Arc<dyn Catalog> = Arc::new(StallingCatalog { failing });

        let ids = vec![failing, ProductId::new(), ProductId::new()];
        let result = fetch_products(&catalog, ids).await;
        assert!(matches!(result, Err(AppError::Collaborator(_))));

        // Each spawned lookup holds a clone of the catalog until it is dropped
        for _ in 0..100 {
            if Arc::strong_count(&catalog) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(Arc::strong_count(&catalog), 1);
    }
}
