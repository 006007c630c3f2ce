use serde::{Deserialize, Serialize};

use super::ProductId;

/// A catalog product as the recommenders see it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub price: f64,
    /// Average review score, 0 to 5
    pub rating: f64,
    pub num_reviews: i64,
    pub count_in_stock: i64,
}

/// The identifying slice of a product echoed back with its recommendations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub brand: String,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            category: product.category.clone(),
            brand: product.brand.clone(),
        }
    }
}

/// Constraints for a catalog listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Products to leave out of the listing
    pub exclude_ids: Vec<ProductId>,
}

impl ProductFilter {
    /// Filter that keeps everything except the given product
    pub fn excluding(id: ProductId) -> Self {
        Self {
            exclude_ids: vec![id],
        }
    }

    /// Whether `product` passes the filter
    ///
    /// In-memory catalogs apply this per product; the Postgres catalog
    /// expresses the same rule as a `NOT (id = ANY($1))` clause.
    pub fn matches(&self, product: &Product) -> bool {
        !self.exclude_ids.contains(&product.id)
    }
}
