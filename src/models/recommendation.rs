use serde::{Deserialize, Serialize};

use super::{Product, ProductId, ProductSummary, UserId};

/// Who a recommendation request is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Product(ProductId),
    User(UserId),
}

/// How a user-facing recommendation list was produced
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    /// Catalog-wide best sellers, served to users without purchase history
    Popular,
    /// Collaborative ranking from the user's purchase history
    Personalized,
}

/// Products similar to a reference product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRecommendations {
    pub product: ProductSummary,
    pub recommendations: Vec<Product>,
}

/// Products suggested to a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecommendations {
    pub user: UserId,
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub recommendations: Vec<Product>,
}

/// Payload served by the gateway and stored in the cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RecommendationResult {
    Product(ProductRecommendations),
    User(UserRecommendations),
}

impl RecommendationResult {
    pub fn recommendations(&self) -> &[Product] {
        match self {
            RecommendationResult::Product(result) => &result.recommendations,
            RecommendationResult::User(result) => &result.recommendations,
        }
    }
}

/// Cache counters reported to admins
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub cache_size: usize,
    pub hit_rate: f64,
}
