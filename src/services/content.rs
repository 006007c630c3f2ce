use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    db::{Catalog, OrderHistory},
    error::AppResult,
    models::{Product, ProductFilter, ProductId, UserId, UserPreferenceProfile},
    services::{
        collaborative::popular_from,
        lookup::fetch_products,
        similarity::{similarity, SimilarityWeights},
    },
};

/// Default number of products a recommender returns
pub const DEFAULT_LIMIT: usize = 10;

/// Contribution of each preference signal when matching a product to a profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreferenceWeights {
    pub category: f64,
    pub brand: f64,
    pub price_in_range: f64,
    /// Subtracted when the product costs more than anything the user bought
    pub above_range_penalty: f64,
    pub high_rating: f64,
    pub high_rating_threshold: f64,
}

impl Default for PreferenceWeights {
    fn default() -> Self {
        Self {
            category: 0.4,
            brand: 0.3,
            price_in_range: 0.2,
            above_range_penalty: 0.1,
            high_rating: 0.1,
            high_rating_threshold: 4.0,
        }
    }
}

/// How well `product` fits `profile`; never negative
///
/// Matching category and brand add their weights. A price inside the
/// profile's range adds `price_in_range`, a price above it subtracts
/// `above_range_penalty`, and a price below it is neutral. Ratings at or over
/// the threshold add `high_rating`.
pub fn preference_score(
    product: &Product,
    profile: &UserPreferenceProfile,
    weights: &PreferenceWeights,
) -> f64 {
    let mut score = 0.0;

    if profile.categories.contains(&product.category) {
        score += weights.category;
    }
    if profile.brands.contains(&product.brand) {
        score += weights.brand;
    }
    if let Some((min, max)) = profile.price_range {
        if product.price >= min && product.price <= max {
            score += weights.price_in_range;
        } else if product.price > max {
            score -= weights.above_range_penalty;
        }
    }
    if product.rating >= weights.high_rating_threshold {
        score += weights.high_rating;
    }

    score.max(0.0)
}

/// Sorts by score, highest first, keeping input order among equal scores
fn rank(mut scored: Vec<(f64, Product)>, limit: usize) -> Vec<Product> {
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, p)| p).collect()
}

/// Ranks catalog products by attribute similarity
pub struct ContentRecommender {
    catalog: Arc<dyn Catalog>,
    orders: Arc<dyn OrderHistory>,
    similarity_weights: SimilarityWeights,
    preference_weights: PreferenceWeights,
}

impl ContentRecommender {
    /// Recommender using the default similarity and preference weights
    pub fn new(catalog: Arc<dyn Catalog>, orders: Arc<dyn OrderHistory>) -> Self {
        Self {
            catalog,
            orders,
            similarity_weights: SimilarityWeights::default(),
            preference_weights: PreferenceWeights::default(),
        }
    }

    /// Replaces both weight sets, for callers tuning the rankings
    pub fn with_weights(mut self, similarity: SimilarityWeights, preference: PreferenceWeights) -> Self {
        self.similarity_weights = similarity;
        self.preference_weights = preference;
        self
    }

    /// Products most similar to the product with `product_id`
    ///
    /// Fails with `NotFound` when the catalog does not know the product.
    pub async fn recommend_similar_to(
        &self,
        product_id: ProductId,
        limit: usize,
    ) -> AppResult<Vec<Product>> {
        let target = self.catalog.get_product(product_id).await?;
        self.similar_to(&target, limit).await
    }

    /// Products most similar to `target`, never including `target` itself
    ///
    /// Candidates keep catalog order, so equal scores come back in the order
    /// the catalog lists them.
    pub async fn similar_to(&self, target: &Product, limit: usize) -> AppResult<Vec<Product>> {
        let candidates = self
            .catalog
            .list_products(&ProductFilter::excluding(target.id))
            .await?;

        let scored = candidates
            .into_iter()
            .filter(|p| p.id != target.id)
            .map(|p| (similarity(target, &p, &self.similarity_weights), p))
            .collect();

        let ranked = rank(scored, limit);
        tracing::debug!(product_id = %target.id, count = ranked.len(), "Ranked similar products");
        Ok(ranked)
    }

    /// Catalog products that best fit `profile`, excluding what it already owns
    pub async fn recommend_for_profile(
        &self,
        profile: &UserPreferenceProfile,
        limit: usize,
    ) -> AppResult<Vec<Product>> {
        let candidates = self.catalog.list_products(&ProductFilter::default()).await?;

        let scored = candidates
            .into_iter()
            .filter(|p| !profile.purchased.contains(&p.id))
            .map(|p| (preference_score(&p, profile, &self.preference_weights), p))
            .collect();

        Ok(rank(scored, limit))
    }

    /// Builds a user's preference profile from their paid orders
    ///
    /// Purchased products the catalog no longer knows are skipped.
    pub async fn build_profile(&self, user: UserId) -> AppResult<UserPreferenceProfile> {
        let orders = self.orders.get_paid_orders_for_user(user).await?;

        let mut seen = HashSet::new();
        let purchased: Vec<ProductId> = orders
            .iter()
            .flat_map(|order| order.product_ids())
            .filter(|id| seen.insert(*id))
            .collect();

        let products = fetch_products(&self.catalog, purchased).await?;
        Ok(UserPreferenceProfile::from_products(&products))
    }

    /// Profile-based suggestions for a user; popular products when they have no history
    pub async fn recommend_for_user_profile(
        &self,
        user: UserId,
        limit: usize,
    ) -> AppResult<Vec<Product>> {
        let profile = self.build_profile(user).await?;
        if profile.is_empty() {
            tracing::debug!(user_id = %user, "No purchase history, serving popular products");
            let all = self.catalog.list_products(&ProductFilter::default()).await?;
            return Ok(popular_from(all, limit));
        }

        self.recommend_for_profile(&profile, limit).await
    }
}
