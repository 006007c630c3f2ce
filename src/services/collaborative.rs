use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    db::{Catalog, OrderHistory},
    error::AppResult,
    models::{Order, Product, ProductFilter, ProductId, UserId},
    services::lookup::fetch_products,
};

/// How many overlapping users feed a collaborative ranking
pub const MAX_SIMILAR_USERS: usize = 10;

/// Best-rated products first, more reviews breaking rating ties
pub fn popular_from(mut products: Vec<Product>, limit: usize) -> Vec<Product> {
    products.sort_by(|a, b| {
        b.rating
            .total_cmp(&a.rating)
            .then_with(|| b.num_reviews.cmp(&a.num_reviews))
    });
    products.truncate(limit);
    products
}

/// A user whose purchases overlap the subject's, with the orders that show it
struct SimilarUser<'a> {
    user: UserId,
    overlap: usize,
    orders: Vec<&'a Order>,
}

/// Groups orders by user, users in order of first appearance
fn group_by_user(orders: &[Order]) -> Vec<(UserId, Vec<&Order>)> {
    let mut index: HashMap<UserId, usize> = HashMap::new();
    let mut grouped: Vec<(UserId, Vec<&Order>)> = Vec::new();

    for order in orders {
        let slot = *index.entry(order.user).or_insert_with(|| {
            grouped.push((order.user, Vec::new()));
            grouped.len() - 1
        });
        grouped[slot].1.push(order);
    }

    grouped
}

/// Users sharing purchases with `purchased`, most overlap first
///
/// Overlap is the raw number of order lines hitting the subject's products.
/// It is not normalised by history size, so heavy buyers rank high.
fn find_similar_users<'a>(
    others: &'a [Order],
    purchased: &HashSet<ProductId>,
    max_users: usize,
) -> Vec<SimilarUser<'a>> {
    let mut similar: Vec<SimilarUser<'a>> = group_by_user(others)
        .into_iter()
        .map(|(user, orders)| {
            let overlap = orders
                .iter()
                .flat_map(|order| order.product_ids())
                .filter(|id| purchased.contains(id))
                .count();
            SimilarUser {
                user,
                overlap,
                orders,
            }
        })
        .filter(|candidate| candidate.overlap > 0)
        .collect();

    similar.sort_by(|a, b| b.overlap.cmp(&a.overlap));
    similar.truncate(max_users);
    similar
}

/// Recommends from what users with overlapping purchase histories bought
pub struct CollaborativeRecommender {
    catalog: Arc<dyn Catalog>,
    orders: Arc<dyn OrderHistory>,
    max_similar_users: usize,
}

impl CollaborativeRecommender {
    /// Recommender considering at most [`MAX_SIMILAR_USERS`] neighbours
    pub fn new(catalog: Arc<dyn Catalog>, orders: Arc<dyn OrderHistory>) -> Self {
        Self {
            catalog,
            orders,
            max_similar_users: MAX_SIMILAR_USERS,
        }
    }

    /// Top-rated catalog products
    ///
    /// Sorted by rating, then review count; an empty catalog yields an empty list.
    pub async fn popular_products(&self, limit: usize) -> AppResult<Vec<Product>> {
        let products = self.catalog.list_products(&ProductFilter::default()).await?;
        Ok(popular_from(products, limit))
    }

    /// Products bought by similar users that `user` has not bought yet
    ///
    /// Falls back to popular products when the user has no paid orders, and
    /// to best-rated products in the user's categories when nobody overlaps.
    pub async fn recommend_collaborative(
        &self,
        user: UserId,
        limit: usize,
    ) -> AppResult<Vec<Product>> {
        let own_orders = self.orders.get_paid_orders_for_user(user).await?;
        self.recommend_from_orders(user, &own_orders, limit).await
    }

    /// Same as [`recommend_collaborative`](Self::recommend_collaborative), for
    /// a caller that already holds `user`'s paid orders
    ///
    /// Only the other users' orders are read from the order history.
    pub async fn recommend_from_orders(
        &self,
        user: UserId,
        own_orders: &[Order],
        limit: usize,
    ) -> AppResult<Vec<Product>> {
        let mut purchased_order: Vec<ProductId> = Vec::new();
        let mut purchased: HashSet<ProductId> = HashSet::new();
        for id in own_orders.iter().flat_map(|order| order.product_ids()) {
            if purchased.insert(id) {
                purchased_order.push(id);
            }
        }

        if purchased.is_empty() {
            tracing::debug!(user_id = %user, "No purchase history, serving popular products");
            return self.popular_products(limit).await;
        }

        let others = self.orders.get_all_paid_orders_excluding_user(user).await?;
        let similar = find_similar_users(&others, &purchased, self.max_similar_users);

        if similar.is_empty() {
            tracing::debug!(user_id = %user, "No overlapping users, falling back to categories");
            return self
                .recommend_by_category(&purchased_order, &purchased, limit)
                .await;
        }

        tracing::debug!(
            user_id = %user,
            similar_users = similar.len(),
            closest_user = %similar[0].user,
            top_overlap = similar[0].overlap,
            "Found similar users"
        );

        let mut frequency: HashMap<ProductId, usize> = HashMap::new();
        let mut encounter: Vec<ProductId> = Vec::new();
        for candidate in &similar {
            for id in candidate.orders.iter().flat_map(|order| order.product_ids()) {
                if purchased.contains(&id) {
                    continue;
                }
                let count = frequency.entry(id).or_insert(0);
                if *count == 0 {
                    encounter.push(id);
                }
                *count += 1;
            }
        }

        let products = fetch_products(&self.catalog, encounter).await?;
        let mut ranked: Vec<(usize, Product)> = products
            .into_iter()
            .map(|p| (frequency.get(&p.id).copied().unwrap_or(0), p))
            .collect();

        ranked.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.rating.total_cmp(&a.1.rating))
        });

        Ok(ranked.into_iter().take(limit).map(|(_, p)| p).collect())
    }

    /// Best-rated products in the categories the user already buys from
    async fn recommend_by_category(
        &self,
        purchased_order: &[ProductId],
        purchased: &HashSet<ProductId>,
        limit: usize,
    ) -> AppResult<Vec<Product>> {
        let owned = fetch_products(&self.catalog, purchased_order.to_vec()).await?;

        let mut categories: Vec<String> = Vec::new();
        for product in &owned {
            if !categories.contains(&product.category) {
                categories.push(product.category.clone());
            }
        }
        if categories.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates = self
            .catalog
            .list_products_by_category(&categories, purchased_order)
            .await?;
        candidates.retain(|p| !purchased.contains(&p.id));
        candidates.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        candidates.truncate(limit);

        Ok(candidates)
    }
}
