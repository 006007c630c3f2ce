use std::collections::HashSet;

use super::{Product, ProductId};

/// Summary of what a user has bought, built per request and then dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPreferenceProfile {
    pub categories: HashSet<String>,
    pub brands: HashSet<String>,
    /// Lowest and highest price among purchased products
    pub price_range: Option<(f64, f64)>,
    /// Products the user already owns; never recommended back
    pub purchased: HashSet<ProductId>,
}

impl UserPreferenceProfile {
    /// Builds a profile from the products a user has paid for
    ///
    /// Categories and brands are collected as sets, the price range spans the
    /// cheapest and dearest purchase, and every product id lands in `purchased`.
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        let mut profile = Self::default();

        for product in products {
            profile.categories.insert(product.category.clone());
            profile.brands.insert(product.brand.clone());
            profile.purchased.insert(product.id);
            profile.price_range = Some(match profile.price_range {
                Some((min, max)) => (min.min(product.price), max.max(product.price)),
                None => (product.price, product.price),
            });
        }

        profile
    }

    /// True when the user has no resolvable purchases
    ///
    /// Callers treat an empty profile as "no history" and serve popular
    /// products instead of scoring against it.
    pub fn is_empty(&self) -> bool {
        self.purchased.is_empty()
    }
}
