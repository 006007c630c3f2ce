//! Pairwise product similarity for content-based recommendations.
//!
//! The score is a weighted blend of four signals, each normalised to `[0, 1]`
//! before weighting: category match, brand match, price proximity and
//! description word overlap.

use std::collections::HashSet;

use crate::models::Product;

/// Weight of each similarity signal
///
/// With weights summing to 1.0 the blended score is already in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityWeights {
    pub category: f64,
    pub brand: f64,
    pub price: f64,
    pub description: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            category: 0.4,
            brand: 0.2,
            price: 0.2,
            description: 0.2,
        }
    }
}

/// Similarity of two products in `[0, 1]`; symmetric in its arguments
pub fn similarity(a: &Product, b: &Product, weights: &SimilarityWeights) -> f64 {
    let mut score = 0.0;

    if a.category == b.category {
        score += weights.category;
    }
    if a.brand == b.brand {
        score += weights.brand;
    }
    score += weights.price * price_proximity(a.price, b.price);
    score += weights.description * description_overlap(&a.description, &b.description);

    score.clamp(0.0, 1.0)
}

/// `1 - |a - b| / mean(a, b)`, floored at 0
pub fn price_proximity(a: f64, b: f64) -> f64 {
    let avg = (a + b) / 2.0;
    if avg <= 0.0 {
        return 0.0;
    }
    (1.0 - (a - b).abs() / avg).max(0.0)
}

/// Shared words relative to the token count of the longer description
///
/// Words are lower-cased and split on whitespace. A shared word counts once
/// however often it repeats, while the denominator counts every token, so
/// "the the shoe" against "the shoe" scores 2/3.
pub fn description_overlap(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    let longest = tokens_a.len().max(tokens_b.len());
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let words_a: HashSet<&str> = tokens_a.iter().map(String::as_str).collect();
    let words_b: HashSet<&str> = tokens_b.iter().map(String::as_str).collect();
    let common = words_a.intersection(&words_b).count();
    common as f64 / longest as f64
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductId;

    fn product(category: &str, brand: &str, price: f64, description: &str) -> Product {
        Product {
            id: ProductId::new(),
            name: "Sample".to_string(),
            description: description.to_string(),
            category: category.to_string(),
            brand: brand.to_string(),
            price,
            rating: 4.0,
            num_reviews: 10,
            count_in_stock: 3,
        }
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let w = SimilarityWeights::default();
        assert!((w.category + w.brand + w.price + w.description - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_related_products_outscore_unrelated() {
        let p1 = product("Electronics", "Acme", 100.0, "wireless noise cancelling headphones");
        let p2 = product("Electronics", "Acme", 110.0, "wireless over-ear headphones");
        let p3 = product("Garden", "Verdant", 15.0, "ceramic plant pot");

        let weights = SimilarityWeights::default();
        let close = similarity(&p1, &p2, &weights);
        let far = similarity(&p1, &p3, &weights);

        assert!(close > far);
        assert!(close > 0.7);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let weights = SimilarityWeights::default();
        let pairs = [
            (
                product("Books", "Penguin", 12.0, "a gripping mystery novel novel"),
                product("Books", "Vintage", 20.0, "Mystery thriller"),
            ),
            (
                product("Toys", "Blocko", 45.0, ""),
                product("Toys", "Blocko", 5.0, "building blocks set"),
            ),
        ];

        for (a, b) in &pairs {
            assert_eq!(similarity(a, b, &weights), similarity(b, a, &weights));
        }
    }

    #[test]
    fn test_similarity_stays_in_unit_range() {
        let weights = SimilarityWeights::default();
        let a = product("Home", "Lumen", 30.0, "warm desk lamp");
        let b = product("Home", "Lumen", 30.0, "warm desk lamp");
        let c = product("Auto", "Torque", 900.0, "socket wrench kit");

        for (x, y) in [(&a, &b), (&a, &c), (&b, &c)] {
            let score = similarity(x, y, &weights);
            assert!((0.0..=1.0).contains(&score), "score out of range: {}", score);
        }
        assert!((similarity(&a, &b, &weights) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_proximity() {
        assert_eq!(price_proximity(100.0, 100.0), 1.0);
        assert!((price_proximity(100.0, 110.0) - (1.0 - 10.0 / 105.0)).abs() < 1e-9);
        assert_eq!(price_proximity(1.0, 1000.0), 0.0);
        assert_eq!(price_proximity(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_description_overlap() {
        assert_eq!(description_overlap("", "anything at all"), 0.0);
        assert_eq!(description_overlap("Red Shoe", "red shoe"), 1.0);
        assert_eq!(description_overlap("red running shoe", "blue shoe"), 1.0 / 3.0);
    }

    #[test]
    fn test_description_overlap_counts_repeated_tokens_in_length() {
        let overlap = description_overlap("the red and the blue shoe", "the shoe");
        assert!((overlap - 2.0 / 6.0).abs() < 1e-9, "overlap = {}", overlap);
        assert_eq!(
            description_overlap("the red and the blue shoe", "the shoe"),
            description_overlap("the shoe", "the red and the blue shoe")
        );
    }
}
