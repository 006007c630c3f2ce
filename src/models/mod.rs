pub mod ids;
pub mod order;
pub mod product;
pub mod profile;
pub mod recommendation;

pub use ids::{ProductId, UserId};
pub use order::{Order, OrderItem};
pub use product::{Product, ProductFilter, ProductSummary};
pub use profile::UserPreferenceProfile;
pub use recommendation::{
    CacheStats, ProductRecommendations, RecommendationKind, RecommendationResult, Subject,
    UserRecommendations,
};
