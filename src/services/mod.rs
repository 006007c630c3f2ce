pub mod cache;
pub mod collaborative;
pub mod content;
pub mod lookup;
pub mod recommendations;
pub mod similarity;

pub use cache::{CacheStore, MemoryStore, RecommendationCache};
pub use collaborative::CollaborativeRecommender;
pub use content::ContentRecommender;
pub use recommendations::RecommendationGateway;
