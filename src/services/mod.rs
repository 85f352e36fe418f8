//! Recommendation core and the catalog operations around it.

pub mod catalog;
pub mod content_based;
pub mod preferences;
pub mod ranking;
pub mod recommendations;
pub mod similarity;
pub mod tfidf;

pub use catalog::Catalog;
pub use content_based::ContentBasedRecommender;
pub use preferences::PreferenceProfileBuilder;
pub use ranking::PopularityOrder;
pub use recommendations::RecommendationService;
