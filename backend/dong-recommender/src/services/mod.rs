pub mod feature_store;
pub mod lookup;
pub mod ranking;
pub mod reasons;
pub mod recommender;
pub mod search;

pub use feature_store::FeatureStore;
pub use lookup::NameLookup;
pub use ranking::{ProbabilityModel, RankingScorer};
pub use recommender::Recommender;
