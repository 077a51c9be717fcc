pub mod aggregator;
pub mod average;
pub mod error;
pub mod store;
pub mod types;

pub use aggregator::RatingAggregator;
pub use error::{AggregatorError, AggregatorResult};
pub use store::RatingStore;
pub use types::{
    EntityId, EntityKind, EntityRef, NewRating, RatingId, RatingRecord, ReconcileReport, Score,
    Summary,
};
