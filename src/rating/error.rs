use thiserror::Error;

use super::types::{EntityRef, RatingId, Score};

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("Invalid score {0}: must be between 1 and 5")]
    InvalidScore(Score),

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityRef),

    #[error("Rating not found: {0}")]
    RatingNotFound(RatingId),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl AggregatorError {
    /// Keeps the whole context chain of a store failure in the message
    pub fn storage(err: anyhow::Error) -> Self {
        AggregatorError::StorageUnavailable(format!("{:#}", err))
    }
}

pub type AggregatorResult<T> = Result<T, AggregatorError>;
