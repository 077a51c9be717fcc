use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::rating::AggregatorError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Aggregator(#[from] AggregatorError),
}

impl ApiError {
    /// Database failures outside the aggregator surface the same way its own do
    pub fn storage(err: anyhow::Error) -> Self {
        ApiError::Aggregator(AggregatorError::storage(err))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Aggregator(AggregatorError::InvalidScore(_)) => StatusCode::BAD_REQUEST,
            ApiError::Aggregator(AggregatorError::EntityNotFound(_))
            | ApiError::Aggregator(AggregatorError::RatingNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Aggregator(AggregatorError::StorageUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::{EntityKind, EntityRef};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(AggregatorError::InvalidScore(0.0)), StatusCode::BAD_REQUEST),
            (
                ApiError::from(AggregatorError::EntityNotFound(EntityRef::new(EntityKind::Hotel, 1))),
                StatusCode::NOT_FOUND,
            ),
            (ApiError::from(AggregatorError::RatingNotFound(3)), StatusCode::NOT_FOUND),
            (
                ApiError::storage(anyhow::anyhow!("disk I/O error")),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{}", error);
        }
    }
}
