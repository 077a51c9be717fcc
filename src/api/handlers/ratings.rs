use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{AppState, entity_ref, parse_kind};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{Json, Path, Query};
use crate::api::models::{
    AverageResponse, CreateRatingPayload, EntitySummaryResponse, RatingWithSummary,
    SummaryParams, UpdateRatingPayload,
};
use crate::rating::{EntityId, NewRating, RatingId, RatingRecord, Summary};

pub async fn record_rating(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, EntityId)>,
    Json(payload): Json<CreateRatingPayload>,
) -> ApiResult<impl IntoResponse> {
    let entity = entity_ref(&kind, id)?;
    let user_id = payload.user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::BadRequest("userId is required".to_string()));
    }

    let new_rating = NewRating {
        entity,
        user_id: user_id.to_string(),
        score: payload.score,
        comment: payload.comment,
    };
    let (rating, summary) = state
        .blocking(move |s| Ok(s.aggregator.record_rating(new_rating)?))
        .await?;

    log::info!(
        "Rating {} recorded for {}: now {:.2} over {}",
        rating.id,
        entity,
        summary.rating,
        summary.review_count
    );
    Ok((StatusCode::CREATED, Json(RatingWithSummary { rating, summary })))
}

pub async fn list_ratings(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, EntityId)>,
) -> ApiResult<Json<Vec<RatingRecord>>> {
    let entity = entity_ref(&kind, id)?;
    let ratings = state
        .blocking(move |s| Ok(s.aggregator.ratings_for(entity)?))
        .await?;
    Ok(Json(ratings))
}

/// Fresh average straight from the ratings; leaves the cached summary alone
pub async fn get_average(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, EntityId)>,
) -> ApiResult<Json<AverageResponse>> {
    let entity = entity_ref(&kind, id)?;
    let summary = state
        .blocking(move |s| Ok(s.aggregator.aggregate_by_group(entity.kind, &[entity.id])?))
        .await?
        .remove(&entity.id)
        .unwrap_or_default();

    Ok(Json(AverageResponse {
        entity_id: entity.id,
        average_score: summary.rating,
        count: summary.review_count,
    }))
}

pub async fn recompute(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, EntityId)>,
) -> ApiResult<Json<EntitySummaryResponse>> {
    let entity = entity_ref(&kind, id)?;
    let summary = state
        .blocking(move |s| Ok(s.aggregator.recompute(entity)?))
        .await?;

    Ok(Json(EntitySummaryResponse {
        entity_id: entity.id,
        kind: entity.kind,
        summary,
    }))
}

pub async fn get_summaries(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(params): Query<SummaryParams>,
) -> ApiResult<Json<BTreeMap<EntityId, Summary>>> {
    let kind = parse_kind(&kind)?;
    let ids = parse_ids(params.ids.as_deref().unwrap_or(""))?;

    let summaries = state
        .blocking(move |s| Ok(s.aggregator.aggregate_by_group(kind, &ids)?))
        .await?;
    Ok(Json(summaries))
}

/// Parses a comma separated id list such as `1,2, 3`
fn parse_ids(raw: &str) -> ApiResult<Vec<EntityId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<EntityId>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid id: {}", s)))
        })
        .collect()
}

pub async fn get_rating(
    State(state): State<Arc<AppState>>,
    Path(id): Path<RatingId>,
) -> ApiResult<Json<RatingRecord>> {
    let rating = state
        .blocking(move |s| Ok(s.aggregator.find_rating(id)?))
        .await?;
    Ok(Json(rating))
}

pub async fn update_rating(
    State(state): State<Arc<AppState>>,
    Path(id): Path<RatingId>,
    Json(payload): Json<UpdateRatingPayload>,
) -> ApiResult<Json<RatingWithSummary>> {
    let (rating, summary) = state
        .blocking(move |s| {
            Ok(s.aggregator
                .edit_rating(id, payload.score, payload.comment.as_deref())?)
        })
        .await?;

    log::info!("Rating {} edited, {} recomputed", id, rating.entity());
    Ok(Json(RatingWithSummary { rating, summary }))
}

pub async fn delete_rating(
    State(state): State<Arc<AppState>>,
    Path(id): Path<RatingId>,
) -> ApiResult<Json<Summary>> {
    let summary = state
        .blocking(move |s| Ok(s.aggregator.remove_rating(id)?))
        .await?;
    log::info!("Rating {} deleted", id);
    Ok(Json(summary))
}
