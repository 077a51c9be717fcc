use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::database::DbEntity;
use crate::rating::{EntityId, EntityKind, RatingRecord, Score, Summary};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntityPayload {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRatingPayload {
    #[serde(alias = "user_id")]
    pub user_id: String,
    pub score: Score,
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateRatingPayload {
    pub score: Score,
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct SummaryParams {
    pub ids: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityResponse {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub description: Option<String>,
    pub rating: f64,
    pub review_count: u64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<DbEntity> for EntityResponse {
    fn from(entity: DbEntity) -> Self {
        let summary = entity.summary();
        Self {
            id: entity.id,
            kind: entity.kind,
            name: entity.name,
            description: entity.description,
            rating: summary.rating,
            review_count: summary.review_count,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub pages: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingWithSummary {
    pub rating: RatingRecord,
    pub summary: Summary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummaryResponse {
    pub entity_id: EntityId,
    pub kind: EntityKind,
    #[serde(flatten)]
    pub summary: Summary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageResponse {
    pub entity_id: EntityId,
    pub average_score: f64,
    pub count: u64,
}
