use axum::{extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use std::sync::Arc;

use super::{AppState, entity_ref, parse_kind};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{Json, Path, Query};
use crate::api::models::{CreateEntityPayload, EntityResponse, PaginatedResponse};
use crate::api::pagination::{Page, PageParams};
use crate::database::{self, EntityFilter};
use crate::rating::EntityId;

const MAX_NAME_LEN: usize = 200;

pub async fn create_entity(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Json(payload): Json<CreateEntityPayload>,
) -> ApiResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    let name = validate_name(&payload.name)?.to_string();
    let description = payload
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    let entity = state
        .blocking(move |s| {
            let conn = s.connection()?;
            database::entities::insert_entity(
                &conn,
                kind,
                &name,
                description.as_deref(),
                Utc::now().naive_utc(),
            )
            .map_err(ApiError::storage)
        })
        .await?;

    log::info!("Created {} {} ({})", kind, entity.id, entity.name);
    Ok((StatusCode::CREATED, Json(EntityResponse::from(entity))))
}

fn validate_name(raw: &str) -> ApiResult<&str> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "name must be between 1 and {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name)
}

pub async fn list_entities(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<PaginatedResponse<EntityResponse>>> {
    let kind = parse_kind(&kind)?;
    let page = Page::from_params(&params, &state.config.server)?;

    let filter = EntityFilter {
        kind,
        limit: page.page_size,
        offset: page.offset(),
    };

    let (rows, total) = state
        .blocking(move |s| {
            let conn = s.connection()?;
            database::entities::list_page(&conn, &filter).map_err(ApiError::storage)
        })
        .await?;

    Ok(Json(PaginatedResponse {
        items: rows.into_iter().map(EntityResponse::from).collect(),
        total,
        page: page.page,
        page_size: page.page_size,
        pages: page.total_pages(total),
    }))
}

pub async fn get_entity(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, EntityId)>,
) -> ApiResult<Json<EntityResponse>> {
    let entity = entity_ref(&kind, id)?;

    let row = state
        .blocking(move |s| {
            let conn = s.connection()?;
            database::entities::find_by_id(&conn, &entity).map_err(ApiError::storage)
        })
        .await?;

    row.map(|row| Json(EntityResponse::from(row)))
        .ok_or_else(|| ApiError::NotFound(format!("{} not found", entity)))
}

pub async fn delete_entity(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, EntityId)>,
) -> ApiResult<StatusCode> {
    let entity = entity_ref(&kind, id)?;

    let deleted = state
        .blocking(move |s| {
            let conn = s.connection()?;
            database::entities::delete_entity(&conn, &entity).map_err(ApiError::storage)
        })
        .await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("{} not found", entity)));
    }

    log::info!("Deleted {} with its ratings", entity);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Seaside Inn ").unwrap(), "Seaside Inn");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
    }
}
