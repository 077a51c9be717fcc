use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::settings::AppConfig;
use crate::database::{DbConn, DbPool, SqliteStore, get_connection};
use crate::rating::{EntityId, EntityKind, EntityRef, RatingAggregator};

pub mod admin;
pub mod entities;
pub mod ratings;

pub struct AppState {
    pub pool: DbPool,
    pub config: AppConfig,
    pub aggregator: RatingAggregator<SqliteStore>,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        let aggregator = RatingAggregator::new(SqliteStore::new(pool.clone()), &config.rating);
        Self {
            pool,
            config,
            aggregator,
        }
    }

    pub fn connection(&self) -> ApiResult<DbConn> {
        get_connection(&self.pool).map_err(ApiError::storage)
    }

    /// Runs pool checkouts and aggregator calls on tokio's blocking threads;
    /// both may wait on a mutex or the SQLite busy timeout.
    pub async fn blocking<T, F>(self: &Arc<Self>, work: F) -> ApiResult<T>
    where
        F: FnOnce(&AppState) -> ApiResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || work(&state))
            .await
            .map_err(|e| ApiError::storage(anyhow::anyhow!("Blocking task failed: {}", e)))?
    }
}

pub fn parse_kind(raw: &str) -> ApiResult<EntityKind> {
    raw.parse().map_err(ApiError::NotFound)
}

pub fn entity_ref(raw_kind: &str, id: EntityId) -> ApiResult<EntityRef> {
    Ok(EntityRef::new(parse_kind(raw_kind)?, id))
}
