use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::TransactionBehavior;
use std::collections::HashMap;

use super::connection::{DbPool, get_connection};
use super::{entities, ratings};
use crate::rating::{
    EntityId, EntityKind, EntityRef, NewRating, RatingId, RatingRecord, RatingStore, Score,
    Summary,
};

/// `RatingStore` backed by the SQLite pool.
///
/// Each call checks out its own connection and returns it before the next
/// call, so a single-connection pool is enough. Summary read-modify-writes
/// run in `BEGIN IMMEDIATE` transactions: the write lock is taken before the
/// read, which serialises them against every other connection to the file.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl RatingStore for SqliteStore {
    fn summary(&self, entity: &EntityRef) -> Result<Option<Summary>> {
        let conn = get_connection(&self.pool)?;
        entities::get_summary(&conn, entity)
    }

    fn append(
        &self,
        rating: &NewRating,
        next: &dyn Fn(Summary) -> Summary,
    ) -> Result<Option<(RatingRecord, Summary)>> {
        let mut conn = get_connection(&self.pool)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to begin transaction")?;

        // Dropping the transaction rolls it back
        let Some(previous) = entities::get_summary(&tx, &rating.entity)? else {
            return Ok(None);
        };
        let summary = next(previous);
        let now = Utc::now().naive_utc();

        entities::write_summary(&tx, &rating.entity, summary, now)?;
        let record = ratings::insert_rating(&tx, rating, now)?;

        tx.commit().context("Failed to commit rating")?;
        Ok(Some((record, summary)))
    }

    fn refresh_summary(
        &self,
        entity: &EntityRef,
        fresh: &dyn Fn(&[Score]) -> Summary,
    ) -> Result<Option<(Summary, Summary)>> {
        let mut conn = get_connection(&self.pool)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to begin transaction")?;

        let Some(cached) = entities::get_summary(&tx, entity)? else {
            return Ok(None);
        };
        let scores: Vec<Score> = ratings::list_by_entity(&tx, entity)?
            .iter()
            .map(|r| r.score)
            .collect();
        let summary = fresh(&scores);

        entities::write_summary(&tx, entity, summary, Utc::now().naive_utc())?;
        tx.commit().context("Failed to commit summary")?;
        Ok(Some((cached, summary)))
    }

    fn find_by_entity(&self, entity: &EntityRef) -> Result<Vec<RatingRecord>> {
        let conn = get_connection(&self.pool)?;
        ratings::list_by_entity(&conn, entity)
    }

    fn group_average(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
    ) -> Result<HashMap<EntityId, (f64, u64)>> {
        let conn = get_connection(&self.pool)?;
        ratings::group_average(&conn, kind, ids)
    }

    fn find_rating(&self, id: RatingId) -> Result<Option<RatingRecord>> {
        let conn = get_connection(&self.pool)?;
        ratings::find_by_id(&conn, id)
    }

    fn update_rating(
        &self,
        id: RatingId,
        score: Score,
        comment: Option<&str>,
    ) -> Result<Option<RatingRecord>> {
        let conn = get_connection(&self.pool)?;
        ratings::update_rating(&conn, id, score, comment, Utc::now().naive_utc())
    }

    fn delete_rating(&self, id: RatingId) -> Result<bool> {
        let conn = get_connection(&self.pool)?;
        ratings::delete_rating(&conn, id)
    }

    fn entity_ids(&self, kind: EntityKind) -> Result<Vec<EntityId>> {
        let conn = get_connection(&self.pool)?;
        entities::list_ids(&conn, kind)
    }
}
