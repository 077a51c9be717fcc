use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use std::collections::HashMap;

use super::models::kind_column;
use crate::rating::{EntityId, EntityKind, EntityRef, NewRating, RatingId, RatingRecord, Score};

// Keeps every grouped query well under SQLite's bound-parameter limit
const GROUP_CHUNK_SIZE: usize = 500;

const RATING_SELECT: &str = "SELECT r.id, r.user_id, r.entity_id, e.kind, r.score, r.comment, r.created_at, r.updated_at FROM ratings r JOIN entities e ON e.id = r.entity_id";

pub fn insert_rating(
    conn: &Connection,
    rating: &NewRating,
    now: NaiveDateTime,
) -> Result<RatingRecord> {
    let sql = "INSERT INTO ratings (entity_id, user_id, score, comment, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5) RETURNING id";

    let id: RatingId = conn
        .query_row(
            sql,
            params![
                rating.entity.id,
                rating.user_id,
                rating.score,
                rating.comment,
                now
            ],
            |r| r.get(0),
        )
        .context("Failed to insert rating")?;

    Ok(RatingRecord {
        id,
        user_id: rating.user_id.clone(),
        entity_id: rating.entity.id,
        entity_kind: rating.entity.kind,
        score: rating.score,
        comment: rating.comment.clone(),
        created_at: now,
        updated_at: now,
    })
}

fn parse_rating_row(row: &rusqlite::Row) -> rusqlite::Result<RatingRecord> {
    Ok(RatingRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        entity_id: row.get(2)?,
        entity_kind: kind_column(row, 3)?,
        score: row.get(4)?,
        comment: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub fn find_by_id(conn: &Connection, id: RatingId) -> Result<Option<RatingRecord>> {
    let sql = format!("{} WHERE r.id = ?1", RATING_SELECT);

    conn.query_row(&sql, params![id], parse_rating_row)
        .optional()
        .context("Failed to query rating by id")
}

pub fn list_by_entity(conn: &Connection, entity: &EntityRef) -> Result<Vec<RatingRecord>> {
    let sql = format!(
        "{} WHERE r.entity_id = ?1 AND e.kind = ?2 ORDER BY r.created_at, r.id",
        RATING_SELECT
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![entity.id, entity.kind.as_str()], parse_rating_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to list ratings for entity")?;

    Ok(rows)
}

pub fn update_rating(
    conn: &Connection,
    id: RatingId,
    score: Score,
    comment: Option<&str>,
    now: NaiveDateTime,
) -> Result<Option<RatingRecord>> {
    let updated = conn
        .execute(
            "UPDATE ratings SET score = ?1, comment = ?2, updated_at = ?3 WHERE id = ?4",
            params![score, comment, now, id],
        )
        .context("Failed to update rating")?;

    if updated == 0 {
        return Ok(None);
    }
    find_by_id(conn, id)
}

pub fn delete_rating(conn: &Connection, id: RatingId) -> Result<bool> {
    let deleted = conn
        .execute("DELETE FROM ratings WHERE id = ?1", params![id])
        .context("Failed to delete rating")?;

    Ok(deleted > 0)
}

/// Mean score and count per entity, computed by SQLite (`GROUP BY`).
/// Entities without ratings do not appear.
pub fn group_average(
    conn: &Connection,
    kind: EntityKind,
    ids: &[EntityId],
) -> Result<HashMap<EntityId, (f64, u64)>> {
    let mut averages = HashMap::with_capacity(ids.len());

    for chunk in ids.chunks(GROUP_CHUNK_SIZE) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!(
            "SELECT r.entity_id, AVG(r.score), COUNT(*) FROM ratings r JOIN entities e ON e.id = r.entity_id WHERE e.kind = ? AND r.entity_id IN ({}) GROUP BY r.entity_id",
            placeholders
        );

        let values = std::iter::once(Value::Text(kind.as_str().to_string()))
            .chain(chunk.iter().map(|&id| Value::Integer(id)));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |r| {
                let count: i64 = r.get(2)?;
                Ok((r.get::<_, EntityId>(0)?, (r.get::<_, f64>(1)?, count.max(0) as u64)))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to aggregate ratings")?;

        averages.extend(rows);
    }

    Ok(averages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::insert_entity;
    use crate::database::setup::ensure_schema;
    use chrono::Utc;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    fn entity(conn: &Connection, kind: EntityKind) -> EntityRef {
        insert_entity(conn, kind, "Place", None, Utc::now().naive_utc())
            .unwrap()
            .entity_ref()
    }

    fn rate(conn: &Connection, entity: EntityRef, score: Score) -> RatingRecord {
        let rating = NewRating {
            entity,
            user_id: "u-1".to_string(),
            score,
            comment: Some("fine".to_string()),
        };
        insert_rating(conn, &rating, Utc::now().naive_utc()).unwrap()
    }

    #[test]
    fn test_insert_find_and_list() {
        let conn = open();
        let hotel = entity(&conn, EntityKind::Hotel);
        let first = rate(&conn, hotel, 4.0);
        rate(&conn, hotel, 5.0);

        let found = find_by_id(&conn, first.id).unwrap().unwrap();
        assert_eq!(found.entity_kind, EntityKind::Hotel);
        assert_eq!(found.comment.as_deref(), Some("fine"));

        let listed = list_by_entity(&conn, &hotel).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);

        let other_kind = EntityRef::new(EntityKind::Cuisine, hotel.id);
        assert!(list_by_entity(&conn, &other_kind).unwrap().is_empty());
    }

    #[test]
    fn test_score_outside_range_is_rejected_by_schema() {
        let conn = open();
        let hotel = entity(&conn, EntityKind::Hotel);
        let rating = NewRating {
            entity: hotel,
            user_id: "u-1".to_string(),
            score: 9.0,
            comment: None,
        };
        assert!(insert_rating(&conn, &rating, Utc::now().naive_utc()).is_err());
    }

    #[test]
    fn test_update_and_delete() {
        let conn = open();
        let hotel = entity(&conn, EntityKind::Hotel);
        let rating = rate(&conn, hotel, 2.0);

        let updated = update_rating(&conn, rating.id, 3.5, None, Utc::now().naive_utc())
            .unwrap()
            .unwrap();
        assert_eq!(updated.score, 3.5);
        assert!(updated.comment.is_none());
        assert!(update_rating(&conn, 404, 3.0, None, Utc::now().naive_utc()).unwrap().is_none());

        assert!(delete_rating(&conn, rating.id).unwrap());
        assert!(!delete_rating(&conn, rating.id).unwrap());
    }

    #[test]
    fn test_group_average() {
        let conn = open();
        let first = entity(&conn, EntityKind::Hotel);
        let second = entity(&conn, EntityKind::Hotel);
        let restaurant = entity(&conn, EntityKind::Restaurant);
        rate(&conn, first, 2.0);
        rate(&conn, first, 4.0);
        rate(&conn, restaurant, 5.0);

        let averages =
            group_average(&conn, EntityKind::Hotel, &[first.id, second.id, restaurant.id]).unwrap();

        assert_eq!(averages.len(), 1);
        assert_eq!(averages[&first.id], (3.0, 2));
    }

    #[test]
    fn test_ratings_follow_entity_deletion() {
        let conn = open();
        let hotel = entity(&conn, EntityKind::Hotel);
        let rating = rate(&conn, hotel, 4.0);

        crate::database::entities::delete_entity(&conn, &hotel).unwrap();

        assert!(find_by_id(&conn, rating.id).unwrap().is_none());
    }
}
