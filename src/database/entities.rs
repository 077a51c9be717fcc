use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};

use super::models::{DbEntity, EntityFilter, kind_column};
use crate::rating::{EntityId, EntityKind, EntityRef, Summary};

const ENTITY_COLUMNS: &str =
    "id, kind, name, description, rating, review_count, created_at, updated_at";

pub fn insert_entity(
    conn: &Connection,
    kind: EntityKind,
    name: &str,
    description: Option<&str>,
    now: NaiveDateTime,
) -> Result<DbEntity> {
    let sql = format!(
        "INSERT INTO entities (kind, name, description, rating, review_count, created_at, updated_at) VALUES (?1, ?2, ?3, 0, 0, ?4, ?4) RETURNING {}",
        ENTITY_COLUMNS
    );

    conn.query_row(
        &sql,
        params![kind.as_str(), name, description, now],
        parse_entity_row,
    )
    .context("Failed to insert entity")
}

fn parse_entity_row(row: &rusqlite::Row) -> rusqlite::Result<DbEntity> {
    Ok(DbEntity {
        id: row.get(0)?,
        kind: kind_column(row, 1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        rating: row.get(4)?,
        review_count: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub fn find_by_id(conn: &Connection, entity: &EntityRef) -> Result<Option<DbEntity>> {
    let sql = format!(
        "SELECT {} FROM entities WHERE id = ?1 AND kind = ?2",
        ENTITY_COLUMNS
    );

    conn.query_row(&sql, params![entity.id, entity.kind.as_str()], parse_entity_row)
        .optional()
        .context("Failed to query entity by id")
}

/// One page of entities, newest first, plus the total for the kind
pub fn list_page(conn: &Connection, filter: &EntityFilter) -> Result<(Vec<DbEntity>, usize)> {
    let total: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM entities WHERE kind = ?1",
            params![filter.kind.as_str()],
            |r| r.get(0),
        )
        .context("Failed to count entities")?;

    let sql = format!(
        "SELECT {} FROM entities WHERE kind = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
        ENTITY_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            params![filter.kind.as_str(), filter.limit as i64, filter.offset as i64],
            parse_entity_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to list entities")?;

    Ok((rows, total.max(0) as usize))
}

pub fn list_ids(conn: &Connection, kind: EntityKind) -> Result<Vec<EntityId>> {
    let mut stmt = conn.prepare("SELECT id FROM entities WHERE kind = ?1 ORDER BY id")?;
    let ids = stmt
        .query_map(params![kind.as_str()], |r| r.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to list entity ids")?;

    Ok(ids)
}

pub fn delete_entity(conn: &Connection, entity: &EntityRef) -> Result<bool> {
    let deleted = conn
        .execute(
            "DELETE FROM entities WHERE id = ?1 AND kind = ?2",
            params![entity.id, entity.kind.as_str()],
        )
        .context("Failed to delete entity")?;

    Ok(deleted > 0)
}

pub fn get_summary(conn: &Connection, entity: &EntityRef) -> Result<Option<Summary>> {
    conn.query_row(
        "SELECT rating, review_count FROM entities WHERE id = ?1 AND kind = ?2",
        params![entity.id, entity.kind.as_str()],
        |r| {
            let count: i64 = r.get(1)?;
            Ok(Summary::new(r.get(0)?, count.max(0) as u64))
        },
    )
    .optional()
    .context("Failed to read entity summary")
}

pub fn write_summary(
    conn: &Connection,
    entity: &EntityRef,
    summary: Summary,
    now: NaiveDateTime,
) -> Result<bool> {
    let updated = conn
        .execute(
            "UPDATE entities SET rating = ?1, review_count = ?2, updated_at = ?3 WHERE id = ?4 AND kind = ?5",
            params![
                summary.rating,
                summary.review_count as i64,
                now,
                entity.id,
                entity.kind.as_str()
            ],
        )
        .context("Failed to write entity summary")?;

    Ok(updated > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::setup::ensure_schema;
    use chrono::{Duration, Utc};

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_find() {
        let conn = open();
        let now = Utc::now().naive_utc();
        let hotel = insert_entity(&conn, EntityKind::Hotel, "Grand", Some("By the sea"), now).unwrap();

        let found = find_by_id(&conn, &hotel.entity_ref()).unwrap().unwrap();
        assert_eq!(found.name, "Grand");
        assert_eq!(found.description.as_deref(), Some("By the sea"));
        assert_eq!(found.summary(), Summary::empty());

        let wrong_kind = EntityRef::new(EntityKind::Restaurant, hotel.id);
        assert!(find_by_id(&conn, &wrong_kind).unwrap().is_none());
    }

    #[test]
    fn test_list_page_newest_first() {
        let conn = open();
        let start = Utc::now().naive_utc();
        for i in 0..7 {
            let name = format!("Cuisine {}", i);
            insert_entity(&conn, EntityKind::Cuisine, &name, None, start + Duration::seconds(i)).unwrap();
        }
        insert_entity(&conn, EntityKind::Hotel, "Other", None, start).unwrap();

        let filter = EntityFilter {
            kind: EntityKind::Cuisine,
            limit: 5,
            offset: 5,
        };
        let (rows, total) = list_page(&conn, &filter).unwrap();

        assert_eq!(total, 7);
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Cuisine 1", "Cuisine 0"]);
    }

    #[test]
    fn test_summary_roundtrip_and_delete() {
        let conn = open();
        let now = Utc::now().naive_utc();
        let entity = insert_entity(&conn, EntityKind::Restaurant, "Bistro", None, now)
            .unwrap()
            .entity_ref();

        assert!(write_summary(&conn, &entity, Summary::new(4.5, 2), now).unwrap());
        assert_eq!(get_summary(&conn, &entity).unwrap(), Some(Summary::new(4.5, 2)));

        assert!(delete_entity(&conn, &entity).unwrap());
        assert!(!delete_entity(&conn, &entity).unwrap());
        assert!(get_summary(&conn, &entity).unwrap().is_none());
        assert!(!write_summary(&conn, &entity, Summary::empty(), now).unwrap());
    }
}
