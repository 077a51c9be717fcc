use chrono::NaiveDateTime;
use rusqlite::Row;
use rusqlite::types::Type;

use crate::rating::{EntityId, EntityKind, EntityRef, Summary};

#[derive(Debug, Clone)]
pub struct DbEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub description: Option<String>,
    pub rating: f64,
    pub review_count: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl DbEntity {
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.kind, self.id)
    }

    pub fn summary(&self) -> Summary {
        Summary::new(self.rating, self.review_count.max(0) as u64)
    }
}

#[derive(Debug, Clone)]
pub struct EntityFilter {
    pub kind: EntityKind,
    pub limit: usize,
    pub offset: usize,
}

/// Reads a `kind` column back into an `EntityKind`
pub fn kind_column(row: &Row, idx: usize) -> rusqlite::Result<EntityKind> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}
