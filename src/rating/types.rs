use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type EntityId = i64;
pub type RatingId = i64;
pub type Score = f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Hotel,
    Restaurant,
    VacationRental,
    Cuisine,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Hotel,
        EntityKind::Restaurant,
        EntityKind::VacationRental,
        EntityKind::Cuisine,
    ];

    /// Value stored in the `kind` column
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Hotel => "hotel",
            EntityKind::Restaurant => "restaurant",
            EntityKind::VacationRental => "vacation_rental",
            EntityKind::Cuisine => "cuisine",
        }
    }

    /// Collection segment used in URLs
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Hotel => "hotels",
            EntityKind::Restaurant => "restaurants",
            EntityKind::VacationRental => "vacation-rentals",
            EntityKind::Cuisine => "cuisines",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    /// Accepts both the column value and the URL collection name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s || kind.collection() == s)
            .ok_or_else(|| format!("Unknown entity kind: {}", s))
    }
}

/// Addresses one ratable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Cached `(rating, review_count)` pair carried by every entity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub rating: f64,
    pub review_count: u64,
}

impl Summary {
    pub fn new(rating: f64, review_count: u64) -> Self {
        Self {
            rating,
            review_count,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct NewRating {
    pub entity: EntityRef,
    pub user_id: String,
    pub score: Score,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRecord {
    pub id: RatingId,
    pub user_id: String,
    pub entity_id: EntityId,
    pub entity_kind: EntityKind,
    pub score: Score,
    pub comment: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl RatingRecord {
    pub fn entity(&self) -> EntityRef {
        EntityRef::new(self.entity_kind, self.entity_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub kind: EntityKind,
    pub entities: usize,
    pub corrected: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_column_and_collection_names() {
        assert_eq!("hotel".parse::<EntityKind>(), Ok(EntityKind::Hotel));
        assert_eq!(
            "vacation-rentals".parse::<EntityKind>(),
            Ok(EntityKind::VacationRental)
        );
        assert_eq!("cuisines".parse::<EntityKind>(), Ok(EntityKind::Cuisine));
        assert!("photos".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = Summary::empty();
        assert_eq!(summary.rating, 0.0);
        assert_eq!(summary.review_count, 0);
    }
}
