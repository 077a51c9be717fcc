use anyhow::Result;
use std::collections::HashMap;

use super::types::{EntityId, EntityKind, EntityRef, NewRating, RatingId, RatingRecord, Score, Summary};

/// Persistence the aggregator works against.
///
/// Implementations report infrastructure failures as errors and "no such
/// row" as `None`/`false`; the aggregator turns those into its own taxonomy.
pub trait RatingStore: Send + Sync {
    /// Cached summary of the entity, `None` if it does not exist
    fn summary(&self, entity: &EntityRef) -> Result<Option<Summary>>;

    /// Inserts the rating and replaces the entity summary with
    /// `next(current)` in one unit. `current` is read inside that unit, so a
    /// writer in another process cannot land between the read and the write.
    /// Returns `None` without writing anything if the entity is gone.
    fn append(
        &self,
        rating: &NewRating,
        next: &dyn Fn(Summary) -> Summary,
    ) -> Result<Option<(RatingRecord, Summary)>>;

    fn find_by_entity(&self, entity: &EntityRef) -> Result<Vec<RatingRecord>>;

    /// Mean score and rating count per entity. Entities without ratings may
    /// be absent from the result.
    fn group_average(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
    ) -> Result<HashMap<EntityId, (f64, u64)>>;

    /// Replaces the cached summary with `fresh(scores)` over the entity's
    /// stored scores, read and written in one unit. Returns `(cached, fresh)`,
    /// or `None` if the entity is gone.
    fn refresh_summary(
        &self,
        entity: &EntityRef,
        fresh: &dyn Fn(&[Score]) -> Summary,
    ) -> Result<Option<(Summary, Summary)>>;

    fn find_rating(&self, id: RatingId) -> Result<Option<RatingRecord>>;

    fn update_rating(
        &self,
        id: RatingId,
        score: Score,
        comment: Option<&str>,
    ) -> Result<Option<RatingRecord>>;

    fn delete_rating(&self, id: RatingId) -> Result<bool>;

    fn entity_ids(&self, kind: EntityKind) -> Result<Vec<EntityId>>;
}
