use log::{debug, info, warn};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::average::{from_aggregate, has_drifted, incremental_mean, mean_of, validate_score};
use super::error::{AggregatorError, AggregatorResult};
use super::store::RatingStore;
use super::types::{
    EntityId, EntityKind, EntityRef, NewRating, RatingId, RatingRecord, ReconcileReport, Score,
    Summary,
};
use crate::config::settings::RatingSettings;

/// Fixed pool of mutexes; an entity always maps to the same stripe.
struct EntityLocks {
    stripes: Vec<Mutex<()>>,
}

impl EntityLocks {
    fn new(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    fn lock(&self, entity: &EntityRef) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        entity.hash(&mut hasher);
        let idx = (hasher.finish() % self.stripes.len() as u64) as usize;
        // The guarded value is (), a panicking holder leaves nothing inconsistent
        self.stripes[idx]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Maintains the cached `(rating, review_count)` of every ratable entity.
///
/// Writes for one entity are serialised through a striped lock inside this
/// process, and the store runs each read-modify-write of the summary as one
/// unit so writers in other processes cannot interleave either.
/// Recomputation from the stored ratings is authoritative; the incremental
/// path only saves a full scan per submission.
pub struct RatingAggregator<S> {
    store: S,
    locks: EntityLocks,
    drift_tolerance: f64,
}

impl<S: RatingStore> RatingAggregator<S> {
    pub fn new(store: S, settings: &RatingSettings) -> Self {
        Self {
            store,
            locks: EntityLocks::new(settings.lock_stripes),
            drift_tolerance: settings.drift_tolerance,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn record_rating(&self, rating: NewRating) -> AggregatorResult<(RatingRecord, Summary)> {
        validate_score(rating.score)?;

        let _guard = self.locks.lock(&rating.entity);
        let score = rating.score;
        let (record, summary) = self
            .store
            .append(&rating, &|previous| incremental_mean(previous, score))
            .map_err(AggregatorError::storage)?
            .ok_or(AggregatorError::EntityNotFound(rating.entity))?;

        debug!(
            "Recorded rating {} for {}: {:.3} over {} ratings",
            record.id, rating.entity, summary.rating, summary.review_count
        );
        Ok((record, summary))
    }

    pub fn recompute(&self, entity: EntityRef) -> AggregatorResult<Summary> {
        let _guard = self.locks.lock(&entity);
        self.recompute_locked(&entity).map(|(_, fresh)| fresh)
    }

    /// Fresh summaries for many entities in one grouped query. Read-only;
    /// every requested id is present, zeroed when it has no ratings.
    pub fn aggregate_by_group(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
    ) -> AggregatorResult<BTreeMap<EntityId, Summary>> {
        let unique: Vec<EntityId> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if unique.is_empty() {
            return Ok(BTreeMap::new());
        }

        let grouped = self
            .store
            .group_average(kind, &unique)
            .map_err(AggregatorError::storage)?;

        Ok(unique
            .into_iter()
            .map(|id| {
                let summary = grouped
                    .get(&id)
                    .map(|&(mean, count)| from_aggregate(mean, count))
                    .unwrap_or_default();
                (id, summary)
            })
            .collect())
    }

    pub fn find_rating(&self, id: RatingId) -> AggregatorResult<RatingRecord> {
        self.store
            .find_rating(id)
            .map_err(AggregatorError::storage)?
            .ok_or(AggregatorError::RatingNotFound(id))
    }

    pub fn ratings_for(&self, entity: EntityRef) -> AggregatorResult<Vec<RatingRecord>> {
        self.cached_summary(&entity)?;
        self.store
            .find_by_entity(&entity)
            .map_err(AggregatorError::storage)
    }

    /// Changes score and comment, then recomputes the owning entity
    pub fn edit_rating(
        &self,
        id: RatingId,
        score: Score,
        comment: Option<&str>,
    ) -> AggregatorResult<(RatingRecord, Summary)> {
        validate_score(score)?;

        let record = self
            .store
            .update_rating(id, score, comment)
            .map_err(AggregatorError::storage)?
            .ok_or(AggregatorError::RatingNotFound(id))?;

        let summary = self.recompute(record.entity())?;
        Ok((record, summary))
    }

    pub fn remove_rating(&self, id: RatingId) -> AggregatorResult<Summary> {
        let record = self.find_rating(id)?;

        if !self
            .store
            .delete_rating(id)
            .map_err(AggregatorError::storage)?
        {
            return Err(AggregatorError::RatingNotFound(id));
        }

        self.recompute(record.entity())
    }

    /// Rewrites every cached summary of `kind` that drifted from its ratings.
    ///
    /// One grouped query finds the candidates; each candidate is then
    /// recomputed under its lock so a concurrent submission is not lost.
    pub fn reconcile(&self, kind: EntityKind) -> AggregatorResult<ReconcileReport> {
        let ids = self
            .store
            .entity_ids(kind)
            .map_err(AggregatorError::storage)?;
        let fresh = self.aggregate_by_group(kind, &ids)?;

        let mut corrected = 0;
        for (&id, &summary) in &fresh {
            let entity = EntityRef::new(kind, id);
            let cached = match self.store.summary(&entity).map_err(AggregatorError::storage)? {
                Some(cached) => cached,
                // Deleted since the id listing
                None => continue,
            };
            if !has_drifted(cached, summary, self.drift_tolerance) {
                continue;
            }

            let _guard = self.locks.lock(&entity);
            match self.recompute_locked(&entity) {
                Ok((before, after)) if has_drifted(before, after, self.drift_tolerance) => {
                    warn!(
                        "Corrected {}: cached {:.6}/{} -> {:.6}/{}",
                        entity, before.rating, before.review_count, after.rating, after.review_count
                    );
                    corrected += 1;
                }
                Ok(_) => {}
                Err(AggregatorError::EntityNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        info!(
            "Reconciled {} {} entities, corrected {}",
            fresh.len(),
            kind,
            corrected
        );
        Ok(ReconcileReport {
            kind,
            entities: fresh.len(),
            corrected,
        })
    }

    fn cached_summary(&self, entity: &EntityRef) -> AggregatorResult<Summary> {
        self.store
            .summary(entity)
            .map_err(AggregatorError::storage)?
            .ok_or(AggregatorError::EntityNotFound(*entity))
    }

    /// Caller must hold the entity's lock. Returns `(cached, fresh)`.
    fn recompute_locked(&self, entity: &EntityRef) -> AggregatorResult<(Summary, Summary)> {
        self.store
            .refresh_summary(entity, &|scores| mean_of(scores.iter().copied()))
            .map_err(AggregatorError::storage)?
            .ok_or(AggregatorError::EntityNotFound(*entity))
    }
}
