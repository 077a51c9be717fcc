use anyhow::{Result, anyhow};
use log::info;

use crate::config::settings::AppConfig;
use crate::database::{self, SqliteStore};
use crate::rating::{EntityKind, RatingAggregator, ReconcileReport};

/// Recomputes cached summaries from the stored ratings, kind by kind
pub struct ReconcileService {
    aggregator: RatingAggregator<SqliteStore>,
}

impl ReconcileService {
    pub fn new(config: AppConfig) -> Result<Self> {
        let pool = database::create_pool(&config.server)?;
        database::setup::ensure_pool_schema(&pool)?;

        Ok(Self {
            aggregator: RatingAggregator::new(SqliteStore::new(pool), &config.rating),
        })
    }

    pub fn run(&self, kind: Option<EntityKind>) -> Result<Vec<ReconcileReport>> {
        info!("=== Starting Reconciliation ===");

        let kinds: Vec<EntityKind> = match kind {
            Some(kind) => vec![kind],
            None => EntityKind::ALL.to_vec(),
        };

        let mut reports = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let report = self
                .aggregator
                .reconcile(kind)
                .map_err(|e| anyhow!("Failed to reconcile {}: {}", kind, e))?;
            info!(
                "  → {}: {} entities, {} corrected",
                kind, report.entities, report.corrected
            );
            reports.push(report);
        }

        info!("=== Reconciliation Complete ===");
        Ok(reports)
    }
}
