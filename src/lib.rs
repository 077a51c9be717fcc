pub mod api;
pub mod cli;
pub mod config;
pub mod database;
pub mod rating;
pub mod services;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

use crate::cli::Command;
use crate::config::settings::AppConfig;
use crate::rating::EntityKind;
use crate::services::reconcile::ReconcileService;
use crate::services::server::ServerService;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_serve(port: u16) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let config = AppConfig::from_env();
        let service = ServerService::new(port, config);
        service.run().await
    })
}

pub fn handle_setup() -> Result<()> {
    let config = AppConfig::from_env();
    let pool = database::create_pool(&config.server)?;
    database::setup::ensure_pool_schema(&pool)?;
    log::info!("Schema ready in {}", config.server.database_path);
    Ok(())
}

pub fn handle_reconcile(kind: Option<EntityKind>) -> Result<()> {
    let config = AppConfig::from_env();
    let service = ReconcileService::new(config)?;
    let reports = service.run(kind)?;

    let corrected: usize = reports.iter().map(|r| r.corrected).sum();
    println!("Reconciled {} kinds, corrected {} summaries", reports.len(), corrected);
    Ok(())
}
