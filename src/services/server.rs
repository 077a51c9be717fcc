use anyhow::{Context, Result};
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::api::{AppState, create_router};
use crate::config::settings::AppConfig;
use crate::database;

pub struct ServerService {
    port: u16,
    config: AppConfig,
}

impl ServerService {
    pub fn new(port: u16, config: AppConfig) -> Self {
        Self { port, config }
    }

    pub async fn run(&self) -> Result<()> {
        let pool = database::create_pool(&self.config.server)?;
        database::setup::ensure_pool_schema(&pool)?;
        info!("Using database {}", self.config.server.database_path);

        if self.config.server.admin_token.is_none() {
            info!("ADMIN_TOKEN not set, admin endpoints are disabled");
        }

        let state = Arc::new(AppState::new(pool, self.config.clone()));
        let app = create_router(state).layer(CorsLayer::permissive());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        // Pool and its connections are released when the state drops
        info!("Server exited gracefully");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down server..."),
        Err(e) => log::error!("Failed to listen for shutdown signal: {}", e),
    }
}
