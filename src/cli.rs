use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::{create_router, AppState};
use crate::config::{config, AppConfig};
use crate::database::{DatabaseManager, MemoryStore, PgStore, Store};

#[derive(Parser)]
#[command(name = "share-me-api")]
#[command(about = "Share Me API - register, upload PDFs, share links")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides PORT")]
        port: Option<u16>,
    },

    #[command(about = "Create tables and the unique email index, then exit")]
    Migrate,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = config().clone();
    config.validate()?;

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Command::Migrate => migrate(&config).await,
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting Share Me API in {:?} mode", config.environment);

    let store = open_store(&config).await?;
    let state = AppState::new(config, store).context("invalid JWT configuration")?;

    state
        .uploads
        .ensure_dirs()
        .await
        .with_context(|| format!("failed to create upload directory {}", state.uploads.root().display()))?;

    let bind_addr = format!("0.0.0.0:{}", state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Share Me API listening on http://{}", bind_addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

/// Postgres when `DATABASE_URL` is set, otherwise an in-memory store
async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    if config.database.url.is_none() {
        warn!("DATABASE_URL not set; using in-memory store, data will not survive a restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let db = DatabaseManager::from_config(&config.database)?;
    // Connect and bootstrap before accepting traffic
    db.pool().await.context("failed to connect to database")?;

    Ok(Arc::new(PgStore::new(db)))
}

async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let db = DatabaseManager::from_config(&config.database)?;
    db.pool().await.context("schema bootstrap failed")?;
    db.close().await;

    info!("Schema is up to date");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::parse_from(["share-me-api"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_port_override_and_migrate() {
        let cli = Cli::parse_from(["share-me-api", "serve", "--port", "8080"]);
        assert!(matches!(cli.command, Some(Command::Serve { port: Some(8080) })));

        let cli = Cli::parse_from(["share-me-api", "migrate"]);
        assert!(matches!(cli.command, Some(Command::Migrate)));
    }
}
