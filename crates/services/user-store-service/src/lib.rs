//! User Store Service Library
//!
//! Keeps user records in three role-scoped stores (candidates, employers,
//! admin users) and migrates an identity between them when its role
//! changes kind. Served over HTTP; the CLI also exposes migrations and the
//! reconciliation pass.

pub mod api;
pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::api::middleware::TokenVerifier;
use crate::api::uploads::UploadStore;
use crate::api::{create_router, AppState};
use crate::config::ServiceConfig;
use crate::infra::Database;
use crate::repository::Persistence;
use crate::service::{RecordService, ReconcileReport};

/// Run the HTTP server. `host` and `port` override `SERVER_HOST` and
/// `SERVER_PORT` when given.
pub async fn run_server(
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServiceConfig::from_env()?;
    config.server = config.server.with_overrides(host, port);
    run_server_with_config(config).await
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::from_env()?;
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Finish interrupted migrations older than the grace window.
///
/// `grace_seconds` overrides `RECONCILE_GRACE_SECONDS`.
pub async fn run_reconcile(
    grace_seconds: Option<i64>,
) -> Result<ReconcileReport, Box<dyn std::error::Error>> {
    let config = ServiceConfig::from_env()?;
    let db = Database::connect(&config.database).await?;

    let records = RecordService::new(Arc::new(Persistence::new(db.get_connection())));
    let grace = chrono::Duration::seconds(grace_seconds.unwrap_or(config.reconcile.grace_seconds));
    let report = records.engine().reconcile(grace).await?;

    println!(
        "scanned={} sources_retired={} markers_cleared={} failed={}",
        report.scanned, report.sources_retired, report.markers_cleared, report.failed
    );
    Ok(report)
}

async fn run_server_with_config(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize database
    let db = Arc::new(Database::connect(&config.database).await?);

    // Create stores and services
    let stores = Arc::new(Persistence::new(db.get_connection()));
    let records = Arc::new(RecordService::new(stores));
    let tokens = Arc::new(TokenVerifier::new(&config.jwt.secret));
    let uploads = Arc::new(UploadStore::new(&config.upload.root));

    let state = AppState::new(records, tokens, uploads, config.upload.max_bytes).with_database(db);
    let app = create_router(state);

    let addr: SocketAddr = config.server.address().parse()?;
    info!("User store service listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
