pub mod app;
pub mod auth;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;
use sea_orm_migration::prelude::*;
use tracing::info;

use crate::config::EngineConfig;
use crate::database::{connection::*, migrations::Migrator};
use crate::services::{FsArtifactStore, HttpAnalysisEngine};

#[derive(Subcommand, Debug)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

pub async fn start_server(
    port: u16,
    database_path: &str,
    cors_origin: Option<&str>,
    engine_config: EngineConfig,
) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    // Run migrations
    Migrator::up(&db, None).await?;
    info!("Database migrations completed");

    let engine = Arc::new(HttpAnalysisEngine::new(
        engine_config.base_url.clone(),
        engine_config.timeout,
    )?);
    let artifacts = Arc::new(FsArtifactStore::new(engine_config.artifact_dir.clone()));

    let app = app::create_app(db, engine, artifacts, cors_origin).await?;

    log_routes();

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  /health                               - Health check");
    info!("  /api/v1/datasets/choose-domain        - Wizard: select domain");
    info!("  /api/v1/datasets/upload               - Wizard: record source URL");
    info!("  /api/v1/datasets/processing-options   - Wizard: record options");
    info!("  /api/v1/datasets/grant-access         - Wizard: record grants");
    info!("  /api/v1/datasets/generate-insights    - Wizard: run analysis");
    info!("  /api/v1/datasets/*                    - Dataset records and sharing");
    info!("  /api/v1/teams/*                       - Teams");
}

pub async fn migrate_database(database_path: &str, direction: MigrateDirection) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    match direction {
        MigrateDirection::Up => {
            info!("Running migrations up");
            Migrator::up(&db, None).await?;
        }
        MigrateDirection::Down => {
            info!("Running migrations down");
            Migrator::down(&db, None).await?;
        }
        MigrateDirection::Fresh => {
            info!("Running fresh migrations (down then up)");
            Migrator::down(&db, None).await?;
            Migrator::up(&db, None).await?;
        }
    }

    info!("Database migration completed");
    Ok(())
}
