use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{datasets, health, teams, wizard};
use crate::services::{AnalysisEngine, ArtifactStore};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub engine: Arc<dyn AnalysisEngine>,
    pub artifacts: Arc<dyn ArtifactStore>,
}

pub async fn create_app(
    db: DatabaseConnection,
    engine: Arc<dyn AnalysisEngine>,
    artifacts: Arc<dyn ArtifactStore>,
    cors_origin: Option<&str>,
) -> Result<Router> {
    let state = AppState {
        db,
        engine,
        artifacts,
    };

    let cors = match cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<axum::http::HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = Router::new()
        // Health check endpoint
        .route("/health", get(health::health_check))
        // API v1 routes
        .nest("/api/v1", api_v1_routes())
        // Add middleware
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    Ok(app)
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Wizard routes
        .route("/datasets/choose-domain", post(wizard::choose_domain))
        .route("/datasets/upload", post(wizard::upload))
        .route("/datasets/processing-options", post(wizard::processing_options))
        .route("/datasets/grant-access", post(wizard::grant_access))
        .route("/datasets/generate-insights", post(wizard::generate_insights))
        // Dataset routes
        .route("/datasets", get(datasets::list_datasets))
        .route("/datasets/shared", get(datasets::list_shared))
        .route("/datasets/:dataset_id", get(datasets::get_dataset))
        .route("/datasets/:dataset_id", patch(datasets::rename_dataset))
        .route("/datasets/:dataset_id", delete(datasets::delete_dataset))
        .route("/datasets/:dataset_id/share", post(datasets::share_dataset))
        .route("/datasets/:dataset_id/share", delete(datasets::unshare_dataset))
        .route("/datasets/:dataset_id/share", get(datasets::list_permissions))
        // Team routes
        .route("/teams", post(teams::create_team))
        .route("/teams", get(teams::list_teams))
        .route("/teams/:team_id", get(teams::get_team))
        .route("/teams/:team_id/members", put(teams::update_members))
        .route("/teams/:team_id/datasets", put(teams::assign_datasets))
        .route("/teams/:team_id/permission", put(teams::update_permission))
}
