//! Sharing and permission-enforcement integration tests

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::Utc;
use insightdeck::database::entities::datasets;
use insightdeck::database::migrations::Migrator;
use insightdeck::errors::InsightResult;
use insightdeck::server::app::create_app;
use insightdeck::services::engine_client::{AnalysisEngine, EngineResponse};
use insightdeck::services::FsArtifactStore;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use tempfile::{NamedTempFile, TempDir};

/// The engine is never reached by these tests.
struct NoopEngine;

#[async_trait]
impl AnalysisEngine for NoopEngine {
    async fn analyze(
        &self,
        _source_url: &str,
        _domain_type: Option<&str>,
    ) -> InsightResult<EngineResponse> {
        Ok(EngineResponse::default())
    }

    async fn clean(&self, _source_url: &str) -> InsightResult<EngineResponse> {
        Ok(EngineResponse::default())
    }
}

struct TestContext {
    server: TestServer,
    db: DatabaseConnection,
    _db_file: NamedTempFile,
    _artifact_dir: TempDir,
}

async fn setup() -> Result<TestContext> {
    let db_file = NamedTempFile::new()?;
    let db_url = format!("sqlite://{}?mode=rwc", db_file.path().display());

    let db = Database::connect(&db_url).await?;
    Migrator::up(&db, None).await?;

    let artifact_dir = TempDir::new()?;
    let app = create_app(
        db.clone(),
        Arc::new(NoopEngine),
        Arc::new(FsArtifactStore::new(artifact_dir.path())),
        Some("*"),
    )
    .await?;
    let server = TestServer::new(app)?;

    Ok(TestContext {
        server,
        db,
        _db_file: db_file,
        _artifact_dir: artifact_dir,
    })
}

async fn seed_authenticated_user(db: &DatabaseConnection, name: &str) -> Result<(i32, String)> {
    let user = insightdeck::database::entities::users::ActiveModel::new(
        format!("{}@example.com", name),
        name.to_string(),
        name.to_string(),
    )
    .insert(db)
    .await?;

    let session = insightdeck::database::entities::user_sessions::ActiveModel::new(user.id)
        .insert(db)
        .await?;

    Ok((user.id, session.session_id))
}

async fn seed_dataset(db: &DatabaseConnection, user_id: i32, name: &str) -> Result<i32> {
    let now = Utc::now();
    let dataset = datasets::ActiveModel {
        user_id: Set(user_id),
        dataset_name: Set(name.to_string()),
        dataset_url: Set(format!("https://cdn/{}.csv", name)),
        insights: Set("{}".to_string()),
        shared_usernames: Set("[]".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(dataset.id)
}

fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {}", token)).expect("header value"),
    )
}

#[tokio::test]
async fn test_view_grant_allows_read_but_not_rename() -> Result<()> {
    let ctx = setup().await?;
    let (owner_id, owner_token) = seed_authenticated_user(&ctx.db, "owner").await?;
    let (reader_id, reader_token) = seed_authenticated_user(&ctx.db, "reader").await?;
    let dataset_id = seed_dataset(&ctx.db, owner_id, "sales").await?;

    // Unshared: reader is denied outright
    let (name, value) = bearer(&reader_token);
    let response = ctx
        .server
        .get(&format!("/api/v1/datasets/{}", dataset_id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    // Owner shares at view level
    let (name, value) = bearer(&owner_token);
    let response = ctx
        .server
        .post(&format!("/api/v1/datasets/{}/share", dataset_id))
        .add_header(name, value)
        .json(&json!({"userId": reader_id, "permission": "view"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // Read works now
    let (name, value) = bearer(&reader_token);
    let response = ctx
        .server
        .get(&format!("/api/v1/datasets/{}", dataset_id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // Rename needs edit
    let (name, value) = bearer(&reader_token);
    let response = ctx
        .server
        .patch(&format!("/api/v1/datasets/{}", dataset_id))
        .add_header(name, value)
        .json(&json!({"dataset_name": "renamed"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INSUFFICIENT_PERMISSION");

    Ok(())
}

#[tokio::test]
async fn test_reshare_upgrades_single_grant() -> Result<()> {
    let ctx = setup().await?;
    let (owner_id, owner_token) = seed_authenticated_user(&ctx.db, "owner").await?;
    let (reader_id, reader_token) = seed_authenticated_user(&ctx.db, "reader").await?;
    let dataset_id = seed_dataset(&ctx.db, owner_id, "sales").await?;

    for permission in ["view", "edit"] {
        let (name, value) = bearer(&owner_token);
        let response = ctx
            .server
            .post(&format!("/api/v1/datasets/{}/share", dataset_id))
            .add_header(name, value)
            .json(&json!({"userId": reader_id, "permission": permission}))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    // Exactly one grant, now at edit
    let (name, value) = bearer(&owner_token);
    let response = ctx
        .server
        .get(&format!("/api/v1/datasets/{}/share", dataset_id))
        .add_header(name, value)
        .await;
    let grants: Vec<Value> = response.json();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0]["permission"], "edit");

    // Rename now allowed
    let (name, value) = bearer(&reader_token);
    let response = ctx
        .server
        .patch(&format!("/api/v1/datasets/{}", dataset_id))
        .add_header(name, value)
        .json(&json!({"dataset_name": "renamed"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["datasetName"], "renamed");

    Ok(())
}

#[tokio::test]
async fn test_share_with_owner_is_rejected() -> Result<()> {
    let ctx = setup().await?;
    let (owner_id, owner_token) = seed_authenticated_user(&ctx.db, "owner").await?;
    let dataset_id = seed_dataset(&ctx.db, owner_id, "sales").await?;

    let (name, value) = bearer(&owner_token);
    let response = ctx
        .server
        .post(&format!("/api/v1/datasets/{}/share", dataset_id))
        .add_header(name, value)
        .json(&json!({"userId": owner_id, "permission": "view"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "ALREADY_OWNER");

    Ok(())
}

#[tokio::test]
async fn test_unshare_revokes_access_and_rejects_missing_grant() -> Result<()> {
    let ctx = setup().await?;
    let (owner_id, owner_token) = seed_authenticated_user(&ctx.db, "owner").await?;
    let (reader_id, reader_token) = seed_authenticated_user(&ctx.db, "reader").await?;
    let dataset_id = seed_dataset(&ctx.db, owner_id, "sales").await?;

    // Unsharing before any grant exists is invalid input
    let (name, value) = bearer(&owner_token);
    let response = ctx
        .server
        .delete(&format!("/api/v1/datasets/{}/share", dataset_id))
        .add_header(name, value)
        .json(&json!({"userId": reader_id}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "GRANT_NOT_FOUND");

    // Share, then revoke
    let (name, value) = bearer(&owner_token);
    ctx.server
        .post(&format!("/api/v1/datasets/{}/share", dataset_id))
        .add_header(name, value)
        .json(&json!({"userId": reader_id, "permission": "view"}))
        .await;

    let (name, value) = bearer(&owner_token);
    let response = ctx
        .server
        .delete(&format!("/api/v1/datasets/{}/share", dataset_id))
        .add_header(name, value)
        .json(&json!({"userId": reader_id}))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    // Username denormalization cleaned up
    let (name, value) = bearer(&owner_token);
    let response = ctx
        .server
        .get(&format!("/api/v1/datasets/{}", dataset_id))
        .add_header(name, value)
        .await;
    assert_eq!(response.json::<Value>()["sharedUsernames"], json!([]));

    // Reader lost access
    let (name, value) = bearer(&reader_token);
    let response = ctx
        .server
        .get(&format!("/api/v1/datasets/{}", dataset_id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn test_shared_listing_shows_granted_datasets() -> Result<()> {
    let ctx = setup().await?;
    let (owner_id, owner_token) = seed_authenticated_user(&ctx.db, "owner").await?;
    let (reader_id, reader_token) = seed_authenticated_user(&ctx.db, "reader").await?;
    let shared_id = seed_dataset(&ctx.db, owner_id, "shared").await?;
    seed_dataset(&ctx.db, owner_id, "private").await?;

    let (name, value) = bearer(&owner_token);
    ctx.server
        .post(&format!("/api/v1/datasets/{}/share", shared_id))
        .add_header(name, value)
        .json(&json!({"userId": reader_id, "permission": "view"}))
        .await;

    let (name, value) = bearer(&reader_token);
    let response = ctx
        .server
        .get("/api/v1/datasets/shared")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let datasets: Vec<Value> = response.json();
    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0]["id"].as_i64(), Some(shared_id as i64));

    Ok(())
}

#[tokio::test]
async fn test_delete_requires_admin_and_cleans_up() -> Result<()> {
    let ctx = setup().await?;
    let (owner_id, owner_token) = seed_authenticated_user(&ctx.db, "owner").await?;
    let (editor_id, editor_token) = seed_authenticated_user(&ctx.db, "editor").await?;
    let dataset_id = seed_dataset(&ctx.db, owner_id, "sales").await?;

    let (name, value) = bearer(&owner_token);
    ctx.server
        .post(&format!("/api/v1/datasets/{}/share", dataset_id))
        .add_header(name, value)
        .json(&json!({"userId": editor_id, "permission": "edit"}))
        .await;

    // Edit level is not enough to delete
    let (name, value) = bearer(&editor_token);
    let response = ctx
        .server
        .delete(&format!("/api/v1/datasets/{}", dataset_id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let (name, value) = bearer(&owner_token);
    let response = ctx
        .server
        .delete(&format!("/api/v1/datasets/{}", dataset_id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let (name, value) = bearer(&owner_token);
    let response = ctx
        .server
        .get(&format!("/api/v1/datasets/{}", dataset_id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    Ok(())
}
