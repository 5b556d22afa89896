use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::DatasetError;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::server::error::ApiError;
use crate::server::handlers::datasets::dataset_json;
use crate::services::wizard_service::{GrantRequest, NextStep};
use crate::services::{InsightService, WizardService};

/// Header carrying the explicit workflow handle across wizard requests.
const WORKFLOW_ID_HEADER: &str = "x-workflow-id";

fn workflow_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(WORKFLOW_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

#[derive(Deserialize)]
pub struct ChooseDomainRequest {
    #[serde(rename = "domainType")]
    pub domain_type: String,
}

#[derive(Deserialize)]
pub struct UploadRequest {
    /// Source URL produced by the upload collaborator
    #[serde(rename = "fileUrl")]
    pub file_url: String,
}

#[derive(Deserialize)]
pub struct ProcessingOptionsRequest {
    pub analysis_option: String,
    #[serde(rename = "downloadAfterCreating", default)]
    pub download_after_creating: bool,
}

#[derive(Deserialize)]
pub struct GrantAccessRequest {
    #[serde(rename = "userPermissions")]
    pub user_permissions: Vec<GrantRequest>,
}

#[derive(Deserialize)]
pub struct GenerateInsightsRequest {
    pub dataset_name: String,
}

pub async fn choose_domain(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Json(payload): Json<ChooseDomainRequest>,
) -> Result<Json<Value>, ApiError> {
    let wizard = WizardService::new(state.db.clone());
    let context = wizard
        .select_domain(workflow_id(&headers).as_deref(), user.id, &payload.domain_type)
        .await?;

    Ok(Json(json!({
        "domainType": context.domain_type,
        "nextStep": NextStep::Upload.as_path(),
        "sessionId": context.workflow_id,
    })))
}

pub async fn upload(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Json(payload): Json<UploadRequest>,
) -> Result<Json<Value>, ApiError> {
    let wizard = WizardService::new(state.db.clone());
    let context = wizard
        .record_upload(workflow_id(&headers).as_deref(), user.id, &payload.file_url)
        .await?;

    Ok(Json(json!({
        "fileUrl": context.source_url,
        "nextStep": NextStep::ProcessingOptions.as_path(),
        "sessionId": context.workflow_id,
    })))
}

pub async fn processing_options(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Json(payload): Json<ProcessingOptionsRequest>,
) -> Result<Json<Value>, ApiError> {
    let wizard = WizardService::new(state.db.clone());
    let context = wizard
        .record_options(
            workflow_id(&headers).as_deref(),
            user.id,
            &payload.analysis_option,
            payload.download_after_creating,
        )
        .await?;

    Ok(Json(json!({
        "nextStep": NextStep::GrantAccess.as_path(),
        "sessionId": context.workflow_id,
    })))
}

pub async fn grant_access(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Json(payload): Json<GrantAccessRequest>,
) -> Result<Json<Value>, ApiError> {
    let wizard = WizardService::new(state.db.clone());
    let outcome = wizard
        .record_grants(
            workflow_id(&headers).as_deref(),
            user.id,
            &payload.user_permissions,
        )
        .await?;

    let mut body = json!({
        "accessGranted": true,
        "usersCount": outcome.users_count,
        "nextStep": outcome.next_step.as_path(),
        "sessionId": outcome.workflow_id,
    });
    if outcome.is_complete {
        body["isComplete"] = json!(true);
    }

    Ok(Json(body))
}

pub async fn generate_insights(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Json(payload): Json<GenerateInsightsRequest>,
) -> Result<Json<Value>, ApiError> {
    if payload.dataset_name.trim().is_empty() {
        return Err(DatasetError::NameRequired.into());
    }

    let wizard = WizardService::new(state.db.clone());
    let context = wizard
        .load_for_generate(workflow_id(&headers).as_deref(), user.id)
        .await?;

    let insight = InsightService::new(
        state.db.clone(),
        state.engine.clone(),
        state.artifacts.clone(),
    );
    let outcome = insight
        .generate(payload.dataset_name.trim(), &context)
        .await?;

    // Full success: the workflow context is spent
    wizard.destroy(&context.workflow_id).await?;

    info!(
        dataset_id = outcome.dataset.id,
        user_id = user.id,
        grant_failures = outcome.grant_failures.len(),
        "insight generation complete"
    );

    Ok(Json(json!({
        "dataset": dataset_json(&outcome.dataset),
        "artifactsSkipped": outcome.artifacts_skipped,
        "grantFailures": outcome.grant_failures,
    })))
}
