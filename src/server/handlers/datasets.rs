use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::entities::datasets;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::server::error::ApiError;
use crate::services::{AccessControlService, DatasetService, PermissionLevel};

#[derive(Deserialize)]
pub struct PaginationParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Deserialize)]
pub struct RenameDatasetRequest {
    pub dataset_name: String,
}

#[derive(Deserialize)]
pub struct ShareRequest {
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub permission: String,
}

#[derive(Deserialize)]
pub struct UnshareRequest {
    #[serde(rename = "userId")]
    pub user_id: i32,
}

/// Render a dataset record with its JSON columns parsed.
pub fn dataset_json(dataset: &datasets::Model) -> Value {
    let insights = dataset
        .insight_map()
        .ok()
        .and_then(|map| serde_json::to_value(map).ok())
        .unwrap_or_else(|| json!({}));

    json!({
        "id": dataset.id,
        "userId": dataset.user_id,
        "datasetName": dataset.dataset_name,
        "datasetUrl": dataset.dataset_url,
        "cleanedUrl": dataset.cleaned_url,
        "domainType": dataset.domain_type,
        "insights": insights,
        "sharedUsernames": dataset.shared_username_list(),
        "createdAt": dataset.created_at,
        "updatedAt": dataset.updated_at,
    })
}

pub async fn list_datasets(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Value>, ApiError> {
    let service = DatasetService::new(state.db.clone());
    let page = service
        .list_owned(
            user.id,
            params.page.unwrap_or(1),
            params.per_page.unwrap_or(10),
        )
        .await?;

    Ok(Json(json!({
        "datasets": page.datasets.iter().map(dataset_json).collect::<Vec<_>>(),
        "page": page.page,
        "perPage": page.per_page,
        "totalItems": page.total_items,
        "totalPages": page.total_pages,
    })))
}

pub async fn list_shared(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let service = DatasetService::new(state.db.clone());
    let datasets = service.list_shared(user.id).await?;

    Ok(Json(json!(datasets
        .iter()
        .map(dataset_json)
        .collect::<Vec<_>>())))
}

pub async fn get_dataset(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(dataset_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let access = AccessControlService::new(state.db.clone());
    let dataset = access
        .require_dataset_access(user.id, dataset_id, PermissionLevel::View)
        .await?;

    Ok(Json(dataset_json(&dataset)))
}

pub async fn rename_dataset(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(dataset_id): Path<i32>,
    Json(payload): Json<RenameDatasetRequest>,
) -> Result<Json<Value>, ApiError> {
    let access = AccessControlService::new(state.db.clone());
    let dataset = access
        .require_dataset_access(user.id, dataset_id, PermissionLevel::Edit)
        .await?;

    let service = DatasetService::new(state.db.clone());
    let dataset = service.rename(dataset, &payload.dataset_name).await?;

    Ok(Json(dataset_json(&dataset)))
}

pub async fn delete_dataset(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(dataset_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let access = AccessControlService::new(state.db.clone());
    let dataset = access
        .require_dataset_access(user.id, dataset_id, PermissionLevel::Admin)
        .await?;

    let service = DatasetService::new(state.db.clone());
    service.delete(dataset).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn share_dataset(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(dataset_id): Path<i32>,
    Json(payload): Json<ShareRequest>,
) -> Result<Json<Value>, ApiError> {
    let access = AccessControlService::new(state.db.clone());
    access
        .require_dataset_access(user.id, dataset_id, PermissionLevel::Admin)
        .await?;

    let level = PermissionLevel::from_str(&payload.permission)?;
    let grant = access
        .share_dataset(dataset_id, payload.user_id, level)
        .await?;

    Ok(Json(json!({
        "datasetId": grant.dataset_id,
        "userId": grant.user_id,
        "permission": grant.permission,
    })))
}

pub async fn unshare_dataset(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(dataset_id): Path<i32>,
    Json(payload): Json<UnshareRequest>,
) -> Result<StatusCode, ApiError> {
    let access = AccessControlService::new(state.db.clone());
    access
        .require_dataset_access(user.id, dataset_id, PermissionLevel::Admin)
        .await?;

    access.unshare_dataset(dataset_id, payload.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_permissions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(dataset_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let access = AccessControlService::new(state.db.clone());
    access
        .require_dataset_access(user.id, dataset_id, PermissionLevel::View)
        .await?;

    let grants = access.dataset_grants(dataset_id).await?;
    let permissions: Vec<Value> = grants
        .iter()
        .map(|(grant, granted_user)| {
            json!({
                "userId": grant.user_id,
                "username": granted_user.as_ref().map(|u| u.username.clone()),
                "permission": grant.permission,
            })
        })
        .collect();

    Ok(Json(json!(permissions)))
}
