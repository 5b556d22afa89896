use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;

use crate::errors::TeamError;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::server::error::ApiError;
use crate::services::team_service::TeamWithRelations;
use crate::services::{AccessControlService, PermissionLevel, TeamService};

#[derive(Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    pub members: Option<Vec<i32>>,
    pub datasets: Option<Vec<i32>>,
    #[serde(rename = "memberPermission")]
    pub member_permission: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateMembersRequest {
    pub members: Option<Vec<i32>>,
}

#[derive(Deserialize)]
pub struct AssignDatasetsRequest {
    pub datasets: Option<Vec<i32>>,
}

#[derive(Deserialize)]
pub struct UpdatePermissionRequest {
    #[serde(rename = "memberPermission")]
    pub member_permission: Option<String>,
}

pub async fn create_team(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateTeamRequest>,
) -> Result<Json<TeamWithRelations>, ApiError> {
    let service = TeamService::new(state.db.clone());
    let team = service
        .create(
            user.id,
            &payload.name,
            payload.members.as_deref().unwrap_or(&[]),
            payload.datasets.as_deref().unwrap_or(&[]),
            payload.member_permission.as_deref(),
        )
        .await?;

    Ok(Json(team))
}

pub async fn list_teams(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<TeamWithRelations>>, ApiError> {
    let service = TeamService::new(state.db.clone());
    let teams = service.list_for_user(user.id).await?;

    Ok(Json(teams))
}

pub async fn get_team(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i32>,
) -> Result<Json<TeamWithRelations>, ApiError> {
    let access = AccessControlService::new(state.db.clone());
    let team = access
        .require_team_access(user.id, team_id, PermissionLevel::View)
        .await?;

    let service = TeamService::new(state.db.clone());
    Ok(Json(service.with_relations(team).await?))
}

pub async fn update_members(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i32>,
    Json(payload): Json<UpdateMembersRequest>,
) -> Result<Json<TeamWithRelations>, ApiError> {
    let access = AccessControlService::new(state.db.clone());
    let team = access
        .require_team_access(user.id, team_id, PermissionLevel::Admin)
        .await?;

    let members = payload.members.ok_or(TeamError::MembersRequired)?;
    let service = TeamService::new(state.db.clone());
    Ok(Json(service.replace_members(team, &members).await?))
}

pub async fn assign_datasets(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i32>,
    Json(payload): Json<AssignDatasetsRequest>,
) -> Result<Json<TeamWithRelations>, ApiError> {
    let access = AccessControlService::new(state.db.clone());
    let team = access
        .require_team_access(user.id, team_id, PermissionLevel::Admin)
        .await?;

    let datasets = payload.datasets.ok_or(TeamError::DatasetsRequired)?;
    let service = TeamService::new(state.db.clone());
    Ok(Json(service.replace_datasets(team, &datasets).await?))
}

pub async fn update_permission(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i32>,
    Json(payload): Json<UpdatePermissionRequest>,
) -> Result<Json<TeamWithRelations>, ApiError> {
    let access = AccessControlService::new(state.db.clone());
    let team = access
        .require_team_access(user.id, team_id, PermissionLevel::Admin)
        .await?;

    let permission = payload
        .member_permission
        .ok_or(TeamError::PermissionRequired)?;
    let service = TeamService::new(state.db.clone());
    Ok(Json(service.set_member_permission(team, &permission).await?))
}
