use axum::{async_trait, extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::database::entities::{user_sessions, users};
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// Authenticated caller, resolved from `Authorization: Bearer <session-id>`.
///
/// Credential issuance lives outside this service; sessions are consumed
/// through this narrow lookup only.
pub struct CurrentUser(pub users::Model);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        let session = user_sessions::Entity::find()
            .filter(user_sessions::Column::SessionId.eq(token))
            .filter(user_sessions::Column::IsActive.eq(true))
            .one(&state.db)
            .await
            .map_err(ApiError::internal)?
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

        if session.expires_at <= Utc::now() {
            return Err(ApiError::unauthorized("Session expired"));
        }

        let user = users::Entity::find_by_id(session.user_id)
            .one(&state.db)
            .await
            .map_err(ApiError::internal)?
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

        if !user.is_active {
            return Err(ApiError::unauthorized("Account is deactivated"));
        }

        Ok(CurrentUser(user))
    }
}
