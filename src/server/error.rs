use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::errors::{AccessError, DatasetError, InsightError, TeamError, WizardError};

/// HTTP rendering of every domain error: `{"error": {"code", "message"}}`
/// with the status the domain error maps to.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: u16, code: &'static str, message: String) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code,
            message,
        }
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new(401, "AUTHENTICATION_REQUIRED", message.to_string())
    }

    pub fn internal(message: impl std::fmt::Display) -> Self {
        Self::new(500, "INTERNAL_ERROR", message.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        }));
        (self.status, body).into_response()
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        Self::new(err.http_status_code(), err.error_code(), err.to_string())
    }
}

impl From<WizardError> for ApiError {
    fn from(err: WizardError) -> Self {
        Self::new(err.http_status_code(), err.error_code(), err.to_string())
    }
}

impl From<InsightError> for ApiError {
    fn from(err: InsightError) -> Self {
        Self::new(err.http_status_code(), err.error_code(), err.to_string())
    }
}

impl From<DatasetError> for ApiError {
    fn from(err: DatasetError) -> Self {
        Self::new(err.http_status_code(), err.error_code(), err.to_string())
    }
}

impl From<TeamError> for ApiError {
    fn from(err: TeamError) -> Self {
        Self::new(err.http_status_code(), err.error_code(), err.to_string())
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        ApiError::internal(err)
    }
}
