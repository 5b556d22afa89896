//! Permission resolution and grant mutation errors
//!
//! Covers effective-permission checks on datasets and teams as well as the
//! share/unshare mutation path.

use thiserror::Error;

/// Access-control errors
#[derive(Error, Debug)]
pub enum AccessError {
    /// Dataset not found by ID
    #[error("Dataset {0} not found")]
    DatasetNotFound(i32),

    /// Team not found by ID
    #[error("Team {0} not found")]
    TeamNotFound(i32),

    /// Target user not found by ID
    #[error("User {0} not found")]
    UserNotFound(i32),

    /// No grant and no team membership covers the dataset
    #[error("Access denied: dataset not shared")]
    NotShared,

    /// Requester is not a member of the team
    #[error("Access denied: not a team member")]
    NotTeamMember,

    /// Resolved level is below the required level
    #[error("Access denied: insufficient permission (requires {required})")]
    InsufficientPermission { required: &'static str },

    /// Permission string outside the view/edit/admin enumeration
    #[error("Invalid permission: {0}")]
    InvalidPermission(String),

    /// Sharing a dataset with its owner
    #[error("User is already the owner of this dataset")]
    AlreadyOwner,

    /// Revoking a grant that does not exist
    #[error("No existing grant for user {0}")]
    GrantNotFound(i32),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl AccessError {
    /// Check if this is an authorisation failure (403)
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            AccessError::NotShared
                | AccessError::NotTeamMember
                | AccessError::InsufficientPermission { .. }
        )
    }

    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AccessError::DatasetNotFound(_)
                | AccessError::TeamNotFound(_)
                | AccessError::UserNotFound(_)
        )
    }

    /// Get HTTP status code for this error
    pub fn http_status_code(&self) -> u16 {
        match self {
            AccessError::DatasetNotFound(_)
            | AccessError::TeamNotFound(_)
            | AccessError::UserNotFound(_) => 404,
            AccessError::NotShared
            | AccessError::NotTeamMember
            | AccessError::InsufficientPermission { .. } => 403,
            AccessError::InvalidPermission(_)
            | AccessError::AlreadyOwner
            | AccessError::GrantNotFound(_) => 400,
            AccessError::Database(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AccessError::DatasetNotFound(_) => "DATASET_NOT_FOUND",
            AccessError::TeamNotFound(_) => "TEAM_NOT_FOUND",
            AccessError::UserNotFound(_) => "USER_NOT_FOUND",
            AccessError::NotShared => "NOT_SHARED",
            AccessError::NotTeamMember => "NOT_TEAM_MEMBER",
            AccessError::InsufficientPermission { .. } => "INSUFFICIENT_PERMISSION",
            AccessError::InvalidPermission(_) => "INVALID_PERMISSION",
            AccessError::AlreadyOwner => "ALREADY_OWNER",
            AccessError::GrantNotFound(_) => "GRANT_NOT_FOUND",
            AccessError::Database(_) => "DATABASE_ERROR",
        }
    }
}
