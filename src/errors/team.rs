//! Team management errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TeamError {
    #[error("Team {0} not found")]
    NotFound(i32),

    #[error("Team name is required")]
    NameRequired,

    #[error("Team name already taken")]
    NameTaken,

    #[error("Member {0} not found")]
    MemberNotFound(i32),

    #[error("Dataset {0} not found")]
    DatasetNotFound(i32),

    #[error("Members are not provided")]
    MembersRequired,

    #[error("Datasets are not provided")]
    DatasetsRequired,

    #[error("Member permission is not provided")]
    PermissionRequired,

    #[error("Member permission is not valid: {0}")]
    InvalidPermission(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl TeamError {
    pub fn http_status_code(&self) -> u16 {
        match self {
            TeamError::NotFound(_)
            | TeamError::MemberNotFound(_)
            | TeamError::DatasetNotFound(_) => 404,
            TeamError::NameRequired
            | TeamError::NameTaken
            | TeamError::MembersRequired
            | TeamError::DatasetsRequired
            | TeamError::PermissionRequired
            | TeamError::InvalidPermission(_) => 400,
            TeamError::Database(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            TeamError::NotFound(_) => "TEAM_NOT_FOUND",
            TeamError::NameRequired => "TEAM_NAME_REQUIRED",
            TeamError::NameTaken => "TEAM_NAME_TAKEN",
            TeamError::MemberNotFound(_) => "MEMBER_NOT_FOUND",
            TeamError::DatasetNotFound(_) => "DATASET_NOT_FOUND",
            TeamError::MembersRequired => "MEMBERS_REQUIRED",
            TeamError::DatasetsRequired => "DATASETS_REQUIRED",
            TeamError::PermissionRequired => "MEMBER_PERMISSION_REQUIRED",
            TeamError::InvalidPermission(_) => "INVALID_MEMBER_PERMISSION",
            TeamError::Database(_) => "DATABASE_ERROR",
        }
    }
}
