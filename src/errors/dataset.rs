//! Dataset record operation errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Dataset {0} not found")]
    NotFound(i32),

    #[error("Dataset name is required")]
    NameRequired,

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl DatasetError {
    pub fn http_status_code(&self) -> u16 {
        match self {
            DatasetError::NotFound(_) => 404,
            DatasetError::NameRequired => 400,
            DatasetError::Database(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            DatasetError::NotFound(_) => "DATASET_NOT_FOUND",
            DatasetError::NameRequired => "DATASET_NAME_REQUIRED",
            DatasetError::Database(_) => "DATABASE_ERROR",
        }
    }
}
