//! Analysis-engine orchestration errors
//!
//! `InsightError` aborts the whole generation request (no partial dataset is
//! written). `ArtifactError` is the per-artifact failure class: it is logged
//! and the offending artifact skipped, never escalated to the request.

use thiserror::Error;

/// Orchestration-level failures
#[derive(Error, Debug)]
pub enum InsightError {
    /// The wizard state carried no source URL
    #[error("Dataset URL is required")]
    MissingDatasetUrl,

    /// Engine did not answer within the deadline
    #[error("Analysis engine timed out")]
    EngineTimeout,

    /// Engine could not be reached at all
    #[error("Analysis engine unreachable: {0}")]
    EngineUnreachable(String),

    /// Engine answered with a non-success status
    #[error("Analysis engine returned status {0}")]
    EngineStatus(u16),

    /// Engine response did not match the contract
    #[error("Malformed engine response: {0}")]
    MalformedResponse(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl InsightError {
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            InsightError::EngineTimeout
                | InsightError::EngineUnreachable(_)
                | InsightError::EngineStatus(_)
                | InsightError::MalformedResponse(_)
        )
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            InsightError::MissingDatasetUrl => 400,
            InsightError::EngineTimeout
            | InsightError::EngineUnreachable(_)
            | InsightError::EngineStatus(_)
            | InsightError::MalformedResponse(_) => 502,
            InsightError::Database(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            InsightError::MissingDatasetUrl => "DATASET_URL_REQUIRED",
            InsightError::EngineTimeout => "ENGINE_TIMEOUT",
            InsightError::EngineUnreachable(_) => "ENGINE_UNREACHABLE",
            InsightError::EngineStatus(_) => "ENGINE_STATUS",
            InsightError::MalformedResponse(_) => "ENGINE_MALFORMED_RESPONSE",
            InsightError::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Per-artifact failures, isolated from the surrounding run
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Payload decode failed: {0}")]
    DecodeFailed(String),

    #[error("Artifact store rejected upload: {0}")]
    StoreFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
