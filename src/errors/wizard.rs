//! Wizard stage validation and workflow context errors

use thiserror::Error;

/// Wizard workflow errors
#[derive(Error, Debug)]
pub enum WizardError {
    /// Domain type outside the allow-list
    #[error("Invalid domain type selected")]
    InvalidDomain(String),

    /// Analysis option outside clean_only / clean_and_generate
    #[error("Invalid analysis option: {0}")]
    InvalidAnalysisOption(String),

    /// A later stage arrived without the state the earlier stages record
    #[error("Missing previous step data. Please start from the beginning.")]
    MissingPreviousStepData,

    /// Grant list must be a non-empty sequence
    #[error("userPermissions must be provided as a non-empty array of user objects")]
    EmptyGrantList,

    /// A grant entry failed validation; the whole call is rejected
    #[error("Invalid grant entry: {0}")]
    InvalidGrantEntry(String),

    /// Workflow context missing for the supplied id
    #[error("Workflow context not found")]
    ContextNotFound,

    /// Stored context JSON could not be decoded
    #[error("Corrupt workflow context: {0}")]
    CorruptContext(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl WizardError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            WizardError::InvalidDomain(_)
                | WizardError::InvalidAnalysisOption(_)
                | WizardError::MissingPreviousStepData
                | WizardError::EmptyGrantList
                | WizardError::InvalidGrantEntry(_)
        )
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            WizardError::InvalidDomain(_)
            | WizardError::InvalidAnalysisOption(_)
            | WizardError::MissingPreviousStepData
            | WizardError::EmptyGrantList
            | WizardError::InvalidGrantEntry(_) => 400,
            WizardError::ContextNotFound => 404,
            WizardError::CorruptContext(_) | WizardError::Database(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            WizardError::InvalidDomain(_) => "INVALID_DOMAIN",
            WizardError::InvalidAnalysisOption(_) => "INVALID_ANALYSIS_OPTION",
            WizardError::MissingPreviousStepData => "MISSING_STEP_DATA",
            WizardError::EmptyGrantList => "EMPTY_GRANT_LIST",
            WizardError::InvalidGrantEntry(_) => "INVALID_GRANT_ENTRY",
            WizardError::ContextNotFound => "CONTEXT_NOT_FOUND",
            WizardError::CorruptContext(_) => "CORRUPT_CONTEXT",
            WizardError::Database(_) => "DATABASE_ERROR",
        }
    }
}
