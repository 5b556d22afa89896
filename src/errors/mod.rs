//! Domain-specific error types for insightdeck.
//!
//! Each domain gets its own structured error enum so callers can match on
//! failure classes instead of strings. Every enum exposes
//! `http_status_code()` and `error_code()` for the HTTP layer:
//!
//! - **AccessError**: permission resolution and grant mutation
//! - **WizardError**: wizard stage validation and workflow context state
//! - **InsightError**: analysis-engine orchestration failures
//! - **DatasetError**: dataset record operations
//! - **TeamError**: team management operations

pub mod access;
pub mod dataset;
pub mod insight;
pub mod team;
pub mod wizard;

pub use access::AccessError;
pub use dataset::DatasetError;
pub use insight::{ArtifactError, InsightError};
pub use team::TeamError;
pub use wizard::WizardError;

/// Result type alias for access-control operations
pub type AccessResult<T> = Result<T, AccessError>;

/// Result type alias for wizard operations
pub type WizardResult<T> = Result<T, WizardError>;

/// Result type alias for insight generation
pub type InsightResult<T> = Result<T, InsightError>;

/// Result type alias for dataset operations
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Result type alias for team operations
pub type TeamResult<T> = Result<T, TeamError>;
