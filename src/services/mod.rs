pub mod access_control;
pub mod artifact_store;
pub mod dataset_service;
pub mod engine_client;
pub mod insight_service;
pub mod team_service;
pub mod wizard_service;

pub use access_control::{AccessControlService, PermissionLevel};
pub use artifact_store::{ArtifactStore, FsArtifactStore};
pub use dataset_service::DatasetService;
pub use engine_client::{AnalysisEngine, HttpAnalysisEngine};
pub use insight_service::InsightService;
pub use team_service::TeamService;
pub use wizard_service::WizardService;
