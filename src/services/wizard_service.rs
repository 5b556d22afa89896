use chrono::Duration;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
    TryIntoModel,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::database::entities::{wizard_sessions, wizard_sessions::Entity as WizardSessions};
use crate::errors::{WizardError, WizardResult};
use crate::services::access_control::PermissionLevel;

/// Domain types the wizard accepts.
const VALID_DOMAINS: &[&str] = &["ecommerce", "HR"];

/// How long an untouched workflow context stays alive. Every stage write
/// pushes the expiry forward.
const CONTEXT_TTL_HOURS: i64 = 1;

/// Wizard stage markers persisted with the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStage {
    DomainSelected,
    Upload,
    Processing,
    AccessGranted,
}

impl WizardStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStage::DomainSelected => "domain-selected",
            WizardStage::Upload => "upload",
            WizardStage::Processing => "processing",
            WizardStage::AccessGranted => "access-granted",
        }
    }
}

/// What the client should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Upload,
    ProcessingOptions,
    GrantAccess,
    GenerateInsights,
}

impl NextStep {
    pub fn as_path(&self) -> &'static str {
        match self {
            NextStep::Upload => "/upload",
            NextStep::ProcessingOptions => "/processing-options",
            NextStep::GrantAccess => "/grant-access",
            NextStep::GenerateInsights => "/generate-insights",
        }
    }
}

/// Requested processing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOption {
    CleanOnly,
    CleanAndGenerate,
}

impl AnalysisOption {
    pub fn from_str(s: &str) -> WizardResult<Self> {
        match s {
            "clean_only" => Ok(AnalysisOption::CleanOnly),
            "clean_and_generate" => Ok(AnalysisOption::CleanAndGenerate),
            _ => Err(WizardError::InvalidAnalysisOption(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisOption::CleanOnly => "clean_only",
            AnalysisOption::CleanAndGenerate => "clean_and_generate",
        }
    }
}

/// One entry of the requested grant list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantRequest {
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub permission: String,
}

/// Result of the grant-access stage.
#[derive(Debug, Clone)]
pub struct GrantOutcome {
    pub workflow_id: String,
    pub users_count: usize,
    pub is_complete: bool,
    pub next_step: NextStep,
}

/// Fully accumulated wizard state handed to the orchestrator.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    pub workflow_id: String,
    pub user_id: i32,
    pub domain_type: Option<String>,
    pub source_url: Option<String>,
    pub analysis_option: AnalysisOption,
    pub download_after: bool,
    pub grants: Vec<GrantRequest>,
}

/// Sequences the wizard's precursor stages and owns the persisted
/// workflow contexts.
///
/// Stages may arrive out of the declared order; only the terminal
/// generate call enforces that the mandatory subset is present. Contexts
/// are scoped to the user that created them and expire after a TTL.
#[derive(Clone)]
pub struct WizardService {
    db: DatabaseConnection,
}

impl WizardService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn ttl() -> Duration {
        Duration::hours(CONTEXT_TTL_HOURS)
    }

    /// Stage 1: pick the dataset domain. Creates the workflow context if
    /// this is the first call of the run.
    pub async fn select_domain(
        &self,
        workflow_id: Option<&str>,
        user_id: i32,
        domain_type: &str,
    ) -> WizardResult<wizard_sessions::Model> {
        if !VALID_DOMAINS.contains(&domain_type) {
            return Err(WizardError::InvalidDomain(domain_type.to_string()));
        }

        let mut active = self.load_or_create(workflow_id, user_id).await?;
        active.domain_type = Set(Some(domain_type.to_string()));
        active.stage = Set(WizardStage::DomainSelected.as_str().to_string());
        let model = active.touch(Self::ttl()).save(&self.db).await?.try_into_model()?;

        debug!(workflow_id = %model.workflow_id, domain = domain_type, "domain selected");
        Ok(model)
    }

    /// Stage 2: record the uploaded source URL. Accepts a context without a
    /// chosen domain; the terminal stage will fail fast instead.
    /// Repeated calls overwrite the stored URL.
    pub async fn record_upload(
        &self,
        workflow_id: Option<&str>,
        user_id: i32,
        file_url: &str,
    ) -> WizardResult<wizard_sessions::Model> {
        let mut active = self.load_or_create(workflow_id, user_id).await?;
        active.source_url = Set(Some(file_url.to_string()));
        active.stage = Set(WizardStage::Upload.as_str().to_string());
        let model = active.touch(Self::ttl()).save(&self.db).await?.try_into_model()?;

        debug!(workflow_id = %model.workflow_id, "source url recorded");
        Ok(model)
    }

    /// Stage 3: record the processing options.
    pub async fn record_options(
        &self,
        workflow_id: Option<&str>,
        user_id: i32,
        option: &str,
        download_after: bool,
    ) -> WizardResult<wizard_sessions::Model> {
        let option = AnalysisOption::from_str(option)?;

        let mut active = self.load_or_create(workflow_id, user_id).await?;
        active.analysis_option = Set(Some(option.as_str().to_string()));
        active.download_after = Set(download_after);
        active.stage = Set(WizardStage::Processing.as_str().to_string());
        let model = active.touch(Self::ttl()).save(&self.db).await?.try_into_model()?;

        Ok(model)
    }

    /// Stage 4: record the requested grant list. Validation is
    /// all-or-nothing: any bad entry rejects the whole call and nothing is
    /// stored. Requires a context with a chosen domain.
    pub async fn record_grants(
        &self,
        workflow_id: Option<&str>,
        user_id: i32,
        grants: &[GrantRequest],
    ) -> WizardResult<GrantOutcome> {
        let context = match self.load(workflow_id, user_id).await? {
            Some(context) if context.domain_type.is_some() => context,
            _ => return Err(WizardError::MissingPreviousStepData),
        };

        if grants.is_empty() {
            return Err(WizardError::EmptyGrantList);
        }
        for entry in grants {
            if entry.user_id <= 0 {
                return Err(WizardError::InvalidGrantEntry(
                    "each entry must contain a userId and a permission".to_string(),
                ));
            }
            if PermissionLevel::from_str(&entry.permission).is_err() {
                return Err(WizardError::InvalidGrantEntry(format!(
                    "permission '{}' must be one of: view, edit, admin",
                    entry.permission
                )));
            }
        }

        let users_count = grants.len();
        let has_upload = context.source_url.is_some();
        let has_options = context.analysis_option.is_some();
        let workflow_id = context.workflow_id.clone();

        let mut active: wizard_sessions::ActiveModel = context.into();
        active.grants = Set(Some(
            serde_json::to_string(grants).map_err(|e| WizardError::CorruptContext(e.to_string()))?,
        ));
        active.stage = Set(WizardStage::AccessGranted.as_str().to_string());
        active.touch(Self::ttl()).update(&self.db).await?;

        // Point the client back at whichever prerequisite is still missing
        let (is_complete, next_step) = if has_upload && has_options {
            (true, NextStep::GenerateInsights)
        } else if !has_upload {
            (false, NextStep::Upload)
        } else {
            (false, NextStep::ProcessingOptions)
        };

        Ok(GrantOutcome {
            workflow_id,
            users_count,
            is_complete,
            next_step,
        })
    }

    /// Terminal-stage load. Fails fast when the context is missing or the
    /// mandatory subset (processing options) was never recorded; the
    /// orchestrator checks the source URL itself.
    pub async fn load_for_generate(
        &self,
        workflow_id: Option<&str>,
        user_id: i32,
    ) -> WizardResult<WorkflowContext> {
        let context = self
            .load(workflow_id, user_id)
            .await?
            .ok_or(WizardError::MissingPreviousStepData)?;

        let option = context
            .analysis_option
            .as_deref()
            .ok_or(WizardError::MissingPreviousStepData)?;
        let analysis_option = AnalysisOption::from_str(option)
            .map_err(|_| WizardError::CorruptContext(format!("analysis option '{}'", option)))?;

        let grants: Vec<GrantRequest> = match context.grants.as_deref() {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| WizardError::CorruptContext(e.to_string()))?,
            None => Vec::new(),
        };

        Ok(WorkflowContext {
            workflow_id: context.workflow_id,
            user_id: context.user_id,
            domain_type: context.domain_type,
            source_url: context.source_url,
            analysis_option,
            download_after: context.download_after,
            grants,
        })
    }

    /// Destroy a context, either on successful completion of the final
    /// stage or on explicit abandonment.
    pub async fn destroy(&self, workflow_id: &str) -> WizardResult<()> {
        WizardSessions::delete_many()
            .filter(wizard_sessions::Column::WorkflowId.eq(workflow_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Load a live context owned by `user_id`. Expired rows are deleted and
    /// reported as absent; contexts are never shared across users.
    async fn load(
        &self,
        workflow_id: Option<&str>,
        user_id: i32,
    ) -> WizardResult<Option<wizard_sessions::Model>> {
        let Some(workflow_id) = workflow_id else {
            return Ok(None);
        };

        let context = WizardSessions::find()
            .filter(wizard_sessions::Column::WorkflowId.eq(workflow_id))
            .one(&self.db)
            .await?;

        match context {
            Some(context) if context.user_id != user_id => Ok(None),
            Some(context) if context.is_expired() => {
                context.delete(&self.db).await?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn load_or_create(
        &self,
        workflow_id: Option<&str>,
        user_id: i32,
    ) -> WizardResult<wizard_sessions::ActiveModel> {
        if let Some(workflow_id) = workflow_id {
            let existing = WizardSessions::find()
                .filter(wizard_sessions::Column::WorkflowId.eq(workflow_id))
                .one(&self.db)
                .await?;

            match existing {
                Some(context) if context.user_id == user_id && !context.is_expired() => {
                    return Ok(context.into());
                }
                Some(context) if context.user_id == user_id => {
                    // Expired: drop the stale row, keep the client's id
                    context.delete(&self.db).await?;
                    return Ok(wizard_sessions::ActiveModel::new(
                        workflow_id.to_string(),
                        user_id,
                        Self::ttl(),
                    ));
                }
                // Another user's id: mint a fresh one below
                Some(_) => {}
                None => {
                    return Ok(wizard_sessions::ActiveModel::new(
                        workflow_id.to_string(),
                        user_id,
                        Self::ttl(),
                    ));
                }
            }
        }

        Ok(wizard_sessions::ActiveModel::new(
            Uuid::new_v4().to_string(),
            user_id,
            Self::ttl(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use sea_orm::ActiveModelTrait;

    async fn seed_user(db: &DatabaseConnection) -> i32 {
        crate::database::entities::users::ActiveModel::new(
            "analyst@example.com".to_string(),
            "analyst".to_string(),
            "Analyst".to_string(),
        )
        .insert(db)
        .await
        .expect("insert user")
        .id
    }

    #[tokio::test]
    async fn test_select_domain_rejects_unknown_domain() {
        let db = setup_test_db().await;
        let user_id = seed_user(&db).await;

        let service = WizardService::new(db);
        let err = service
            .select_domain(None, user_id, "finance")
            .await
            .expect_err("not in allow-list");
        assert!(matches!(err, WizardError::InvalidDomain(_)));
    }

    #[tokio::test]
    async fn test_stages_accumulate_into_one_context() {
        let db = setup_test_db().await;
        let user_id = seed_user(&db).await;

        let service = WizardService::new(db);
        let context = service
            .select_domain(None, user_id, "ecommerce")
            .await
            .expect("select domain");
        let workflow_id = context.workflow_id.clone();

        service
            .record_upload(Some(&workflow_id), user_id, "https://cdn/data.csv")
            .await
            .expect("record upload");
        service
            .record_options(Some(&workflow_id), user_id, "clean_and_generate", true)
            .await
            .expect("record options");
        let outcome = service
            .record_grants(
                Some(&workflow_id),
                user_id,
                &[GrantRequest {
                    user_id,
                    permission: "view".to_string(),
                }],
            )
            .await
            .expect("record grants");

        assert!(outcome.is_complete);
        assert_eq!(outcome.next_step, NextStep::GenerateInsights);
        assert_eq!(outcome.users_count, 1);

        let loaded = service
            .load_for_generate(Some(&workflow_id), user_id)
            .await
            .expect("ready to generate");
        assert_eq!(loaded.domain_type.as_deref(), Some("ecommerce"));
        assert_eq!(loaded.source_url.as_deref(), Some("https://cdn/data.csv"));
        assert_eq!(loaded.analysis_option, AnalysisOption::CleanAndGenerate);
        assert!(loaded.download_after);
        assert_eq!(loaded.grants.len(), 1);
    }

    #[tokio::test]
    async fn test_grants_require_domain_stage() {
        let db = setup_test_db().await;
        let user_id = seed_user(&db).await;

        let service = WizardService::new(db);
        let err = service
            .record_grants(
                None,
                user_id,
                &[GrantRequest {
                    user_id: 1,
                    permission: "view".to_string(),
                }],
            )
            .await
            .expect_err("no context yet");
        assert!(matches!(err, WizardError::MissingPreviousStepData));
    }

    #[tokio::test]
    async fn test_grant_validation_is_all_or_nothing() {
        let db = setup_test_db().await;
        let user_id = seed_user(&db).await;

        let service = WizardService::new(db);
        let context = service
            .select_domain(None, user_id, "HR")
            .await
            .expect("select domain");
        let workflow_id = context.workflow_id;

        let err = service
            .record_grants(
                Some(&workflow_id),
                user_id,
                &[
                    GrantRequest {
                        user_id: 1,
                        permission: "view".to_string(),
                    },
                    GrantRequest {
                        user_id: 2,
                        permission: "owner".to_string(),
                    },
                ],
            )
            .await
            .expect_err("one invalid entry rejects the call");
        assert!(matches!(err, WizardError::InvalidGrantEntry(_)));

        // Nothing was stored
        let err = service
            .load_for_generate(Some(&workflow_id), user_id)
            .await
            .expect_err("options still missing");
        assert!(matches!(err, WizardError::MissingPreviousStepData));
    }

    #[tokio::test]
    async fn test_next_step_points_at_missing_prerequisite() {
        let db = setup_test_db().await;
        let user_id = seed_user(&db).await;

        let service = WizardService::new(db);
        let context = service
            .select_domain(None, user_id, "ecommerce")
            .await
            .expect("select domain");
        let workflow_id = context.workflow_id;

        // No upload, no options yet: back to /upload first
        let outcome = service
            .record_grants(
                Some(&workflow_id),
                user_id,
                &[GrantRequest {
                    user_id: 1,
                    permission: "edit".to_string(),
                }],
            )
            .await
            .expect("grants accepted");
        assert!(!outcome.is_complete);
        assert_eq!(outcome.next_step, NextStep::Upload);

        // Upload present, options still missing
        service
            .record_upload(Some(&workflow_id), user_id, "https://cdn/data.csv")
            .await
            .expect("record upload");
        let outcome = service
            .record_grants(
                Some(&workflow_id),
                user_id,
                &[GrantRequest {
                    user_id: 1,
                    permission: "edit".to_string(),
                }],
            )
            .await
            .expect("grants accepted");
        assert_eq!(outcome.next_step, NextStep::ProcessingOptions);
    }

    #[tokio::test]
    async fn test_context_is_not_shared_across_users() {
        let db = setup_test_db().await;
        let user_id = seed_user(&db).await;
        let other_id = crate::database::entities::users::ActiveModel::new(
            "other@example.com".to_string(),
            "other".to_string(),
            "Other".to_string(),
        )
        .insert(&db)
        .await
        .expect("insert user")
        .id;

        let service = WizardService::new(db);
        let context = service
            .select_domain(None, user_id, "ecommerce")
            .await
            .expect("select domain");

        let err = service
            .load_for_generate(Some(&context.workflow_id), other_id)
            .await
            .expect_err("foreign context is invisible");
        assert!(matches!(err, WizardError::MissingPreviousStepData));
    }

    #[tokio::test]
    async fn test_destroyed_context_is_gone() {
        let db = setup_test_db().await;
        let user_id = seed_user(&db).await;

        let service = WizardService::new(db);
        let context = service
            .select_domain(None, user_id, "ecommerce")
            .await
            .expect("select domain");
        service
            .destroy(&context.workflow_id)
            .await
            .expect("destroy");

        let err = service
            .load_for_generate(Some(&context.workflow_id), user_id)
            .await
            .expect_err("context destroyed");
        assert!(matches!(err, WizardError::MissingPreviousStepData));
    }
}
