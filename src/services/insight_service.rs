use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::entities::datasets;
use crate::errors::{ArtifactError, InsightError, InsightResult};
use crate::insights::{ArtifactRef, InsightCategory, InsightMap};
use crate::services::access_control::{AccessControlService, PermissionLevel};
use crate::services::artifact_store::ArtifactStore;
use crate::services::engine_client::{AnalysisEngine, EngineArtifact};
use crate::services::wizard_service::{AnalysisOption, WorkflowContext};

/// One requested grant that could not be applied. Reported to the caller
/// alongside the created dataset; never rolls anything back.
#[derive(Debug, Clone, Serialize)]
pub struct GrantFailure {
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub permission: String,
    pub reason: String,
}

/// Result of a successful generation run.
#[derive(Debug)]
pub struct GenerateOutcome {
    pub dataset: datasets::Model,
    pub artifacts_skipped: usize,
    pub grant_failures: Vec<GrantFailure>,
}

/// Orchestrates the terminal wizard stage: one engine round trip,
/// artifact classification and storage, dataset persistence, and the
/// requested grant applications.
///
/// Engine failures abort the whole run with nothing persisted. A single
/// artifact that cannot be decoded or stored is logged and skipped so one
/// bad frame does not discard an otherwise-successful analysis.
#[derive(Clone)]
pub struct InsightService {
    db: DatabaseConnection,
    engine: Arc<dyn AnalysisEngine>,
    store: Arc<dyn ArtifactStore>,
    access: AccessControlService,
}

impl InsightService {
    pub fn new(
        db: DatabaseConnection,
        engine: Arc<dyn AnalysisEngine>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        let access = AccessControlService::new(db.clone());
        Self {
            db,
            engine,
            store,
            access,
        }
    }

    pub async fn generate(
        &self,
        dataset_name: &str,
        context: &WorkflowContext,
    ) -> InsightResult<GenerateOutcome> {
        let source_url = context
            .source_url
            .as_deref()
            .ok_or(InsightError::MissingDatasetUrl)?;

        let (insight_map, cleaned_url, artifacts_skipped) = match context.analysis_option {
            AnalysisOption::CleanOnly => {
                let response = self.engine.clean(source_url).await?;
                (InsightMap::default(), response.cleaned_csv, 0)
            }
            AnalysisOption::CleanAndGenerate => {
                let response = self
                    .engine
                    .analyze(source_url, context.domain_type.as_deref())
                    .await?;
                let (map, skipped) = self.classify_and_store(&response.images).await;
                (map, response.cleaned_csv, skipped)
            }
        };

        let now = Utc::now();
        let mut active = datasets::ActiveModel {
            user_id: Set(context.user_id),
            dataset_name: Set(dataset_name.to_string()),
            dataset_url: Set(source_url.to_string()),
            cleaned_url: Set(cleaned_url),
            domain_type: Set(context.domain_type.clone()),
            shared_usernames: Set("[]".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        active
            .set_insight_map(&insight_map)
            .map_err(|e| InsightError::Database(sea_orm::DbErr::Custom(e.to_string())))?;
        let dataset = active.insert(&self.db).await?;

        info!(
            dataset_id = dataset.id,
            artifacts = insight_map.len(),
            skipped = artifacts_skipped,
            "dataset persisted"
        );

        let grant_failures = self.apply_grants(dataset.id, &context.grants).await;

        Ok(GenerateOutcome {
            dataset,
            artifacts_skipped,
            grant_failures,
        })
    }

    /// Route every artifact into its category bucket, storing the decoded
    /// payload durably. Order within each bucket follows the engine
    /// response. Per-artifact failures are isolated: warn and skip.
    async fn classify_and_store(&self, images: &[EngineArtifact]) -> (InsightMap, usize) {
        let mut map = InsightMap::default();
        let mut skipped = 0;

        for (index, artifact) in images.iter().enumerate() {
            let category = InsightCategory::from_tag(&artifact.tag);
            match self.store_artifact(category, artifact).await {
                Ok(url) => {
                    let filter_number = if category.carries_filter() {
                        artifact.filter_number
                    } else {
                        None
                    };
                    map.push(category, ArtifactRef::new(url, filter_number));
                }
                Err(err) => {
                    warn!(
                        index,
                        category = category.as_str(),
                        error = %err,
                        "skipping artifact"
                    );
                    skipped += 1;
                }
            }
        }

        (map, skipped)
    }

    /// Decode the payload into a scoped temp file, then hand it to the
    /// artifact store. The temp file is deleted on every exit path.
    async fn store_artifact(
        &self,
        category: InsightCategory,
        artifact: &EngineArtifact,
    ) -> Result<String, ArtifactError> {
        let bytes = decode_payload(&artifact.payload)?;

        let staged = NamedTempFile::new()?;
        tokio::fs::write(staged.path(), &bytes).await?;

        let name = format!("{}-{}.png", category.as_str(), Uuid::new_v4());
        self.store.put(&name, staged.path()).await
    }

    /// Apply the requested grants sequentially. A failed grant is reported
    /// and does not roll back the dataset or already-applied grants.
    async fn apply_grants(
        &self,
        dataset_id: i32,
        grants: &[crate::services::wizard_service::GrantRequest],
    ) -> Vec<GrantFailure> {
        let mut failures = Vec::new();

        for grant in grants {
            let result = match PermissionLevel::from_str(&grant.permission) {
                Ok(level) => self
                    .access
                    .share_dataset(dataset_id, grant.user_id, level)
                    .await
                    .map(|_| ()),
                Err(err) => Err(err),
            };

            if let Err(err) = result {
                warn!(
                    dataset_id,
                    user_id = grant.user_id,
                    error = %err,
                    "grant application failed"
                );
                failures.push(GrantFailure {
                    user_id: grant.user_id,
                    permission: grant.permission.clone(),
                    reason: err.to_string(),
                });
            }
        }

        failures
    }
}

/// Decode a base64 payload, tolerating `data:*;base64,` URLs.
fn decode_payload(payload: &str) -> Result<Vec<u8>, ArtifactError> {
    let encoded = if payload.starts_with("data:") {
        payload
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| ArtifactError::DecodeFailed("data url without payload".to_string()))?
    } else {
        payload
    };

    BASE64
        .decode(encoded.trim())
        .map_err(|e| ArtifactError::DecodeFailed(e.to_string()))
}
