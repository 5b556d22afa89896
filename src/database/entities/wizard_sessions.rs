use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// Persisted workflow context for one run of the dataset-intake wizard.
/// Keyed by a client-held `workflow_id`; rows expire after a TTL and an
/// expired row is treated as absent.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wizard_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub workflow_id: String,
    pub user_id: i32,
    pub domain_type: Option<String>,
    pub source_url: Option<String>,
    pub analysis_option: Option<String>,
    pub download_after: bool,
    /// Requested grant list, stored as JSON `[{"userId": .., "permission": ..}]`
    pub grants: Option<String>,
    pub stage: String,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
    pub expires_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new(workflow_id: String, user_id: i32, ttl: chrono::Duration) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: ActiveValue::NotSet,
            workflow_id: Set(workflow_id),
            user_id: Set(user_id),
            domain_type: ActiveValue::NotSet,
            source_url: ActiveValue::NotSet,
            analysis_option: ActiveValue::NotSet,
            download_after: Set(false),
            grants: ActiveValue::NotSet,
            stage: Set(String::new()),
            created_at: Set(now),
            updated_at: Set(now),
            expires_at: Set(now + ttl),
        }
    }

    /// Refresh `updated_at` and push the expiry forward by the TTL
    pub fn touch(mut self, ttl: chrono::Duration) -> Self {
        let now = chrono::Utc::now();
        self.updated_at = Set(now);
        self.expires_at = Set(now + ttl);
        self
    }
}

impl Model {
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now() > self.expires_at
    }
}
