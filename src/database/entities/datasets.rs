use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::insights::InsightMap;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "datasets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub dataset_name: String,
    pub dataset_url: String,
    pub cleaned_url: Option<String>,
    pub domain_type: Option<String>,
    /// Insight-category mapping, stored as JSON (see [`InsightMap`])
    pub insights: String,
    /// Denormalized usernames with a grant on this dataset, stored as a JSON array
    pub shared_usernames: String,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::shared_grants::Entity")]
    SharedGrants,
    #[sea_orm(has_many = "super::team_datasets::Entity")]
    TeamDatasets,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::shared_grants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SharedGrants.def()
    }
}

impl Related<super::team_datasets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeamDatasets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parse the insight mapping column
    pub fn insight_map(&self) -> Result<InsightMap, serde_json::Error> {
        serde_json::from_str(&self.insights)
    }

    /// Parse the denormalized username list
    pub fn shared_username_list(&self) -> Vec<String> {
        serde_json::from_str(&self.shared_usernames).unwrap_or_default()
    }
}

impl ActiveModel {
    pub fn set_insight_map(&mut self, map: &InsightMap) -> Result<(), serde_json::Error> {
        self.insights = Set(serde_json::to_string(map)?);
        Ok(())
    }

    pub fn set_shared_usernames(&mut self, usernames: &[String]) -> Result<(), serde_json::Error> {
        self.shared_usernames = Set(serde_json::to_string(usernames)?);
        Ok(())
    }
}
