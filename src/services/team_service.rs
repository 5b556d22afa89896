use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

use crate::database::entities::{
    datasets::Entity as Datasets, team_datasets, team_datasets::Entity as TeamDatasets,
    team_members, team_members::Entity as TeamMembers, teams, teams::Entity as Teams,
    users::Entity as Users,
};
use crate::errors::{TeamError, TeamResult};
use crate::services::access_control::PermissionLevel;

/// A team with its member and dataset references resolved.
#[derive(Debug, Serialize)]
pub struct TeamWithRelations {
    #[serde(flatten)]
    pub team: teams::Model,
    pub members: Vec<i32>,
    pub datasets: Vec<i32>,
}

/// Team management. Mutations follow total-replace semantics: the member
/// set and dataset set are replaced wholesale, and the owner is re-added
/// whenever a submitted member set omits it.
#[derive(Clone)]
pub struct TeamService {
    db: DatabaseConnection,
}

impl TeamService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        owner_id: i32,
        name: &str,
        members: &[i32],
        dataset_ids: &[i32],
        member_permission: Option<&str>,
    ) -> TeamResult<TeamWithRelations> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TeamError::NameRequired);
        }

        let exists = Teams::find()
            .filter(teams::Column::Name.eq(name))
            .filter(teams::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?;
        if exists.is_some() {
            return Err(TeamError::NameTaken);
        }

        let permission = match member_permission {
            Some(value) => PermissionLevel::from_str(value)
                .map_err(|_| TeamError::InvalidPermission(value.to_string()))?,
            None => PermissionLevel::View,
        };

        self.check_members_exist(members).await?;
        self.check_datasets_exist(dataset_ids).await?;

        let now = Utc::now();
        let team = teams::ActiveModel {
            name: Set(name.to_string()),
            owner_id: Set(owner_id),
            member_permission: Set(permission.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        self.insert_members(team.id, owner_id, members).await?;
        self.insert_datasets(team.id, dataset_ids).await?;

        self.with_relations(team).await
    }

    /// Teams the user owns or belongs to.
    pub async fn list_for_user(&self, user_id: i32) -> TeamResult<Vec<TeamWithRelations>> {
        let member_team_ids: Vec<i32> = TeamMembers::find()
            .filter(team_members::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| m.team_id)
            .collect();

        let teams = Teams::find()
            .filter(
                teams::Column::OwnerId
                    .eq(user_id)
                    .or(teams::Column::Id.is_in(member_team_ids)),
            )
            .order_by_desc(teams::Column::UpdatedAt)
            .all(&self.db)
            .await?;

        let mut result = Vec::with_capacity(teams.len());
        for team in teams {
            result.push(self.with_relations(team).await?);
        }
        Ok(result)
    }

    pub async fn with_relations(&self, team: teams::Model) -> TeamResult<TeamWithRelations> {
        let members: Vec<i32> = TeamMembers::find()
            .filter(team_members::Column::TeamId.eq(team.id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| m.user_id)
            .collect();
        let datasets: Vec<i32> = TeamDatasets::find()
            .filter(team_datasets::Column::TeamId.eq(team.id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|d| d.dataset_id)
            .collect();

        Ok(TeamWithRelations {
            team,
            members,
            datasets,
        })
    }

    /// Replace the member set. The owner is always re-added.
    pub async fn replace_members(
        &self,
        team: teams::Model,
        members: &[i32],
    ) -> TeamResult<TeamWithRelations> {
        self.check_members_exist(members).await?;

        TeamMembers::delete_many()
            .filter(team_members::Column::TeamId.eq(team.id))
            .exec(&self.db)
            .await?;
        self.insert_members(team.id, team.owner_id, members).await?;

        let team = self.touch(team).await?;
        self.with_relations(team).await
    }

    /// Replace the assigned dataset set.
    pub async fn replace_datasets(
        &self,
        team: teams::Model,
        dataset_ids: &[i32],
    ) -> TeamResult<TeamWithRelations> {
        self.check_datasets_exist(dataset_ids).await?;

        TeamDatasets::delete_many()
            .filter(team_datasets::Column::TeamId.eq(team.id))
            .exec(&self.db)
            .await?;
        self.insert_datasets(team.id, dataset_ids).await?;

        let team = self.touch(team).await?;
        self.with_relations(team).await
    }

    /// Replace the single permission level shared by all non-owner members.
    pub async fn set_member_permission(
        &self,
        team: teams::Model,
        permission: &str,
    ) -> TeamResult<TeamWithRelations> {
        let level = PermissionLevel::from_str(permission)
            .map_err(|_| TeamError::InvalidPermission(permission.to_string()))?;

        let mut active: teams::ActiveModel = team.into();
        active.member_permission = Set(level.as_str().to_string());
        active.updated_at = Set(Utc::now());
        let team = active.update(&self.db).await?;

        self.with_relations(team).await
    }

    async fn touch(&self, team: teams::Model) -> TeamResult<teams::Model> {
        let mut active: teams::ActiveModel = team.into();
        active.updated_at = Set(Utc::now());
        Ok(active.update(&self.db).await?)
    }

    async fn check_members_exist(&self, members: &[i32]) -> TeamResult<()> {
        for member_id in members {
            Users::find_by_id(*member_id)
                .one(&self.db)
                .await?
                .ok_or(TeamError::MemberNotFound(*member_id))?;
        }
        Ok(())
    }

    async fn check_datasets_exist(&self, dataset_ids: &[i32]) -> TeamResult<()> {
        for dataset_id in dataset_ids {
            Datasets::find_by_id(*dataset_id)
                .one(&self.db)
                .await?
                .ok_or(TeamError::DatasetNotFound(*dataset_id))?;
        }
        Ok(())
    }

    async fn insert_members(&self, team_id: i32, owner_id: i32, members: &[i32]) -> TeamResult<()> {
        let mut seen = HashSet::new();
        let now = Utc::now();
        for member_id in members.iter().copied().chain(std::iter::once(owner_id)) {
            if !seen.insert(member_id) {
                continue;
            }
            team_members::ActiveModel {
                team_id: Set(team_id),
                user_id: Set(member_id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&self.db)
            .await?;
        }
        Ok(())
    }

    async fn insert_datasets(&self, team_id: i32, dataset_ids: &[i32]) -> TeamResult<()> {
        let mut seen = HashSet::new();
        let now = Utc::now();
        for dataset_id in dataset_ids.iter().copied() {
            if !seen.insert(dataset_id) {
                continue;
            }
            team_datasets::ActiveModel {
                team_id: Set(team_id),
                dataset_id: Set(dataset_id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&self.db)
            .await?;
        }
        Ok(())
    }
}
