use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
};

use crate::database::entities::{
    datasets, shared_grants, team_datasets, team_members, teams, users,
    datasets::Entity as Datasets, shared_grants::Entity as SharedGrants,
    team_datasets::Entity as TeamDatasets, team_members::Entity as TeamMembers,
    teams::Entity as Teams, users::Entity as Users,
};
use crate::errors::{AccessError, AccessResult};

/// Permission level with a total order: `View < Edit < Admin`.
///
/// An operation requiring level L is permitted iff the resolved level
/// compares greater or equal to L.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PermissionLevel {
    View,
    Edit,
    Admin,
}

impl PermissionLevel {
    pub fn from_str(s: &str) -> AccessResult<Self> {
        match s.to_lowercase().as_str() {
            "view" => Ok(PermissionLevel::View),
            "edit" => Ok(PermissionLevel::Edit),
            "admin" => Ok(PermissionLevel::Admin),
            _ => Err(AccessError::InvalidPermission(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::View => "view",
            PermissionLevel::Edit => "edit",
            PermissionLevel::Admin => "admin",
        }
    }

    pub fn ordinal(&self) -> u8 {
        match self {
            PermissionLevel::View => 1,
            PermissionLevel::Edit => 2,
            PermissionLevel::Admin => 3,
        }
    }
}

/// Resolves and mutates effective access for (user, dataset) and
/// (user, team) pairs.
///
/// Dataset resolution combines three sources: ownership (always admin,
/// short-circuits everything), a direct grant, and team-derived access via
/// any team the dataset is assigned to. When more than one source applies,
/// the highest level wins.
#[derive(Clone)]
pub struct AccessControlService {
    db: DatabaseConnection,
}

impl AccessControlService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Compute the effective permission of `user_id` on a dataset.
    /// Errors with `NotShared` when no source grants any access.
    pub async fn resolve_dataset_level(
        &self,
        user_id: i32,
        dataset: &datasets::Model,
    ) -> AccessResult<PermissionLevel> {
        if dataset.user_id == user_id {
            return Ok(PermissionLevel::Admin);
        }

        let mut best: Option<PermissionLevel> = None;

        let grant = SharedGrants::find()
            .filter(shared_grants::Column::DatasetId.eq(dataset.id))
            .filter(shared_grants::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        if let Some(grant) = grant {
            best = Some(PermissionLevel::from_str(&grant.permission)?);
        }

        if let Some(team_level) = self.team_derived_level(user_id, dataset.id).await? {
            best = Some(best.map_or(team_level, |b| b.max(team_level)));
        }

        best.ok_or(AccessError::NotShared)
    }

    /// Highest level any team assignment confers on the dataset, if any.
    async fn team_derived_level(
        &self,
        user_id: i32,
        dataset_id: i32,
    ) -> AccessResult<Option<PermissionLevel>> {
        let links = TeamDatasets::find()
            .filter(team_datasets::Column::DatasetId.eq(dataset_id))
            .all(&self.db)
            .await?;
        if links.is_empty() {
            return Ok(None);
        }

        let team_ids: Vec<i32> = links.iter().map(|l| l.team_id).collect();
        let candidate_teams = Teams::find()
            .filter(teams::Column::Id.is_in(team_ids.clone()))
            .all(&self.db)
            .await?;
        let memberships: HashSet<i32> = TeamMembers::find()
            .filter(team_members::Column::TeamId.is_in(team_ids))
            .filter(team_members::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| m.team_id)
            .collect();

        let mut best: Option<PermissionLevel> = None;
        for team in candidate_teams {
            let level = if team.owner_id == user_id {
                PermissionLevel::Admin
            } else if memberships.contains(&team.id) {
                PermissionLevel::from_str(&team.member_permission)?
            } else {
                continue;
            };
            best = Some(best.map_or(level, |b| b.max(level)));
        }

        Ok(best)
    }

    /// Fetch the dataset and require an effective level of at least
    /// `required`. Returns the dataset so callers don't re-fetch it.
    pub async fn require_dataset_access(
        &self,
        user_id: i32,
        dataset_id: i32,
        required: PermissionLevel,
    ) -> AccessResult<datasets::Model> {
        let dataset = Datasets::find_by_id(dataset_id)
            .one(&self.db)
            .await?
            .ok_or(AccessError::DatasetNotFound(dataset_id))?;

        let level = self.resolve_dataset_level(user_id, &dataset).await?;
        if level < required {
            return Err(AccessError::InsufficientPermission {
                required: required.as_str(),
            });
        }

        Ok(dataset)
    }

    /// Compute the effective permission of `user_id` within a team.
    pub async fn resolve_team_level(
        &self,
        user_id: i32,
        team: &teams::Model,
    ) -> AccessResult<PermissionLevel> {
        if team.owner_id == user_id {
            return Ok(PermissionLevel::Admin);
        }

        let membership = TeamMembers::find()
            .filter(team_members::Column::TeamId.eq(team.id))
            .filter(team_members::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        if membership.is_none() {
            return Err(AccessError::NotTeamMember);
        }

        PermissionLevel::from_str(&team.member_permission)
    }

    /// Fetch the team and require an effective level of at least `required`.
    pub async fn require_team_access(
        &self,
        user_id: i32,
        team_id: i32,
        required: PermissionLevel,
    ) -> AccessResult<teams::Model> {
        let team = Teams::find_by_id(team_id)
            .one(&self.db)
            .await?
            .ok_or(AccessError::TeamNotFound(team_id))?;

        let level = self.resolve_team_level(user_id, &team).await?;
        if level < required {
            return Err(AccessError::InsufficientPermission {
                required: required.as_str(),
            });
        }

        Ok(team)
    }

    /// Grant-mutation path. Creates a grant, or updates the existing grant's
    /// permission in place, and keeps the dataset's denormalized username
    /// list in sync (added once, never duplicated).
    pub async fn share_dataset(
        &self,
        dataset_id: i32,
        target_user_id: i32,
        level: PermissionLevel,
    ) -> AccessResult<shared_grants::Model> {
        let dataset = Datasets::find_by_id(dataset_id)
            .one(&self.db)
            .await?
            .ok_or(AccessError::DatasetNotFound(dataset_id))?;

        if dataset.user_id == target_user_id {
            return Err(AccessError::AlreadyOwner);
        }

        let target = Users::find_by_id(target_user_id)
            .one(&self.db)
            .await?
            .ok_or(AccessError::UserNotFound(target_user_id))?;

        let existing = SharedGrants::find()
            .filter(shared_grants::Column::DatasetId.eq(dataset_id))
            .filter(shared_grants::Column::UserId.eq(target_user_id))
            .one(&self.db)
            .await?;

        let grant = match existing {
            Some(grant) => {
                let mut active: shared_grants::ActiveModel = grant.into();
                active.permission = Set(level.as_str().to_string());
                active.updated_at = Set(Utc::now());
                active.update(&self.db).await?
            }
            None => {
                let now = Utc::now();
                let active = shared_grants::ActiveModel {
                    dataset_id: Set(dataset_id),
                    user_id: Set(target_user_id),
                    permission: Set(level.as_str().to_string()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                active.insert(&self.db).await?
            }
        };

        let mut usernames = dataset.shared_username_list();
        if !usernames.contains(&target.username) {
            usernames.push(target.username.clone());
            let mut active: datasets::ActiveModel = dataset.into();
            active
                .set_shared_usernames(&usernames)
                .map_err(|e| sea_orm::DbErr::Custom(e.to_string()))?;
            active.updated_at = Set(Utc::now());
            active.update(&self.db).await?;
        }

        Ok(grant)
    }

    /// Revoke a grant. Rejects when no grant exists for the target user.
    pub async fn unshare_dataset(
        &self,
        dataset_id: i32,
        target_user_id: i32,
    ) -> AccessResult<()> {
        let dataset = Datasets::find_by_id(dataset_id)
            .one(&self.db)
            .await?
            .ok_or(AccessError::DatasetNotFound(dataset_id))?;

        let grant = SharedGrants::find()
            .filter(shared_grants::Column::DatasetId.eq(dataset_id))
            .filter(shared_grants::Column::UserId.eq(target_user_id))
            .one(&self.db)
            .await?
            .ok_or(AccessError::GrantNotFound(target_user_id))?;

        grant.delete(&self.db).await?;

        if let Some(target) = Users::find_by_id(target_user_id).one(&self.db).await? {
            let mut usernames = dataset.shared_username_list();
            if let Some(pos) = usernames.iter().position(|u| u == &target.username) {
                usernames.remove(pos);
                let mut active: datasets::ActiveModel = dataset.into();
                active
                    .set_shared_usernames(&usernames)
                    .map_err(|e| sea_orm::DbErr::Custom(e.to_string()))?;
                active.updated_at = Set(Utc::now());
                active.update(&self.db).await?;
            }
        }

        Ok(())
    }

    /// All grants on a dataset, with the granted user where it still exists.
    pub async fn dataset_grants(
        &self,
        dataset_id: i32,
    ) -> AccessResult<Vec<(shared_grants::Model, Option<users::Model>)>> {
        let grants = SharedGrants::find()
            .filter(shared_grants::Column::DatasetId.eq(dataset_id))
            .find_also_related(Users)
            .all(&self.db)
            .await?;

        Ok(grants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;

    async fn seed_user(db: &DatabaseConnection, name: &str) -> users::Model {
        users::ActiveModel::new(
            format!("{}@example.com", name),
            name.to_string(),
            name.to_string(),
        )
        .insert(db)
        .await
        .expect("insert user")
    }

    async fn seed_dataset(db: &DatabaseConnection, owner: &users::Model) -> datasets::Model {
        let now = Utc::now();
        datasets::ActiveModel {
            user_id: Set(owner.id),
            dataset_name: Set("sales".to_string()),
            dataset_url: Set("https://cdn/sales.csv".to_string()),
            insights: Set("{}".to_string()),
            shared_usernames: Set("[]".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("insert dataset")
    }

    #[test]
    fn test_permission_level_ordering() {
        assert!(PermissionLevel::View < PermissionLevel::Edit);
        assert!(PermissionLevel::Edit < PermissionLevel::Admin);
        assert_eq!(PermissionLevel::View.ordinal(), 1);
        assert_eq!(PermissionLevel::Edit.ordinal(), 2);
        assert_eq!(PermissionLevel::Admin.ordinal(), 3);
    }

    #[test]
    fn test_permission_level_from_string() {
        assert_eq!(
            PermissionLevel::from_str("view").expect("parse view"),
            PermissionLevel::View
        );
        assert_eq!(
            PermissionLevel::from_str("ADMIN").expect("parse ADMIN"),
            PermissionLevel::Admin
        );
        assert!(PermissionLevel::from_str("owner").is_err());
        assert!(PermissionLevel::from_str("").is_err());
    }

    #[tokio::test]
    async fn test_owner_resolves_to_admin() {
        let db = setup_test_db().await;
        let owner = seed_user(&db, "owner").await;
        let dataset = seed_dataset(&db, &owner).await;

        let service = AccessControlService::new(db);
        let level = service
            .resolve_dataset_level(owner.id, &dataset)
            .await
            .expect("owner always resolves");
        assert_eq!(level, PermissionLevel::Admin);
    }

    #[tokio::test]
    async fn test_unrelated_user_is_denied() {
        let db = setup_test_db().await;
        let owner = seed_user(&db, "owner").await;
        let stranger = seed_user(&db, "stranger").await;
        let dataset = seed_dataset(&db, &owner).await;

        let service = AccessControlService::new(db);
        let err = service
            .resolve_dataset_level(stranger.id, &dataset)
            .await
            .expect_err("no access source");
        assert!(matches!(err, AccessError::NotShared));
    }

    #[tokio::test]
    async fn test_share_is_an_upsert() {
        let db = setup_test_db().await;
        let owner = seed_user(&db, "owner").await;
        let reader = seed_user(&db, "reader").await;
        let dataset = seed_dataset(&db, &owner).await;

        let service = AccessControlService::new(db.clone());
        service
            .share_dataset(dataset.id, reader.id, PermissionLevel::View)
            .await
            .expect("first share");
        service
            .share_dataset(dataset.id, reader.id, PermissionLevel::Edit)
            .await
            .expect("re-share upgrades");

        let grants = SharedGrants::find()
            .filter(shared_grants::Column::DatasetId.eq(dataset.id))
            .all(&db)
            .await
            .expect("list grants");
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].permission, "edit");

        // Username denormalization present exactly once
        let dataset = Datasets::find_by_id(dataset.id)
            .one(&db)
            .await
            .expect("query")
            .expect("dataset exists");
        assert_eq!(dataset.shared_username_list(), vec!["reader".to_string()]);
    }

    #[tokio::test]
    async fn test_share_with_owner_is_rejected() {
        let db = setup_test_db().await;
        let owner = seed_user(&db, "owner").await;
        let dataset = seed_dataset(&db, &owner).await;

        let service = AccessControlService::new(db);
        let err = service
            .share_dataset(dataset.id, owner.id, PermissionLevel::View)
            .await
            .expect_err("owner cannot be granted");
        assert!(matches!(err, AccessError::AlreadyOwner));
    }

    #[tokio::test]
    async fn test_unshare_without_grant_is_rejected() {
        let db = setup_test_db().await;
        let owner = seed_user(&db, "owner").await;
        let reader = seed_user(&db, "reader").await;
        let dataset = seed_dataset(&db, &owner).await;

        let service = AccessControlService::new(db);
        let err = service
            .unshare_dataset(dataset.id, reader.id)
            .await
            .expect_err("nothing to revoke");
        assert!(matches!(err, AccessError::GrantNotFound(_)));
    }

    #[tokio::test]
    async fn test_unshare_removes_grant_and_username() {
        let db = setup_test_db().await;
        let owner = seed_user(&db, "owner").await;
        let reader = seed_user(&db, "reader").await;
        let dataset = seed_dataset(&db, &owner).await;

        let service = AccessControlService::new(db.clone());
        service
            .share_dataset(dataset.id, reader.id, PermissionLevel::View)
            .await
            .expect("share");
        service
            .unshare_dataset(dataset.id, reader.id)
            .await
            .expect("unshare");

        let grants = SharedGrants::find()
            .filter(shared_grants::Column::DatasetId.eq(dataset.id))
            .all(&db)
            .await
            .expect("list grants");
        assert!(grants.is_empty());

        let dataset = Datasets::find_by_id(dataset.id)
            .one(&db)
            .await
            .expect("query")
            .expect("dataset exists");
        assert!(dataset.shared_username_list().is_empty());
    }

    #[tokio::test]
    async fn test_direct_grant_and_team_level_combine_by_maximum() {
        let db = setup_test_db().await;
        let owner = seed_user(&db, "owner").await;
        let member = seed_user(&db, "member").await;
        let dataset = seed_dataset(&db, &owner).await;

        let service = AccessControlService::new(db.clone());
        service
            .share_dataset(dataset.id, member.id, PermissionLevel::Edit)
            .await
            .expect("direct grant");

        // Team with member_permission=view, containing the dataset and the member
        let now = Utc::now();
        let team = teams::ActiveModel {
            name: Set("analytics".to_string()),
            owner_id: Set(owner.id),
            member_permission: Set("view".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("insert team");
        team_members::ActiveModel {
            team_id: Set(team.id),
            user_id: Set(member.id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("insert membership");
        team_datasets::ActiveModel {
            team_id: Set(team.id),
            dataset_id: Set(dataset.id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("assign dataset");

        // Direct edit beats team view
        let level = service
            .resolve_dataset_level(member.id, &dataset)
            .await
            .expect("resolves");
        assert_eq!(level, PermissionLevel::Edit);

        // Downgrade the grant to view, raise the team to admin: team wins now
        service
            .share_dataset(dataset.id, member.id, PermissionLevel::View)
            .await
            .expect("downgrade grant");
        let mut active: teams::ActiveModel = team.into();
        active.member_permission = Set("admin".to_string());
        active.update(&db).await.expect("update team");

        let level = service
            .resolve_dataset_level(member.id, &dataset)
            .await
            .expect("resolves");
        assert_eq!(level, PermissionLevel::Admin);
    }

    #[tokio::test]
    async fn test_team_owner_outranks_member_permission() {
        let db = setup_test_db().await;
        let owner = seed_user(&db, "owner").await;
        let member = seed_user(&db, "member").await;

        let now = Utc::now();
        let team = teams::ActiveModel {
            name: Set("ops".to_string()),
            owner_id: Set(owner.id),
            member_permission: Set("view".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("insert team");
        team_members::ActiveModel {
            team_id: Set(team.id),
            user_id: Set(member.id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("insert membership");

        let service = AccessControlService::new(db);
        assert_eq!(
            service
                .resolve_team_level(owner.id, &team)
                .await
                .expect("owner"),
            PermissionLevel::Admin
        );
        assert_eq!(
            service
                .resolve_team_level(member.id, &team)
                .await
                .expect("member"),
            PermissionLevel::View
        );
    }
}
