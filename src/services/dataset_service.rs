use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::database::entities::{
    datasets, shared_grants, team_datasets, datasets::Entity as Datasets,
    shared_grants::Entity as SharedGrants, team_datasets::Entity as TeamDatasets,
};
use crate::errors::{DatasetError, DatasetResult};

/// One page of a dataset listing.
#[derive(Debug)]
pub struct DatasetPage {
    pub datasets: Vec<datasets::Model>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

/// Dataset record operations. Access checks happen before these calls, at
/// the handler boundary, so every method here receives either a plain user
/// scope or an already-authorized dataset.
#[derive(Clone)]
pub struct DatasetService {
    db: DatabaseConnection,
}

impl DatasetService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Datasets owned by the user, newest first. `page` is 1-based.
    pub async fn list_owned(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> DatasetResult<DatasetPage> {
        let per_page = per_page.max(1);
        let page = page.max(1);

        let paginator = Datasets::find()
            .filter(datasets::Column::UserId.eq(user_id))
            .order_by_desc(datasets::Column::UpdatedAt)
            .paginate(&self.db, per_page);

        let totals = paginator.num_items_and_pages().await?;
        let datasets = paginator.fetch_page(page - 1).await?;

        Ok(DatasetPage {
            datasets,
            page,
            per_page,
            total_items: totals.number_of_items,
            total_pages: totals.number_of_pages,
        })
    }

    /// Datasets shared with the user through direct grants.
    pub async fn list_shared(&self, user_id: i32) -> DatasetResult<Vec<datasets::Model>> {
        let grants = SharedGrants::find()
            .filter(shared_grants::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;
        let dataset_ids: Vec<i32> = grants.iter().map(|g| g.dataset_id).collect();

        let datasets = Datasets::find()
            .filter(datasets::Column::Id.is_in(dataset_ids))
            .order_by_desc(datasets::Column::UpdatedAt)
            .all(&self.db)
            .await?;

        Ok(datasets)
    }

    /// Rename an already-authorized dataset.
    pub async fn rename(
        &self,
        dataset: datasets::Model,
        name: &str,
    ) -> DatasetResult<datasets::Model> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DatasetError::NameRequired);
        }

        let mut active: datasets::ActiveModel = dataset.into();
        active.dataset_name = Set(name.to_string());
        active.updated_at = Set(Utc::now());

        Ok(active.update(&self.db).await?)
    }

    /// Delete an already-authorized dataset together with its grants and
    /// team assignments.
    pub async fn delete(&self, dataset: datasets::Model) -> DatasetResult<()> {
        SharedGrants::delete_many()
            .filter(shared_grants::Column::DatasetId.eq(dataset.id))
            .exec(&self.db)
            .await?;
        TeamDatasets::delete_many()
            .filter(team_datasets::Column::DatasetId.eq(dataset.id))
            .exec(&self.db)
            .await?;
        dataset.delete(&self.db).await?;

        Ok(())
    }
}
