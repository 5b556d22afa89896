use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Username).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::DisplayName).string().not_null())
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Users::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        // Create user_sessions table
        manager
            .create_table(
                Table::create()
                    .table(UserSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserSessions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserSessions::SessionId).string().not_null().unique_key())
                    .col(ColumnDef::new(UserSessions::UserId).integer().not_null())
                    .col(ColumnDef::new(UserSessions::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(UserSessions::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(UserSessions::ExpiresAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_sessions_user_id")
                            .from(UserSessions::Table, UserSessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create datasets table
        manager
            .create_table(
                Table::create()
                    .table(Datasets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Datasets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Datasets::UserId).integer().not_null())
                    .col(ColumnDef::new(Datasets::DatasetName).string().not_null())
                    .col(ColumnDef::new(Datasets::DatasetUrl).string().not_null())
                    .col(ColumnDef::new(Datasets::CleanedUrl).string().null())
                    .col(ColumnDef::new(Datasets::DomainType).string().null())
                    .col(ColumnDef::new(Datasets::Insights).text().not_null().default("{}"))
                    .col(ColumnDef::new(Datasets::SharedUsernames).text().not_null().default("[]"))
                    .col(ColumnDef::new(Datasets::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Datasets::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_datasets_user_id")
                            .from(Datasets::Table, Datasets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create shared_grants table
        manager
            .create_table(
                Table::create()
                    .table(SharedGrants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SharedGrants::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SharedGrants::DatasetId).integer().not_null())
                    .col(ColumnDef::new(SharedGrants::UserId).integer().not_null())
                    .col(ColumnDef::new(SharedGrants::Permission).string().not_null())
                    .col(ColumnDef::new(SharedGrants::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(SharedGrants::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shared_grants_dataset_id")
                            .from(SharedGrants::Table, SharedGrants::DatasetId)
                            .to(Datasets::Table, Datasets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shared_grants_user_id")
                            .from(SharedGrants::Table, SharedGrants::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx_shared_grants_dataset_user")
                            .col(SharedGrants::DatasetId)
                            .col(SharedGrants::UserId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create teams table
        manager
            .create_table(
                Table::create()
                    .table(Teams::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Teams::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Teams::Name).string().not_null())
                    .col(ColumnDef::new(Teams::OwnerId).integer().not_null())
                    .col(ColumnDef::new(Teams::MemberPermission).string().not_null().default("view"))
                    .col(ColumnDef::new(Teams::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Teams::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teams_owner_id")
                            .from(Teams::Table, Teams::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create team_members table
        manager
            .create_table(
                Table::create()
                    .table(TeamMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeamMembers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TeamMembers::TeamId).integer().not_null())
                    .col(ColumnDef::new(TeamMembers::UserId).integer().not_null())
                    .col(ColumnDef::new(TeamMembers::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_members_team_id")
                            .from(TeamMembers::Table, TeamMembers::TeamId)
                            .to(Teams::Table, Teams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_members_user_id")
                            .from(TeamMembers::Table, TeamMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx_team_members_team_user")
                            .col(TeamMembers::TeamId)
                            .col(TeamMembers::UserId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create team_datasets table
        manager
            .create_table(
                Table::create()
                    .table(TeamDatasets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeamDatasets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TeamDatasets::TeamId).integer().not_null())
                    .col(ColumnDef::new(TeamDatasets::DatasetId).integer().not_null())
                    .col(ColumnDef::new(TeamDatasets::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_datasets_team_id")
                            .from(TeamDatasets::Table, TeamDatasets::TeamId)
                            .to(Teams::Table, Teams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_datasets_dataset_id")
                            .from(TeamDatasets::Table, TeamDatasets::DatasetId)
                            .to(Datasets::Table, Datasets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx_team_datasets_team_dataset")
                            .col(TeamDatasets::TeamId)
                            .col(TeamDatasets::DatasetId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create wizard_sessions table
        manager
            .create_table(
                Table::create()
                    .table(WizardSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WizardSessions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WizardSessions::WorkflowId).string().not_null().unique_key())
                    .col(ColumnDef::new(WizardSessions::UserId).integer().not_null())
                    .col(ColumnDef::new(WizardSessions::DomainType).string().null())
                    .col(ColumnDef::new(WizardSessions::SourceUrl).string().null())
                    .col(ColumnDef::new(WizardSessions::AnalysisOption).string().null())
                    .col(ColumnDef::new(WizardSessions::DownloadAfter).boolean().not_null().default(false))
                    .col(ColumnDef::new(WizardSessions::Grants).text().null())
                    .col(ColumnDef::new(WizardSessions::Stage).string().not_null())
                    .col(ColumnDef::new(WizardSessions::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(WizardSessions::UpdatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(WizardSessions::ExpiresAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wizard_sessions_user_id")
                            .from(WizardSessions::Table, WizardSessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WizardSessions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(TeamDatasets::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(TeamMembers::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Teams::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(SharedGrants::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Datasets::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserSessions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Username,
    DisplayName,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UserSessions {
    Table,
    Id,
    SessionId,
    UserId,
    IsActive,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum Datasets {
    Table,
    Id,
    UserId,
    DatasetName,
    DatasetUrl,
    CleanedUrl,
    DomainType,
    Insights,
    SharedUsernames,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SharedGrants {
    Table,
    Id,
    DatasetId,
    UserId,
    Permission,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Teams {
    Table,
    Id,
    Name,
    OwnerId,
    MemberPermission,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TeamMembers {
    Table,
    Id,
    TeamId,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TeamDatasets {
    Table,
    Id,
    TeamId,
    DatasetId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum WizardSessions {
    Table,
    Id,
    WorkflowId,
    UserId,
    DomainType,
    SourceUrl,
    AnalysisOption,
    DownloadAfter,
    Grants,
    Stage,
    CreatedAt,
    UpdatedAt,
    ExpiresAt,
}
