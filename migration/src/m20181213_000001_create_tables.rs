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
                    .table(User::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(User::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(User::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(User::CompanyName).string().not_null())
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create lookup tables
        manager
            .create_table(
                Table::create()
                    .table(ProjectType::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectType::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProjectType::Label).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StatusType::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StatusType::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StatusType::Label).string().not_null())
                    .to_owned(),
            )
            .await?;

        // Create artists table
        manager
            .create_table(
                Table::create()
                    .table(Artist::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Artist::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Artist::Name).string().not_null())
                    .col(ColumnDef::new(Artist::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Artist::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Artist::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_artists_user_id")
                            .from(Artist::Table, Artist::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Create clients table
        manager
            .create_table(
                Table::create()
                    .table(Client::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Client::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Client::Name).string().not_null())
                    .col(ColumnDef::new(Client::Phone).string().not_null())
                    .col(ColumnDef::new(Client::Email).string().not_null())
                    .col(ColumnDef::new(Client::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Client::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Client::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_clients_user_id")
                            .from(Client::Table, Client::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Create players table
        manager
            .create_table(
                Table::create()
                    .table(Player::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Player::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Player::FirstName).string().not_null())
                    .col(ColumnDef::new(Player::LastName).string().not_null())
                    .col(ColumnDef::new(Player::Instrument).string().not_null())
                    .col(ColumnDef::new(Player::Phone).string().not_null())
                    .col(ColumnDef::new(Player::Email).string().not_null())
                    .col(ColumnDef::new(Player::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Player::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Player::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_players_user_id")
                            .from(Player::Table, Player::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Create projects table
        manager
            .create_table(
                Table::create()
                    .table(Project::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Project::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Project::Title).string_len(55).not_null())
                    .col(
                        ColumnDef::new(Project::Description)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Project::PayRate).double().not_null())
                    .col(ColumnDef::new(Project::DurationDays).integer().not_null())
                    .col(ColumnDef::new(Project::StartDate).date().not_null())
                    .col(ColumnDef::new(Project::ProjectTypeId).integer().not_null())
                    .col(ColumnDef::new(Project::StatusTypeId).integer().not_null())
                    .col(ColumnDef::new(Project::ClientId).integer().not_null())
                    .col(ColumnDef::new(Project::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Project::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Project::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_project_type_id")
                            .from(Project::Table, Project::ProjectTypeId)
                            .to(ProjectType::Table, ProjectType::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_status_type_id")
                            .from(Project::Table, Project::StatusTypeId)
                            .to(StatusType::Table, StatusType::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_client_id")
                            .from(Project::Table, Project::ClientId)
                            .to(Client::Table, Client::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_user_id")
                            .from(Project::Table, Project::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Junction tables restrict deletes of either endpoint; rows are removed
        // explicitly before an artist, client, player or project goes away.
        // Create client_artists junction table
        manager
            .create_table(
                Table::create()
                    .table(ClientArtist::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClientArtist::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClientArtist::ClientId).integer().not_null())
                    .col(ColumnDef::new(ClientArtist::ArtistId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_client_artists_client_id")
                            .from(ClientArtist::Table, ClientArtist::ClientId)
                            .to(Client::Table, Client::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_client_artists_artist_id")
                            .from(ClientArtist::Table, ClientArtist::ArtistId)
                            .to(Artist::Table, Artist::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Create artist_projects junction table
        manager
            .create_table(
                Table::create()
                    .table(ArtistProject::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ArtistProject::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ArtistProject::ArtistId).integer().not_null())
                    .col(
                        ColumnDef::new(ArtistProject::ProjectId)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_artist_projects_artist_id")
                            .from(ArtistProject::Table, ArtistProject::ArtistId)
                            .to(Artist::Table, Artist::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_artist_projects_project_id")
                            .from(ArtistProject::Table, ArtistProject::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Create player_projects junction table
        manager
            .create_table(
                Table::create()
                    .table(PlayerProject::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlayerProject::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PlayerProject::PlayerId).integer().not_null())
                    .col(
                        ColumnDef::new(PlayerProject::ProjectId)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_player_projects_player_id")
                            .from(PlayerProject::Table, PlayerProject::PlayerId)
                            .to(Player::Table, Player::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_player_projects_project_id")
                            .from(PlayerProject::Table, PlayerProject::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Create indexes
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_artists_user_id")
                    .table(Artist::Table)
                    .col(Artist::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_clients_user_id")
                    .table(Client::Table)
                    .col(Client::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_players_user_id")
                    .table(Player::Table)
                    .col(Player::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_projects_user_id")
                    .table(Project::Table)
                    .col(Project::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_projects_client_id")
                    .table(Project::Table)
                    .col(Project::ClientId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_projects_status_type_id")
                    .table(Project::Table)
                    .col(Project::StatusTypeId)
                    .to_owned(),
            )
            .await?;

        // Join pairs are unique; the leading column also serves owner-side lookups
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_client_artists_pair")
                    .table(ClientArtist::Table)
                    .col(ClientArtist::ClientId)
                    .col(ClientArtist::ArtistId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_client_artists_artist_id")
                    .table(ClientArtist::Table)
                    .col(ClientArtist::ArtistId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_artist_projects_pair")
                    .table(ArtistProject::Table)
                    .col(ArtistProject::ProjectId)
                    .col(ArtistProject::ArtistId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_artist_projects_artist_id")
                    .table(ArtistProject::Table)
                    .col(ArtistProject::ArtistId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_player_projects_pair")
                    .table(PlayerProject::Table)
                    .col(PlayerProject::ProjectId)
                    .col(PlayerProject::PlayerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_player_projects_player_id")
                    .table(PlayerProject::Table)
                    .col(PlayerProject::PlayerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order
        manager
            .drop_table(Table::drop().table(PlayerProject::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ArtistProject::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ClientArtist::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Project::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Player::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Client::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Artist::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StatusType::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectType::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Email,
    CompanyName,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ProjectType {
    #[sea_orm(iden = "project_types")]
    Table,
    Id,
    Label,
}

#[derive(DeriveIden)]
enum StatusType {
    #[sea_orm(iden = "status_types")]
    Table,
    Id,
    Label,
}

#[derive(DeriveIden)]
enum Artist {
    #[sea_orm(iden = "artists")]
    Table,
    Id,
    Name,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Client {
    #[sea_orm(iden = "clients")]
    Table,
    Id,
    Name,
    Phone,
    Email,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Player {
    #[sea_orm(iden = "players")]
    Table,
    Id,
    FirstName,
    LastName,
    Instrument,
    Phone,
    Email,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Project {
    #[sea_orm(iden = "projects")]
    Table,
    Id,
    Title,
    Description,
    PayRate,
    DurationDays,
    StartDate,
    ProjectTypeId,
    StatusTypeId,
    ClientId,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ClientArtist {
    #[sea_orm(iden = "client_artists")]
    Table,
    Id,
    ClientId,
    ArtistId,
}

#[derive(DeriveIden)]
enum ArtistProject {
    #[sea_orm(iden = "artist_projects")]
    Table,
    Id,
    ArtistId,
    ProjectId,
}

#[derive(DeriveIden)]
enum PlayerProject {
    #[sea_orm(iden = "player_projects")]
    Table,
    Id,
    PlayerId,
    ProjectId,
}
