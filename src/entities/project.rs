use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue::Set};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub pay_rate: f64,
    /// Expected length of the engagement in days
    pub duration_days: i32,
    pub start_date: Date,
    pub project_type_id: i64,
    pub status_type_id: i64,
    pub client_id: i64,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Restrict"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id",
        on_delete = "Restrict"
    )]
    Client,
    #[sea_orm(
        belongs_to = "super::project_type::Entity",
        from = "Column::ProjectTypeId",
        to = "super::project_type::Column::Id",
        on_delete = "Restrict"
    )]
    ProjectType,
    #[sea_orm(
        belongs_to = "super::status_type::Entity",
        from = "Column::StatusTypeId",
        to = "super::status_type::Column::Id",
        on_delete = "Restrict"
    )]
    StatusType,
    #[sea_orm(has_many = "super::player_project::Entity")]
    PlayerProject,
    #[sea_orm(has_many = "super::artist_project::Entity")]
    ArtistProject,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::project_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectType.def()
    }
}

impl Related<super::status_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusType.def()
    }
}

impl Related<super::player_project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlayerProject.def()
    }
}

impl Related<super::artist_project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ArtistProject.def()
    }
}

impl Related<super::player::Entity> for Entity {
    fn to() -> RelationDef {
        super::player_project::Relation::Player.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::player_project::Relation::Project.def().rev())
    }
}

impl Related<super::artist::Entity> for Entity {
    fn to() -> RelationDef {
        super::artist_project::Relation::Artist.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::artist_project::Relation::Project.def().rev())
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: Set(now),
            updated_at: Set(now),
            ..ActiveModelTrait::default()
        }
    }

    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, sea_orm::DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();

        if insert {
            self.created_at = Set(now);
        }

        self.updated_at = Set(now);

        Ok(self)
    }
}
