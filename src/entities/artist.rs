use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue::Set};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "artists")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
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
    #[sea_orm(has_many = "super::client_artist::Entity")]
    ClientArtist,
    #[sea_orm(has_many = "super::artist_project::Entity")]
    ArtistProject,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::client_artist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClientArtist.def()
    }
}

impl Related<super::artist_project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ArtistProject.def()
    }
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        super::client_artist::Relation::Client.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::client_artist::Relation::Artist.def().rev())
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        super::artist_project::Relation::Project.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::artist_project::Relation::Artist.def().rev())
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
