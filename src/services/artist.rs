use std::sync::Arc;

use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::database::Database;
use crate::entities::{artist, client, project};
use crate::services::associations::{self, ArtistClients, ArtistProjects};
use crate::services::error::{FieldErrors, StudioError, StudioResult};
use crate::services::scope::{self, SelectOption};
use crate::services::validation;

/// What the artist form posts.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArtistForm {
    pub id: Option<i64>,
    pub name: String,
    pub selected_clients: Option<Vec<i64>>,
}

struct ValidArtist {
    name: String,
    selected_clients: Option<Vec<i64>>,
}

/// Everything needed to (re)draw the artist form.
#[derive(Debug, Serialize)]
pub struct ArtistFormView {
    pub form: ArtistForm,
    pub clients: Vec<SelectOption>,
    pub errors: FieldErrors,
}

#[derive(Debug, Serialize)]
pub struct ArtistDetails {
    #[serde(flatten)]
    pub artist: artist::Model,
    pub clients: Vec<client::Model>,
    pub projects: Vec<project::Model>,
}

pub struct ArtistService {
    db: Arc<Database>,
}

impl ArtistService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn list(&self, user_id: &str) -> StudioResult<Vec<artist::Model>> {
        Ok(scope::list_owned::<artist::Entity>(&self.db.conn, user_id).await?)
    }

    pub async fn details(&self, user_id: &str, id: i64) -> StudioResult<ArtistDetails> {
        let artist = scope::get_owned::<artist::Entity>(&self.db.conn, user_id, id).await?;

        let clients = artist
            .find_related(client::Entity)
            .filter(client::Column::UserId.eq(user_id))
            .order_by_asc(client::Column::Id)
            .all(&self.db.conn)
            .await?;
        let projects = artist
            .find_related(project::Entity)
            .filter(project::Column::UserId.eq(user_id))
            .order_by_asc(project::Column::Id)
            .all(&self.db.conn)
            .await?;

        Ok(ArtistDetails {
            artist,
            clients,
            projects,
        })
    }

    pub async fn create_form(&self, user_id: &str) -> StudioResult<ArtistFormView> {
        self.form_view(user_id, ArtistForm::default(), FieldErrors::new())
            .await
    }

    /// Rebuilds the form around `form`, keeping whatever the user typed.
    pub async fn form_view(
        &self,
        user_id: &str,
        form: ArtistForm,
        errors: FieldErrors,
    ) -> StudioResult<ArtistFormView> {
        let clients = scope::options::<client::Entity>(&self.db.conn, user_id).await?;
        Ok(ArtistFormView {
            form,
            clients,
            errors,
        })
    }

    #[instrument(skip(self, form))]
    pub async fn create(&self, user_id: &str, form: ArtistForm) -> StudioResult<artist::Model> {
        let txn = self.db.conn.begin().await?;
        let valid = validate(&txn, user_id, form).await?;

        let artist = artist::ActiveModel {
            name: Set(valid.name),
            user_id: Set(user_id.to_string()),
            ..artist::ActiveModel::new()
        }
        .insert(&txn)
        .await?;

        associations::reconcile::<ArtistClients>(
            &txn,
            user_id,
            artist.id,
            valid.selected_clients.as_deref(),
        )
        .await?;

        txn.commit().await?;

        tracing::info!(artist_id = artist.id, "Created artist");
        Ok(artist)
    }

    pub async fn edit_form(&self, user_id: &str, id: i64) -> StudioResult<ArtistFormView> {
        let artist = scope::get_owned::<artist::Entity>(&self.db.conn, user_id, id).await?;
        let selected = associations::selected_ids::<ArtistClients>(&self.db.conn, id).await?;

        let form = ArtistForm {
            id: Some(artist.id),
            name: artist.name,
            selected_clients: Some(selected),
        };
        self.form_view(user_id, form, FieldErrors::new()).await
    }

    #[instrument(skip(self, form))]
    pub async fn edit(
        &self,
        user_id: &str,
        id: i64,
        form: ArtistForm,
    ) -> StudioResult<artist::Model> {
        if form.id != Some(id) {
            return Err(StudioError::not_found("Artist", id));
        }

        let txn = self.db.conn.begin().await?;
        let valid = validate(&txn, user_id, form).await?;

        associations::reconcile::<ArtistClients>(
            &txn,
            user_id,
            id,
            valid.selected_clients.as_deref(),
        )
        .await?;

        let result = artist::Entity::update_many()
            .col_expr(artist::Column::Name, Expr::value(valid.name))
            .col_expr(artist::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(artist::Column::Id.eq(id))
            .filter(artist::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(scope::resolve_missed_update::<artist::Entity>(&txn, user_id, id).await);
        }

        let artist = scope::get_owned::<artist::Entity>(&txn, user_id, id).await?;
        txn.commit().await?;

        tracing::info!(artist_id = id, "Updated artist");
        Ok(artist)
    }

    pub async fn delete_preview(&self, user_id: &str, id: i64) -> StudioResult<artist::Model> {
        scope::get_owned::<artist::Entity>(&self.db.conn, user_id, id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: &str, id: i64) -> StudioResult<()> {
        let txn = self.db.conn.begin().await?;
        scope::get_owned::<artist::Entity>(&txn, user_id, id).await?;

        let clients = associations::clear::<ArtistClients>(&txn, id).await?;
        let projects = associations::clear::<ArtistProjects>(&txn, id).await?;

        let result = artist::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|err| StudioError::from_delete("Artist", id, err))?;
        if result.rows_affected == 0 {
            return Err(StudioError::not_found("Artist", id));
        }

        txn.commit().await?;

        tracing::info!(
            artist_id = id,
            client_links = clients,
            project_links = projects,
            "Deleted artist"
        );
        Ok(())
    }
}

async fn validate(
    db: &impl ConnectionTrait,
    user_id: &str,
    form: ArtistForm,
) -> StudioResult<ValidArtist> {
    let mut errors = FieldErrors::new();

    let name = validation::required(&mut errors, "name", "Name", &form.name);
    validation::owned_selection::<client::Entity>(
        db,
        &mut errors,
        user_id,
        "selected_clients",
        form.selected_clients.as_deref(),
    )
    .await?;

    errors.finish(ValidArtist {
        name,
        selected_clients: form.selected_clients,
    })
}
