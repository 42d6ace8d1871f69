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
use crate::services::associations::{self, ClientArtists};
use crate::services::error::{FieldErrors, StudioError, StudioResult};
use crate::services::scope::{self, SelectOption};
use crate::services::validation;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientForm {
    pub id: Option<i64>,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub selected_artists: Option<Vec<i64>>,
}

struct ValidClient {
    name: String,
    phone: String,
    email: String,
    selected_artists: Option<Vec<i64>>,
}

#[derive(Debug, Serialize)]
pub struct ClientFormView {
    pub form: ClientForm,
    pub artists: Vec<SelectOption>,
    pub errors: FieldErrors,
}

#[derive(Debug, Serialize)]
pub struct ClientDetails {
    #[serde(flatten)]
    pub client: client::Model,
    pub artists: Vec<artist::Model>,
    pub projects: Vec<project::Model>,
}

pub struct ClientService {
    db: Arc<Database>,
}

impl ClientService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn list(&self, user_id: &str) -> StudioResult<Vec<client::Model>> {
        Ok(scope::list_owned::<client::Entity>(&self.db.conn, user_id).await?)
    }

    pub async fn details(&self, user_id: &str, id: i64) -> StudioResult<ClientDetails> {
        let client = scope::get_owned::<client::Entity>(&self.db.conn, user_id, id).await?;

        let artists = client
            .find_related(artist::Entity)
            .filter(artist::Column::UserId.eq(user_id))
            .order_by_asc(artist::Column::Id)
            .all(&self.db.conn)
            .await?;
        let projects = client
            .find_related(project::Entity)
            .filter(project::Column::UserId.eq(user_id))
            .order_by_asc(project::Column::Id)
            .all(&self.db.conn)
            .await?;

        Ok(ClientDetails {
            client,
            artists,
            projects,
        })
    }

    pub async fn create_form(&self, user_id: &str) -> StudioResult<ClientFormView> {
        self.form_view(user_id, ClientForm::default(), FieldErrors::new())
            .await
    }

    pub async fn form_view(
        &self,
        user_id: &str,
        form: ClientForm,
        errors: FieldErrors,
    ) -> StudioResult<ClientFormView> {
        let artists = scope::options::<artist::Entity>(&self.db.conn, user_id).await?;
        Ok(ClientFormView {
            form,
            artists,
            errors,
        })
    }

    #[instrument(skip(self, form))]
    pub async fn create(&self, user_id: &str, form: ClientForm) -> StudioResult<client::Model> {
        let txn = self.db.conn.begin().await?;
        let valid = validate(&txn, user_id, form).await?;

        let client = client::ActiveModel {
            name: Set(valid.name),
            phone: Set(valid.phone),
            email: Set(valid.email),
            user_id: Set(user_id.to_string()),
            ..client::ActiveModel::new()
        }
        .insert(&txn)
        .await?;

        associations::reconcile::<ClientArtists>(
            &txn,
            user_id,
            client.id,
            valid.selected_artists.as_deref(),
        )
        .await?;

        txn.commit().await?;

        tracing::info!(client_id = client.id, "Created client");
        Ok(client)
    }

    pub async fn edit_form(&self, user_id: &str, id: i64) -> StudioResult<ClientFormView> {
        let client = scope::get_owned::<client::Entity>(&self.db.conn, user_id, id).await?;
        let selected = associations::selected_ids::<ClientArtists>(&self.db.conn, id).await?;

        let form = ClientForm {
            id: Some(client.id),
            name: client.name,
            phone: client.phone,
            email: client.email,
            selected_artists: Some(selected),
        };
        self.form_view(user_id, form, FieldErrors::new()).await
    }

    #[instrument(skip(self, form))]
    pub async fn edit(
        &self,
        user_id: &str,
        id: i64,
        form: ClientForm,
    ) -> StudioResult<client::Model> {
        if form.id != Some(id) {
            return Err(StudioError::not_found("Client", id));
        }

        let txn = self.db.conn.begin().await?;
        let valid = validate(&txn, user_id, form).await?;

        associations::reconcile::<ClientArtists>(
            &txn,
            user_id,
            id,
            valid.selected_artists.as_deref(),
        )
        .await?;

        let result = client::Entity::update_many()
            .col_expr(client::Column::Name, Expr::value(valid.name))
            .col_expr(client::Column::Phone, Expr::value(valid.phone))
            .col_expr(client::Column::Email, Expr::value(valid.email))
            .col_expr(client::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(client::Column::Id.eq(id))
            .filter(client::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(scope::resolve_missed_update::<client::Entity>(&txn, user_id, id).await);
        }

        let client = scope::get_owned::<client::Entity>(&txn, user_id, id).await?;
        txn.commit().await?;

        tracing::info!(client_id = id, "Updated client");
        Ok(client)
    }

    pub async fn delete_preview(&self, user_id: &str, id: i64) -> StudioResult<client::Model> {
        scope::get_owned::<client::Entity>(&self.db.conn, user_id, id).await
    }

    /// Projects are not removed with their client; a client that still has
    /// projects is refused with `ReferentialIntegrity`.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: &str, id: i64) -> StudioResult<()> {
        let txn = self.db.conn.begin().await?;
        scope::get_owned::<client::Entity>(&txn, user_id, id).await?;

        let artists = associations::clear::<ClientArtists>(&txn, id).await?;

        let result = client::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|err| StudioError::from_delete("Client", id, err))?;
        if result.rows_affected == 0 {
            return Err(StudioError::not_found("Client", id));
        }

        txn.commit().await?;

        tracing::info!(client_id = id, artist_links = artists, "Deleted client");
        Ok(())
    }
}

async fn validate(
    db: &impl ConnectionTrait,
    user_id: &str,
    form: ClientForm,
) -> StudioResult<ValidClient> {
    let mut errors = FieldErrors::new();

    let name = validation::required(&mut errors, "name", "Name", &form.name);
    let phone = validation::required(&mut errors, "phone", "Phone", &form.phone);
    let email = validation::required(&mut errors, "email", "Email", &form.email);
    validation::owned_selection::<artist::Entity>(
        db,
        &mut errors,
        user_id,
        "selected_artists",
        form.selected_artists.as_deref(),
    )
    .await?;

    errors.finish(ValidClient {
        name,
        phone,
        email,
        selected_artists: form.selected_artists,
    })
}

#[cfg(test)]
mod tests {
    use migration::ADMIN_USER_ID;

    use super::*;
    use crate::services::associations::ArtistClients;
    use crate::test_utils::{OTHER_USER_ID, seed_project, test_db};

    fn form(name: &str, artists: Option<Vec<i64>>) -> ClientForm {
        ClientForm {
            id: None,
            name: name.to_string(),
            phone: "615-444-4444".to_string(),
            email: "booking@example.com".to_string(),
            selected_artists: artists,
        }
    }

    #[tokio::test]
    async fn test_create_links_artists() {
        let db = test_db().await;
        let service = ClientService::new(db.clone());

        let client = service
            .create(ADMIN_USER_ID, form("Rick Rubin", Some(vec![3, 1, 3])))
            .await
            .unwrap();

        let details = service.details(ADMIN_USER_ID, client.id).await.unwrap();
        let artist_ids: Vec<i64> = details.artists.iter().map(|a| a.id).collect();
        assert_eq!(artist_ids, vec![1, 3]);
        assert_eq!(
            associations::selected_ids::<ArtistClients>(&db.conn, 3)
                .await
                .unwrap(),
            vec![client.id]
        );
    }

    #[tokio::test]
    async fn test_create_requires_contact_fields() {
        let db = test_db().await;
        let service = ClientService::new(db.clone());

        let mut input = form("Rick Rubin", None);
        input.phone = String::new();
        input.email = " ".to_string();

        let err = service.create(ADMIN_USER_ID, input).await.unwrap_err();
        let StudioError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(
            errors.get("phone"),
            Some(&["The Phone field is required.".to_string()][..])
        );
        assert_eq!(
            errors.get("email"),
            Some(&["The Email field is required.".to_string()][..])
        );
        assert!(errors.get("name").is_none());
        assert_eq!(service.list(ADMIN_USER_ID).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_edit_clears_links_with_empty_selection() {
        let db = test_db().await;
        let service = ClientService::new(db.clone());

        let mut edit = form("Mark Hale", Some(vec![]));
        edit.id = Some(1);
        let client = service.edit(ADMIN_USER_ID, 1, edit).await.unwrap();
        assert_eq!(client.phone, "615-444-4444");

        let view = service.edit_form(ADMIN_USER_ID, 1).await.unwrap();
        assert_eq!(view.form.selected_artists, Some(vec![]));
        assert_eq!(view.artists.len(), 4);
    }

    #[tokio::test]
    async fn test_edit_missing_client_is_not_found() {
        let db = test_db().await;
        let service = ClientService::new(db.clone());

        let mut edit = form("Ghost", None);
        edit.id = Some(77);
        let err = service.edit(ADMIN_USER_ID, 77, edit).await.unwrap_err();
        assert!(matches!(err, StudioError::NotFound { id: 77, .. }));
    }

    #[tokio::test]
    async fn test_delete_client_with_projects_is_refused() {
        let db = test_db().await;
        let service = ClientService::new(db.clone());
        seed_project(&db, "Hey Jude").await;

        let err = service.delete(ADMIN_USER_ID, 1).await.unwrap_err();
        assert!(matches!(
            err,
            StudioError::ReferentialIntegrity {
                entity: "Client",
                id: 1,
                ..
            }
        ));

        // The failed delete rolled back, links included.
        assert!(service.details(ADMIN_USER_ID, 1).await.is_ok());
        assert_eq!(
            associations::selected_ids::<ClientArtists>(&db.conn, 1)
                .await
                .unwrap(),
            vec![1]
        );
    }

    #[tokio::test]
    async fn test_delete_client_without_projects() {
        let db = test_db().await;
        let service = ClientService::new(db.clone());

        service.delete(ADMIN_USER_ID, 3).await.unwrap();
        assert!(
            associations::selected_ids::<ArtistClients>(&db.conn, 2)
                .await
                .unwrap()
                .is_empty()
        );

        let err = service.delete(OTHER_USER_ID, 2).await.unwrap_err();
        assert!(matches!(err, StudioError::NotFound { id: 2, .. }));
    }
}
