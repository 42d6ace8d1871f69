use std::sync::Arc;

use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::database::Database;
use crate::entities::{player, project};
use crate::services::associations::{self, PlayerProjects};
use crate::services::error::{FieldErrors, StudioError, StudioResult};
use crate::services::scope;
use crate::services::validation;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayerForm {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub instrument: String,
    pub phone: String,
    pub email: String,
}

struct ValidPlayer {
    first_name: String,
    last_name: String,
    instrument: String,
    phone: String,
    email: String,
}

/// Players have no choice lists, so the view is just the form and its errors.
#[derive(Debug, Serialize)]
pub struct PlayerFormView {
    pub form: PlayerForm,
    pub errors: FieldErrors,
}

#[derive(Debug, Serialize)]
pub struct PlayerDetails {
    #[serde(flatten)]
    pub player: player::Model,
    pub full_name: String,
    pub projects: Vec<project::Model>,
}

pub struct PlayerService {
    db: Arc<Database>,
}

impl PlayerService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn list(&self, user_id: &str) -> StudioResult<Vec<player::Model>> {
        Ok(scope::list_owned::<player::Entity>(&self.db.conn, user_id).await?)
    }

    pub async fn details(&self, user_id: &str, id: i64) -> StudioResult<PlayerDetails> {
        let player = scope::get_owned::<player::Entity>(&self.db.conn, user_id, id).await?;

        let projects = player
            .find_related(project::Entity)
            .filter(project::Column::UserId.eq(user_id))
            .order_by_asc(project::Column::Id)
            .all(&self.db.conn)
            .await?;

        Ok(PlayerDetails {
            full_name: player.full_name(),
            player,
            projects,
        })
    }

    pub fn create_form(&self) -> PlayerFormView {
        self.form_view(PlayerForm::default(), FieldErrors::new())
    }

    pub fn form_view(&self, form: PlayerForm, errors: FieldErrors) -> PlayerFormView {
        PlayerFormView { form, errors }
    }

    #[instrument(skip(self, form))]
    pub async fn create(&self, user_id: &str, form: PlayerForm) -> StudioResult<player::Model> {
        let valid = validate(form)?;

        let player = player::ActiveModel {
            first_name: Set(valid.first_name),
            last_name: Set(valid.last_name),
            instrument: Set(valid.instrument),
            phone: Set(valid.phone),
            email: Set(valid.email),
            user_id: Set(user_id.to_string()),
            ..player::ActiveModel::new()
        }
        .insert(&self.db.conn)
        .await?;

        tracing::info!(player_id = player.id, "Created player");
        Ok(player)
    }

    pub async fn edit_form(&self, user_id: &str, id: i64) -> StudioResult<PlayerFormView> {
        let player = scope::get_owned::<player::Entity>(&self.db.conn, user_id, id).await?;

        let form = PlayerForm {
            id: Some(player.id),
            first_name: player.first_name,
            last_name: player.last_name,
            instrument: player.instrument,
            phone: player.phone,
            email: player.email,
        };
        Ok(self.form_view(form, FieldErrors::new()))
    }

    #[instrument(skip(self, form))]
    pub async fn edit(
        &self,
        user_id: &str,
        id: i64,
        form: PlayerForm,
    ) -> StudioResult<player::Model> {
        if form.id != Some(id) {
            return Err(StudioError::not_found("Player", id));
        }
        let valid = validate(form)?;

        let txn = self.db.conn.begin().await?;
        let result = player::Entity::update_many()
            .col_expr(player::Column::FirstName, Expr::value(valid.first_name))
            .col_expr(player::Column::LastName, Expr::value(valid.last_name))
            .col_expr(player::Column::Instrument, Expr::value(valid.instrument))
            .col_expr(player::Column::Phone, Expr::value(valid.phone))
            .col_expr(player::Column::Email, Expr::value(valid.email))
            .col_expr(player::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(player::Column::Id.eq(id))
            .filter(player::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(scope::resolve_missed_update::<player::Entity>(&txn, user_id, id).await);
        }

        let player = scope::get_owned::<player::Entity>(&txn, user_id, id).await?;
        txn.commit().await?;

        tracing::info!(player_id = id, "Updated player");
        Ok(player)
    }

    pub async fn delete_preview(&self, user_id: &str, id: i64) -> StudioResult<player::Model> {
        scope::get_owned::<player::Entity>(&self.db.conn, user_id, id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: &str, id: i64) -> StudioResult<()> {
        let txn = self.db.conn.begin().await?;
        scope::get_owned::<player::Entity>(&txn, user_id, id).await?;

        let projects = associations::clear::<PlayerProjects>(&txn, id).await?;

        let result = player::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|err| StudioError::from_delete("Player", id, err))?;
        if result.rows_affected == 0 {
            return Err(StudioError::not_found("Player", id));
        }

        txn.commit().await?;

        tracing::info!(player_id = id, project_links = projects, "Deleted player");
        Ok(())
    }
}

fn validate(form: PlayerForm) -> StudioResult<ValidPlayer> {
    let mut errors = FieldErrors::new();

    let valid = ValidPlayer {
        first_name: validation::required(&mut errors, "first_name", "First Name", &form.first_name),
        last_name: validation::required(&mut errors, "last_name", "Last Name", &form.last_name),
        instrument: validation::required(&mut errors, "instrument", "Instrument", &form.instrument),
        phone: validation::required(&mut errors, "phone", "Phone", &form.phone),
        email: validation::required(&mut errors, "email", "Email", &form.email),
    };

    errors.finish(valid)
}

#[cfg(test)]
mod tests {
    use migration::ADMIN_USER_ID;

    use super::*;
    use crate::services::associations::ProjectPlayers;
    use crate::test_utils::{OTHER_USER_ID, seed_project, test_db};

    fn form(first: &str, last: &str) -> PlayerForm {
        PlayerForm {
            id: None,
            first_name: first.to_string(),
            last_name: last.to_string(),
            instrument: "Bass".to_string(),
            phone: "999-999-9999".to_string(),
            email: "player@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_details() {
        let db = test_db().await;
        let service = PlayerService::new(db.clone());

        let player = service
            .create(ADMIN_USER_ID, form("Carol", "Kaye"))
            .await
            .unwrap();
        let details = service.details(ADMIN_USER_ID, player.id).await.unwrap();
        assert_eq!(details.full_name, "Carol Kaye");
        assert_eq!(details.player.user_id, ADMIN_USER_ID);
        assert!(details.projects.is_empty());

        let err = service.details(OTHER_USER_ID, player.id).await.unwrap_err();
        assert!(matches!(err, StudioError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_reports_every_missing_field() {
        let db = test_db().await;
        let service = PlayerService::new(db.clone());

        let err = service
            .create(ADMIN_USER_ID, PlayerForm::default())
            .await
            .unwrap_err();
        let StudioError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(
            errors.get("first_name"),
            Some(&["The First Name field is required.".to_string()][..])
        );
        assert_eq!(
            errors.get("last_name"),
            Some(&["The Last Name field is required.".to_string()][..])
        );
        assert!(errors.get("instrument").is_some());
        assert!(errors.get("phone").is_some());
        assert!(errors.get("email").is_some());
    }

    #[tokio::test]
    async fn test_edit_player() {
        let db = test_db().await;
        let service = PlayerService::new(db.clone());

        let view = service.edit_form(ADMIN_USER_ID, 3).await.unwrap();
        let mut edit = view.form;
        edit.first_name = "Jimi".to_string();

        let player = service.edit(ADMIN_USER_ID, 3, edit.clone()).await.unwrap();
        assert_eq!(player.full_name(), "Jimi Hendrix");
        assert_eq!(player.instrument, "Guitar");

        let err = service.edit(OTHER_USER_ID, 3, edit).await.unwrap_err();
        assert!(matches!(err, StudioError::NotFound { id: 3, .. }));
    }

    #[tokio::test]
    async fn test_delete_player_unlinks_projects() {
        let db = test_db().await;
        let service = PlayerService::new(db.clone());
        let project = seed_project(&db, "Hey Jude").await;
        associations::reconcile::<ProjectPlayers>(
            &db.conn,
            ADMIN_USER_ID,
            project.id,
            Some(&[1, 2]),
        )
        .await
        .unwrap();

        service.delete(ADMIN_USER_ID, 2).await.unwrap();

        assert_eq!(
            associations::selected_ids::<ProjectPlayers>(&db.conn, project.id)
                .await
                .unwrap(),
            vec![1]
        );
        let err = service.delete(ADMIN_USER_ID, 2).await.unwrap_err();
        assert!(matches!(err, StudioError::NotFound { id: 2, .. }));
    }
}
