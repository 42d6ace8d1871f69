use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Select, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::database::Database;
use crate::entities::{artist, client, player, project, project_type, status_type};
use crate::services::associations::{self, ProjectArtists, ProjectPlayers};
use crate::services::error::{FieldErrors, StudioError, StudioResult};
use crate::services::scope::{self, SelectOption};
use crate::services::validation;

const TITLE_MAX: usize = 55;
const DESCRIPTION_MAX: usize = 255;

/// What the project form posts. Choice fields use `0` for "not chosen".
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectForm {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub pay_rate: f64,
    pub duration_days: i32,
    pub start_date: Option<NaiveDate>,
    pub project_type_id: i64,
    pub status_type_id: i64,
    pub client_id: i64,
    pub selected_players: Option<Vec<i64>>,
    pub selected_artists: Option<Vec<i64>>,
}

struct ValidProject {
    title: String,
    description: String,
    pay_rate: f64,
    duration_days: i32,
    start_date: NaiveDate,
    project_type_id: i64,
    status_type_id: i64,
    client_id: i64,
    selected_players: Option<Vec<i64>>,
    selected_artists: Option<Vec<i64>>,
}

#[derive(Debug, Serialize)]
pub struct ProjectFormView {
    pub form: ProjectForm,
    pub project_types: Vec<SelectOption>,
    pub status_types: Vec<SelectOption>,
    pub clients: Vec<SelectOption>,
    pub players: Vec<SelectOption>,
    pub artists: Vec<SelectOption>,
    pub errors: FieldErrors,
}

/// A project row with its single-valued relations resolved for display.
#[derive(Debug, Serialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: project::Model,
    pub client: Option<client::Model>,
    pub project_type: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetails {
    #[serde(flatten)]
    pub summary: ProjectSummary,
    pub players: Vec<player::Model>,
    pub artists: Vec<artist::Model>,
}

/// One status filter tab. `status_type_id` is `None` for the "All" tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusTab {
    pub status_type_id: Option<i64>,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ProjectsOfStatus {
    pub status_type_id: Option<i64>,
    pub tabs: Vec<StatusTab>,
    pub projects: Vec<ProjectSummary>,
}

pub struct ProjectService {
    db: Arc<Database>,
}

impl ProjectService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn list(&self, user_id: &str) -> StudioResult<Vec<ProjectSummary>> {
        summaries(&self.db.conn, scope::owned_by::<project::Entity>(user_id)).await
    }

    /// The caller's projects, optionally narrowed to one status, plus the
    /// per-status counts used to draw the filter tabs.
    #[instrument(skip(self))]
    pub async fn list_by_status(
        &self,
        user_id: &str,
        status_type_id: Option<i64>,
    ) -> StudioResult<ProjectsOfStatus> {
        let all = self.list(user_id).await?;
        let statuses = status_type::Entity::find()
            .order_by_asc(status_type::Column::Id)
            .all(&self.db.conn)
            .await?;

        let mut tabs = vec![StatusTab {
            status_type_id: None,
            label: "All".to_string(),
            count: all.len(),
        }];
        tabs.extend(statuses.into_iter().map(|status| StatusTab {
            status_type_id: Some(status.id),
            count: all
                .iter()
                .filter(|p| p.project.status_type_id == status.id)
                .count(),
            label: status.label,
        }));

        let projects = match status_type_id {
            Some(status) => all
                .into_iter()
                .filter(|p| p.project.status_type_id == status)
                .collect(),
            None => all,
        };

        Ok(ProjectsOfStatus {
            status_type_id,
            tabs,
            projects,
        })
    }

    /// Title substring search over the caller's projects. A blank term
    /// matches everything.
    #[instrument(skip(self))]
    pub async fn search(&self, user_id: &str, term: &str) -> StudioResult<Vec<ProjectSummary>> {
        let term = term.trim();
        let mut query = scope::owned_by::<project::Entity>(user_id);
        if !term.is_empty() {
            query = query.filter(project::Column::Title.like(
                LikeExpr::new(format!("%{}%", escape_like(term))).escape('\\'),
            ));
        }
        summaries(&self.db.conn, query).await
    }

    pub async fn details(&self, user_id: &str, id: i64) -> StudioResult<ProjectDetails> {
        let summary = self.summary(user_id, id).await?;

        let players = summary
            .project
            .find_related(player::Entity)
            .filter(player::Column::UserId.eq(user_id))
            .order_by_asc(player::Column::Id)
            .all(&self.db.conn)
            .await?;
        let artists = summary
            .project
            .find_related(artist::Entity)
            .filter(artist::Column::UserId.eq(user_id))
            .order_by_asc(artist::Column::Id)
            .all(&self.db.conn)
            .await?;

        Ok(ProjectDetails {
            summary,
            players,
            artists,
        })
    }

    pub async fn create_form(&self, user_id: &str) -> StudioResult<ProjectFormView> {
        self.form_view(user_id, ProjectForm::default(), FieldErrors::new())
            .await
    }

    pub async fn form_view(
        &self,
        user_id: &str,
        form: ProjectForm,
        errors: FieldErrors,
    ) -> StudioResult<ProjectFormView> {
        let conn = &self.db.conn;

        let mut project_types = vec![SelectOption::placeholder("Choose a Project Type")];
        project_types.extend(
            project_type::Entity::find()
                .order_by_asc(project_type::Column::Id)
                .all(conn)
                .await?
                .into_iter()
                .map(|t| SelectOption {
                    id: t.id,
                    label: t.label,
                }),
        );

        let mut status_types = vec![SelectOption::placeholder("Choose a Status")];
        status_types.extend(
            status_type::Entity::find()
                .order_by_asc(status_type::Column::Id)
                .all(conn)
                .await?
                .into_iter()
                .map(|s| SelectOption {
                    id: s.id,
                    label: s.label,
                }),
        );

        let mut clients = vec![SelectOption::placeholder("Choose a Client")];
        clients.extend(scope::options::<client::Entity>(conn, user_id).await?);

        Ok(ProjectFormView {
            form,
            project_types,
            status_types,
            clients,
            players: scope::options::<player::Entity>(conn, user_id).await?,
            artists: scope::options::<artist::Entity>(conn, user_id).await?,
            errors,
        })
    }

    #[instrument(skip(self, form))]
    pub async fn create(&self, user_id: &str, form: ProjectForm) -> StudioResult<project::Model> {
        let txn = self.db.conn.begin().await?;
        let valid = validate(&txn, user_id, form).await?;

        let project = project::ActiveModel {
            title: Set(valid.title),
            description: Set(valid.description),
            pay_rate: Set(valid.pay_rate),
            duration_days: Set(valid.duration_days),
            start_date: Set(valid.start_date),
            project_type_id: Set(valid.project_type_id),
            status_type_id: Set(valid.status_type_id),
            client_id: Set(valid.client_id),
            user_id: Set(user_id.to_string()),
            ..project::ActiveModel::new()
        }
        .insert(&txn)
        .await?;

        associations::reconcile::<ProjectPlayers>(
            &txn,
            user_id,
            project.id,
            valid.selected_players.as_deref(),
        )
        .await?;
        associations::reconcile::<ProjectArtists>(
            &txn,
            user_id,
            project.id,
            valid.selected_artists.as_deref(),
        )
        .await?;

        txn.commit().await?;

        tracing::info!(project_id = project.id, "Created project");
        Ok(project)
    }

    pub async fn edit_form(&self, user_id: &str, id: i64) -> StudioResult<ProjectFormView> {
        let project = scope::get_owned::<project::Entity>(&self.db.conn, user_id, id).await?;
        let players = associations::selected_ids::<ProjectPlayers>(&self.db.conn, id).await?;
        let artists = associations::selected_ids::<ProjectArtists>(&self.db.conn, id).await?;

        let form = ProjectForm {
            id: Some(project.id),
            title: project.title,
            description: project.description,
            pay_rate: project.pay_rate,
            duration_days: project.duration_days,
            start_date: Some(project.start_date),
            project_type_id: project.project_type_id,
            status_type_id: project.status_type_id,
            client_id: project.client_id,
            selected_players: Some(players),
            selected_artists: Some(artists),
        };
        self.form_view(user_id, form, FieldErrors::new()).await
    }

    #[instrument(skip(self, form))]
    pub async fn edit(
        &self,
        user_id: &str,
        id: i64,
        form: ProjectForm,
    ) -> StudioResult<project::Model> {
        if form.id != Some(id) {
            return Err(StudioError::not_found("Project", id));
        }

        let txn = self.db.conn.begin().await?;
        let valid = validate(&txn, user_id, form).await?;

        let players = associations::reconcile::<ProjectPlayers>(
            &txn,
            user_id,
            id,
            valid.selected_players.as_deref(),
        )
        .await?;
        let artists = associations::reconcile::<ProjectArtists>(
            &txn,
            user_id,
            id,
            valid.selected_artists.as_deref(),
        )
        .await?;

        let result = project::Entity::update_many()
            .col_expr(project::Column::Title, Expr::value(valid.title))
            .col_expr(project::Column::Description, Expr::value(valid.description))
            .col_expr(project::Column::PayRate, Expr::value(valid.pay_rate))
            .col_expr(project::Column::DurationDays, Expr::value(valid.duration_days))
            .col_expr(project::Column::StartDate, Expr::value(valid.start_date))
            .col_expr(
                project::Column::ProjectTypeId,
                Expr::value(valid.project_type_id),
            )
            .col_expr(
                project::Column::StatusTypeId,
                Expr::value(valid.status_type_id),
            )
            .col_expr(project::Column::ClientId, Expr::value(valid.client_id))
            .col_expr(project::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(project::Column::Id.eq(id))
            .filter(project::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(scope::resolve_missed_update::<project::Entity>(&txn, user_id, id).await);
        }

        let project = scope::get_owned::<project::Entity>(&txn, user_id, id).await?;
        txn.commit().await?;

        tracing::info!(project_id = id, ?players, ?artists, "Updated project");
        Ok(project)
    }

    pub async fn delete_preview(&self, user_id: &str, id: i64) -> StudioResult<ProjectSummary> {
        self.summary(user_id, id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: &str, id: i64) -> StudioResult<()> {
        let txn = self.db.conn.begin().await?;
        scope::get_owned::<project::Entity>(&txn, user_id, id).await?;

        let players = associations::clear::<ProjectPlayers>(&txn, id).await?;
        let artists = associations::clear::<ProjectArtists>(&txn, id).await?;

        let result = project::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|err| StudioError::from_delete("Project", id, err))?;
        if result.rows_affected == 0 {
            return Err(StudioError::not_found("Project", id));
        }

        txn.commit().await?;

        tracing::info!(
            project_id = id,
            player_links = players,
            artist_links = artists,
            "Deleted project"
        );
        Ok(())
    }

    async fn summary(&self, user_id: &str, id: i64) -> StudioResult<ProjectSummary> {
        let query = scope::owned_by::<project::Entity>(user_id).filter(project::Column::Id.eq(id));
        summaries(&self.db.conn, query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StudioError::not_found("Project", id))
    }
}

/// Runs `query` and attaches client, project type and status to each row.
async fn summaries(
    db: &impl ConnectionTrait,
    query: Select<project::Entity>,
) -> StudioResult<Vec<ProjectSummary>> {
    let project_types: HashMap<i64, String> = project_type::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t.label))
        .collect();
    let statuses: HashMap<i64, String> = status_type::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.label))
        .collect();

    let rows = query
        .order_by_asc(project::Column::Id)
        .find_also_related(client::Entity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(project, client)| ProjectSummary {
            project_type: project_types.get(&project.project_type_id).cloned(),
            status: statuses.get(&project.status_type_id).cloned(),
            client,
            project,
        })
        .collect())
}

async fn validate(
    db: &impl ConnectionTrait,
    user_id: &str,
    form: ProjectForm,
) -> StudioResult<ValidProject> {
    let mut errors = FieldErrors::new();

    let title = validation::required(&mut errors, "title", "Title", &form.title);
    validation::max_chars(
        &mut errors,
        "title",
        &title,
        TITLE_MAX,
        "Please shorten the Project title to 55 characters",
    );

    let description =
        validation::required(&mut errors, "description", "Description", &form.description);
    validation::max_chars(
        &mut errors,
        "description",
        &description,
        DESCRIPTION_MAX,
        "The field Description must be a string with a maximum length of 255.",
    );

    validation::at_least(
        &mut errors,
        "pay_rate",
        form.pay_rate,
        1.0,
        "Please choose a Payrate",
    );
    validation::at_least(
        &mut errors,
        "duration_days",
        form.duration_days,
        1,
        "Please choose a length of time in days",
    );

    if form.start_date.is_none() {
        errors.add("start_date", "The Start Date field is required.");
    }

    validation::lookup::<project_type::Entity>(
        db,
        &mut errors,
        "project_type_id",
        form.project_type_id,
        "Please choose a Project Type",
    )
    .await?;
    validation::lookup::<status_type::Entity>(
        db,
        &mut errors,
        "status_type_id",
        form.status_type_id,
        "Please choose a Status",
    )
    .await?;
    validation::owned_choice::<client::Entity>(
        db,
        &mut errors,
        user_id,
        "client_id",
        form.client_id,
        "Please choose a Client",
    )
    .await?;

    validation::owned_selection::<player::Entity>(
        db,
        &mut errors,
        user_id,
        "selected_players",
        form.selected_players.as_deref(),
    )
    .await?;
    validation::owned_selection::<artist::Entity>(
        db,
        &mut errors,
        user_id,
        "selected_artists",
        form.selected_artists.as_deref(),
    )
    .await?;

    let Some(start_date) = form.start_date else {
        return Err(StudioError::Validation(errors));
    };

    errors.finish(ValidProject {
        title,
        description,
        pay_rate: form.pay_rate,
        duration_days: form.duration_days,
        start_date,
        project_type_id: form.project_type_id,
        status_type_id: form.status_type_id,
        client_id: form.client_id,
        selected_players: form.selected_players,
        selected_artists: form.selected_artists,
    })
}

/// Escapes `LIKE` metacharacters so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
