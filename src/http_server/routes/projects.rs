use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use super::{missing_id, see_other};
use crate::http_server::{auth::CurrentUser, error::Report, state::AppState};
use crate::services::error::StudioError;
use crate::services::project::{ProjectForm, ProjectService};

const LIST: &str = "/Projects";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(LIST, get(index))
        .route("/Projects/ProjectsOfStatus", get(all_statuses))
        .route("/Projects/ProjectsOfStatus/{id}", get(of_status))
        .route("/Projects/Search", get(search))
        .route("/Projects/Details", get(missing_id))
        .route("/Projects/Details/{id}", get(details))
        .route("/Projects/Create", get(create_form).post(create))
        .route("/Projects/Edit", get(missing_id).post(missing_id))
        .route("/Projects/Edit/{id}", get(edit_form).post(edit))
        .route("/Projects/Delete", get(missing_id).post(missing_id))
        .route("/Projects/Delete/{id}", get(delete_form).post(delete))
}

fn service(state: &AppState) -> ProjectService {
    ProjectService::new(state.db.clone())
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    #[serde(default)]
    search: String,
}

async fn index(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, Report> {
    Ok(Json(service(&state).list(&user.id).await?))
}

async fn all_statuses(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, Report> {
    Ok(Json(service(&state).list_by_status(&user.id, None).await?))
}

async fn of_status(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Report> {
    Ok(Json(
        service(&state).list_by_status(&user.id, Some(id)).await?,
    ))
}

async fn search(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, Report> {
    Ok(Json(service(&state).search(&user.id, &params.search).await?))
}

async fn details(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Report> {
    Ok(Json(service(&state).details(&user.id, id).await?))
}

async fn create_form(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, Report> {
    Ok(Json(service(&state).create_form(&user.id).await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(form): Json<ProjectForm>,
) -> Result<Response, Report> {
    let service = service(&state);
    match service.create(&user.id, form.clone()).await {
        Ok(_) => Ok(see_other(LIST)),
        Err(StudioError::Validation(errors)) => {
            let view = service.form_view(&user.id, form, errors).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(view)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

async fn edit_form(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Report> {
    Ok(Json(service(&state).edit_form(&user.id, id).await?))
}

async fn edit(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(form): Json<ProjectForm>,
) -> Result<Response, Report> {
    let service = service(&state);
    match service.edit(&user.id, id, form.clone()).await {
        Ok(_) => Ok(see_other(LIST)),
        Err(StudioError::Validation(errors)) => {
            let view = service.form_view(&user.id, form, errors).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(view)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

async fn delete_form(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Report> {
    Ok(Json(service(&state).delete_preview(&user.id, id).await?))
}

async fn delete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response, Report> {
    service(&state).delete(&user.id, id).await?;
    Ok(see_other(LIST))
}
