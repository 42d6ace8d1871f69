use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use super::{missing_id, see_other};
use crate::http_server::{auth::CurrentUser, error::Report, state::AppState};
use crate::services::error::StudioError;
use crate::services::player::{PlayerForm, PlayerService};

const LIST: &str = "/Players";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(LIST, get(index))
        .route("/Players/Details", get(missing_id))
        .route("/Players/Details/{id}", get(details))
        .route("/Players/Create", get(create_form).post(create))
        .route("/Players/Edit", get(missing_id).post(missing_id))
        .route("/Players/Edit/{id}", get(edit_form).post(edit))
        .route("/Players/Delete", get(missing_id).post(missing_id))
        .route("/Players/Delete/{id}", get(delete_form).post(delete))
}

fn service(state: &AppState) -> PlayerService {
    PlayerService::new(state.db.clone())
}

async fn index(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, Report> {
    Ok(Json(service(&state).list(&user.id).await?))
}

async fn details(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Report> {
    Ok(Json(service(&state).details(&user.id, id).await?))
}

// Players have no choice lists, but the caller still has to be known.
async fn create_form(State(state): State<Arc<AppState>>, _user: CurrentUser) -> impl IntoResponse {
    Json(service(&state).create_form())
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(form): Json<PlayerForm>,
) -> Result<Response, Report> {
    let service = service(&state);
    match service.create(&user.id, form.clone()).await {
        Ok(_) => Ok(see_other(LIST)),
        Err(StudioError::Validation(errors)) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(service.form_view(form, errors)),
        )
            .into_response()),
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
    Json(form): Json<PlayerForm>,
) -> Result<Response, Report> {
    let service = service(&state);
    match service.edit(&user.id, id, form.clone()).await {
        Ok(_) => Ok(see_other(LIST)),
        Err(StudioError::Validation(errors)) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(service.form_view(form, errors)),
        )
            .into_response()),
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
