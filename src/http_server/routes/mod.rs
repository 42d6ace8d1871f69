use axum::{
    Router,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::http_server::{auth::CurrentUser, error::Report, state::AppState};
use crate::services::error::StudioError;

pub mod artists;
pub mod clients;
pub mod players;
pub mod projects;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(artists::router())
        .merge(clients::router())
        .merge(players::router())
        .merge(projects::router())
}

/// Target of every id-taking route when the id segment is left off.
pub async fn missing_id(_user: CurrentUser) -> Report {
    StudioError::BadRequest("An id is required".to_string()).into()
}

pub(crate) fn see_other(location: &'static str) -> Response {
    Redirect::to(location).into_response()
}
