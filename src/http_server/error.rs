use axum::{
    Json,
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};
use serde_json::json;

use crate::services::error::StudioError;

// A generic error report
// Produced via `Err(some_err).wrap_err("Some context")`
// or `Err(color_eyre::eyre::Report::new(SomeError))`
pub struct Report(color_eyre::Report);

impl std::fmt::Debug for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<E> From<E> for Report
where
    E: Into<color_eyre::Report>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

fn status_of(err: &StudioError) -> StatusCode {
    match err {
        StudioError::BadRequest(_) => StatusCode::BAD_REQUEST,
        StudioError::Unauthorized => StatusCode::UNAUTHORIZED,
        StudioError::NotFound { .. } => StatusCode::NOT_FOUND,
        StudioError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StudioError::ReferentialIntegrity { .. } => StatusCode::CONFLICT,
        StudioError::ConcurrencyConflict { .. } | StudioError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// Tell axum how to convert `Report` into a response.
impl IntoResponse for Report {
    fn into_response(self) -> Response<Body> {
        let err = self.0;

        let Some(studio_err) = err.downcast_ref::<StudioError>() else {
            tracing::error!("{err:?}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Something went wrong" })),
            )
                .into_response();
        };

        let status = status_of(studio_err);
        if status.is_server_error() {
            tracing::error!("{err:?}");
            return (
                status,
                Json(json!({ "error": "Something went wrong" })),
            )
                .into_response();
        }

        tracing::debug!(%status, "{studio_err}");
        let body = match studio_err {
            StudioError::Validation(errors) => json!({ "error": "Validation failed", "errors": errors }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
