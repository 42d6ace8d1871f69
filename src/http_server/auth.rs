use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::EntityTrait;

use crate::entities::user;
use crate::http_server::{error::Report, state::AppState};
use crate::services::error::StudioError;

/// Header carrying the caller's user id, set by the identity proxy in front
/// of the service.
pub const USER_HEADER: &str = "x-studio-user";

/// The studio owner making the request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = Report;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(StudioError::Unauthorized)?;

        let user = user::Entity::find_by_id(id.to_string())
            .one(&state.db.conn)
            .await
            .map_err(StudioError::from)?
            .ok_or(StudioError::Unauthorized)?;

        tracing::debug!(user_id = %user.id, company = %user.company_name, "Resolved caller");
        Ok(CurrentUser { id: user.id })
    }
}
