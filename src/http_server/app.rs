use std::sync::Arc;

use axum::Router;
use color_eyre::eyre::{Context, eyre};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{
    database::Database,
    http_server::{routes, state::AppState},
};

pub struct HttpServerConfig {
    pub port: u16,
    pub database: Database,
}

/// The full application router with tracing and CORS applied.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    #[cfg(debug_assertions)]
    let cors_layer = CorsLayer::permissive();

    #[cfg(not(debug_assertions))]
    let cors_layer = CorsLayer::new();

    routes::router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state)
}

pub async fn start(config: HttpServerConfig) -> color_eyre::Result<()> {
    let HttpServerConfig { port, database } = config;

    let app_state = Arc::new(AppState {
        db: Arc::new(database),
    });
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .wrap_err_with(|| eyre!("Failed to bind to port {}", port))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Failed to start HTTP server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use migration::ADMIN_USER_ID;
    use serde_json::{Value, json};
    use tower::util::ServiceExt;

    use super::*;
    use crate::http_server::auth::USER_HEADER;
    use crate::test_utils::{OTHER_USER_ID, test_db};

    async fn app() -> Router {
        build_router(Arc::new(AppState { db: test_db().await }))
    }

    fn get(uri: &str, user: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_HEADER, user);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post(uri: &str, user: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(USER_HEADER, user)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn hey_jude(id: Option<i64>, players: Value) -> Value {
        json!({
            "id": id,
            "title": "Hey Jude",
            "description": "Single with full band",
            "pay_rate": 2500.0,
            "duration_days": 5,
            "start_date": "2018-12-28",
            "project_type_id": 1,
            "status_type_id": 1,
            "client_id": 1,
            "selected_players": players,
        })
    }

    #[tokio::test]
    async fn test_requires_known_user() {
        let app = app().await;

        let response = app.clone().oneshot(get("/Artists", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(get("/Artists", Some("nobody")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_id_requires_user_then_is_bad_request() {
        let app = app().await;

        for uri in ["/Artists/Details", "/Clients/Edit", "/Players/Delete", "/Projects/Details"] {
            let response = app.clone().oneshot(get(uri, None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");

            let response = app
                .clone()
                .oneshot(get(uri, Some(ADMIN_USER_ID)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_list_is_scoped() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(get("/Clients", Some(ADMIN_USER_ID)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 3);

        let response = app
            .clone()
            .oneshot(get("/Clients", Some(OTHER_USER_ID)))
            .await
            .unwrap();
        assert_eq!(json_body(response).await, json!([]));

        let response = app
            .oneshot(get("/Clients/Details/1", Some(OTHER_USER_ID)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_redirects_and_invalid_input_returns_form() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(post("/Artists/Create", ADMIN_USER_ID, json!({ "name": "Wilco" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/Artists");

        let response = app
            .oneshot(post(
                "/Artists/Create",
                ADMIN_USER_ID,
                json!({ "name": "", "selected_clients": [2] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["errors"]["name"][0], "The Name field is required.");
        assert_eq!(body["form"]["selected_clients"], json!([2]));
        assert_eq!(body["clients"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_hey_jude_over_http() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(post("/Projects/Create", ADMIN_USER_ID, hey_jude(None, json!([]))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app
            .clone()
            .oneshot(get("/Projects/Search?search=Jude", Some(ADMIN_USER_ID)))
            .await
            .unwrap();
        let found = json_body(response).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["client"]["name"], "Mark Hale");
        let id = found[0]["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(post(
                &format!("/Projects/Edit/{id}"),
                ADMIN_USER_ID,
                hey_jude(Some(id), json!([1, 2])),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app
            .clone()
            .oneshot(get(&format!("/Projects/Details/{id}"), Some(ADMIN_USER_ID)))
            .await
            .unwrap();
        let details = json_body(response).await;
        assert_eq!(details["players"].as_array().unwrap().len(), 2);

        let response = app
            .clone()
            .oneshot(post(
                &format!("/Projects/Edit/{id}"),
                ADMIN_USER_ID,
                hey_jude(Some(id + 1), json!([2])),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(get("/Projects/Search?search=Jude", Some(OTHER_USER_ID)))
            .await
            .unwrap();
        assert_eq!(json_body(response).await, json!([]));

        let response = app
            .clone()
            .oneshot(get("/Projects/ProjectsOfStatus/1", Some(ADMIN_USER_ID)))
            .await
            .unwrap();
        let view = json_body(response).await;
        assert_eq!(view["projects"].as_array().unwrap().len(), 1);
        assert_eq!(view["tabs"][0]["count"], 1);
    }

    #[tokio::test]
    async fn test_deleting_client_with_projects_conflicts() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(post("/Projects/Create", ADMIN_USER_ID, hey_jude(None, json!([1]))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app
            .clone()
            .oneshot(post("/Clients/Delete/1", ADMIN_USER_ID, json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .clone()
            .oneshot(post("/Players/Delete/1", ADMIN_USER_ID, json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app
            .oneshot(post("/Players/Delete/1", ADMIN_USER_ID, json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
