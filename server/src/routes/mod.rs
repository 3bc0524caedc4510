//! HTTP routes
//!
//! Builds the axum router: auth endpoints, owner-scoped document endpoints,
//! a status route and a JSON fallback for unknown paths.

mod auth;
mod documents;

use crate::app::AppState;
use crate::config::{EDIT_BODY_LIMIT, UPLOAD_BODY_LIMIT};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

const ROUTES: &[&str] = &[
    "POST /api/auth/register",
    "POST /api/auth/login",
    "GET /api/auth/verify",
    "POST /api/documents/upload",
    "GET /api/documents",
    "GET /api/documents/{id}",
    "PUT /api/documents/{id}",
    "PUT /api/documents/{id}/highlights",
    "PATCH /api/documents/{id}/title",
    "PATCH /api/documents/{id}/content",
    "DELETE /api/documents/{id}",
];

/// Build the application router
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/api/test", get(status))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/verify", get(auth::verify))
        .route("/api/documents", get(documents::list))
        .route(
            "/api/documents/upload",
            post(documents::upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/documents/{id}",
            get(documents::get)
                .put(documents::replace)
                .delete(documents::remove)
                .layer(DefaultBodyLimit::max(EDIT_BODY_LIMIT)),
        )
        .route(
            "/api/documents/{id}/highlights",
            put(documents::update_highlights).layer(DefaultBodyLimit::max(EDIT_BODY_LIMIT)),
        )
        .route("/api/documents/{id}/title", patch(documents::update_title))
        .route(
            "/api/documents/{id}/content",
            patch(documents::update_content).layer(DefaultBodyLimit::max(EDIT_BODY_LIMIT)),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Liveness check listing the available routes
async fn status() -> impl IntoResponse {
    Json(json!({
        "message": "Highlighter API is running",
        "timestamp": Utc::now(),
        "routes": ROUTES,
    }))
}

async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    tracing::debug!("No route for {} {}", method, uri.path());

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Route not found",
            "path": uri.path(),
            "method": method.as_str(),
        })),
    )
}
