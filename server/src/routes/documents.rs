//! Document handlers
//!
//! Every handler takes an [`AuthUser`], so requests without a valid token
//! are rejected before any document is touched.

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::config::MAX_UPLOAD_BYTES;
use crate::database::{Document, DocumentChanges, Highlight, WritingMode};
use crate::error::{AppError, Result};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Multipart field carrying the uploaded file
const UPLOAD_FIELD: &str = "file";

type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHighlightsRequest {
    pub highlights: Vec<Highlight>,
    #[serde(default)]
    pub writing_mode: Option<WritingMode>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTitleRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateContentRequest {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
    pub id: String,
}

pub async fn upload(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Document>> {
    let mut multipart =
        multipart.map_err(|e| AppError::Validation(format!("Expected a multipart upload: {}", e)))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;

        let document = state
            .documents
            .upload(&user_id, &filename, content_type.as_deref(), &data)
            .await?;
        return Ok(Json(document));
    }

    Err(AppError::Validation("No file uploaded".to_string()))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge {
            limit: MAX_UPLOAD_BYTES,
        }
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", err.body_text()))
    }
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Document>>> {
    Ok(Json(state.documents.list(&user_id).await?))
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Document>> {
    Ok(Json(state.documents.get(&user_id, &id).await?))
}

pub async fn replace(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: JsonBody<DocumentChanges>,
) -> Result<Json<Document>> {
    let Json(changes) = payload?;
    Ok(Json(state.documents.replace(&user_id, &id, changes).await?))
}

pub async fn update_highlights(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: JsonBody<UpdateHighlightsRequest>,
) -> Result<Json<Document>> {
    let Json(req) = payload?;
    let document = state
        .documents
        .update_highlights(&user_id, &id, req.highlights, req.writing_mode)
        .await?;
    Ok(Json(document))
}

pub async fn update_title(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: JsonBody<UpdateTitleRequest>,
) -> Result<Json<Document>> {
    let Json(req) = payload?;
    let document = state
        .documents
        .update_title(&user_id, &id, req.title.as_deref())
        .await?;
    Ok(Json(document))
}

pub async fn update_content(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: JsonBody<UpdateContentRequest>,
) -> Result<Json<Document>> {
    let Json(req) = payload?;
    let document = state
        .documents
        .update_content(&user_id, &id, req.content)
        .await?;
    Ok(Json(document))
}

pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let id = state.documents.remove(&user_id, &id).await?;
    Ok(Json(DeleteResponse {
        message: "Document deleted successfully",
        id,
    }))
}
