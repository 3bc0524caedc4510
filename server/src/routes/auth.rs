//! Account handlers

use crate::app::AppState;
use crate::auth::{AuthSession, AuthUser};
use crate::database::UserInfo;
use crate::error::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserInfo,
    pub message: &'static str,
}

impl SessionResponse {
    fn new(session: AuthSession, message: &'static str) -> Self {
        Self {
            token: session.token,
            user: session.user,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub user: UserInfo,
}

pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>> {
    let Json(req) = payload?;
    let session = state
        .auth
        .register(&req.username, &req.email, &req.password)
        .await?;
    Ok(Json(SessionResponse::new(session, "User registered successfully")))
}

pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>> {
    let Json(req) = payload?;
    let session = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(SessionResponse::new(session, "Login successful")))
}

pub async fn verify(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<VerifyResponse>> {
    let user = state.auth.current_user(&user_id).await?;
    Ok(Json(VerifyResponse { user }))
}
