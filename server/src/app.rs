//! Application state and initialization
//!
//! All services are initialized here and made available to handlers through
//! AppState.

use crate::auth::{AuthService, TokenKeys};
use crate::config::ServerConfig;
use crate::database::Repository;
use crate::error::{AppError, Result};
use crate::services::DocumentService;
use sqlx::SqlitePool;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub documents: DocumentService,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &ServerConfig) -> Result<Self> {
        tracing::info!("Initializing application state");

        let keys = TokenKeys::from_secret(
            config.jwt_secret.as_bytes(),
            chrono::Duration::hours(config.token_ttl_hours),
        )
        .map_err(|e| AppError::Generic(format!("Failed to build token keys: {}", e)))?;

        let repo = Repository::new(pool);

        Ok(Self {
            auth: AuthService::new(repo.clone(), keys),
            documents: DocumentService::new(repo),
        })
    }
}
