//! Application configuration
//!
//! Constants for resource limits and validation boundaries, plus the
//! environment-driven server configuration.
//!
//! # Environment Variables
//!
//! - `JWT_SECRET`: secret used to sign and verify tokens (required)
//! - `DATABASE_PATH`: SQLite database file (default: `./data/highlighter.db`)
//! - `PORT`: port to listen on (default: `3001`)
//! - `TOKEN_TTL_HOURS`: token lifetime in hours (default: `168`)
//! - `CORS_ALLOWED_ORIGINS`: comma-separated browser origins allowed to call the API

use std::path::PathBuf;
use thiserror::Error;

// ===== Upload Limits =====

/// Maximum size of an uploaded document in bytes (5 MiB)
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Request body limit for the upload route.
/// Leaves room for multipart boundaries and part headers on top of the file
/// itself, so an oversized file is reported by the size check rather than
/// cut off mid-stream.
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

/// Request body limit for JSON edits that carry document content.
/// JSON escaping can double the size of text (quotes, backslashes,
/// newlines), and the body carries highlights and other fields besides.
pub const EDIT_BODY_LIMIT: usize = 2 * MAX_UPLOAD_BYTES + 64 * 1024;

/// Mime types accepted as text uploads
pub const TEXT_UPLOAD_MIME_TYPES: &[&str] = &["text/plain", "text/markdown"];

/// File extensions accepted as text uploads regardless of mime type
pub const TEXT_UPLOAD_EXTENSIONS: &[&str] = &[".md", ".txt"];

// ===== Document Limits =====

/// Maximum length of a title derived from an uploaded filename
pub const MAX_TITLE_LENGTH: usize = 255;

// ===== Authentication =====

/// Default token lifetime (one week)
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 7;

/// Error returned when loading configuration fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Secret for HS256 token signatures
    pub jwt_secret: String,
    /// SQLite database file
    pub database_path: PathBuf,
    pub listen_port: u16,
    pub token_ttl_hours: i64,
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 3001;
    pub const DEFAULT_DATABASE_PATH: &'static str = "./data/highlighter.db";
    pub const DEFAULT_ALLOWED_ORIGINS: &'static str =
        "http://localhost:3000,http://localhost:3001,http://127.0.0.1:3001";

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "JWT_SECRET".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        let database_path = lookup("DATABASE_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_DATABASE_PATH));

        let listen_port = match lookup("PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: "PORT".to_string(),
                message: format!("'{value}' is not a valid port number"),
            })?,
            None => Self::DEFAULT_PORT,
        };

        let token_ttl_hours = match lookup("TOKEN_TTL_HOURS") {
            Some(value) => match value.parse::<i64>() {
                Ok(hours) if hours > 0 => hours,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "TOKEN_TTL_HOURS".to_string(),
                        message: format!("'{value}' is not a positive number of hours"),
                    })
                }
            },
            None => DEFAULT_TOKEN_TTL_HOURS,
        };

        let allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| Self::DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            jwt_secret,
            database_path,
            listen_port,
            token_ttl_hours,
            allowed_origins,
        })
    }
}
