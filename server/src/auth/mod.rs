//! Authentication
//!
//! Registration, login and token verification. Every document route is
//! guarded by the [`AuthUser`] extractor, which resolves the bearer token to
//! a user id before the handler runs.

mod extract;
pub mod password;
pub mod token;

pub use extract::AuthUser;
pub use token::{TokenError, TokenKeys};

use crate::database::{Repository, UserInfo};
use crate::error::{AppError, Result};
use serde::Serialize;

/// Outcome of a successful register or login
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserInfo,
}

/// Service for account registration and token handling
#[derive(Clone)]
pub struct AuthService {
    repo: Repository,
    keys: TokenKeys,
}

impl AuthService {
    pub fn new(repo: Repository, keys: TokenKeys) -> Self {
        Self { repo, keys }
    }

    /// Register a new account and issue its first token
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession> {
        let username = username.trim();
        let email = normalize_email(email);

        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Username, email and password are required".to_string(),
            ));
        }

        tracing::info!("Registering user: {}", username);

        if self.repo.user_exists(username, &email).await? {
            return Err(AppError::Conflict(
                "Username or email is already in use".to_string(),
            ));
        }

        let password_hash = password::hash_password(password.to_string()).await?;
        let user = self.repo.create_user(username, &email, &password_hash).await?;
        let token = self.issue_token(&user.id)?;

        tracing::info!("User registered: {}", user.id);

        Ok(AuthSession {
            token,
            user: user.to_info(),
        })
    }

    /// Check credentials and issue a token
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(email);

        if email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let user = self
            .repo
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::UserNotFound(email.clone()))?;

        let valid =
            password::verify_password(password.to_string(), user.password_hash.clone()).await?;
        if !valid {
            tracing::info!("Rejected login for user: {}", user.id);
            return Err(AppError::InvalidCredentials);
        }

        let token = self.issue_token(&user.id)?;

        tracing::info!("User logged in: {}", user.id);

        Ok(AuthSession {
            token,
            user: user.to_info(),
        })
    }

    fn issue_token(&self, user_id: &str) -> Result<String> {
        // A signing failure is a server fault, not a rejected credential
        self.keys
            .issue(user_id)
            .map_err(|e| AppError::Generic(e.to_string()))
    }

    /// Resolve a token to the user id it was issued for
    pub fn verify(&self, token: &str) -> Result<String> {
        Ok(self.keys.verify(token)?)
    }

    /// Load the account behind a verified user id.
    ///
    /// A valid token for an account that no longer exists is treated as an
    /// invalid token.
    pub async fn current_user(&self, user_id: &str) -> Result<UserInfo> {
        self.repo
            .get_user(user_id)
            .await?
            .map(|user| user.to_info())
            .ok_or(AppError::Unauthorized(TokenError::MissingSubClaim))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
