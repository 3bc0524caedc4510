//! Bearer token extractor

use super::TokenError;
use crate::app::AppState;
use crate::error::AppError;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// Id of the user whose token accompanied the request.
///
/// Reads `Authorization: Bearer <token>`; a bare token without the scheme is
/// accepted as well. Rejects with 401 when the header is absent or the token
/// does not verify.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(TokenError::Missing)?
            .to_str()
            .map_err(|_| TokenError::Malformed)?;

        let token = header
            .strip_prefix("Bearer ")
            .unwrap_or(header)
            .trim();

        let user_id = state.auth.verify(token)?;
        Ok(Self(user_id))
    }
}
