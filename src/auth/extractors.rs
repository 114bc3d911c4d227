use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::{error::IdentityError, state::AppState};

/// Extracts the caller's account id from a `Bearer` access token. Missing
/// header, wrong scheme, bad signature, expiry, and refresh-for-access all
/// reject the same way.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = IdentityError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(IdentityError::InvalidToken)?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(IdentityError::InvalidToken)?;

        let account_id = state.identity.verify_access(token)?;
        Ok(AuthUser(account_id))
    }
}
