use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Classified failures returned by the identity lifecycle. The transport
/// mapping lives in the `IntoResponse` impl so every handler shares it.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Username is already taken")]
    DuplicateUsername,
    /// Wrong password and unknown email are intentionally the same error.
    #[error("Invalid email or password")]
    InvalidCredentials,
    /// Expired, malformed, wrong secret, or wrong kind; callers cannot
    /// distinguish the cause.
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Account not found")]
    NotFound,
    #[error("Storage failure")]
    Storage(#[source] anyhow::Error),
}

impl IdentityError {
    pub fn status(&self) -> StatusCode {
        match self {
            IdentityError::Validation(_) => StatusCode::BAD_REQUEST,
            IdentityError::DuplicateEmail | IdentityError::DuplicateUsername => {
                StatusCode::CONFLICT
            }
            IdentityError::InvalidCredentials | IdentityError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            IdentityError::NotFound => StatusCode::NOT_FOUND,
            IdentityError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            IdentityError::Storage(source) => {
                error!(error = %source, "storage failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(json!({ "success": false, "error": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_errors_map_to_conflict() {
        assert_eq!(IdentityError::DuplicateEmail.status(), StatusCode::CONFLICT);
        assert_eq!(
            IdentityError::DuplicateUsername.status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn credential_and_token_errors_map_to_unauthorized() {
        assert_eq!(
            IdentityError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            IdentityError::InvalidToken.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn credential_and_token_messages_do_not_leak_cause() {
        assert_eq!(
            IdentityError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
        assert_eq!(
            IdentityError::InvalidToken.to_string(),
            "Invalid or expired token"
        );
    }

    #[test]
    fn storage_maps_to_internal_error() {
        let err = IdentityError::Storage(anyhow::anyhow!("connection refused"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
