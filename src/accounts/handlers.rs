use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    accounts::dto::{
        AuthResponse, DataResponse, LoginRequest, MessageResponse, RefreshRequest,
        RegisterRequest, UpdateAccountRequest,
    },
    accounts::model::{OwnerAccount, PublicAccount},
    auth::extractors::AuthUser,
    error::IdentityError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/me",
            get(get_own_profile)
                .put(update_own_profile)
                .delete(delete_own_profile),
        )
        .route("/users/:id", get(get_account_by_id))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, IdentityError> {
    payload.validate()?;
    let session = state.identity.register(payload).await?;
    Ok(Json(session))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, IdentityError> {
    payload.validate()?;
    let session = state
        .identity
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(session))
}

#[instrument(skip(state, payload))]
async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, IdentityError> {
    let session = state.identity.refresh(&payload.refresh_token).await?;
    Ok(Json(session))
}

/// Tokens are self-contained and there is no denylist; logout only
/// acknowledges so clients discard their copies.
#[instrument]
async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse::new("Logged out successfully"))
}

#[instrument(skip(state))]
async fn get_own_profile(
    State(state): State<AppState>,
    AuthUser(account_id): AuthUser,
) -> Result<Json<DataResponse<OwnerAccount>>, IdentityError> {
    let account = state
        .identity
        .get_by_id(account_id)
        .await?
        .ok_or(IdentityError::NotFound)?;
    Ok(Json(DataResponse::new(account.owner_view())))
}

#[instrument(skip(state, payload))]
async fn update_own_profile(
    State(state): State<AppState>,
    AuthUser(account_id): AuthUser,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<DataResponse<OwnerAccount>>, IdentityError> {
    payload.validate()?;
    let account = state.identity.update(account_id, payload).await?;
    Ok(Json(DataResponse::new(account)))
}

#[instrument(skip(state))]
async fn delete_own_profile(
    State(state): State<AppState>,
    AuthUser(account_id): AuthUser,
) -> Result<Json<MessageResponse>, IdentityError> {
    state.identity.remove(account_id).await?;
    Ok(Json(MessageResponse::new(
        "Account deleted successfully",
    )))
}

#[instrument(skip(state))]
async fn get_account_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DataResponse<PublicAccount>>, IdentityError> {
    let account = state
        .identity
        .get_by_id(id)
        .await?
        .ok_or(IdentityError::NotFound)?;
    Ok(Json(DataResponse::new(account.public_view())))
}
