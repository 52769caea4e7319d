use axum::{
    extract::State,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{CleanupRequest, CleanupResponse, SafeUser, UserResponse},
        extractors::{AdminUser, AuthUser},
        repo_types::User,
    },
    error::ApiError,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/user", get(get_user))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/unverified", delete(cleanup_unverified))
}

/// The authenticated user's own record, hash-stripped.
#[instrument(skip(state, user))]
pub async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = User::find_by_id(&state.db, user.id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(UserResponse {
        user: SafeUser::from(&user),
    }))
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<SafeUser>>, ApiError> {
    let users = User::list_all(&state.db).await?;
    Ok(Json(users.iter().map(SafeUser::from).collect()))
}

/// Remove unverified accounts for an email address.
#[instrument(skip(state, admin, payload))]
pub async fn cleanup_unverified(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<CleanupRequest>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let deleted = User::delete_unverified_by_email(&state.db, &payload.email).await?;
    info!(admin_id = %admin.0.id, email = %payload.email, deleted, "unverified cleanup");
    Ok(Json(CleanupResponse { deleted }))
}
