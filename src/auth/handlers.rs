use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use time::Duration;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        cookie::{
            access_cookie, refresh_cookie, removal_cookie, ACCESS_COOKIE_NAME,
            REFRESH_COOKIE_NAME,
        },
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, RefreshRequest,
            RefreshResponse, RegisterRequest, ResetPasswordRequest, SafeUser, UserResponse,
        },
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::{RefreshToken, User},
        services::{self, is_valid_email},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/login/forgot", post(forgot_password))
        .route("/auth/login/reset/:token", post(reset_password))
        .route("/auth/logout", post(logout))
}

fn validate_email_field(email: &str) -> Result<(), ApiError> {
    if email.len() < 5 || email.len() > 255 || !is_valid_email(email) {
        warn!("invalid email");
        return Err(ApiError::Validation("\"email\" must be a valid email".into()));
    }
    Ok(())
}

fn validate_password_field(password: &str) -> Result<(), ApiError> {
    if password.len() < 5 || password.len() > 255 {
        warn!("password length out of bounds");
        return Err(ApiError::Validation(
            "\"password\" length must be between 5 and 255 characters".into(),
        ));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_lowercase();

    validate_email_field(&payload.email)?;
    validate_password_field(&payload.password)?;
    if payload.username.len() < 3 || payload.username.len() > 50 {
        warn!("username length out of bounds");
        return Err(ApiError::Validation(
            "\"username\" length must be between 3 and 50 characters".into(),
        ));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::UserExists);
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.email, &payload.username, &hash, false).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            user: SafeUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    validate_email_field(&payload.email)?;

    // Unknown email and wrong password answer identically.
    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!("login with unknown email");
            ApiError::InvalidCredentials
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(&user)?;
    let refresh_token = services::issue_refresh_token(&state, &user).await?;

    let secure = state.config.production;
    let jar = jar
        .add(access_cookie(
            access_token.clone(),
            Duration::seconds(keys.access_ttl.as_secs() as i64),
            secure,
        ))
        .add(refresh_cookie(
            refresh_token.clone(),
            Duration::days(state.config.jwt.refresh_ttl_days),
            secure,
        ));

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        jar,
        Json(AuthResponse {
            access_token,
            refresh_token,
            user: SafeUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let token = payload
        .refresh_token
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::MissingRefreshToken)?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = services::refresh_access_token(&state, &keys, &token).await?;
    Ok(Json(RefreshResponse { access_token }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    validate_email_field(&email)?;

    let user = services::request_password_reset(&state, &email).await?;
    Ok(Json(MessageResponse {
        message: format!("A reset password email has been sent to {}", user.email),
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate_password_field(&payload.password)?;

    services::complete_password_reset(&state, &token, &payload.password).await?;
    Ok(Json(MessageResponse {
        message: "Password has been successfully changed.".into(),
    }))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    // Revoke the presented refresh token; logging out twice is fine.
    if let Some(cookie) = jar.get(REFRESH_COOKIE_NAME) {
        RefreshToken::revoke(&state.db, cookie.value()).await?;
    }

    let jar = jar
        .add(removal_cookie(ACCESS_COOKIE_NAME))
        .add(removal_cookie(REFRESH_COOKIE_NAME));

    info!("user logged out");
    Ok((jar, Json(MessageResponse {
        message: "Logout success".into(),
    })))
}
