use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::jwt::JwtKeys;
use crate::auth::repo_types::{RefreshToken, User};
use crate::email::reset_link;
use crate::error::ApiError;
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Mint an opaque refresh token and persist it with its expiry.
pub async fn issue_refresh_token(state: &AppState, user: &User) -> anyhow::Result<String> {
    let token = Uuid::new_v4().to_string();
    let expires_at =
        OffsetDateTime::now_utc() + Duration::days(state.config.jwt.refresh_ttl_days);
    RefreshToken::create(&state.db, &token, user.id, expires_at).await?;
    info!(user_id = %user.id, "refresh token issued");
    Ok(token)
}

/// Exchange a stored refresh token for a fresh access token.
///
/// An unknown token and a token whose owner has vanished are reported
/// identically; an expired token is revoked on sight. The token itself is
/// reusable until its own expiry.
pub async fn refresh_access_token(
    state: &AppState,
    keys: &JwtKeys,
    token: &str,
) -> Result<String, ApiError> {
    let stored = RefreshToken::find(&state.db, token)
        .await?
        .ok_or(ApiError::InvalidRefreshToken)?;

    if stored.is_expired() {
        RefreshToken::revoke(&state.db, token).await?;
        warn!(user_id = %stored.user_id, "expired refresh token revoked");
        return Err(ApiError::RefreshTokenExpired);
    }

    let user = User::find_by_id(&state.db, stored.user_id)
        .await?
        .ok_or(ApiError::InvalidRefreshToken)?;

    let access_token = keys.sign_access(&user)?;
    info!(user_id = %user.id, "access token refreshed");
    Ok(access_token)
}

/// Issue a reset token for the account and email the reset link.
///
/// Returns the user the email went to. An email-send timeout does not undo
/// the token: the reset stays usable for its full window either way.
pub async fn request_password_reset(state: &AppState, email: &str) -> Result<User, ApiError> {
    let user = User::find_by_email(&state.db, email)
        .await?
        .ok_or(ApiError::ResetNoUser)?;

    let token = Uuid::new_v4().to_string();
    let expires_at =
        OffsetDateTime::now_utc() + Duration::hours(state.config.jwt.reset_ttl_hours);
    let user = User::set_reset_token(&state.db, user.id, &token, expires_at).await?;

    let link = reset_link(&state.config.frontend_url, &token);
    send_bounded(
        state,
        state.mailer.send_reset_password(&user.email, &link),
        "reset password",
    )
    .await?;

    info!(user_id = %user.id, "password reset requested");
    Ok(user)
}

/// Consume a live reset token and set the new password.
///
/// All refresh tokens of the account die with the old password. Exactly one
/// of two racing completions can succeed; the loser sees the cleared token.
pub async fn complete_password_reset(
    state: &AppState,
    token: &str,
    new_password: &str,
) -> Result<User, ApiError> {
    let new_hash = super::password::hash_password(new_password)?;

    let user = User::reset_password_with_token(&state.db, token, &new_hash)
        .await?
        .ok_or(ApiError::InvalidResetToken)?;

    send_bounded(
        state,
        state.mailer.send_reset_confirmation(&user.email),
        "reset confirmation",
    )
    .await?;

    info!(user_id = %user.id, "password reset completed");
    Ok(user)
}

/// Await an email send, bounded so a slow provider cannot hang the request.
/// Hitting the bound is not an error: the operation already took effect.
async fn send_bounded(
    state: &AppState,
    fut: impl std::future::Future<Output = anyhow::Result<()>>,
    what: &str,
) -> Result<(), ApiError> {
    let bound = std::time::Duration::from_secs(state.config.email.timeout_seconds);
    match tokio::time::timeout(bound, fut).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ApiError::Email(e)),
        Err(_) => {
            warn!(what = %what, "email send exceeded {}s; continuing", bound.as_secs());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("two@@x.com"));
        assert!(!is_valid_email("spaces in@x.com"));
    }
}
