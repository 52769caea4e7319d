use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::auth::cookie::ACCESS_COOKIE_NAME;
use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use crate::state::AppState;

/// Identity resolved from a verified access token.
///
/// Extraction reads the `authToken` cookie and verifies it; there is no
/// fallback to anonymous access.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub is_admin: bool,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(ACCESS_COOKIE_NAME)
            .map(|c| c.value().to_string())
            .ok_or_else(|| ApiError::Unauthorized("Missing authentication cookie".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token).map_err(|_| {
            warn!("invalid or expired access token");
            ApiError::Unauthorized("Invalid or expired token".into())
        })?;

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
            is_admin: claims.is_admin,
        })
    }
}

/// Identity that must carry the admin flag. Runs the full `AuthUser`
/// extraction first, so it can never observe an unauthenticated request.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            warn!(user_id = %user.id, "non-admin denied");
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::User;
    use axum::http::{Request, StatusCode};
    use time::OffsetDateTime;

    fn make_user(id: i64, is_admin: bool) -> User {
        User {
            id,
            email: "alice@example.com".into(),
            username: "alice".into(),
            password_hash: "phc-string".into(),
            is_admin,
            is_verified: true,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn parts_with_cookie(cookie: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/user");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn extracts_identity_from_auth_cookie() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_access(&make_user(5, false)).unwrap();
        let mut parts = parts_with_cookie(Some(format!("authToken={token}")));

        let user = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("extraction should succeed");
        assert_eq!(user.id, 5);
        assert_eq!(user.email, "alice@example.com");
        assert!(!user.is_admin);
    }

    #[tokio::test]
    async fn missing_cookie_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_cookie(None);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_cookie(Some("authToken=garbage".into()));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_gate_rejects_non_admin_with_403() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_access(&make_user(5, false)).unwrap();
        let mut parts = parts_with_cookie(Some(format!("authToken={token}")));

        let err = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_gate_passes_admin_through() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_access(&make_user(1, true)).unwrap();
        let mut parts = parts_with_cookie(Some(format!("authToken={token}")));

        let AdminUser(user) = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .expect("admin should pass");
        assert!(user.is_admin);
        assert_eq!(user.id, 1);
    }

    #[tokio::test]
    async fn admin_gate_without_identity_is_401_not_403() {
        let state = AppState::fake();
        let mut parts = parts_with_cookie(None);
        let err = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
