use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Domain errors surfaced at the HTTP boundary.
///
/// Every variant renders as `{"error": <custom message>, "message": <detail>}`;
/// database and unexpected errors collapse to a generic 500 with the detail
/// logged server-side only.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Administrator privileges are required for this operation.")]
    Forbidden,

    #[error("A user with this email address already exists.")]
    UserExists,

    #[error("User not found")]
    UserNotFound,

    #[error("No user found with this email address")]
    ResetNoUser,

    #[error("Password reset token is invalid or has expired.")]
    InvalidResetToken,

    #[error("Refresh token is required.")]
    MissingRefreshToken,

    #[error("Invalid refresh token.")]
    InvalidRefreshToken,

    #[error("Refresh token has expired.")]
    RefreshTokenExpired,

    #[error("Failed to send email.")]
    Email(#[source] anyhow::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::InvalidCredentials
            | ApiError::UserExists
            | ApiError::InvalidResetToken
            | ApiError::MissingRefreshToken => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden
            | ApiError::InvalidRefreshToken
            | ApiError::RefreshTokenExpired => StatusCode::FORBIDDEN,
            ApiError::UserNotFound | ApiError::ResetNoUser => StatusCode::NOT_FOUND,
            ApiError::Email(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn custom_message(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "Validation error",
            ApiError::InvalidCredentials | ApiError::Unauthorized(_) => "Authentication failed",
            ApiError::Forbidden => "Forbidden: Admins only",
            ApiError::UserExists => "User already exists.",
            ApiError::UserNotFound => "User not found",
            ApiError::ResetNoUser => "Error during password reset",
            ApiError::InvalidResetToken => "Invalid or expired token",
            ApiError::MissingRefreshToken
            | ApiError::InvalidRefreshToken
            | ApiError::RefreshTokenExpired => "Error refreshing token",
            ApiError::Email(_) => "Email delivery failed",
            ApiError::Internal(_) => "Server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Internal details stay in the logs, not in the response body.
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "An unexpected error occurred.".to_string()
            }
            ApiError::Email(e) => {
                error!(error = %e, "email delivery error");
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": self.custom_message(),
            "message": message,
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::Validation("bad input".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidCredentials.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("missing cookie".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::UserNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InvalidResetToken.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::RefreshTokenExpired.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ApiError::InvalidCredentials.to_string(),
            "Invalid username or password."
        );
        assert_eq!(
            ApiError::InvalidResetToken.to_string(),
            "Password reset token is invalid or has expired."
        );
        assert_eq!(
            ApiError::ResetNoUser.to_string(),
            "No user found with this email address"
        );
    }

    #[test]
    fn test_login_failures_are_uniform() {
        // Unknown email and wrong password must be indistinguishable.
        let a = ApiError::InvalidCredentials;
        let b = ApiError::InvalidCredentials;
        assert_eq!(a.status_code(), b.status_code());
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a.custom_message(), b.custom_message());
    }
}
