use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,                       // unique, immutable
    pub email: String,                 // stored lowercase, unique
    pub username: String,              // stored lowercase, unique
    #[serde(skip_serializing)]
    pub password_hash: String,         // argon2 PHC string, never exposed
    pub is_admin: bool,
    pub is_verified: bool,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Database-backed session-continuation credential.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub id: i64,
    pub token: String,                 // opaque, unique
    pub user_id: i64,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

impl RefreshToken {
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at
    }
}
