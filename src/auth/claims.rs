use serde::{Deserialize, Serialize};

/// Access-token payload: a self-contained identity assertion.
/// Verification is signature + expiry only, no database lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,        // user ID
    pub email: String,   // user email at issue time
    pub is_admin: bool,  // role flag at issue time
    pub iat: usize,      // issued at (unix timestamp)
    pub exp: usize,      // expires at (unix timestamp)
    pub iss: String,     // issuer
    pub aud: String,     // audience
}
