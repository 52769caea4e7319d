use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

pub const ACCESS_COOKIE_NAME: &str = "authToken";
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

fn build(name: &'static str, value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(max_age)
        .build()
}

/// Access-token cookie; max-age matches the token's own lifetime.
pub fn access_cookie(token: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    build(ACCESS_COOKIE_NAME, token, max_age, secure)
}

/// Refresh-token cookie; max-age matches the stored row's expiry.
pub fn refresh_cookie(token: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    build(REFRESH_COOKIE_NAME, token, max_age, secure)
}

/// Expired cookie used to clear a credential on logout.
pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).path("/").build();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_cookie_is_locked_down() {
        let cookie = access_cookie("tok".into(), Duration::minutes(15), true);
        assert_eq!(cookie.name(), "authToken");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(Duration::minutes(15)));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn secure_flag_follows_environment() {
        let dev = refresh_cookie("tok".into(), Duration::days(7), false);
        assert_eq!(dev.secure(), Some(false));
        let prod = refresh_cookie("tok".into(), Duration::days(7), true);
        assert_eq!(prod.secure(), Some(true));
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let cookie = removal_cookie(REFRESH_COOKIE_NAME);
        assert_eq!(cookie.name(), "refreshToken");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
