use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    pub reset_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub sending_email: String,
    pub sendgrid_api_key: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub frontend_url: String,
    pub production: bool,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".into());
        let production = std::env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);
        let jwt = JwtConfig {
            secret: std::env::var("ACCESS_TOKEN_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "portald".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "portald-users".into()),
            access_ttl_minutes: std::env::var("ACCESS_TOKEN_EXPIRY_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(15),
            refresh_ttl_days: std::env::var("REFRESH_TOKEN_EXPIRY_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
            reset_ttl_hours: std::env::var("RESET_TOKEN_EXPIRY_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(12),
        };
        let email = EmailConfig {
            sending_email: std::env::var("SENDING_EMAIL")
                .unwrap_or_else(|_| "no-reply@localhost".into()),
            sendgrid_api_key: std::env::var("SENDGRID_API_KEY").unwrap_or_default(),
            timeout_seconds: std::env::var("EMAIL_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };
        Ok(Self {
            database_url,
            frontend_url,
            production,
            jwt,
            email,
        })
    }
}
