mod app;
mod auth;
mod config;
mod email;
mod error;
mod state;
mod users;

use crate::auth::{password::hash_password, repo_types::User};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "portald=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    seed_admin(&app_state).await?;

    let db = app_state.db.clone();
    let app = app::build_app(app_state);
    app::serve(app).await?;

    // Pool opened at startup, closed at shutdown.
    db.close().await;
    tracing::info!("database pool closed");

    Ok(())
}

/// Ensure the configured admin account exists. Skipped when the
/// ADMIN_EMAIL/ADMIN_PASSWORD pair is not set or already registered.
async fn seed_admin(state: &AppState) -> anyhow::Result<()> {
    let (email, password) = match (
        std::env::var("ADMIN_EMAIL"),
        std::env::var("ADMIN_PASSWORD"),
    ) {
        (Ok(email), Ok(password)) => (email, password),
        _ => return Ok(()),
    };

    if User::find_by_email(&state.db, &email).await?.is_some() {
        tracing::debug!("admin user already exists, skipping seeding");
        return Ok(());
    }

    let hash = hash_password(&password)?;
    let admin = User::create(&state.db, &email, "admin", &hash, true).await?;
    tracing::info!(user_id = %admin.id, "admin user created");
    Ok(())
}
