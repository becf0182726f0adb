use anyhow::Result;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod billing;
mod config;
mod db;
mod error;
mod integrations;
mod listing;
mod mailer;
mod middleware;
mod routes;
mod session;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wandelen_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::load()?;
    tracing::info!(
        "Starting Virtual Wandelen server on {}:{}",
        config.server.host,
        config.server.port
    );

    // Initialize database
    let db = db::Database::new(&config.database.url, config.database.max_connections).await?;
    db.run_migrations().await?;
    bootstrap_admin(&db).await?;

    // Create app state
    let state = AppState::new(db.clone(), config.clone());
    session::spawn_sweeper(db, state.otp.clone(), config.session.sweep_interval_secs);

    // Build router
    let app = routes::create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

/// Create the first admin from WANDELEN_ADMIN_EMAIL / WANDELEN_ADMIN_PASSWORD
async fn bootstrap_admin(db: &db::Database) -> Result<()> {
    let (Ok(email), Ok(password)) = (
        std::env::var("WANDELEN_ADMIN_EMAIL"),
        std::env::var("WANDELEN_ADMIN_PASSWORD"),
    ) else {
        return Ok(());
    };

    let email = session::normalize_email(&email);
    if email.is_empty() || db.get_admin_by_email(&email).await?.is_some() {
        return Ok(());
    }

    let hash = routes::auth::hash_password(&password)?;
    db.create_admin(&email, &hash).await?;
    tracing::info!("Bootstrapped admin account {}", email);
    Ok(())
}
