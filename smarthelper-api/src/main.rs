//! # SmartHelper API Server
//!
//! The main API server for SmartHelper, a marketplace connecting families
//! with domestic helpers.
//!
//! ## Architecture
//!
//! Built with Axum over PostgreSQL:
//! - Accounts and JWT authentication (family and helper roles)
//! - Job postings and applications
//! - Face-gated attendance scanning
//! - Attendance-to-payment reconciliation
//! - Reviews and a community feed
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p smarthelper-api
//! ```

use smarthelper_api::{
    app::{build_router, AppState},
    config::Config,
};
use smarthelper_shared::db::{migrations::run_migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smarthelper_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "SmartHelper API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db_config = pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..pool::DatabaseConfig::default()
    };
    let db = pool::create_pool(db_config).await?;

    run_migrations(&db).await?;

    let bind_address = config.bind_address();
    let state = AppState::new(db, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
