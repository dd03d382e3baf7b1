//! Whereabouts - "Where" bot for the LINE Messaging API
//!
//! Answers "Where" with today's side. The side flips once per calendar day,
//! on the first query of that day, and is persisted in SQLite.

mod api;
mod config;
mod db;
mod dispatch;
mod line;
mod toggle;

use api::{create_router, AppState};
use config::Config;
use db::Database;
use dispatch::Dispatcher;
use line::LineClient;
use std::net::SocketAddr;
use std::sync::Arc;
use toggle::{DatabaseStore, Toggle, ZonedClock};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "whereabouts=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = Config::from_env()?;

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path, config.db_busy_timeout)?;

    match db.latest()? {
        Some(last) => tracing::info!(
            day = %last.day,
            side = %last.side,
            created_at = %last.created_at,
            "Last known side"
        ),
        None => tracing::info!(initial = %config.initial_side, "No day state yet"),
    }

    let clock = ZonedClock::new(config.timezone);
    let toggle = Toggle::new(
        Arc::new(DatabaseStore::new(db)),
        Arc::new(clock),
        config.initial_side,
    );
    tracing::info!(timezone = %config.timezone, today = %toggle.today(), "Reference timezone");

    let messenger = LineClient::new(
        config.channel_access_token.as_str(),
        &config.api_base,
        config.http_timeout,
    )?;

    // Create application state
    let dispatcher = Dispatcher::new(toggle, Arc::new(messenger));
    let state = AppState::new(dispatcher, &config.channel_secret);

    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Whereabouts listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
