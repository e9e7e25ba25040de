//! Slotbook Server - appointment booking
//!
//! REST API server for slot availability and reservations.

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Pool, Postgres,
};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use slotbook_server::{
    api,
    config::{AppConfig, DatabaseConfig, LoggingConfig},
    repository::Repository,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Held for the process lifetime so buffered file logs are flushed
    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting Slotbook Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = connect(&config.database, &config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    let read_pool = match &config.database.replica_url {
        Some(url) => {
            let replica = connect(&config.database, url)
                .await
                .context("Failed to connect to read replica")?;
            tracing::info!("Connected to read replica");
            Some(replica)
        }
        None => None,
    };

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let repository = Repository::new(pool.clone(), read_pool, config.database.lock_timeout_ms);
    let services = Services::new(repository, &config.notifications);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        pool,
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Stdout logging in the configured format, plus an optional daily file
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("slotbook_server={},tower_http=debug", logging.level).into());

    let stdout_layer = match logging.format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().boxed(),
        _ => tracing_subscriber::fmt::layer().pretty().boxed(),
    };

    let (file_layer, guard) = match &logging.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "slotbook-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}

/// Pool with the statement timeout applied to every connection
async fn connect(database: &DatabaseConfig, url: &str) -> anyhow::Result<Pool<Postgres>> {
    let options = PgConnectOptions::from_str(url)?.options([(
        "statement_timeout",
        format!("{}ms", database.statement_timeout_ms),
    )]);

    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .min_connections(database.min_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Availability
        .route("/availability/slots", get(api::availability::list_slots))
        .route("/availability/check", get(api::availability::check_slot))
        // Bookings
        .route("/bookings", post(api::bookings::create_booking))
        .route("/bookings/:id", get(api::bookings::get_booking))
        .route("/bookings/:id/history", get(api::bookings::get_booking_history))
        .route("/bookings/:id/confirm", post(api::bookings::confirm_booking))
        .route("/bookings/:id/check-in", post(api::bookings::check_in_booking))
        .route("/bookings/:id/complete", post(api::bookings::complete_booking))
        .route("/bookings/:id/no-show", post(api::bookings::no_show_booking))
        .route("/bookings/:id/cancel", post(api::bookings::cancel_booking))
        // Customers
        .route("/customers/:id/bookings", get(api::bookings::list_customer_bookings))
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
}
