//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use anyhow::Context;
use axum::{
    Router, http,
    http::{HeaderName, Method, header},
};
use platform::mail::{HttpMailTransport, LogMailTransport};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verification::{PgVerificationRepository, VerificationConfig, verification_router};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,verification=info,platform=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&database_url)
        .await?;

    tracing::info!(max_connections, "Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Expired requests are kept for history; report them, never fail on it
    match PgVerificationRepository::new(pool.clone())
        .count_stale_pending()
        .await
    {
        Ok(stale) => {
            tracing::info!(stale_pending = stale, "Verification startup report");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Verification startup report failed, continuing anyway");
        }
    }

    // Verification configuration
    let config = if cfg!(debug_assertions) {
        VerificationConfig::development()
    } else {
        VerificationConfig::default()
    };
    let config = match env::var("FRONTEND_BASE_URL") {
        Ok(url) => config.with_frontend_base_url(url),
        Err(_) => config,
    };

    // Mail relay; without one, messages are only logged
    let verification = match env::var("MAIL_API_URL") {
        Ok(endpoint) => {
            let api_key = env::var("MAIL_API_KEY").context("MAIL_API_KEY must be set")?;
            let from = env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Portfolio <no-reply@portfolio.example>".to_string());
            let transport =
                HttpMailTransport::new(endpoint, api_key, from, config.notification_timeout)?;
            tracing::info!("Mail relay configured");
            verification_router(pool.clone(), transport, config)
        }
        Err(_) => {
            tracing::warn!("MAIL_API_URL not set, verification emails will only be logged");
            verification_router(pool.clone(), LogMailTransport, config)
        }
    };

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:5173,http://127.0.0.1:5173".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-user-id"),
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api/verifications", verification)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        );

    // Start server
    let addr: SocketAddr = env::var("BIND_ADDR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 31113)));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
