//! API Server Entry Point
//!
//! Uses `anyhow` for startup errors; request-level errors render through
//! `kernel::error::AppError`.

mod config;

use anyhow::Context;
use auth::{AppMailer, PgAuthRepository, auth_router};
use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "api=info,auth=info,tower_http=info";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn connect_database() -> anyhow::Result<PgPool> {
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("Database connection failed")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await
        .context("Migrations failed")?;
    tracing::info!("Migrations completed");

    Ok(pool)
}

/// Browsers must be allowed to send the token header cross-origin
fn cors_layer(token_header: HeaderName) -> CorsLayer {
    let origins = env::var("FRONTEND_ORIGINS").unwrap_or_else(|_| DEFAULT_FRONTEND_ORIGINS.into());
    let allowed_origins: Vec<HeaderValue> = origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            token_header,
        ]))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let auth_config = config::auth_config()?;
    let token_header = HeaderName::from_bytes(auth_config.token_header.as_bytes())
        .context("AUTH_TOKEN_HEADER is not a valid header name")?;
    let mailer = AppMailer::from_config(auth_config.mail.as_ref())?;

    tracing::info!(
        token_header = %token_header,
        token_ttl_secs = auth_config.token_ttl.map(|ttl| ttl.as_secs()),
        mail_api = auth_config.mail.is_some(),
        "Auth configured"
    );

    let pool = connect_database().await?;

    let app = Router::new()
        .nest(
            "/api/auth",
            auth_router(PgAuthRepository::new(pool), mailer, auth_config),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(token_header));

    let addr = config::bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
