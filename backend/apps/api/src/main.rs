//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use anyhow::Context;
use axum::{
    Router, http,
    http::{Method, header},
};
use base64::Engine;
use base64::engine::general_purpose;
use community::{CommunityConfig, PgCommunityRepository, community_router};
use platform::blob::{
    BlobCleaner, BlobConfig, BlobQueue, BucketCredentials, CredentialCell, HttpBlobStore,
};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:31113";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,community=info,platform=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url =
        env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Community configuration
    let community_config = if cfg!(debug_assertions) {
        CommunityConfig::development()
    } else {
        // In production, load secret from environment
        let secret_b64 =
            env::var("TOKEN_SECRET").context("TOKEN_SECRET must be set in production")?;
        let secret_bytes = Engine::decode(&general_purpose::STANDARD, &secret_b64)?;
        let secret: [u8; 32] = secret_bytes
            .as_slice()
            .try_into()
            .context("TOKEN_SECRET must decode to exactly 32 bytes")?;
        CommunityConfig {
            token_secret: secret,
            password_pepper: env::var("PASSWORD_PEPPER").ok().map(String::into_bytes),
            ..CommunityConfig::default()
        }
    };

    // Blob store: one queue serializes every credential-scoped call
    let credentials = BucketCredentials::new(
        env::var("BLOB_TOKEN_POST").ok(),
        env::var("BLOB_TOKEN_AVATAR").ok(),
    );
    let mut blob_config = BlobConfig {
        credentials: credentials.clone(),
        ..BlobConfig::default()
    };
    if let Ok(url) = env::var("BLOB_API_URL") {
        blob_config.api_base_url = url;
    }

    let cell = CredentialCell::new(None);
    let queue = BlobQueue::start(cell.clone(), credentials);
    let blob_store = HttpBlobStore::new(&blob_config, cell)?;
    let cleaner = BlobCleaner::new(Arc::new(blob_store), queue);

    tracing::info!(blob_api = %blob_config.api_base_url, "Blob store configured");

    let repository = PgCommunityRepository::new(pool.clone());

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .merge(community_router(repository, community_config, cleaner))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env::var("LISTEN_ADDR")
        .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string())
        .parse()
        .context("LISTEN_ADDR must be a socket address")?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
