//! PDF Generator Web - upload images, preview them in a grid, download one PDF.

mod helpers;
mod routes;
mod state;
mod templates;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use pdf_generator_core::AppConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use axum::http::{header, HeaderValue};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter, prelude::*};

use state::AppState;

/// Request body limit; a single pass may carry many images.
const BODY_LIMIT: usize = 200 * 1024 * 1024;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Resolve the static files directory.
///
/// Priority:
/// 1. Explicit path if provided
/// 2. ./static if it exists
/// 3. Crate's built-in static directory
fn resolve_static_dir(explicit_path: Option<&str>) -> PathBuf {
    if let Some(path) = explicit_path {
        return PathBuf::from(path);
    }

    let local_static = PathBuf::from("static");
    if local_static.exists() && local_static.is_dir() {
        return local_static;
    }

    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}

#[derive(Parser, Debug)]
#[command(name = "pdf-generator-web")]
#[command(author, version, about = "PDF Generator Web Server", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Config file (defaults to ~/.config/pdf-generator/config.toml or ./config.toml)
    #[arg(short, long, env = "PDF_GENERATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Static files directory (defaults to ./static or crate's static dir)
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<String>,
}

fn router(state: Arc<AppState>, static_dir: PathBuf) -> Router {
    Router::new()
        // Pages
        .route("/", get(routes::index))
        .route("/view/{session_id}", get(routes::view_session))
        // API endpoints - redirects (POST-Redirect-GET)
        .route("/api/upload", post(routes::upload_images))
        .route("/api/upload/{session_id}", post(routes::upload_more))
        .route("/api/session/{session_id}/close", post(routes::close_session))
        // API endpoints - JSON and binary responses
        .route("/api/layout/{session_id}", get(routes::get_layout))
        .route("/api/image/{session_id}/{index}", get(routes::get_image))
        .route("/api/download/{session_id}", get(routes::download_pdf))
        // Static files with Cache-Control: no-cache (cache but always revalidate via ETag)
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-cache"),
                ))
                .service(ServeDir::new(static_dir)),
        )
        // Middleware
        // Pages reflect session state, so never serve them from cache
        // (images and downloads set their own headers)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        ))
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load(),
    };

    let state = Arc::new(
        AppState::new(config).context("Failed to initialize application state")?,
    );

    // Spawn background task for session cleanup
    let cleanup_state = Arc::clone(&state);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(CLEANUP_INTERVAL).await;
            cleanup_state.cleanup_old_sessions().await;
        }
    });

    let app = router(state, resolve_static_dir(args.static_dir.as_deref()));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
