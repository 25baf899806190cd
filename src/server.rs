//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all API endpoints
//! - Middleware stack (rate limiting, auth, CORS, logging)
//! - Startup sequence: store open, admin bootstrap, dataset load
//! - Graceful shutdown handling

use crate::bootstrap;
use crate::config::ServerConfig;
use crate::dataset::Datasets;
use crate::middleware::{
    bearer_auth, cors, log_requests, rate_limit_admin, rate_limit_api, rate_limit_global,
    request_id,
};
use crate::routes::{admin, anime, api_info, health, jokes, not_found, quotes, raw};
use crate::state::ServerState;
use crate::store::{CredentialStore, Database};
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware.
///
/// Route groups:
/// - Public: `/`, `/health`, `/healthz`, `/metrics`, and the shorthand
///   category aliases
/// - `/api/v1/*`: category reads plus the raw dataset blobs (api rate tier)
/// - `/api/v1/admin/*`: settings management (admin rate tier + bearer auth)
pub fn build_router(state: Arc<ServerState>) -> Router {
    let admin_routes = Router::new()
        .route(
            "/settings",
            get(admin::list_settings).post(admin::set_setting),
        )
        .route("/settings/{key}", axum::routing::delete(admin::delete_setting))
        .layer(from_fn_with_state(state.clone(), bearer_auth))
        .layer(from_fn_with_state(state.clone(), rate_limit_admin));

    let api_routes = Router::new()
        // Quotes
        .route("/random", get(quotes::random_quote))
        .route("/quotes", get(quotes::all_quotes))
        .route("/quotes/{id}", get(quotes::quote_by_id))
        .route("/quotes/category/{category}", get(quotes::quotes_by_category))
        .route("/quotes/author/{author}", get(quotes::quotes_by_author))
        // Anime
        .route("/anime", get(anime::all_quotes))
        .route("/anime/random", get(anime::random_quote))
        .route("/anime/{id}", get(anime::quote_by_id))
        .route("/anime/category/{category}", get(anime::quotes_by_category))
        .route("/anime/show/{anime}", get(anime::quotes_by_show))
        .route("/anime/character/{character}", get(anime::quotes_by_character))
        // Jokes
        .route("/chucknorris", get(jokes::all_chucknorris))
        .route("/chucknorris/random", get(jokes::random_chucknorris))
        .route("/dadjokes", get(jokes::all_dadjokes))
        .route("/dadjokes/random", get(jokes::random_dadjoke))
        .route("/programming", get(jokes::all_programming))
        .route("/programming/random", get(jokes::random_programming))
        // Raw dataset blobs
        .route("/quotes.json", get(raw::quotes_json))
        .route("/anime.json", get(raw::anime_json))
        .route("/chucknorris.json", get(raw::chucknorris_json))
        .route("/dadjokes.json", get(raw::dadjokes_json))
        .route("/programming.json", get(raw::programming_json))
        // Status
        .route("/status", get(health::status))
        // Admin (most restrictive tier + auth)
        .nest("/admin", admin_routes)
        .layer(from_fn_with_state(state.clone(), rate_limit_api));

    // Shorthand aliases without the /api/v1 prefix
    let shorthand_routes = Router::new()
        .route("/anime", get(anime::all_quotes))
        .route("/anime/random", get(anime::random_quote))
        .route("/chucknorris", get(jokes::all_chucknorris))
        .route("/chucknorris/random", get(jokes::random_chucknorris))
        .route("/dadjokes", get(jokes::all_dadjokes))
        .route("/dadjokes/random", get(jokes::random_dadjoke))
        .route("/programming", get(jokes::all_programming))
        .route("/programming/random", get(jokes::random_programming));

    let public_routes = Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/healthz", get(health::health_check))
        .route("/metrics", get(health::metrics));

    Router::new()
        .merge(public_routes)
        .merge(shorthand_routes)
        .nest("/api/v1", api_routes)
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(from_fn_with_state(state.clone(), cors))
        .layer(from_fn_with_state(state.clone(), rate_limit_global))
        .layer(from_fn(request_id))
        .layer(from_fn_with_state(state.clone(), log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Quotes API server.
///
/// Initialization order matters: the store opens first, the admin identity
/// is bootstrapped, then every dataset must load before the listener binds.
/// A dataset failure aborts startup; the process never serves a partial
/// catalog.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Quotes API");

    let db = Database::open(&config.db_path)?;
    tracing::info!(path = %config.db_path.display(), "database opened");

    let credentials = CredentialStore::new(&db);
    bootstrap::ensure_admin(&config, &credentials)?;

    let datasets = Datasets::load_embedded()?;
    tracing::info!(
        quotes = datasets.quotes.count(),
        anime = datasets.anime.count(),
        chucknorris = datasets.chucknorris.count(),
        dadjokes = datasets.dadjokes.count(),
        programming = datasets.programming.count(),
        "datasets loaded"
    );

    let metrics = if config.metrics_enabled {
        Some(PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };

    let addr: SocketAddr = config.socket_addr()?;
    let state = Arc::new(ServerState::new(config, &db, datasets)?.with_metrics(metrics));
    let app = build_router(state);

    tracing::info!(%addr, "server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
