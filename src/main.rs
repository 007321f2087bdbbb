mod config;
mod error;
mod handlers;
mod models;
mod services;
mod sync;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use services::{AuthService, QuoteService, StoreClient, WatchlistService};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub watchlist_service: WatchlistService,
    pub quote_service: QuoteService,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() {
    // Load .env file if it exists
    if let Ok(path) = dotenvy::dotenv() {
        println!("Loaded .env file from: {:?}", path);
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Stockwatch Backend Starting...");

    // Load configuration
    let config = Config::from_env();
    let addr = config.server_addr();

    if config.finnhub_api_key.is_none() {
        tracing::warn!("FINNHUB_API_KEY not set; dashboard rows will have no market data");
    }

    // Initialize services
    let store = StoreClient::new(&config);
    let auth_service = AuthService::new(config.clone());
    let watchlist_service = WatchlistService::new(store);
    let quote_service = QuoteService::new(config.clone());

    let state = AppState {
        auth_service,
        watchlist_service,
        quote_service,
        config: Arc::new(config),
    };

    let app = build_router(state);

    tracing::info!("🚀 Stockwatch Backend starting on http://{}", addr);
    tracing::info!("📈 Watchlist API available at http://{}/api/watchlist", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

fn build_router(state: AppState) -> Router {
    let cors_origins: Vec<axum::http::HeaderValue> = state
        .config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .route("/api/status", get(system_status))
        // Watchlist API routes
        .route("/api/watchlist/symbols", get(handlers::get_watchlist_symbols))
        .route("/api/watchlist/add", post(handlers::add_to_watchlist))
        .route("/api/watchlist/remove", post(handlers::remove_from_watchlist))
        .route(
            "/api/watchlist/contains/:symbol",
            get(handlers::check_watchlist),
        )
        // Symbol directory
        .route("/api/symbols/search", get(handlers::search_symbols))
        // Page-level watchlist routes (redirect to sign-in when unauthenticated)
        .route("/watchlist", get(handlers::get_watchlist_dashboard))
        .route("/watchlist/actions/add", post(handlers::watchlist_action_add))
        .route(
            "/watchlist/actions/remove",
            post(handlers::watchlist_action_remove),
        )
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::COOKIE,
                ])
                .allow_credentials(true),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/status - Detailed system status including document store connection
async fn system_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let pb_url = format!("{}/api/health", state.config.pocketbase_url);
    let pb_status = match reqwest::Client::new()
        .get(&pb_url)
        .timeout(std::time::Duration::from_secs(2))
        .send()
        .await
    {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    };

    Json(serde_json::json!({
        "status": "ok",
        "pocketbase": {
            "url": state.config.pocketbase_url,
            "connected": pb_status
        },
        "quote_provider": {
            "configured": state.config.finnhub_api_key.is_some()
        },
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
