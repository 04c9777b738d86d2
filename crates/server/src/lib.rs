pub mod config;
pub mod engine;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::engine::EngineAdapter;

/// Build the application router with its shared state.
pub fn build_router(config: Config) -> Router {
    let adapter = Arc::new(EngineAdapter::from_config(&config));

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        // Analysis
        .route(
            "/api/stockfish_eval",
            get(routes::analyze::stockfish_eval).post(routes::analyze::stockfish_eval),
        )
        // Shared state
        .layer(Extension(adapter))
        .layer(Extension(config))
        .layer(cors)
}

/// Serve the router on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, config: Config, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(config))
        .with_graceful_shutdown(shutdown)
        .await
}
