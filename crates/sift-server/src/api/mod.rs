//! Search HTTP API
//!
//! `POST /api/search` and `GET /api/health` on localhost, behind CORS and a
//! concurrency limit.

pub mod error;
pub mod handlers;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use sift_core::SearchEngine;
use state::AppState;

/// Default port for `sift serve`
pub const DEFAULT_PORT: u16 = 3939;

/// Requests handled at once; the rest wait
pub const MAX_CONCURRENT_REQUESTS: usize = 50;

/// Build the axum router with all API routes
pub fn build_router(engine: Arc<SearchEngine>, port: u16) -> Router {
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", port),
        format!("http://localhost:{}", port),
    ]
    .iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/api/search", post(handlers::search))
        .route("/api/health", get(handlers::health_check))
        .layer(
            ServiceBuilder::new()
                .concurrency_limit(MAX_CONCURRENT_REQUESTS)
                .layer(cors),
        )
        .with_state(AppState::new(engine))
}

/// Serve the API until the process is stopped
pub async fn serve(engine: Arc<SearchEngine>, port: u16) -> std::io::Result<()> {
    let app = build_router(engine, port);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Search API listening at http://{}", addr);

    axum::serve(listener, app).await
}
