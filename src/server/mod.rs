//! HTTP surface for the recommender.
//!
//! Routes:
//! - `GET /` plain-text banner
//! - `GET /health` readiness and catalog size
//! - `GET|POST /predict/recommend` ranked products for `{query, top_n?}`

pub mod handlers;
pub mod types;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::{Extension, Router};
use std::sync::Arc;
use tracing::info;

use crate::config::ServerConfig;
use crate::product_recommender::ProductRecommender;
use handlers::{handle_health, handle_home, handle_recommend_get, handle_recommend_post};

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<ProductRecommender>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(recommender: Arc<ProductRecommender>, config: ServerConfig) -> Self {
        Self {
            recommender,
            config,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_home))
        .route("/health", get(handle_health))
        .route(
            "/predict/recommend",
            get(handle_recommend_get).post(handle_recommend_post),
        )
        .layer(Extension(state))
}

/// Serves until Ctrl+C.
pub async fn serve(state: AppState) -> Result<()> {
    let addr = state.config.bind_addr;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated unexpectedly")?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
