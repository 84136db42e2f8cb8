//! HTTP surface: label normalization, voice analysis and recommendations.

mod handlers;

use crate::emotion::RuleBasedAnalyzer;
use crate::pipeline::EmotionPipeline;
use crate::recommend::{MusicSearch, OfflineSearch, Recommender};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use handlers::{ApiError, PROCESS_CONFIDENCE, VOICE_CONFIDENCE};

const LOG_TARGET: &str = "api";

pub const SERVICE_NAME: &str = "emotion-aware-music-recommender";
/// API contract version reported by `GET /`; independent of the crate version.
pub const API_VERSION: &str = "1.0.0";
/// Uploads larger than this are rejected before analysis.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: EmotionPipeline<RuleBasedAnalyzer>,
    pub recommender: Recommender<Arc<dyn MusicSearch>>,
}

impl AppState {
    pub fn new(search: Arc<dyn MusicSearch>) -> Self {
        Self {
            pipeline: EmotionPipeline::default(),
            recommender: Recommender::new(search),
        }
    }

    /// Recommendations always come from the static catalog.
    pub fn offline() -> Self {
        Self::new(Arc::new(OfflineSearch::new()))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/health", get(handlers::health))
        .route("/api/process-emotion", post(handlers::process_emotion))
        .route("/api/analyze-voice", post(handlers::analyze_voice))
        .route("/api/recommend-music", post(handlers::recommend_music))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(target: LOG_TARGET, %addr, "listening");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(target: LOG_TARGET, error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!(target: LOG_TARGET, "shutting down");
}
