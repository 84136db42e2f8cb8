use super::{AppState, API_VERSION, LOG_TARGET, SERVICE_NAME};
use crate::emotion::Emotion;
use crate::recommend::Recommendation;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

pub const PROCESS_CONFIDENCE: f64 = 0.85;
pub const VOICE_CONFIDENCE: f64 = 0.80;

const AUDIO_FIELD: &str = "audio";
const DEFAULT_SOURCE: &str = "face";
const AVAILABLE_ENDPOINTS: [&str; 4] = [
    "/api/health",
    "/api/process-emotion",
    "/api/analyze-voice",
    "/api/recommend-music",
];

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("No audio file provided")]
    MissingAudio,

    #[error(transparent)]
    InvalidJson(#[from] JsonRejection),

    #[error(transparent)]
    Multipart(#[from] MultipartError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingAudio => StatusCode::BAD_REQUEST,
            ApiError::InvalidJson(e) => e.status(),
            ApiError::Multipart(e) => e.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(target: LOG_TARGET, error = %self, "request failed");
        } else {
            tracing::debug!(target: LOG_TARGET, error = %self, %status, "rejected request");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub(super) async fn index() -> Json<Value> {
    Json(json!({
        "message": "Emotion-Aware Music Recommender API",
        "version": API_VERSION,
        "endpoints": {
            "health": "/api/health",
            "process_emotion": "/api/process-emotion (POST)",
            "analyze_voice": "/api/analyze-voice (POST)",
            "recommend_music": "/api/recommend-music (POST)"
        },
        "status": "running"
    }))
}

pub(super) async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

pub(super) async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "message": "The requested endpoint does not exist. Check /api/health for available endpoints.",
            "available_endpoints": AVAILABLE_ENDPOINTS,
        })),
    )
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ProcessEmotionRequest {
    #[serde(default)]
    emotion: Option<String>,
    #[serde(default)]
    source: Option<Value>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProcessEmotionResponse {
    processed_emotion: Emotion,
    source: Value,
    confidence: f64,
}

pub(super) async fn process_emotion(
    State(state): State<AppState>,
    body: Result<Json<ProcessEmotionRequest>, JsonRejection>,
) -> Result<Json<ProcessEmotionResponse>, ApiError> {
    let Json(request) = body?;
    let processed_emotion = state.pipeline.resolve_label(request.emotion.as_deref());
    Ok(Json(ProcessEmotionResponse {
        processed_emotion,
        source: request.source.unwrap_or_else(|| Value::from(DEFAULT_SOURCE)),
        confidence: PROCESS_CONFIDENCE,
    }))
}

#[derive(Debug, Serialize)]
pub(super) struct AnalyzeVoiceResponse {
    emotion: Emotion,
    confidence: f64,
}

pub(super) async fn analyze_voice(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeVoiceResponse>, ApiError> {
    let multipart = multipart.map_err(|_| ApiError::MissingAudio)?;
    let (audio, extension) = read_audio_field(multipart)
        .await?
        .ok_or(ApiError::MissingAudio)?;
    let emotion = state.pipeline.analyze_voice(audio, extension).await;
    Ok(Json(AnalyzeVoiceResponse {
        emotion,
        confidence: VOICE_CONFIDENCE,
    }))
}

/// First `audio` field, with the upload's file extension as a format hint.
async fn read_audio_field(
    mut multipart: Multipart,
) -> Result<Option<(Bytes, Option<String>)>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let extension = field
            .file_name()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let bytes = field.bytes().await?;
        return Ok(Some((bytes, extension)));
    }
    Ok(None)
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RecommendRequest {
    #[serde(default)]
    emotion: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct RecommendResponse {
    emotion: String,
    recommendations: Vec<Recommendation>,
}

/// Echoes the requested label as sent; recommendations follow its normalized form.
pub(super) async fn recommend_music(
    State(state): State<AppState>,
    body: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let Json(request) = body?;
    let emotion = request
        .emotion
        .unwrap_or_else(|| Emotion::Neutral.as_str().to_owned());
    let (_, recommendations) = state.recommender.recommend_label(&emotion).await;
    Ok(Json(RecommendResponse {
        emotion,
        recommendations,
    }))
}
