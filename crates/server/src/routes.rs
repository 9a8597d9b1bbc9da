//! HTTP routes: viewer page, MJPEG feed and stream control.
use std::convert::Infallible;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::json;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use emotion_stream_core::emotion::domain::emotion_label::EmotionLabel;
use emotion_stream_core::streaming::multipart;

use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../static/index.html");
const SCRIPTS_JS: &str = include_str!("../static/js/scripts.js");

#[derive(Serialize)]
struct EmotionsResponse {
    emotions: Vec<EmotionLabel>,
}

#[derive(Serialize)]
struct StatusResponse {
    streaming: bool,
    failure: Option<String>,
    viewers: usize,
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/static/js/scripts.js", get(scripts))
        .route("/video_feed", get(video_feed))
        .route("/start", post(start_stream))
        .route("/stop", post(stop_stream))
        .route("/emotions", get(emotions))
        .route("/status", get(status))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn scripts() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript")], SCRIPTS_JS)
}

/// Endless multipart stream of annotated JPEG frames.
///
/// Ends when the pipeline stops for good; a viewer that falls behind
/// skips frames.
async fn video_feed(State(state): State<AppState>) -> impl IntoResponse {
    let frames = BroadcastStream::new(state.broadcaster.subscribe()).filter_map(|item| match item {
        Ok(chunk) => Some(Ok::<Bytes, Infallible>(chunk)),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            log::debug!("Viewer lagged, skipped {skipped} frames");
            None
        }
    });
    log::info!(
        "Viewer connected ({} watching)",
        state.broadcaster.receiver_count()
    );

    (
        [
            (header::CONTENT_TYPE, multipart::content_type()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        Body::from_stream(frames),
    )
}

async fn start_stream(State(state): State<AppState>) -> Response {
    match state.controller.start() {
        Ok(()) => Json(json!({ "status": "Stream started" })).into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "Stream unavailable", "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn stop_stream(State(state): State<AppState>) -> impl IntoResponse {
    state.controller.stop();
    Json(json!({ "status": "Stream stopped" }))
}

async fn emotions(State(state): State<AppState>) -> impl IntoResponse {
    Json(EmotionsResponse {
        emotions: state.controller.emotions(),
    })
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        streaming: state.controller.is_streaming(),
        failure: state.controller.failure(),
        viewers: state.broadcaster.receiver_count(),
    })
}
