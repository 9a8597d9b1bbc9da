mod routes;
mod state;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;

use emotion_stream_core::annotation::infrastructure::box_label_annotator::BoxLabelAnnotator;
use emotion_stream_core::capture::infrastructure::ffmpeg_capture_source::{
    CaptureTarget, FfmpegCaptureSource,
};
use emotion_stream_core::control::stream_controller::StreamController;
use emotion_stream_core::detection::face_locator::FaceLocator;
use emotion_stream_core::emotion::domain::emotion_classifier::EmotionClassifier;
use emotion_stream_core::emotion::domain::emotion_engine::{share, SharedEngine};
use emotion_stream_core::emotion::infrastructure::onnx_emotion_engine::OnnxEmotionEngine;
use emotion_stream_core::pipeline::frame_pipeline::FramePipeline;
use emotion_stream_core::pipeline::pipeline_logger::LogPipelineLogger;
use emotion_stream_core::shared::constants::{
    CASCADE_FILE_NAME, DEFAULT_BROADCAST_CAPACITY, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH,
    DEFAULT_JPEG_QUALITY, EMOTION_MODEL_NAME, EMOTION_MODEL_URL, FACE_MODEL_NAME,
};
use emotion_stream_core::shared::model_resolver;
use emotion_stream_core::streaming::frame_broadcaster::{FrameBroadcaster, FrameSink};
use emotion_stream_core::streaming::infrastructure::jpeg_frame_encoder::JpegFrameEncoder;

use crate::state::AppState;

/// Streams a camera feed with detected faces labelled by emotion.
#[derive(Parser, Debug)]
#[command(name = "emotion-stream")]
struct Cli {
    /// Camera index to capture from.
    #[arg(long, default_value_t = 0)]
    device: u32,

    /// File or stream URL to read instead of a camera.
    #[arg(long)]
    source: Option<String>,

    /// Capture width in pixels.
    #[arg(long, default_value_t = DEFAULT_FRAME_WIDTH)]
    width: u32,

    /// Capture height in pixels.
    #[arg(long, default_value_t = DEFAULT_FRAME_HEIGHT)]
    height: u32,

    /// Haar cascade XML (default: haarcascade_frontalface_default.xml from
    /// the model cache, --models-dir or the working directory).
    #[arg(long)]
    cascade: Option<PathBuf>,

    /// FER+ emotion model (downloaded to the model cache if omitted).
    #[arg(long)]
    emotion_model: Option<PathBuf>,

    /// BlazeFace model used to find faces when no cascade is available.
    #[arg(long)]
    face_model: Option<PathBuf>,

    /// Directory searched for bundled models.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// JPEG quality for streamed frames (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
    jpeg_quality: u8,

    /// Address to serve HTTP on.
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Frames buffered per viewer before a slow viewer skips ahead.
    #[arg(long, default_value_t = DEFAULT_BROADCAST_CAPACITY)]
    broadcast_capacity: usize,

    /// Start streaming immediately instead of waiting for POST /start.
    #[arg(long)]
    autostart: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let target = match &cli.source {
        Some(url) => CaptureTarget::Url(url.clone()),
        None => CaptureTarget::Device(cli.device),
    };
    let source = FfmpegCaptureSource::open(&target, cli.width, cli.height)?;

    let engine = build_engine(&cli)?;
    let cascade = model_resolver::locate(
        CASCADE_FILE_NAME,
        cli.cascade.as_deref(),
        model_resolver::model_cache_dir().ok().as_deref(),
        cli.models_dir.as_deref(),
    );
    let locator = FaceLocator::select(cascade.as_deref(), engine.clone());

    let pipeline = FramePipeline::new(
        Box::new(source),
        locator,
        EmotionClassifier::new(engine),
        Box::new(BoxLabelAnnotator::default()),
        Box::new(JpegFrameEncoder::new(cli.jpeg_quality)),
        Box::new(LogPipelineLogger::default()),
    );

    let controller = Arc::new(StreamController::new());
    let broadcaster = Arc::new(FrameBroadcaster::new(cli.broadcast_capacity));
    if cli.autostart {
        controller.start()?;
    }

    let pipeline_handle = pipeline.spawn(controller.clone(), broadcaster.clone())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let served = runtime.block_on(serve(cli.bind, AppState::new(controller.clone(), broadcaster)));

    controller.shutdown();
    match pipeline_handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::warn!("Frame pipeline ended with error: {e}"),
        Err(_) => return Err("frame pipeline thread panicked".into()),
    }
    served
}

async fn serve(bind: SocketAddr, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    let on_shutdown = state.clone();
    axum::serve(listener, routes::create_router(state))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {e}");
            }
            log::info!("Shutting down");
            on_shutdown.controller.shutdown();
            // Open /video_feed responses only finish once the feed closes.
            on_shutdown.broadcaster.close();
        })
        .await?;
    Ok(())
}

fn build_engine(cli: &Cli) -> Result<SharedEngine, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {EMOTION_MODEL_NAME}");
    let emotion_model = model_resolver::resolve(
        EMOTION_MODEL_NAME,
        EMOTION_MODEL_URL,
        cli.emotion_model.as_deref(),
        cli.models_dir.as_deref(),
        Some(Box::new(download_progress)),
    )?;

    let face_model = model_resolver::locate(
        FACE_MODEL_NAME,
        cli.face_model.as_deref(),
        model_resolver::model_cache_dir().ok().as_deref(),
        cli.models_dir.as_deref(),
    );
    if face_model.is_none() {
        log::info!("No {FACE_MODEL_NAME} found; the emotion engine will analyse whole images");
    }

    Ok(share(OnnxEmotionEngine::new(
        &emotion_model,
        face_model.as_deref(),
    )?))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.width == 0 || cli.height == 0 {
        return Err(format!(
            "Resolution must be non-zero, got {}x{}",
            cli.width, cli.height
        )
        .into());
    }
    if !(1..=100).contains(&cli.jpeg_quality) {
        return Err(format!(
            "JPEG quality must be between 1 and 100, got {}",
            cli.jpeg_quality
        )
        .into());
    }
    if cli.broadcast_capacity == 0 {
        return Err("Broadcast capacity must be at least 1".into());
    }
    for (flag, path) in [
        ("--emotion-model", &cli.emotion_model),
        ("--face-model", &cli.face_model),
    ] {
        if let Some(path) = path {
            require_file(flag, path)?;
        }
    }
    if let Some(dir) = &cli.models_dir {
        if !dir.is_dir() {
            return Err(format!("Models directory not found: {}", dir.display()).into());
        }
    }
    Ok(())
}

fn require_file(flag: &str, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.is_file() {
        Ok(())
    } else {
        Err(format!("{flag} file not found: {}", path.display()).into())
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        log::info!("Downloading emotion model... {pct}%");
    } else {
        log::info!("Downloading emotion model... {downloaded} bytes");
    }
}
