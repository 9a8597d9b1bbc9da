use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use thiserror::Error;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::capture::domain::frame_source::{CaptureError, FrameSource};
use crate::control::stream_controller::StreamController;
use crate::detection::domain::detected_face::DetectedFace;
use crate::detection::face_locator::FaceLocator;
use crate::emotion::domain::emotion_classifier::{ClassificationOutcome, EmotionClassifier};
use crate::emotion::domain::emotion_label::EmotionLabel;
use crate::shared::frame::Frame;
use crate::streaming::domain::frame_encoder::FrameEncoder;
use crate::streaming::frame_broadcaster::FrameSink;
use crate::streaming::multipart;

use super::pipeline_logger::PipelineLogger;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("frame pipeline crashed: {0}")]
    Panicked(String),
}

/// Everything one iteration produced.
#[derive(Debug)]
pub struct ProcessedFrame {
    pub outcomes: Vec<ClassificationOutcome>,
    /// Multipart chunk for viewers; `None` when encoding failed.
    pub chunk: Option<Bytes>,
}

impl ProcessedFrame {
    /// Labels of the successfully classified faces, in detection order.
    pub fn labels(&self) -> Vec<EmotionLabel> {
        self.outcomes.iter().filter_map(|o| o.label()).collect()
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// The capture → detect → classify → annotate → encode loop.
///
/// Owns every stage exclusively; runs on its own thread.
pub struct FramePipeline {
    source: Box<dyn FrameSource>,
    locator: FaceLocator,
    classifier: EmotionClassifier,
    annotator: Box<dyn FrameAnnotator>,
    encoder: Box<dyn FrameEncoder>,
    logger: Box<dyn PipelineLogger>,
}

impl FramePipeline {
    pub fn new(
        source: Box<dyn FrameSource>,
        locator: FaceLocator,
        classifier: EmotionClassifier,
        annotator: Box<dyn FrameAnnotator>,
        encoder: Box<dyn FrameEncoder>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            source,
            locator,
            classifier,
            annotator,
            encoder,
            logger,
        }
    }

    /// Detects, classifies, annotates and encodes one frame.
    ///
    /// Never fails: detector errors yield no faces, classifier errors
    /// become [`ClassificationOutcome::Failed`], encoder errors drop the
    /// chunk.
    pub fn process_frame(&mut self, mut frame: Frame) -> ProcessedFrame {
        let t = Instant::now();
        let faces: Vec<DetectedFace> = self
            .locator
            .locate(&frame)
            .into_iter()
            .filter_map(|bbox| DetectedFace::crop(&frame, bbox))
            .collect();
        self.logger.timing("detect", elapsed_ms(t));
        self.logger.metric("faces", faces.len() as f64);

        let t = Instant::now();
        let outcomes: Vec<ClassificationOutcome> = faces
            .iter()
            .map(|face| {
                let outcome = self.classifier.outcome(face);
                if let ClassificationOutcome::Failed { face, reason } = &outcome {
                    log::warn!(
                        "Emotion classification failed for face at ({}, {}) on frame {}: {reason}",
                        face.x,
                        face.y,
                        frame.index()
                    );
                }
                outcome
            })
            .collect();
        self.logger.timing("classify", elapsed_ms(t));

        let t = Instant::now();
        self.annotator.annotate(&mut frame, &outcomes);
        self.logger.timing("annotate", elapsed_ms(t));

        let t = Instant::now();
        let chunk = match self.encoder.encode(&frame) {
            Ok(encoded) => {
                log::trace!("Encoded frame {} ({} bytes)", encoded.index, encoded.data.len());
                Some(multipart::chunk(&encoded.data, self.encoder.content_type()))
            }
            Err(e) => {
                log::warn!("Dropping frame {}: {e}", frame.index());
                None
            }
        };
        self.logger.timing("encode", elapsed_ms(t));

        let processed = ProcessedFrame { outcomes, chunk };
        self.logger.metric("labels", processed.labels().len() as f64);
        processed
    }

    /// Runs until the controller shuts down or capture fails.
    ///
    /// On capture failure, or a panic in any stage, the controller is
    /// marked failed, the sink is closed and the error is returned. The
    /// sink is also closed on a clean shutdown.
    pub fn run(
        &mut self,
        controller: &StreamController,
        sink: &dyn FrameSink,
    ) -> Result<(), PipelineError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.run_loop(controller, sink))) {
            Ok(result) => result,
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                log::error!("Frame pipeline panicked: {reason}");
                controller.mark_failed(format!("frame pipeline crashed: {reason}"));
                sink.close();
                Err(PipelineError::Panicked(reason))
            }
        }
    }

    fn run_loop(
        &mut self,
        controller: &StreamController,
        sink: &dyn FrameSink,
    ) -> Result<(), PipelineError> {
        self.logger.info(&format!(
            "Frame pipeline ready ({}x{}, faces via {})",
            self.source.resolution().0,
            self.source.resolution().1,
            self.locator.strategy_name()
        ));

        let mut frames = 0usize;
        while controller.wait_until_streaming() {
            let t = Instant::now();
            let frame = match self.source.read() {
                Ok(frame) => frame,
                Err(e) => {
                    controller.mark_failed(e.to_string());
                    sink.close();
                    self.logger.summary();
                    return Err(e.into());
                }
            };
            self.logger.timing("capture", elapsed_ms(t));

            let processed = self.process_frame(frame);
            controller.publish_emotions(processed.labels());
            if let Some(chunk) = processed.chunk {
                sink.emit(chunk);
            }

            frames += 1;
            self.logger.progress(frames);
        }

        self.logger.info(&format!("Frame pipeline stopped after {frames} frames"));
        self.logger.summary();
        sink.close();
        Ok(())
    }

    /// Moves the pipeline onto a dedicated thread.
    pub fn spawn(
        mut self,
        controller: Arc<StreamController>,
        sink: Arc<dyn FrameSink>,
    ) -> std::io::Result<std::thread::JoinHandle<Result<(), PipelineError>>> {
        std::thread::Builder::new()
            .name("frame-pipeline".to_string())
            .spawn(move || self.run(&controller, sink.as_ref()))
    }
}
