//! Face localisation strategy, chosen once at startup.
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::engine_face_detector::EngineFaceDetector;
use crate::detection::infrastructure::haar_cascade_detector::HaarCascadeDetector;
use crate::emotion::domain::emotion_engine::SharedEngine;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Either the fast geometric detector or the engine-backed fallback.
pub enum FaceLocator {
    Geometric(HaarCascadeDetector),
    MlFallback(EngineFaceDetector),
}

impl FaceLocator {
    /// Uses the cascade at `cascade_path` when it loads, otherwise the
    /// engine's own face analysis.
    pub fn select(cascade_path: Option<&Path>, engine: SharedEngine) -> Self {
        let Some(path) = cascade_path else {
            log::warn!("No Haar cascade found; using the emotion engine to locate faces");
            return FaceLocator::MlFallback(EngineFaceDetector::new(engine));
        };

        match HaarCascadeDetector::from_file(path) {
            Ok(detector) => FaceLocator::Geometric(detector),
            Err(e) => {
                log::warn!(
                    "Haar cascade {} unusable ({e}); using the emotion engine to locate faces",
                    path.display()
                );
                FaceLocator::MlFallback(EngineFaceDetector::new(engine))
            }
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        match self {
            FaceLocator::Geometric(_) => "haar-cascade",
            FaceLocator::MlFallback(_) => "emotion-engine",
        }
    }

    /// Face boxes that lie fully inside `frame`.
    ///
    /// Detector errors are logged and yield no faces.
    pub fn locate(&mut self, frame: &Frame) -> Vec<BoundingBox> {
        let detector: &mut dyn FaceDetector = match self {
            FaceLocator::Geometric(d) => d,
            FaceLocator::MlFallback(d) => d,
        };

        let boxes = match detector.detect(frame) {
            Ok(boxes) => boxes,
            Err(e) => {
                log::warn!("Face detection failed on frame {}: {e}", frame.index());
                return Vec::new();
            }
        };

        boxes
            .into_iter()
            .filter(|b| {
                let ok = b.fits(frame.width(), frame.height());
                if !ok {
                    log::debug!("Discarding out-of-frame face box {b:?}");
                }
                ok
            })
            .collect()
    }
}
