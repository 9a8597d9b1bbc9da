use std::sync::{Arc, Mutex};

use crate::emotion::domain::emotion_label::EmotionLabel;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// One face found and classified by an [`EmotionEngine`].
#[derive(Clone, Debug, PartialEq)]
pub struct FaceAnalysis {
    /// Face location in the coordinates of the analysed frame.
    pub region: BoundingBox,
    pub dominant_emotion: EmotionLabel,
}

/// Face analysis capability: locate faces in an image and label each one.
///
/// With `enforce_detection` off, an implementation must treat an image
/// with no detectable face as a single face covering the whole image.
pub trait EmotionEngine: Send {
    fn analyze(
        &mut self,
        frame: &Frame,
        enforce_detection: bool,
    ) -> Result<Vec<FaceAnalysis>, Box<dyn std::error::Error>>;
}

/// An engine shared by the ML face detector and the emotion classifier.
///
/// Both run on the pipeline thread, so the lock is never contended.
pub type SharedEngine = Arc<Mutex<dyn EmotionEngine>>;

pub fn share<E: EmotionEngine + 'static>(engine: E) -> SharedEngine {
    Arc::new(Mutex::new(engine))
}

/// Runs `analyze` on a shared engine, mapping lock poisoning to an error.
pub fn analyze_shared(
    engine: &SharedEngine,
    frame: &Frame,
    enforce_detection: bool,
) -> Result<Vec<FaceAnalysis>, Box<dyn std::error::Error>> {
    let mut guard = engine
        .lock()
        .map_err(|_| "emotion engine lock poisoned")?;
    guard.analyze(frame, enforce_detection)
}
