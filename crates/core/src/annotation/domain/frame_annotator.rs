use crate::emotion::domain::emotion_classifier::ClassificationOutcome;
use crate::shared::frame::Frame;

/// Draws classification results onto a frame in place.
///
/// Only [`ClassificationOutcome::Labelled`] faces are drawn.
pub trait FrameAnnotator: Send {
    fn annotate(&self, frame: &mut Frame, outcomes: &[ClassificationOutcome]);
}
