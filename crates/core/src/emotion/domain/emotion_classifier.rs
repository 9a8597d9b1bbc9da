use crate::detection::domain::detected_face::DetectedFace;
use crate::emotion::domain::emotion_engine::{analyze_shared, SharedEngine};
use crate::emotion::domain::emotion_label::EmotionLabel;
use crate::shared::bounding_box::BoundingBox;

/// Result of classifying one detected face.
#[derive(Clone, Debug, PartialEq)]
pub enum ClassificationOutcome {
    Labelled { face: BoundingBox, label: EmotionLabel },
    Failed { face: BoundingBox, reason: String },
}

impl ClassificationOutcome {
    pub fn label(&self) -> Option<EmotionLabel> {
        match self {
            ClassificationOutcome::Labelled { label, .. } => Some(*label),
            ClassificationOutcome::Failed { .. } => None,
        }
    }

    pub fn face(&self) -> BoundingBox {
        match self {
            ClassificationOutcome::Labelled { face, .. }
            | ClassificationOutcome::Failed { face, .. } => *face,
        }
    }
}

/// Labels cropped face regions with their dominant emotion.
///
/// The crop is assumed to already be a face, so the engine runs with
/// detection enforcement off.
pub struct EmotionClassifier {
    engine: SharedEngine,
}

impl EmotionClassifier {
    pub fn new(engine: SharedEngine) -> Self {
        Self { engine }
    }

    /// Dominant emotion of the face in `face.roi`.
    ///
    /// When the engine reports several regions inside the crop, the
    /// largest one wins.
    pub fn classify(
        &mut self,
        face: &DetectedFace,
    ) -> Result<EmotionLabel, Box<dyn std::error::Error>> {
        let analyses = analyze_shared(&self.engine, &face.roi, false)?;
        analyses
            .iter()
            .max_by_key(|a| a.region.area())
            .map(|a| a.dominant_emotion)
            .ok_or_else(|| "emotion engine returned no analysis for the face region".into())
    }

    /// Classifies `face`, folding any error into [`ClassificationOutcome::Failed`].
    pub fn outcome(&mut self, face: &DetectedFace) -> ClassificationOutcome {
        match self.classify(face) {
            Ok(label) => ClassificationOutcome::Labelled {
                face: face.bbox,
                label,
            },
            Err(e) => ClassificationOutcome::Failed {
                face: face.bbox,
                reason: e.to_string(),
            },
        }
    }
}
