use crate::detection::domain::face_detector::FaceDetector;
use crate::emotion::domain::emotion_engine::{analyze_shared, SharedEngine};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Face detector that borrows the emotion engine's own face analysis.
///
/// Used when no geometric detector could be loaded. Runs with detection
/// enforcement off, so a frame without a face may yield a single
/// whole-frame region.
pub struct EngineFaceDetector {
    engine: SharedEngine,
}

impl EngineFaceDetector {
    pub fn new(engine: SharedEngine) -> Self {
        Self { engine }
    }
}

impl FaceDetector for EngineFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        Ok(analyze_shared(&self.engine, frame, false)?
            .into_iter()
            .map(|analysis| analysis.region)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::domain::emotion_engine::{share, EmotionEngine, FaceAnalysis};
    use crate::emotion::domain::emotion_label::EmotionLabel;

    struct TwoFaces;

    impl EmotionEngine for TwoFaces {
        fn analyze(
            &mut self,
            _frame: &Frame,
            enforce_detection: bool,
        ) -> Result<Vec<FaceAnalysis>, Box<dyn std::error::Error>> {
            assert!(!enforce_detection);
            Ok(vec![
                FaceAnalysis {
                    region: BoundingBox::new(1, 2, 3, 4),
                    dominant_emotion: EmotionLabel::Sad,
                },
                FaceAnalysis {
                    region: BoundingBox::new(5, 6, 7, 8),
                    dominant_emotion: EmotionLabel::Fear,
                },
            ])
        }
    }

    #[test]
    fn test_returns_engine_regions() {
        let mut detector = EngineFaceDetector::new(share(TwoFaces));
        let boxes = detector
            .detect(&Frame::filled(16, 16, [0, 0, 0], 0))
            .unwrap();
        assert_eq!(
            boxes,
            vec![BoundingBox::new(1, 2, 3, 4), BoundingBox::new(5, 6, 7, 8)]
        );
    }
}
