//! Multi-scale Haar cascade face detector backed by OpenCV's
//! `CascadeClassifier`.
use std::path::{Path, PathBuf};

use opencv::core::{Mat, Rect, Size, Vector};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use thiserror::Error;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::{CASCADE_MIN_NEIGHBORS, CASCADE_MIN_SIZE, CASCADE_SCALE_FACTOR};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CascadeLoadError {
    #[error("cascade path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),
    #[error("failed to load Haar cascade: {0}")]
    OpenCv(#[from] opencv::Error),
    #[error("Haar cascade {0} contains no classifier")]
    Empty(PathBuf),
}

/// `detectMultiScale` search parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct CascadeParams {
    pub scale_factor: f64,
    /// Neighbouring hits a face needs to be reported.
    pub min_neighbors: i32,
    /// Smallest window side in frame pixels.
    pub min_size: u32,
    /// Largest window side in frame pixels; `None` is unbounded.
    pub max_size: Option<u32>,
}

impl Default for CascadeParams {
    fn default() -> Self {
        Self {
            scale_factor: CASCADE_SCALE_FACTOR,
            min_neighbors: CASCADE_MIN_NEIGHBORS,
            min_size: CASCADE_MIN_SIZE,
            max_size: None,
        }
    }
}

/// Geometric face detector.
pub struct HaarCascadeDetector {
    classifier: CascadeClassifier,
    params: CascadeParams,
}

impl HaarCascadeDetector {
    /// Loads an OpenCV cascade XML file with default search parameters.
    pub fn from_file(path: &Path) -> Result<Self, CascadeLoadError> {
        Self::with_params(path, CascadeParams::default())
    }

    pub fn with_params(path: &Path, params: CascadeParams) -> Result<Self, CascadeLoadError> {
        let name = path
            .to_str()
            .ok_or_else(|| CascadeLoadError::NonUtf8Path(path.to_path_buf()))?;
        let classifier = CascadeClassifier::new(name)?;
        if classifier.empty()? {
            return Err(CascadeLoadError::Empty(path.to_path_buf()));
        }

        log::info!(
            "Loaded Haar cascade {} (scale {}, neighbours {}, min size {})",
            path.display(),
            params.scale_factor,
            params.min_neighbors,
            params.min_size
        );
        Ok(Self { classifier, params })
    }
}

impl FaceDetector for HaarCascadeDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        let luma = frame.to_luma();
        let flat = Mat::from_slice(luma.as_raw())?;
        let gray = flat.reshape(1, frame.height() as i32)?;

        let min = self.params.min_size as i32;
        let max = self.params.max_size.map_or(0, |m| m as i32);
        let mut faces = Vector::<Rect>::new();
        self.classifier.detect_multi_scale(
            &gray,
            &mut faces,
            self.params.scale_factor,
            self.params.min_neighbors,
            0,
            Size::new(min, min),
            Size::new(max, max),
        )?;

        log::debug!("Cascade frame {}: {} faces", frame.index(), faces.len());
        Ok(faces
            .iter()
            .map(|r| BoundingBox::new(r.x, r.y, r.width, r.height))
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// One-stage cascade with a single stump over a 24×24 window that fires
    /// when the bottom half is clearly brighter than the top half.
    pub(crate) const TOP_DARK_CASCADE: &str = r#"<?xml version="1.0"?>
<opencv_storage>
<cascade type_id="opencv-cascade-classifier"><stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>24</height>
  <width>24</width>
  <stageParams><maxWeakCount>1</maxWeakCount></stageParams>
  <featureParams><maxCatCount>0</maxCatCount></featureParams>
  <stageNum>1</stageNum>
  <stages>
    <_>
      <maxWeakCount>1</maxWeakCount>
      <stageThreshold>0.</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>
            0 -1 0 1.0000000000000001e-01</internalNodes>
          <leafValues>
            -1. 1.</leafValues></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>
        <_>
          0 0 24 24 -1.</_>
        <_>
          0 12 24 12 2.</_></rects></_></features></cascade>
</opencv_storage>
"#;

    /// Side of the dark-over-bright squares the synthetic cascade finds.
    pub(crate) const PATTERN: u32 = 24;

    /// Writes [`TOP_DARK_CASCADE`] into `dir`.
    pub(crate) fn write_cascade(dir: &Path) -> PathBuf {
        let path = dir.join("top_dark.xml");
        std::fs::write(&path, TOP_DARK_CASCADE).unwrap();
        path
    }

    /// Search window bounds that keep the synthetic cascade near pattern scale.
    pub(crate) fn pattern_params() -> CascadeParams {
        CascadeParams {
            min_size: PATTERN,
            max_size: Some(30),
            ..CascadeParams::default()
        }
    }

    /// Paints each `(corner, dark, bright)` square: top half `dark`,
    /// bottom half `bright`.
    pub(crate) fn paint_patterns(frame: &mut Frame, patterns: &[((u32, u32), [u8; 3], [u8; 3])]) {
        frame.with_rgb_image(|img| {
            for &((px, py), dark, bright) in patterns {
                for y in py..py + PATTERN {
                    let color = if y - py < PATTERN / 2 { dark } else { bright };
                    for x in px..px + PATTERN {
                        img.put_pixel(x, y, image::Rgb(color));
                    }
                }
            }
        });
    }

    pub(crate) fn center(b: &BoundingBox) -> (f64, f64) {
        (
            b.x as f64 + b.width as f64 / 2.0,
            b.y as f64 + b.height as f64 / 2.0,
        )
    }

    /// True when `b` is centred within a quarter-window of the pattern at `corner`.
    pub(crate) fn near_pattern(b: &BoundingBox, corner: (u32, u32)) -> bool {
        let (cx, cy) = center(b);
        let ex = (corner.0 + PATTERN / 2) as f64;
        let ey = (corner.1 + PATTERN / 2) as f64;
        (cx - ex).abs() <= 12.0 && (cy - ey).abs() <= 12.0
    }

    fn gray_patterns(corners: &[(u32, u32)]) -> Frame {
        let mut frame = Frame::filled(640, 480, [128, 128, 128], 0);
        let patterns: Vec<_> = corners
            .iter()
            .map(|&c| (c, [40, 40, 40], [220, 220, 220]))
            .collect();
        paint_patterns(&mut frame, &patterns);
        frame
    }

    fn synthetic_detector(dir: &Path, params: CascadeParams) -> HaarCascadeDetector {
        HaarCascadeDetector::with_params(&write_cascade(dir), params).unwrap()
    }

    #[test]
    fn test_detects_two_synthetic_faces_near_known_positions() {
        let dir = tempfile::tempdir().unwrap();
        let corners = [(100, 100), (400, 200)];
        let frame = gray_patterns(&corners);
        let mut detector = synthetic_detector(dir.path(), pattern_params());

        let mut faces = detector.detect(&frame).unwrap();
        faces.sort_by_key(|b| b.x);

        assert_eq!(faces.len(), 2, "faces: {faces:?}");
        for (face, &corner) in faces.iter().zip(&corners) {
            assert!(near_pattern(face, corner), "face {face:?} too far from {corner:?}");
            assert!(face.fits(frame.width(), frame.height()));
        }
    }

    #[test]
    fn test_flat_frame_has_no_faces() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Frame::filled(320, 240, [128, 128, 128], 0);
        let mut detector = synthetic_detector(dir.path(), pattern_params());
        assert!(detector.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_min_size_larger_than_frame_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let frame = gray_patterns(&[(100, 100)]);
        let mut detector = synthetic_detector(
            dir.path(),
            CascadeParams {
                min_size: 1000,
                ..CascadeParams::default()
            },
        );
        assert!(detector.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_frame_smaller_than_window_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Frame::filled(10, 10, [128, 128, 128], 0);
        let mut detector = synthetic_detector(dir.path(), pattern_params());
        assert!(detector.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_default_params() {
        let params = CascadeParams::default();
        assert_eq!(params.scale_factor, 1.1);
        assert_eq!(params.min_neighbors, 5);
        assert_eq!(params.min_size, 30);
        assert_eq!(params.max_size, None);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(HaarCascadeDetector::from_file(Path::new("/nonexistent/cascade.xml")).is_err());
    }

    #[test]
    fn test_storage_without_cascade_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.xml");
        std::fs::write(
            &path,
            "<?xml version=\"1.0\"?>\n<opencv_storage>\n<answer>42</answer>\n</opencv_storage>\n",
        )
        .unwrap();
        assert!(HaarCascadeDetector::from_file(&path).is_err());
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xml");
        std::fs::write(&path, "<opencv_storage><cascade>").unwrap();
        assert!(HaarCascadeDetector::from_file(&path).is_err());
    }
}
