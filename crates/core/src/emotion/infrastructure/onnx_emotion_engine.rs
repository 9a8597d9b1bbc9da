//! Emotion engine backed by ONNX Runtime.
//!
//! Faces are located with an optional [`FaceDetector`] (normally BlazeFace)
//! and each face is scored with the FER+ classifier.
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use thiserror::Error;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::execution_provider::preferred_execution_providers;
use crate::detection::infrastructure::onnx_blazeface_detector::{
    OnnxBlazefaceDetector, DEFAULT_CONFIDENCE,
};
use crate::emotion::domain::emotion_engine::{EmotionEngine, FaceAnalysis};
use crate::emotion::domain::emotion_label::EmotionLabel;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// FER+ input side length.
const INPUT_SIZE: u32 = 64;

/// FER+ output order.
const FERPLUS_LABELS: [EmotionLabel; 8] = [
    EmotionLabel::Neutral,
    EmotionLabel::Happy,
    EmotionLabel::Surprise,
    EmotionLabel::Sad,
    EmotionLabel::Angry,
    EmotionLabel::Disgust,
    EmotionLabel::Fear,
    EmotionLabel::Contempt,
];

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to load model {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },
    #[error("face could not be detected; disable detection enforcement to analyse the whole image")]
    NoFaceDetected,
    #[error("emotion model returned {actual} scores, expected {expected}")]
    OutputShape { expected: usize, actual: usize },
}

pub struct OnnxEmotionEngine {
    classifier: ort::session::Session,
    localizer: Option<Box<dyn FaceDetector>>,
}

impl OnnxEmotionEngine {
    /// Loads the FER+ classifier and, if given, a BlazeFace localizer.
    pub fn new(emotion_model: &Path, face_model: Option<&Path>) -> Result<Self, EngineError> {
        let classifier = load_session(emotion_model).map_err(|e| EngineError::ModelLoad {
            path: emotion_model.to_path_buf(),
            reason: e.to_string(),
        })?;

        let localizer = face_model
            .map(|path| {
                OnnxBlazefaceDetector::new(path, DEFAULT_CONFIDENCE)
                    .map(|d| Box::new(d) as Box<dyn FaceDetector>)
                    .map_err(|e| EngineError::ModelLoad {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    })
            })
            .transpose()?;

        log::info!(
            "Emotion engine ready ({}, face localizer: {})",
            emotion_model.display(),
            face_model.map_or("none".to_string(), |p| p.display().to_string())
        );

        Ok(Self {
            classifier,
            localizer,
        })
    }

    fn score(&mut self, face: &Frame) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let input = ort::value::Tensor::from_array(preprocess(face))?;
        let outputs = self.classifier.run(ort::inputs![input])?;
        let scores = outputs[0].try_extract_array::<f32>()?;
        Ok(scores.iter().copied().collect())
    }
}

impl EmotionEngine for OnnxEmotionEngine {
    fn analyze(
        &mut self,
        frame: &Frame,
        enforce_detection: bool,
    ) -> Result<Vec<FaceAnalysis>, Box<dyn std::error::Error>> {
        let located = match self.localizer.as_mut() {
            Some(localizer) => localizer.detect(frame)?,
            None => Vec::new(),
        };
        let regions = regions_to_analyse(located, frame.width(), frame.height(), enforce_detection)?;

        let mut analyses = Vec::with_capacity(regions.len());
        for region in regions {
            let scores = self.score(&frame.crop(&region))?;
            analyses.push(FaceAnalysis {
                region,
                dominant_emotion: dominant_emotion(&scores)?,
            });
        }
        Ok(analyses)
    }
}

fn load_session(path: &Path) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    Ok(ort::session::Session::builder()?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(path)?)
}

/// Keeps localized boxes that overlap the frame; falls back to the whole
/// frame when nothing was found and enforcement is off.
fn regions_to_analyse(
    located: Vec<BoundingBox>,
    width: u32,
    height: u32,
    enforce_detection: bool,
) -> Result<Vec<BoundingBox>, EngineError> {
    let regions: Vec<BoundingBox> = located
        .iter()
        .filter_map(|b| b.clip_to(width, height))
        .collect();

    if !regions.is_empty() {
        return Ok(regions);
    }
    if enforce_detection {
        return Err(EngineError::NoFaceDetected);
    }
    Ok(vec![BoundingBox::new(0, 0, width as i32, height as i32)])
}

/// Grayscale, resize to 64×64, raw 0–255 values in NCHW layout.
fn preprocess(face: &Frame) -> ndarray::Array4<f32> {
    let gray = imageops::resize(&face.to_luma(), INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
    let s = INPUT_SIZE as usize;
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 1, s, s));
    for (x, y, px) in gray.enumerate_pixels() {
        tensor[[0, 0, y as usize, x as usize]] = px.0[0] as f32;
    }
    tensor
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}

fn dominant_emotion(scores: &[f32]) -> Result<EmotionLabel, EngineError> {
    if scores.len() != FERPLUS_LABELS.len() {
        return Err(EngineError::OutputShape {
            expected: FERPLUS_LABELS.len(),
            actual: scores.len(),
        });
    }
    let probabilities = softmax(scores);
    let best = probabilities
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);
    log::trace!("FER+ probabilities: {probabilities:?}");
    Ok(FERPLUS_LABELS[best])
}
