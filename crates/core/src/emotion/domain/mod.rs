pub mod emotion_classifier;
pub mod emotion_engine;
pub mod emotion_label;
