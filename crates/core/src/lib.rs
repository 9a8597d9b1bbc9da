//! Live emotion stream: capture frames, find faces, label their emotions,
//! draw the result and fan the annotated frames out to viewers.
pub mod annotation;
pub mod capture;
pub mod control;
pub mod detection;
pub mod emotion;
pub mod pipeline;
pub mod shared;
pub mod streaming;
