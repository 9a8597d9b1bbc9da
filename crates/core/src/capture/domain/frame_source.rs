use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to open capture source {source_name}: {reason}")]
    Open { source_name: String, reason: String },
    #[error("failed to read frame: {0}")]
    Read(String),
    #[error("capture source reached end of stream")]
    EndOfStream,
}

/// Produces frames from a live capture device or stream.
///
/// Owned exclusively by the frame pipeline; never shared with request
/// handlers. Any error is terminal for the pipeline.
pub trait FrameSource: Send {
    /// Blocks until the next frame is available.
    fn read(&mut self) -> Result<Frame, CaptureError>;

    /// Dimensions of the frames this source produces.
    fn resolution(&self) -> (u32, u32);
}
