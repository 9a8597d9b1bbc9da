use bytes::Bytes;
use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// A compressed frame ready to be sent to viewers.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedFrame {
    pub data: Bytes,
    pub index: usize,
}

/// Compresses annotated frames for transmission.
pub trait FrameEncoder: Send {
    fn encode(&mut self, frame: &Frame) -> Result<EncodedFrame, EncodeError>;

    /// MIME type of the encoded payload.
    fn content_type(&self) -> &'static str;
}
