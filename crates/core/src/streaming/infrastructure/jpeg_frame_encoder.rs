use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::shared::constants::DEFAULT_JPEG_QUALITY;
use crate::shared::frame::Frame;
use crate::streaming::domain::frame_encoder::{EncodeError, EncodedFrame, FrameEncoder};

/// Baseline JPEG encoder from the `image` crate.
pub struct JpegFrameEncoder {
    quality: u8,
    buffer: Vec<u8>,
}

impl JpegFrameEncoder {
    /// `quality` is clamped to 1..=100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            buffer: Vec::new(),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegFrameEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl FrameEncoder for JpegFrameEncoder {
    fn encode(&mut self, frame: &Frame) -> Result<EncodedFrame, EncodeError> {
        self.buffer.clear();
        JpegEncoder::new_with_quality(&mut self.buffer, self.quality).encode(
            frame.data(),
            frame.width(),
            frame.height(),
            ExtendedColorType::Rgb8,
        )?;
        Ok(EncodedFrame {
            data: Bytes::copy_from_slice(&self.buffer),
            index: frame.index(),
        })
    }

    fn content_type(&self) -> &'static str {
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodes_decodable_jpeg() {
        let frame = Frame::filled(32, 24, [200, 10, 10], 9);
        let encoded = JpegFrameEncoder::default().encode(&frame).unwrap();

        assert_eq!(encoded.index, 9);
        assert_eq!(&encoded.data[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&encoded.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
        let px = decoded.to_rgb8().get_pixel(16, 12).0;
        assert!(px[0] > 150 && px[1] < 60, "unexpected color {px:?}");
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let noise = (0..64 * 64 * 3).map(|i| (i * 37 % 251) as u8).collect();
        let frame = Frame::new(noise, 64, 64, 0);
        let high = JpegFrameEncoder::new(95).encode(&frame).unwrap();
        let low = JpegFrameEncoder::new(10).encode(&frame).unwrap();
        assert!(low.data.len() < high.data.len());
    }

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(JpegFrameEncoder::new(0).quality(), 1);
        assert_eq!(JpegFrameEncoder::new(255).quality(), 100);
    }
}
