use image::{GrayImage, RgbImage};
use ndarray::ArrayView3;

use crate::shared::bounding_box::BoundingBox;

/// A single captured frame: contiguous RGB bytes in row-major order.
///
/// Owned by exactly one pipeline iteration; dropped after encoding.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

pub const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// A frame filled with a single color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], index: usize) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * CHANNELS)
            .collect();
        Self::new(data, width, height, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// `(height, width, channel)` view, as the ONNX preprocessors index it.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Luminance-only copy (ITU-R 601 weights, as used by `image`).
    pub fn to_luma(&self) -> GrayImage {
        let mut gray = GrayImage::new(self.width, self.height);
        for (dst, px) in gray.iter_mut().zip(self.data.chunks_exact(CHANNELS)) {
            let l = 299 * px[0] as u32 + 587 * px[1] as u32 + 114 * px[2] as u32;
            *dst = ((l + 500) / 1000) as u8;
        }
        gray
    }

    /// Copies the pixels under `bbox` into a new frame with the same index.
    ///
    /// The box must already be valid for this frame.
    pub fn crop(&self, bbox: &BoundingBox) -> Frame {
        let x = bbox.x as usize;
        let y = bbox.y as usize;
        let w = bbox.width as usize;
        let h = bbox.height as usize;
        let stride = self.width as usize * CHANNELS;

        let mut data = Vec::with_capacity(w * h * CHANNELS);
        for row in y..y + h {
            let start = row * stride + x * CHANNELS;
            data.extend_from_slice(&self.data[start..start + w * CHANNELS]);
        }
        Frame::new(data, w as u32, h as u32, self.index)
    }

    /// Lends the pixel buffer to `f` as an [`RgbImage`] for drawing.
    pub fn with_rgb_image<R>(&mut self, f: impl FnOnce(&mut RgbImage) -> R) -> R {
        let data = std::mem::take(&mut self.data);
        let mut img = RgbImage::from_raw(self.width, self.height, data)
            .expect("Frame data length must match dimensions");
        let result = f(&mut img);
        self.data = img.into_raw();
        result
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}
