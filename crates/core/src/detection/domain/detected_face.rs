use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// A validated face box together with a copy of the pixels under it.
#[derive(Clone, Debug)]
pub struct DetectedFace {
    pub bbox: BoundingBox,
    pub roi: Frame,
}

impl DetectedFace {
    /// Crops `bbox` out of `frame`, or `None` if the box does not fit.
    pub fn crop(frame: &Frame, bbox: BoundingBox) -> Option<Self> {
        if !bbox.fits(frame.width(), frame.height()) {
            return None;
        }
        Some(Self {
            bbox,
            roi: frame.crop(&bbox),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_copies_region() {
        let mut frame = Frame::filled(10, 10, [0, 0, 0], 4);
        frame.with_rgb_image(|img| img.put_pixel(3, 2, image::Rgb([9, 8, 7])));

        let face = DetectedFace::crop(&frame, BoundingBox::new(3, 2, 4, 4)).unwrap();
        assert_eq!(face.roi.width(), 4);
        assert_eq!(face.roi.height(), 4);
        assert_eq!(face.roi.index(), 4);
        assert_eq!(&face.roi.data()[..3], &[9, 8, 7]);
    }

    #[test]
    fn test_crop_rejects_out_of_bounds() {
        let frame = Frame::filled(10, 10, [0, 0, 0], 0);
        assert!(DetectedFace::crop(&frame, BoundingBox::new(8, 8, 4, 4)).is_none());
        assert!(DetectedFace::crop(&frame, BoundingBox::new(0, 0, 0, 4)).is_none());
    }
}
