use font8x8::UnicodeFonts;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::emotion::domain::emotion_classifier::ClassificationOutcome;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

const GLYPH_SIZE: u32 = 8;

/// Gap between the top of the box and the text baseline.
const LABEL_OFFSET: i32 = 10;

/// Draws a rectangle around each face and its emotion label above it.
pub struct BoxLabelAnnotator {
    color: Rgb<u8>,
    thickness: u32,
    text_scale: u32,
}

impl Default for BoxLabelAnnotator {
    fn default() -> Self {
        Self {
            color: Rgb([0, 255, 0]),
            thickness: 2,
            text_scale: 2,
        }
    }
}

impl BoxLabelAnnotator {
    pub fn new(color: [u8; 3], thickness: u32, text_scale: u32) -> Self {
        Self {
            color: Rgb(color),
            thickness: thickness.max(1),
            text_scale: text_scale.max(1),
        }
    }

    fn draw_box(&self, img: &mut RgbImage, bbox: &BoundingBox) {
        for inset in 0..self.thickness as i32 {
            let w = bbox.width - 2 * inset;
            let h = bbox.height - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(bbox.x + inset, bbox.y + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(img, rect, self.color);
        }
    }

    /// Renders `text` with its top-left corner at `(x, y)`; pixels outside
    /// the image are clipped.
    fn draw_text(&self, img: &mut RgbImage, x: i32, y: i32, text: &str) {
        let cell = self.text_scale;
        let advance = (GLYPH_SIZE * cell) as i32;
        for (i, ch) in text.chars().enumerate() {
            let Some(glyph) = font8x8::BASIC_FONTS.get(ch) else {
                continue;
            };
            let gx = x + i as i32 * advance;
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    let rect = Rect::at(gx + (col * cell) as i32, y + row as i32 * cell as i32)
                        .of_size(cell, cell);
                    draw_filled_rect_mut(img, rect, self.color);
                }
            }
        }
    }

    /// Top edge of the label: baseline 10 px above the box, kept on screen.
    fn label_top(&self, bbox: &BoundingBox) -> i32 {
        (bbox.y - LABEL_OFFSET - (GLYPH_SIZE * self.text_scale) as i32).max(0)
    }
}

impl FrameAnnotator for BoxLabelAnnotator {
    fn annotate(&self, frame: &mut Frame, outcomes: &[ClassificationOutcome]) {
        frame.with_rgb_image(|img| {
            for outcome in outcomes {
                let ClassificationOutcome::Labelled { face, label } = outcome else {
                    continue;
                };
                self.draw_box(img, face);
                self.draw_text(img, face.x, self.label_top(face), label.as_str());
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::domain::emotion_label::EmotionLabel;

    const GREEN: [u8; 3] = [0, 255, 0];

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * frame.width() + x) * 3) as usize;
        [frame.data()[i], frame.data()[i + 1], frame.data()[i + 2]]
    }

    fn count_green(frame: &Frame, x0: u32, y0: u32, x1: u32, y1: u32) -> usize {
        (y0..y1)
            .flat_map(|y| (x0..x1).map(move |x| (x, y)))
            .filter(|&(x, y)| pixel(frame, x, y) == GREEN)
            .count()
    }

    #[test]
    fn test_draws_two_pixel_box() {
        let mut frame = Frame::filled(200, 200, [0, 0, 0], 0);
        let face = BoundingBox::new(50, 60, 40, 30);
        BoxLabelAnnotator::default().annotate(
            &mut frame,
            &[ClassificationOutcome::Labelled {
                face,
                label: EmotionLabel::Happy,
            }],
        );

        assert_eq!(pixel(&frame, 50, 60), GREEN);
        assert_eq!(pixel(&frame, 51, 61), GREEN);
        assert_eq!(pixel(&frame, 89, 89), GREEN);
        assert_eq!(pixel(&frame, 52, 62), [0, 0, 0]);
        assert_eq!(pixel(&frame, 70, 75), [0, 0, 0]);
    }

    #[test]
    fn test_draws_label_above_box() {
        let mut frame = Frame::filled(200, 200, [0, 0, 0], 0);
        let face = BoundingBox::new(50, 100, 40, 40);
        BoxLabelAnnotator::default().annotate(
            &mut frame,
            &[ClassificationOutcome::Labelled {
                face,
                label: EmotionLabel::Sad,
            }],
        );
        // text occupies rows 74..90 above the box
        assert!(count_green(&frame, 50, 74, 100, 90) > 20);
        assert_eq!(count_green(&frame, 0, 0, 200, 70), 0);
    }

    #[test]
    fn test_label_clamped_at_top_edge() {
        let mut frame = Frame::filled(100, 100, [0, 0, 0], 0);
        let face = BoundingBox::new(10, 5, 30, 30);
        BoxLabelAnnotator::default().annotate(
            &mut frame,
            &[ClassificationOutcome::Labelled {
                face,
                label: EmotionLabel::Fear,
            }],
        );
        assert!(count_green(&frame, 10, 0, 60, 5) > 0);
    }

    #[test]
    fn test_failed_outcomes_are_not_drawn() {
        let mut frame = Frame::filled(64, 64, [0, 0, 0], 0);
        BoxLabelAnnotator::default().annotate(
            &mut frame,
            &[ClassificationOutcome::Failed {
                face: BoundingBox::new(5, 5, 20, 20),
                reason: "engine error".into(),
            }],
        );
        assert!(frame.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_custom_color() {
        let mut frame = Frame::filled(64, 64, [0, 0, 0], 0);
        BoxLabelAnnotator::new([255, 0, 0], 1, 1).annotate(
            &mut frame,
            &[ClassificationOutcome::Labelled {
                face: BoundingBox::new(20, 20, 10, 10),
                label: EmotionLabel::Angry,
            }],
        );
        assert_eq!(pixel(&frame, 20, 20), [255, 0, 0]);
        assert_eq!(pixel(&frame, 21, 21), [0, 0, 0]);
    }
}
