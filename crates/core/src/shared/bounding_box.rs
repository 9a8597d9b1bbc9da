/// Axis-aligned face box in frame-pixel coordinates.
///
/// Detectors may produce boxes that spill over frame edges; use
/// [`BoundingBox::clip_to`] or [`BoundingBox::fits`] before cropping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    /// True when the box is non-empty and lies entirely inside the frame.
    pub fn fits(&self, frame_w: u32, frame_h: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width > 0
            && self.height > 0
            && self.right() as i64 <= frame_w as i64
            && self.bottom() as i64 <= frame_h as i64
    }

    /// Intersection with the frame rectangle, or `None` if nothing remains.
    pub fn clip_to(&self, frame_w: u32, frame_h: u32) -> Option<BoundingBox> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = (self.right() as i64).min(frame_w as i64) as i32;
        let y2 = (self.bottom() as i64).min(frame_h as i64) as i32;
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(BoundingBox::new(x1, y1, x2 - x1, y2 - y1))
    }
}
