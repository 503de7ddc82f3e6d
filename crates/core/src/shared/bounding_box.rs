/// Axis-aligned box in frame coordinates, `(x1, y1)` top-left and
/// `(x2, y2)` bottom-right. Coordinates may lie outside the frame; detectors
/// and trackers are free to extrapolate past the edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Integer pixel rectangle guaranteed to lie within a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn from_center(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }

    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Clamps the box to a `frame_w × frame_h` frame and snaps it to whole
    /// pixels (truncating toward the top-left).
    ///
    /// Returns `None` for a malformed box (non-finite coordinates). A box
    /// that lies entirely outside the frame, or is inverted, yields a
    /// zero-area rect.
    pub fn clamp_to(&self, frame_w: u32, frame_h: u32) -> Option<PixelRect> {
        if !self.is_finite() {
            return None;
        }
        let fw = frame_w as f64;
        let fh = frame_h as f64;
        let x1 = self.x1.clamp(0.0, fw).floor();
        let y1 = self.y1.clamp(0.0, fh).floor();
        let x2 = self.x2.clamp(0.0, fw).floor();
        let y2 = self.y2.clamp(0.0, fh).floor();
        Some(PixelRect {
            x: x1 as u32,
            y: y1 as u32,
            width: (x2 - x1).max(0.0) as u32,
            height: (y2 - y1).max(0.0) as u32,
        })
    }
}

impl PixelRect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
