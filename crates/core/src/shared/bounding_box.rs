/// Axis-aligned box in frame-pixel coordinates.
///
/// Kept in `f64` so detector output and normalized ratios need no rounding
/// until pixels are actually touched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from corner coordinates `(x1, y1, x2, y2)`.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Grows the box by `pad` on the left, right and bottom and by
    /// `pad * top_factor` on the top.
    pub fn expand(&self, pad: f64, top_factor: f64) -> Self {
        let top = pad * top_factor;
        Self::new(
            self.x - pad,
            self.y - top,
            self.width + 2.0 * pad,
            self.height + pad + top,
        )
    }

    /// Intersection with the `[0, width) x [0, height)` frame.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let x1 = self.x.clamp(0.0, width as f64);
        let y1 = self.y.clamp(0.0, height as f64);
        let x2 = self.right().clamp(0.0, width as f64);
        let y2 = self.bottom().clamp(0.0, height as f64);
        Self::from_corners(x1, y1, x2, y2)
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }
}
