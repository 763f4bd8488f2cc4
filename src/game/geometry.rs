//! Axis-aligned rectangles in play-field pixels (y grows downwards)

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Overlap test with inclusive edges: touching rectangles intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right() < other.left
            || self.left > other.right()
            || self.bottom() < other.top
            || self.top > other.bottom())
    }
}
