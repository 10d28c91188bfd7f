use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
///
/// An all-zero rectangle doubles as the "not placed" marker on sprite records.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// True when the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        !(self.x >= other.x + other.w
            || other.x >= self.x + self.w
            || self.y >= other.y + other.h
            || other.y >= self.y + self.h)
    }
}

#[cfg(test)]
mod tests {
    use super::Rect;

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 10, 10);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&Rect::new(9, 9, 2, 2)));
    }

    #[test]
    fn empty_rect_never_intersects() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(!a.intersects(&Rect::new(2, 2, 0, 5)));
        assert!(Rect::default().is_empty());
    }
}
