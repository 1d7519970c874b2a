//! Integer pixel rectangles.

/// Axis-aligned pixel rectangle, `width`/`height` may be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning `[x0, x1) x [y0, y1)`; empty if inverted.
    pub fn from_corners(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Shift by an offset, e.g. from mask-local into image coordinates.
    pub fn offset(&self, dx: u32, dy: u32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Smallest rectangle containing both; an empty side is ignored.
    pub fn union(&self, other: &PixelRect) -> PixelRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        PixelRect::from_corners(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Iterate over every `(x, y)` in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.y..self.bottom()).flat_map(move |y| (self.x..self.right()).map(move |x| (x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_inverted_is_empty() {
        let r = PixelRect::from_corners(5, 5, 3, 9);
        assert!(r.is_empty());
        assert_eq!(r.area(), 0);
    }

    #[test]
    fn test_union_ignores_empty() {
        let a = PixelRect::new(2, 2, 3, 3);
        assert_eq!(a.union(&PixelRect::default()), a);
        assert_eq!(
            a.union(&PixelRect::new(10, 0, 1, 1)),
            PixelRect::from_corners(2, 0, 11, 5)
        );
    }

    #[test]
    fn test_pixels_row_major() {
        let r = PixelRect::new(1, 1, 2, 2);
        let pixels: Vec<_> = r.pixels().collect();
        assert_eq!(pixels, vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
        assert!(r.contains(2, 2));
        assert!(!r.contains(3, 1));
    }
}
