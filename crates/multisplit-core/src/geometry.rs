//! Rectangles, sizes, and padding in host pixel coordinates.

/// Axis-aligned rectangle: node bounds, widget bounds, and damage regions.
///
/// The origin may be negative. Layout only ever produces rectangles with
/// non-negative extents; [`Rect::is_well_formed`] checks that for values
/// coming from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// `width` x `height` at the origin.
    #[inline]
    #[must_use]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// One past the last column.
    #[inline]
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// One past the last row.
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// No pixel inside.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Neither extent is negative.
    #[inline]
    #[must_use]
    pub const fn is_well_formed(&self) -> bool {
        self.width >= 0 && self.height >= 0
    }

    /// Half-open hit test: the right and bottom edges are outside.
    #[inline]
    #[must_use]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        self.x <= x && x < self.right() && self.y <= y && y < self.bottom()
    }

    /// Bounding box of `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        Rect::new(
            left,
            top,
            self.right().max(other.right()).saturating_sub(left),
            self.bottom().max(other.bottom()).saturating_sub(top),
        )
    }
}

/// Preferred width and height reported by a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    /// Measured size of an unbound name.
    pub const ZERO: Self = Self::new(0, 0);

    #[inline]
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// `self` plus `padding` on each side.
    #[inline]
    #[must_use]
    pub const fn padded(self, padding: Sides) -> Self {
        Self {
            width: self.width.saturating_add(padding.horizontal_sum()),
            height: self.height.saturating_add(padding.vertical_sum()),
        }
    }
}

/// Container padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sides {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Sides {
    /// Same padding everywhere.
    #[must_use]
    pub const fn all(val: i32) -> Self {
        Self::new(val, val, val, val)
    }

    /// Clockwise from the top, like CSS.
    #[must_use]
    pub const fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    #[inline]
    #[must_use]
    pub const fn horizontal_sum(&self) -> i32 {
        self.left.saturating_add(self.right)
    }

    #[inline]
    #[must_use]
    pub const fn vertical_sum(&self) -> i32 {
        self.top.saturating_add(self.bottom)
    }
}

impl From<i32> for Sides {
    fn from(val: i32) -> Self {
        Self::all(val)
    }
}

/// `(vertical, horizontal)`.
impl From<(i32, i32)> for Sides {
    fn from((vertical, horizontal): (i32, i32)) -> Self {
        Self::new(vertical, horizontal, vertical, horizontal)
    }
}

#[cfg(test)]
mod tests {
    use super::{Rect, Sides, Size};

    #[test]
    fn hit_test_is_half_open() {
        let rect = Rect::new(2, 3, 4, 5);
        assert!(rect.contains(2, 3));
        assert!(rect.contains(5, 7));
        assert!(!rect.contains(6, 3));
        assert!(!rect.contains(2, 8));
        assert!(!Rect::new(10, 0, 0, 5).contains(10, 1));
    }

    #[test]
    fn negative_origin_hit_test() {
        let rect = Rect::new(-10, -10, 5, 5);
        assert!(rect.contains(-10, -6));
        assert!(!rect.contains(-5, -10));
    }

    #[test]
    fn union_is_bounding_box() {
        let a = Rect::new(0, 0, 10, 4);
        let b = Rect::new(20, 2, 5, 10);
        assert_eq!(a.union(&b), Rect::new(0, 0, 25, 12));
        assert_eq!(b.union(&a), a.union(&b));
    }

    #[test]
    fn well_formed_and_empty() {
        let rect = Rect::new(0, 0, -3, 4);
        assert!(!rect.is_well_formed());
        assert!(rect.is_empty());
        assert!(Rect::from_size(0, 4).is_well_formed());
        assert!(Rect::from_size(0, 4).is_empty());
        assert!(!Rect::from_size(3, 4).is_empty());
    }

    #[test]
    fn padding_grows_both_axes() {
        let size = Size::new(100, 50).padded(Sides::from((2, 3)));
        assert_eq!(size, Size::new(106, 54));
        assert_eq!(Size::new(1, 1).padded(Sides::from(4)), Size::new(9, 9));
        assert_eq!(Size::ZERO.padded(Sides::default()), Size::ZERO);
    }
}
