//! Geometric primitives.
//!
//! All measurements are real numbers in logical pixels. Rounding to device
//! pixels belongs to the render boundary; nothing in the engine rounds.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle with its origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: f64,
    /// Top edge (inclusive).
    pub y: f64,
    /// Width in logical pixels.
    pub width: f64,
    /// Height in logical pixels.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Area in square pixels.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Extent along `orientation` (width for horizontal, height for vertical).
    #[inline]
    pub fn extent(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    /// True when every component is a finite number and the size is positive.
    pub fn is_finite_positive(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Axis along which a splitview lays out its views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Views arranged left to right; sizes are widths.
    #[default]
    Horizontal,
    /// Views arranged top to bottom; sizes are heights.
    Vertical,
}

impl Orientation {
    /// The flip of this orientation.
    #[must_use]
    pub const fn orthogonal(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

/// Side of a reference node at which new content is docked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Above,
    Below,
}

impl Direction {
    /// Axis the new content is arranged along relative to its reference.
    #[must_use]
    pub const fn orientation(self) -> Orientation {
        match self {
            Self::Left | Self::Right => Orientation::Horizontal,
            Self::Above | Self::Below => Orientation::Vertical,
        }
    }

    /// Whether new content lands after the reference (right of / below it).
    #[must_use]
    pub const fn is_trailing(self) -> bool {
        matches!(self, Self::Right | Self::Below)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges_and_area() {
        let r = Rect::new(10.0, 20.0, 30.5, 40.0);
        assert_eq!(r.right(), 40.5);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.area(), 1220.0);
        assert!(!r.is_empty());
    }

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::from_size(10.0, 10.0);
        assert!(r.contains(0.0, 0.0));
        assert!(r.contains(9.99, 9.99));
        assert!(!r.contains(10.0, 5.0));
        assert!(!r.contains(5.0, 10.0));
    }

    #[test]
    fn zero_sized_rect_is_empty() {
        assert!(Rect::from_size(0.0, 10.0).is_empty());
        assert!(!Rect::from_size(0.0, 10.0).is_finite_positive());
        assert!(!Rect::new(f64::NAN, 0.0, 1.0, 1.0).is_finite_positive());
    }

    #[test]
    fn orthogonal_flips() {
        assert_eq!(Orientation::Horizontal.orthogonal(), Orientation::Vertical);
        assert_eq!(Orientation::Vertical.orthogonal(), Orientation::Horizontal);
    }

    #[test]
    fn direction_axes() {
        assert_eq!(Direction::Left.orientation(), Orientation::Horizontal);
        assert_eq!(Direction::Below.orientation(), Orientation::Vertical);
        assert!(Direction::Right.is_trailing());
        assert!(!Direction::Above.is_trailing());
    }

    #[test]
    fn orientation_serializes_lowercase() {
        let json = serde_json::to_string(&Orientation::Vertical).unwrap();
        assert_eq!(json, "\"vertical\"");
        let dir: Direction = serde_json::from_str("\"below\"").unwrap();
        assert_eq!(dir, Direction::Below);
    }
}
