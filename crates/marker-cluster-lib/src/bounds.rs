//! Axis-aligned rectangles in projected plane coordinates

use geo::{Coord, Point, Rect};

/// An immutable axis-aligned rectangle with precomputed midpoints
///
/// Containment tests are inclusive on every side, intersection tests are not: two
/// rectangles that only share an edge do not intersect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub mid_x: f64,
    pub mid_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        debug_assert!(min_x <= max_x, "min_x {min_x} > max_x {max_x}");
        debug_assert!(min_y <= max_y, "min_y {min_y} > max_y {max_y}");

        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            mid_x: (min_x + max_x) / 2.0,
            mid_y: (min_y + max_y) / 2.0,
        }
    }

    /// Square of side `span` centered on `center`
    pub fn from_span(center: Point<f64>, span: f64) -> Self {
        let half_span = span / 2.0;
        Self::new(
            center.x() - half_span,
            center.x() + half_span,
            center.y() - half_span,
            center.y() + half_span,
        )
    }

    #[inline]
    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        self.min_x <= x && x <= self.max_x && self.min_y <= y && y <= self.max_y
    }

    #[inline]
    pub fn contains_point(&self, point: Point<f64>) -> bool {
        self.contains_xy(point.x(), point.y())
    }

    /// Whether `other` lies entirely inside `self` (equal bounds contain each other)
    #[inline]
    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// Open-interval overlap test
    #[inline]
    pub fn intersects(&self, other: &Bounds) -> bool {
        other.min_x < self.max_x
            && self.min_x < other.max_x
            && other.min_y < self.max_y
            && self.min_y < other.max_y
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Split into the four quadrants: top-left, top-right, bottom-left, bottom-right
    pub(crate) fn quadrants(&self) -> [Bounds; 4] {
        [
            Bounds::new(self.min_x, self.mid_x, self.min_y, self.mid_y),
            Bounds::new(self.mid_x, self.max_x, self.min_y, self.mid_y),
            Bounds::new(self.min_x, self.mid_x, self.mid_y, self.max_y),
            Bounds::new(self.mid_x, self.max_x, self.mid_y, self.max_y),
        ]
    }

    /// Index into [`Self::quadrants`] of the quadrant that holds `(x, y)`
    #[inline]
    pub(crate) fn quadrant_index(&self, x: f64, y: f64) -> usize {
        match (y < self.mid_y, x < self.mid_x) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        }
    }
}

impl From<Rect<f64>> for Bounds {
    fn from(rect: Rect<f64>) -> Self {
        Bounds::new(rect.min().x, rect.max().x, rect.min().y, rect.max().y)
    }
}

impl From<Bounds> for Rect<f64> {
    fn from(bounds: Bounds) -> Self {
        Rect::new(
            Coord {
                x: bounds.min_x,
                y: bounds.min_y,
            },
            Coord {
                x: bounds.max_x,
                y: bounds.max_y,
            },
        )
    }
}
