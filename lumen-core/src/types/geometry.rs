//! Geometric primitives: points, sizes and rectangles.

use num_traits::{Num, Zero};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Neg, Sub};

/// A 2D point with generic coordinates.
///
/// # Type Parameters
///
/// * `T`: The numeric type for the coordinates (e.g., `i32`, `f64`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize + Num + Copy",
    deserialize = "T: Deserialize<'de> + Num + Copy"
))]
pub struct Point<T: Num + Copy> {
    /// The x-coordinate of the point.
    pub x: T,
    /// The y-coordinate of the point.
    pub y: T,
}

impl<T: Num + Copy + Eq> Eq for Point<T> {}

impl<T: Num + Copy> Point<T> {
    /// Creates a new point with the given coordinates.
    pub const fn new(x: T, y: T) -> Self {
        Point { x, y }
    }

    /// Multiplies each coordinate by its own factor.
    pub fn scaled(&self, factor_x: T, factor_y: T) -> Self {
        Point::new(self.x * factor_x, self.y * factor_y)
    }

    /// Componentwise clamp against a lower bound.
    pub fn max(&self, floor: T) -> Self
    where
        T: PartialOrd,
    {
        Point::new(
            if self.x < floor { floor } else { self.x },
            if self.y < floor { floor } else { self.y },
        )
    }
}

impl<T: Num + Copy> Point<T> {
    /// The origin.
    pub fn zero() -> Self {
        Point::new(T::zero(), T::zero())
    }
}

impl<T: Num + Copy> Add for Point<T> {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl<T: Num + Copy> Sub for Point<T> {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

impl<T: Num + Copy + Neg<Output = T>> Neg for Point<T> {
    type Output = Self;
    fn neg(self) -> Self {
        Point::new(-self.x, -self.y)
    }
}

/// A 2D size (width and height) with generic dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize + Num + Copy",
    deserialize = "T: Deserialize<'de> + Num + Copy"
))]
pub struct Size<T: Num + Copy> {
    /// The width component of the size.
    pub width: T,
    /// The height component of the size.
    pub height: T,
}

impl<T: Num + Copy + Eq> Eq for Size<T> {}

impl<T: Num + Copy> Size<T> {
    /// Creates a new size with the given width and height.
    pub const fn new(width: T, height: T) -> Self {
        Size { width, height }
    }

    pub fn zero() -> Self {
        Size::new(T::zero(), T::zero())
    }

    /// Width times height.
    pub fn area(&self) -> T {
        self.width * self.height
    }

    /// True if either dimension is zero or negative.
    pub fn is_empty(&self) -> bool
    where
        T: PartialOrd + Zero,
    {
        self.width <= T::zero() || self.height <= T::zero()
    }

    pub fn scaled(&self, factor_x: T, factor_y: T) -> Self {
        Size::new(self.width * factor_x, self.height * factor_y)
    }

    /// Width and height exchanged, as after a 90 or 270 degree rotation.
    pub fn swapped(&self) -> Self {
        Size::new(self.height, self.width)
    }

    pub fn to_point(&self) -> Point<T> {
        Point::new(self.width, self.height)
    }
}

/// A 2D rectangle defined by an origin point and a size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize + Num + Copy",
    deserialize = "T: Deserialize<'de> + Num + Copy"
))]
pub struct Rect<T: Num + Copy> {
    /// The origin point (top-left corner) of the rectangle.
    pub origin: Point<T>,
    /// The size (width and height) of the rectangle.
    pub size: Size<T>,
}

impl<T: Num + Copy + Eq> Eq for Rect<T> {}

impl<T: Num + Copy> Rect<T> {
    /// Creates a new rectangle from an origin point and a size.
    pub const fn new(origin: Point<T>, size: Size<T>) -> Self {
        Rect { origin, size }
    }

    /// Creates a new rectangle from individual coordinate and dimension values.
    pub const fn from_coords(x: T, y: T, width: T, height: T) -> Self {
        Rect {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// A rectangle of `size` anchored at the origin.
    pub fn from_size(size: Size<T>) -> Self {
        Rect::new(Point::zero(), size)
    }

    pub fn x(&self) -> T {
        self.origin.x
    }

    pub fn y(&self) -> T {
        self.origin.y
    }

    pub fn width(&self) -> T {
        self.size.width
    }

    pub fn height(&self) -> T {
        self.size.height
    }

    /// The x-coordinate of the right edge (exclusive).
    pub fn right(&self) -> T {
        self.origin.x + self.size.width
    }

    /// The y-coordinate of the bottom edge (exclusive).
    pub fn bottom(&self) -> T {
        self.origin.y + self.size.height
    }

    pub fn is_empty(&self) -> bool
    where
        T: PartialOrd + Zero,
    {
        self.size.is_empty()
    }

    /// Checks if a point lies within the rectangle, right and bottom edges excluded.
    pub fn contains_point(&self, point: &Point<T>) -> bool
    where
        T: PartialOrd,
    {
        point.x >= self.x() && point.x < self.right() && point.y >= self.y() && point.y < self.bottom()
    }

    /// True if `other` lies entirely within this rectangle.
    pub fn contains_rect(&self, other: &Rect<T>) -> bool
    where
        T: PartialOrd,
    {
        other.x() >= self.x() && other.y() >= self.y() && other.right() <= self.right() && other.bottom() <= self.bottom()
    }

    /// Checks if this rectangle overlaps another with a non-empty area.
    pub fn intersects(&self, other: &Rect<T>) -> bool
    where
        T: PartialOrd,
    {
        self.x() < other.right() && self.right() > other.x() && self.y() < other.bottom() && self.bottom() > other.y()
    }

    /// The overlapping area, or `None` when the rectangles do not intersect.
    pub fn intersection(&self, other: &Rect<T>) -> Option<Rect<T>>
    where
        T: PartialOrd,
    {
        let x1 = if self.x() > other.x() { self.x() } else { other.x() };
        let y1 = if self.y() > other.y() { self.y() } else { other.y() };
        let x2 = if self.right() < other.right() { self.right() } else { other.right() };
        let y2 = if self.bottom() < other.bottom() { self.bottom() } else { other.bottom() };

        if x1 < x2 && y1 < y2 {
            Some(Rect::from_coords(x1, y1, x2 - x1, y2 - y1))
        } else {
            None
        }
    }

    /// The smallest rectangle containing both rectangles.
    pub fn union(&self, other: &Rect<T>) -> Rect<T>
    where
        T: PartialOrd,
    {
        let x1 = if self.x() < other.x() { self.x() } else { other.x() };
        let y1 = if self.y() < other.y() { self.y() } else { other.y() };
        let x2 = if self.right() > other.right() { self.right() } else { other.right() };
        let y2 = if self.bottom() > other.bottom() { self.bottom() } else { other.bottom() };

        Rect::from_coords(x1, y1, x2 - x1, y2 - y1)
    }

    /// Returns the rectangle moved by `delta`.
    pub fn translated(&self, delta: &Point<T>) -> Rect<T> {
        Rect::new(self.origin + *delta, self.size)
    }

    /// Scales origin and size together, i.e. maps the rectangle into a space
    /// scaled by the given factors.
    pub fn scaled(&self, factor_x: T, factor_y: T) -> Rect<T> {
        Rect::new(self.origin.scaled(factor_x, factor_y), self.size.scaled(factor_x, factor_y))
    }

    /// Grows the rectangle by `margin` on every side.
    pub fn expanded(&self, margin: T) -> Rect<T> {
        let two = T::one() + T::one();
        Rect::from_coords(
            self.x() - margin,
            self.y() - margin,
            self.width() + margin * two,
            self.height() + margin * two,
        )
    }
}

/// Shorthands used throughout the compositor, which works in logical `f64` space.
pub type PointF = Point<f64>;
pub type SizeF = Size<f64>;
pub type RectF = Rect<f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(3.0, 4.0);
        let b = Point::new(1.0, -2.0);
        assert_eq!(a + b, Point::new(4.0, 2.0));
        assert_eq!(a - b, Point::new(2.0, 6.0));
        assert_eq!(-a, Point::new(-3.0, -4.0));
        assert_eq!(Point::new(-1.0, 5.0).max(0.0), Point::new(0.0, 5.0));
    }

    #[test]
    fn test_size_helpers() {
        let size = Size::new(400, 300);
        assert_eq!(size.area(), 120_000);
        assert_eq!(size.swapped(), Size::new(300, 400));
        assert!(Size::new(0, 10).is_empty());
        assert!(!size.is_empty());
    }

    #[test]
    fn test_rect_intersection_and_union() {
        let a = Rect::from_coords(0, 0, 10, 10);
        let b = Rect::from_coords(5, 5, 10, 10);
        assert_eq!(a.intersection(&b), Some(Rect::from_coords(5, 5, 5, 5)));
        assert_eq!(a.union(&b), Rect::from_coords(0, 0, 15, 15));
        assert_eq!(a.intersection(&Rect::from_coords(10, 0, 5, 5)), None, "touching edges do not intersect");
    }

    #[test]
    fn test_rect_contains_point_excludes_far_edges() {
        let r = Rect::from_coords(10, 10, 5, 5);
        assert!(r.contains_point(&Point::new(10, 10)));
        assert!(!r.contains_point(&Point::new(15, 12)));
    }

    #[test]
    fn test_rect_expanded_and_scaled() {
        let r = Rect::from_coords(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.expanded(4.0), Rect::from_coords(6.0, 16.0, 108.0, 58.0));
        assert_eq!(r.scaled(0.5, 2.0), Rect::from_coords(5.0, 40.0, 50.0, 100.0));
        assert_eq!(r.translated(&Point::new(-10.0, 5.0)), Rect::from_coords(0.0, 25.0, 100.0, 50.0));
    }

    #[test]
    fn test_rect_serde_roundtrip_shape() {
        let r: Rect<i32> = toml::from_str("[origin]\nx = 1\ny = 2\n[size]\nwidth = 3\nheight = 4\n").unwrap();
        assert_eq!(r, Rect::from_coords(1, 2, 3, 4));
    }
}
