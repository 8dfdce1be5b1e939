//! Core data types shared across the workspace.

pub mod geometry;

pub use geometry::{Point, PointF, Rect, RectF, Size, SizeF};
