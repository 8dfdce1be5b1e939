//! Regions: sets of rectangles used for damage and input areas.

use lumen_core::types::{PointF, RectF};

use crate::transform::OutputTransform;

/// A region represented as a collection of non-overlapping rectangles.
///
/// `add` subtracts the new rectangle from what is already stored before pushing
/// it, so the stored rectangles stay disjoint and the covered area is exact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    rects: Vec<RectF>,
}

impl Region {
    /// Creates a new, empty `Region`.
    pub fn new() -> Self {
        Self { rects: Vec::new() }
    }

    pub fn from_rect(rect: RectF) -> Self {
        let mut region = Self::new();
        region.add(rect);
        region
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// The disjoint rectangles defining the region.
    pub fn rects(&self) -> &[RectF] {
        &self.rects
    }

    /// Bounding box of the region, `None` if it is empty.
    pub fn extents(&self) -> Option<RectF> {
        let mut iter = self.rects.iter();
        let first = *iter.next()?;
        Some(iter.fold(first, |acc, r| acc.union(r)))
    }

    /// Adds a rectangle to the region. Empty rectangles are ignored.
    pub fn add(&mut self, rect: RectF) -> &mut Self {
        if rect.is_empty() {
            return self;
        }
        if self.rects.iter().any(|r| r.contains_rect(&rect)) {
            return self;
        }
        self.subtract(rect);
        self.rects.push(rect);
        Self::merge_adjacent(&mut self.rects);
        self
    }

    /// Adds every rectangle of `other`.
    pub fn union(&mut self, other: &Region) -> &mut Self {
        for rect in &other.rects {
            self.add(*rect);
        }
        self
    }

    /// Removes `cut` from the region, fragmenting rectangles as needed.
    pub fn subtract(&mut self, cut: RectF) -> &mut Self {
        if cut.is_empty() || self.rects.is_empty() {
            return self;
        }

        let mut remaining = Vec::with_capacity(self.rects.len());
        for existing in &self.rects {
            if !existing.intersects(&cut) {
                remaining.push(*existing);
                continue;
            }
            if cut.contains_rect(existing) {
                continue;
            }

            // Top
            if existing.y() < cut.y() {
                remaining.push(RectF::from_coords(
                    existing.x(),
                    existing.y(),
                    existing.width(),
                    cut.y() - existing.y(),
                ));
            }
            // Bottom
            if existing.bottom() > cut.bottom() {
                remaining.push(RectF::from_coords(
                    existing.x(),
                    cut.bottom(),
                    existing.width(),
                    existing.bottom() - cut.bottom(),
                ));
            }
            let band_top = existing.y().max(cut.y());
            let band_bottom = existing.bottom().min(cut.bottom());
            if band_top < band_bottom {
                // Left
                if existing.x() < cut.x() {
                    remaining.push(RectF::from_coords(
                        existing.x(),
                        band_top,
                        cut.x() - existing.x(),
                        band_bottom - band_top,
                    ));
                }
                // Right
                if existing.right() > cut.right() {
                    remaining.push(RectF::from_coords(
                        cut.right(),
                        band_top,
                        existing.right() - cut.right(),
                        band_bottom - band_top,
                    ));
                }
            }
        }
        self.rects = remaining;
        self
    }

    /// Clips the region to `clip`.
    pub fn intersect_rect(&mut self, clip: RectF) -> &mut Self {
        self.rects = self.rects.iter().filter_map(|r| r.intersection(&clip)).collect();
        self
    }

    pub fn translate(&mut self, delta: PointF) -> &mut Self {
        for rect in &mut self.rects {
            *rect = rect.translated(&delta);
        }
        self
    }

    /// Scales origin and size of every rectangle.
    pub fn scale(&mut self, factor_x: f64, factor_y: f64) -> &mut Self {
        for rect in &mut self.rects {
            *rect = rect.scaled(factor_x, factor_y);
        }
        self.rects.retain(|r| !r.is_empty());
        self
    }

    /// Maps the region from buffer space of the given (untransformed) extent into
    /// the transformed space.
    pub fn transform(&mut self, transform: OutputTransform, width: f64, height: f64) -> &mut Self {
        if transform == OutputTransform::Normal {
            return self;
        }
        for rect in &mut self.rects {
            *rect = transform.transform_rect(rect, width, height);
        }
        self
    }

    pub fn contains_point(&self, point: &PointF) -> bool {
        self.rects.iter().any(|r| r.contains_point(point))
    }

    /// Merges rectangles that share a full edge. Never changes the covered area.
    fn merge_adjacent(rects: &mut Vec<RectF>) {
        let mut i = 0;
        while i < rects.len() {
            let mut merged = false;
            let mut j = i + 1;
            while j < rects.len() {
                let (a, b) = (rects[i], rects[j]);
                let vertical = a.x() == b.x()
                    && a.width() == b.width()
                    && (a.bottom() == b.y() || b.bottom() == a.y());
                let horizontal = a.y() == b.y()
                    && a.height() == b.height()
                    && (a.right() == b.x() || b.right() == a.x());
                if vertical || horizontal {
                    rects[i] = a.union(&b);
                    rects.remove(j);
                    merged = true;
                } else {
                    j += 1;
                }
            }
            if merged {
                i = 0;
            } else {
                i += 1;
            }
        }
    }
}

impl From<RectF> for Region {
    fn from(rect: RectF) -> Self {
        Region::from_rect(rect)
    }
}
