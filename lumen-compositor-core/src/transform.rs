//! `wl_output.transform` values and their action on rectangles.

use lumen_core::types::{RectF, SizeF};

/// Buffer transform as advertised by `wl_output::transform`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputTransform {
    #[default]
    Normal,
    Rotated90,
    Rotated180,
    Rotated270,
    /// Flipped horizontally.
    Flipped,
    FlippedRotated90,
    FlippedRotated180,
    FlippedRotated270,
}

impl OutputTransform {
    /// True for transforms that exchange width and height.
    pub fn swaps_axes(&self) -> bool {
        matches!(
            self,
            OutputTransform::Rotated90
                | OutputTransform::Rotated270
                | OutputTransform::FlippedRotated90
                | OutputTransform::FlippedRotated270
        )
    }

    /// Size of an extent after the transform is applied.
    pub fn transform_size(&self, size: SizeF) -> SizeF {
        if self.swaps_axes() {
            size.swapped()
        } else {
            size
        }
    }

    /// Maps `rect`, given inside an untransformed extent of `width` x `height`,
    /// into the transformed extent.
    pub fn transform_rect(&self, rect: &RectF, width: f64, height: f64) -> RectF {
        let (x, y, w, h) = (rect.x(), rect.y(), rect.width(), rect.height());
        match self {
            OutputTransform::Normal => *rect,
            OutputTransform::Rotated90 => RectF::from_coords(height - y - h, x, h, w),
            OutputTransform::Rotated180 => RectF::from_coords(width - x - w, height - y - h, w, h),
            OutputTransform::Rotated270 => RectF::from_coords(y, width - x - w, h, w),
            OutputTransform::Flipped => RectF::from_coords(width - x - w, y, w, h),
            OutputTransform::FlippedRotated90 => RectF::from_coords(y, x, h, w),
            OutputTransform::FlippedRotated180 => RectF::from_coords(x, height - y - h, w, h),
            OutputTransform::FlippedRotated270 => {
                RectF::from_coords(height - y - h, width - x - w, h, w)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OutputTransform::Normal, RectF::from_coords(10.0, 20.0, 30.0, 40.0))]
    #[case(OutputTransform::Rotated90, RectF::from_coords(40.0, 10.0, 40.0, 30.0))]
    #[case(OutputTransform::Rotated180, RectF::from_coords(60.0, 40.0, 30.0, 40.0))]
    #[case(OutputTransform::Rotated270, RectF::from_coords(20.0, 60.0, 40.0, 30.0))]
    #[case(OutputTransform::Flipped, RectF::from_coords(60.0, 20.0, 30.0, 40.0))]
    #[case(OutputTransform::FlippedRotated90, RectF::from_coords(20.0, 10.0, 40.0, 30.0))]
    #[case(OutputTransform::FlippedRotated180, RectF::from_coords(10.0, 40.0, 30.0, 40.0))]
    #[case(OutputTransform::FlippedRotated270, RectF::from_coords(40.0, 60.0, 40.0, 30.0))]
    fn test_transform_rect_in_100x100_buffer(#[case] transform: OutputTransform, #[case] expected: RectF) {
        let rect = RectF::from_coords(10.0, 20.0, 30.0, 40.0);
        assert_eq!(transform.transform_rect(&rect, 100.0, 100.0), expected);
    }

    #[test]
    fn test_full_extent_maps_onto_transformed_extent() {
        let full = RectF::from_coords(0.0, 0.0, 200.0, 100.0);
        for transform in [
            OutputTransform::Rotated90,
            OutputTransform::Rotated270,
            OutputTransform::FlippedRotated90,
            OutputTransform::FlippedRotated270,
        ] {
            assert_eq!(
                transform.transform_rect(&full, 200.0, 100.0),
                RectF::from_coords(0.0, 0.0, 100.0, 200.0),
                "{:?}",
                transform
            );
            assert_eq!(transform.transform_size(full.size), SizeF::new(100.0, 200.0));
        }
    }
}
