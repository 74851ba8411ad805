use crate::error::{DecodeError, Result};
use crate::matrix::{BitMatrix, Point};

/// Region of the image holding the symbol, bounded by the outer edges of the
/// row indicator columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BoundingBox {
    image_width: u32,
    image_height: u32,
    top_left: Point,
    bottom_left: Point,
    top_right: Point,
    bottom_right: Point,
    min_x: u32,
    max_x: u32,
    min_y: u32,
    max_y: u32,
}

impl BoundingBox {
    /// A side with a missing corner is replaced by the matching image edge.
    /// Fails when neither side is known, or when a side's top lies below its
    /// bottom or the left edge lies right of the right edge.
    pub fn new(
        image: &BitMatrix,
        top_left: Option<Point>,
        bottom_left: Option<Point>,
        top_right: Option<Point>,
        bottom_right: Option<Point>,
    ) -> Result<Self> {
        let right_edge = image.width().saturating_sub(1) as f32;
        let (top_left, bottom_left, top_right, bottom_right) = match (top_left.zip(bottom_left), top_right.zip(bottom_right)) {
            (None, None) => return Err(DecodeError::NotFound),
            (None, Some((tr, br))) => (Point::new(0.0, tr.y), Point::new(0.0, br.y), tr, br),
            (Some((tl, bl)), None) => (tl, bl, Point::new(right_edge, tl.y), Point::new(right_edge, bl.y)),
            (Some((tl, bl)), Some((tr, br))) => (tl, bl, tr, br),
        };
        let bbox = Self::with_corners(image.width() as u32, image.height() as u32, top_left, bottom_left, top_right, bottom_right);

        let ordered = top_left.y <= bottom_left.y && top_right.y <= bottom_right.y;
        if !ordered || bbox.max_x < bbox.min_x {
            return Err(DecodeError::NotFound);
        }
        Ok(bbox)
    }

    fn with_corners(
        image_width: u32,
        image_height: u32,
        top_left: Point,
        bottom_left: Point,
        top_right: Point,
        bottom_right: Point,
    ) -> Self {
        Self {
            image_width,
            image_height,
            top_left,
            bottom_left,
            top_right,
            bottom_right,
            min_x: top_left.x.min(bottom_left.x) as u32,
            max_x: top_right.x.max(bottom_right.x) as u32,
            min_y: top_left.y.min(top_right.y) as u32,
            max_y: bottom_left.y.max(bottom_right.y) as u32,
        }
    }

    /// Left edges of `left` with right edges of `right`.
    pub fn merge(left: Option<Self>, right: Option<Self>) -> Option<Self> {
        match (left, right) {
            (Some(left), Some(right)) => Some(Self::with_corners(
                left.image_width,
                left.image_height,
                left.top_left,
                left.bottom_left,
                right.top_right,
                right.bottom_right,
            )),
            (left, right) => left.or(right),
        }
    }

    /// Grows one side of the box by a number of pixel rows at the top and
    /// bottom, clamped to the image.
    pub fn add_missing_rows(&self, missing_start_rows: u32, missing_end_rows: u32, is_left: bool) -> Self {
        let mut grown = *self;

        if missing_start_rows > 0 {
            let top = if is_left { &mut grown.top_left } else { &mut grown.top_right };
            top.y = (top.y as u32).saturating_sub(missing_start_rows) as f32;
        }
        if missing_end_rows > 0 {
            let bottom = if is_left { &mut grown.bottom_left } else { &mut grown.bottom_right };
            let max_y = (bottom.y as u32 + missing_end_rows).min(self.image_height.saturating_sub(1));
            bottom.y = max_y as f32;
        }

        Self::with_corners(
            self.image_width,
            self.image_height,
            grown.top_left,
            grown.bottom_left,
            grown.top_right,
            grown.bottom_right,
        )
    }

    pub const fn min_x(&self) -> u32 {
        self.min_x
    }

    pub const fn max_x(&self) -> u32 {
        self.max_x
    }

    pub const fn min_y(&self) -> u32 {
        self.min_y
    }

    pub const fn max_y(&self) -> u32 {
        self.max_y
    }

    pub const fn top(&self, is_left: bool) -> Point {
        if is_left { self.top_left } else { self.top_right }
    }

    pub const fn bottom(&self, is_left: bool) -> Point {
        if is_left { self.bottom_left } else { self.bottom_right }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> BitMatrix {
        BitMatrix::new(100, 50)
    }

    #[test]
    fn test_missing_side() {
        let image = image();
        assert_eq!(BoundingBox::new(&image, None, None, None, None), Err(DecodeError::NotFound));
        assert_eq!(
            BoundingBox::new(&image, Some(Point::new(10.0, 5.0)), None, None, Some(Point::new(90.0, 40.0))),
            Err(DecodeError::NotFound)
        );

        let left_only = BoundingBox::new(&image, Some(Point::new(10.0, 5.0)), Some(Point::new(12.0, 40.0)), None, None).unwrap();
        assert_eq!((left_only.min_x(), left_only.max_x()), (10, 99));
        assert_eq!((left_only.min_y(), left_only.max_y()), (5, 40));

        let right_only = BoundingBox::new(&image, None, None, Some(Point::new(80.0, 4.0)), Some(Point::new(82.0, 45.0))).unwrap();
        assert_eq!((right_only.min_x(), right_only.max_x()), (0, 82));
        assert_eq!((right_only.min_y(), right_only.max_y()), (4, 45));

        // bottom corners above the top ones
        assert_eq!(
            BoundingBox::new(&image, Some(Point::new(10.0, 40.0)), Some(Point::new(10.0, 5.0)), None, None),
            Err(DecodeError::NotFound)
        );
        assert_eq!(
            BoundingBox::new(
                &image,
                Some(Point::new(10.0, 5.0)),
                Some(Point::new(10.0, 40.0)),
                Some(Point::new(80.0, 45.0)),
                Some(Point::new(80.0, 4.0)),
            ),
            Err(DecodeError::NotFound)
        );
        // left edge right of the right edge
        assert_eq!(
            BoundingBox::new(
                &image,
                Some(Point::new(80.0, 5.0)),
                Some(Point::new(80.0, 40.0)),
                Some(Point::new(10.0, 5.0)),
                Some(Point::new(10.0, 40.0)),
            ),
            Err(DecodeError::NotFound)
        );
        assert_eq!(
            BoundingBox::new(&image, Some(Point::new(150.0, 5.0)), Some(Point::new(150.0, 40.0)), None, None),
            Err(DecodeError::NotFound)
        );
    }

    #[test]
    fn test_merge() {
        let image = image();
        let left = BoundingBox::new(&image, Some(Point::new(10.0, 5.0)), Some(Point::new(10.0, 40.0)), None, None).unwrap();
        let right = BoundingBox::new(&image, None, None, Some(Point::new(80.0, 3.0)), Some(Point::new(80.0, 42.0))).unwrap();

        assert_eq!(BoundingBox::merge(None, None), None);
        assert_eq!(BoundingBox::merge(Some(left), None), Some(left));

        let merged = BoundingBox::merge(Some(left), Some(right)).unwrap();
        assert_eq!((merged.min_x(), merged.max_x(), merged.min_y(), merged.max_y()), (10, 80, 3, 42));
    }

    #[test]
    fn test_add_missing_rows() {
        let image = image();
        let bbox = BoundingBox::new(
            &image,
            Some(Point::new(10.0, 5.0)),
            Some(Point::new(10.0, 40.0)),
            Some(Point::new(80.0, 5.0)),
            Some(Point::new(80.0, 40.0)),
        )
        .unwrap();

        let grown = bbox.add_missing_rows(8, 20, true);
        assert_eq!((grown.min_y(), grown.max_y()), (0, 49));
        assert_eq!(grown.top(false).y, 5.0);

        let grown = bbox.add_missing_rows(2, 0, false);
        assert_eq!(grown.top(false).y, 3.0);
        assert_eq!(grown.min_y(), 3);
        assert_eq!(grown.max_y(), 40);
    }
}
