use crate::{Scalar, Vec2};
use std::ops::Range;

/// Axis-aligned rectangle `[x_min, x_max] x [y_min, y_max]`.
pub type Rect = Range<Vec2>;

pub fn rect(x_min: Scalar, x_max: Scalar, y_min: Scalar, y_max: Scalar) -> Rect {
    Vec2::new(x_min, y_min)..Vec2::new(x_max, y_max)
}

pub trait RangeExt {
    fn size(&self) -> Vec2;

    fn center(&self) -> Vec2;

    /// Inclusive on both ends of both axes, so a point on the edge of two touching
    /// rectangles is contained in both.
    fn contains_point(&self, x: &Vec2) -> bool;

    fn is_empty_area(&self) -> bool;
}

impl RangeExt for Range<Vec2> {
    fn size(&self) -> Vec2 {
        self.end - self.start
    }

    fn center(&self) -> Vec2 {
        0.5 * (self.start + self.end)
    }

    fn contains_point(&self, x: &Vec2) -> bool {
        self.start.x <= x.x && x.x <= self.end.x && self.start.y <= x.y && x.y <= self.end.y
    }

    fn is_empty_area(&self) -> bool {
        !(self.start.x < self.end.x && self.start.y < self.end.y)
    }
}
