use crate::error::{ensure_finite, Error, Result};
use crate::util::{rect, RangeExt, Rect};
use crate::{Scalar, Vec2};
use serde::{Deserialize, Serialize};

/// Positions of the four boundary walls of a model box, as reported by the simulation
/// engine. Only the coordinate normal to each wall matters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Walls {
    pub left: Scalar,
    pub right: Scalar,
    pub bottom: Scalar,
    pub top: Scalar,
}

/// The rectangle a model occupies. Captured once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub bounds: Rect,
}

impl Domain {
    pub fn new(bounds: Rect) -> Result<Self> {
        let invalid = |reason| Error::InvalidDomain { reason };
        ensure_finite(
            &[
                ("x_min", bounds.start.x),
                ("x_max", bounds.end.x),
                ("y_min", bounds.start.y),
                ("y_max", bounds.end.y),
            ],
            invalid,
        )?;
        if bounds.is_empty_area() {
            return Err(invalid(format!(
                "bounds {:?}..{:?} enclose no area",
                bounds.start, bounds.end
            )));
        }
        Ok(Domain { bounds })
    }

    pub fn from_walls(walls: Walls) -> Result<Self> {
        Self::new(rect(walls.left, walls.right, walls.bottom, walls.top))
    }

    /// Bottom left corner.
    pub fn origin(&self) -> Vec2 {
        self.bounds.start
    }

    pub fn width(&self) -> Scalar {
        self.bounds.size().x
    }

    pub fn height(&self) -> Scalar {
        self.bounds.size().y
    }

    /// The full-height strip `[x_min, x_max]` of the domain.
    pub fn column(&self, x_min: Scalar, x_max: Scalar) -> Rect {
        rect(x_min, x_max, self.bounds.start.y, self.bounds.end.y)
    }

    /// The full-width strip `[y_min, y_max]` of the domain.
    pub fn row(&self, y_min: Scalar, y_max: Scalar) -> Rect {
        rect(self.bounds.start.x, self.bounds.end.x, y_min, y_max)
    }
}
