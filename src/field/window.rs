use super::FieldGrid;
use crate::error::{ensure_finite, Error, Result};
use crate::util::{RangeExt, Rect};
use crate::{Scalar, Vec2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowParams {
    /// Side length of the square window.
    pub window_size: Scalar,
    /// Fraction of the window shared by consecutive window positions, in `[0, 1)`.
    pub overlap: Scalar,
}

impl Default for WindowParams {
    fn default() -> Self {
        WindowParams {
            window_size: 3.,
            overlap: 0.5,
        }
    }
}

impl WindowParams {
    /// Distance between consecutive window positions.
    pub fn step(&self) -> Scalar {
        self.window_size * (1. - self.overlap)
    }

    pub fn validate(&self, width: Scalar, height: Scalar) -> Result<()> {
        let invalid = |reason| Error::InvalidWindow { reason };
        ensure_finite(
            &[
                ("window size", self.window_size),
                ("overlap", self.overlap),
                ("width", width),
                ("height", height),
            ],
            invalid,
        )?;

        if !(0. ..1.).contains(&self.overlap) {
            return Err(invalid(format!(
                "overlap must lie in [0, 1), got {}",
                self.overlap
            )));
        }
        if self.window_size <= 0. || self.step() <= 0. {
            return Err(invalid(format!(
                "window size must be positive, got {}",
                self.window_size
            )));
        }
        if width < self.window_size || height < self.window_size {
            return Err(invalid(format!(
                "window of size {} does not fit a {} x {} domain",
                self.window_size, width, height
            )));
        }
        Ok(())
    }

    /// Number of window positions along an axis of the given extent.
    pub fn positions_along(&self, extent: Scalar) -> usize {
        ((extent - self.window_size) / self.step()).ceil() as usize + 1
    }

    /// `(rows, cols)` of the grid over a `width x height` domain.
    pub fn grid_shape(&self, width: Scalar, height: Scalar) -> (usize, usize) {
        (self.positions_along(height), self.positions_along(width))
    }
}

/// Averages `values` over square windows swept across `bounds`.
///
/// Window `(i, j)` covers `[x_min + j*step, x_min + j*step + window_size]` by the same on y,
/// bounds included. A particle sitting on the edge shared by two windows is counted in
/// both. Cells whose window holds no particle are missing.
#[tracing::instrument(level = "info", skip(positions, values))]
pub fn windowed_mean(
    positions: &[Vec2],
    values: &[Scalar],
    bounds: &Rect,
    params: &WindowParams,
) -> Result<FieldGrid> {
    let size = bounds.size();
    params.validate(size.x, size.y)?;
    if positions.len() != values.len() {
        return Err(Error::LengthMismatch {
            what: "attribute values".to_owned(),
            expected: positions.len(),
            actual: values.len(),
        });
    }

    let (rows, cols) = params.grid_shape(size.x, size.y);
    let step = params.step();
    let origin = bounds.start;
    let half = 0.5 * params.window_size;

    // Sorting by x lets every window binary search the slab of particles it can contain.
    let mut order: Vec<usize> = (0..positions.len()).collect();
    order.sort_by(|&a, &b| positions[a].x.total_cmp(&positions[b].x));
    let sorted_x: Vec<Scalar> = order.iter().map(|&p| positions[p].x).collect();

    let cells: Vec<(Option<Scalar>, usize)> = (0..rows * cols)
        .into_par_iter()
        .map(|idx| {
            let (i, j) = (idx / cols, idx % cols);
            let x_min = origin.x + j as Scalar * step;
            let y_min = origin.y + i as Scalar * step;
            let x_max = x_min + params.window_size;
            let y_max = y_min + params.window_size;

            let lo = sorted_x.partition_point(|&x| x < x_min);
            let hi = sorted_x.partition_point(|&x| x <= x_max);

            let (sum, count) = order[lo..hi]
                .iter()
                .filter(|&&p| (y_min..=y_max).contains(&positions[p].y))
                .fold((0., 0usize), |(sum, count), &p| (sum + values[p], count + 1));

            if count > 0 {
                (Some(sum / count as Scalar), count)
            } else {
                (None, 0)
            }
        })
        .collect();

    let mut grid = FieldGrid::new(rows, cols);
    grid.x_centers = (0..cols)
        .map(|j| origin.x + j as Scalar * step + half)
        .collect();
    grid.y_centers = (0..rows)
        .map(|i| origin.y + i as Scalar * step + half)
        .collect();
    for (idx, (value, count)) in cells.into_iter().enumerate() {
        let (i, j) = grid.index_to_coord(idx);
        grid.set(i, j, value);
        grid.samples[idx] = count;
    }

    tracing::info!(
        rows,
        cols,
        particles = positions.len(),
        empty = grid.missing_count(),
        "built windowed field"
    );

    Ok(grid)
}
