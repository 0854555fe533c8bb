//! Reconstruction of a continuous scalar field from particle samples.

mod gaps;
pub mod interpolate;
mod window;

pub use gaps::{classify_true_gaps, fill_gaps, fill_gaps_with, FillReport, GapMask};
pub use interpolate::{Method, Sample, ScatteredInterpolator};
pub use window::{windowed_mean, WindowParams};

use crate::error::{Error, Result};
use crate::Scalar;
use serde::{Deserialize, Serialize};

/// A row-major grid of window averages.
///
/// Row `i` runs along x at height `y_centers[i]`, column `j` along y at `x_centers[j]`.
/// A cell without data is `None`; a computed zero is `Some(0.)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldGrid {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<Option<Scalar>>,
    /// How many particles contributed to each cell.
    pub samples: Vec<usize>,
    /// Cells that were classified as true gaps by a fill. They stay `None` for good.
    pub gaps: Vec<bool>,
    pub x_centers: Vec<Scalar>,
    pub y_centers: Vec<Scalar>,
}

impl FieldGrid {
    /// An all-missing grid with unit spaced centers starting at zero.
    pub fn new(rows: usize, cols: usize) -> Self {
        FieldGrid {
            rows,
            cols,
            values: vec![None; rows * cols],
            samples: vec![0; rows * cols],
            gaps: vec![false; rows * cols],
            x_centers: (0..cols).map(|j| j as Scalar).collect(),
            y_centers: (0..rows).map(|i| i as Scalar).collect(),
        }
    }

    /// Builds a grid from rows of values. Every row must be as long as the first.
    pub fn from_rows(rows: &[Vec<Option<Scalar>>]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut grid = FieldGrid::new(rows.len(), cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::LengthMismatch {
                    what: format!("grid row {}", i),
                    expected: cols,
                    actual: row.len(),
                });
            }
            for (j, &v) in row.iter().enumerate() {
                grid.set(i, j, v);
            }
        }
        Ok(grid)
    }

    pub fn num_cells(&self) -> usize {
        self.rows * self.cols
    }

    pub fn coord_to_index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn index_to_coord(&self, i: usize) -> (usize, usize) {
        (i / self.cols, i % self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Scalar> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.values[self.coord_to_index(row, col)]
    }

    /// Stores `value`, turning anything non-finite into a missing cell.
    pub fn set(&mut self, row: usize, col: usize, value: Option<Scalar>) {
        let i = self.coord_to_index(row, col);
        self.values[i] = value.filter(|v| v.is_finite());
    }

    pub fn is_missing(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_none()
    }

    pub fn missing_mask(&self) -> Vec<bool> {
        self.values.iter().map(Option::is_none).collect()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    pub fn center(&self, row: usize, col: usize) -> (Scalar, Scalar) {
        (self.x_centers[col], self.y_centers[row])
    }

    /// Values as nested rows, bottom row first, with `NaN` for missing cells. This is the
    /// layout plotting and array tools expect.
    pub fn to_nan_rows(&self) -> Vec<Vec<Scalar>> {
        self.values
            .chunks(self.cols.max(1))
            .map(|row| row.iter().map(|v| v.unwrap_or(Scalar::NAN)).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn index_coord_test(i in 0usize..400, cols in 1usize..20) {
            let grid = FieldGrid::new(400 / cols + 1, cols);
            let (row, col) = grid.index_to_coord(i);

            prop_assert_eq!(grid.coord_to_index(row, col), i);
        }
    }

    #[test]
    fn set_rejects_non_finite_values() {
        let mut grid = FieldGrid::new(2, 2);
        grid.set(0, 0, Some(Scalar::NAN));
        grid.set(0, 1, Some(0.));
        grid.set(1, 0, Some(Scalar::INFINITY));

        assert!(grid.is_missing(0, 0));
        assert_eq!(grid.get(0, 1), Some(0.));
        assert!(grid.is_missing(1, 0));
        assert_eq!(grid.missing_count(), 3);
        assert_eq!(grid.get(5, 5), None);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let result = FieldGrid::from_rows(&[vec![Some(1.), None], vec![Some(2.)]]);

        assert_eq!(
            result,
            Err(Error::LengthMismatch {
                what: "grid row 1".to_owned(),
                expected: 2,
                actual: 1,
            })
        );
        assert_eq!(FieldGrid::from_rows(&[]).unwrap().num_cells(), 0);
    }

    #[test]
    fn nan_rows_mark_missing_cells() {
        let grid = FieldGrid::from_rows(&[vec![Some(1.), None], vec![None, Some(2.)]]).unwrap();
        let rows = grid.to_nan_rows();

        assert_eq!(rows[0][0], 1.);
        assert!(rows[0][1].is_nan());
        assert!(rows[1][0].is_nan());
        assert_eq!(rows[1][1], 2.);
    }
}
