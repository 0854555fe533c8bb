use super::interpolate::{Method, Sample, ScatteredInterpolator};
use super::FieldGrid;
use crate::Vec2;
use rayon::prelude::*;
use smallvec::SmallVec;

/// Cells of a grid that are missing because no material is there, not because sampling
/// happened to miss them.
#[derive(Debug, Clone, PartialEq)]
pub struct GapMask {
    pub rows: usize,
    pub cols: usize,
    pub mask: Vec<bool>,
}

impl GapMask {
    pub fn is_gap(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.mask[row * self.cols + col]
    }

    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&g| g).count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Missing cells before the fill.
    pub missing: usize,
    /// Missing cells classified as true gaps, including those flagged by earlier fills.
    pub gaps: usize,
    /// Cells that received an estimate.
    pub filled: usize,
    /// Non-gap cells the interpolator could not estimate. They stay missing.
    pub unresolved: usize,
}

fn neighbours(row: usize, col: usize, rows: usize, cols: usize) -> SmallVec<[(usize, usize); 8]> {
    let mut out = SmallVec::new();
    for dr in -1isize..=1 {
        for dc in -1isize..=1 {
            if dr == 0 && dc == 0 {
                continue;
            }
            let r = row as isize + dr;
            let c = col as isize + dc;
            if r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols {
                out.push((r as usize, c as usize));
            }
        }
    }
    out
}

/// Whether every cell of a border line of length `len` is missing.
fn line_missing(missing: impl Fn(usize) -> bool, len: usize) -> bool {
    (0..len).all(missing)
}

fn is_true_gap(missing: &[bool], rows: usize, cols: usize, row: usize, col: usize) -> bool {
    let at = |r: usize, c: usize| missing[r * cols + c];
    if !at(row, col) {
        return false;
    }

    let isolated = neighbours(row, col, rows, cols)
        .iter()
        .all(|&(r, c)| at(r, c));
    let interior = row > 0 && col > 0 && row + 1 < rows && col + 1 < cols;
    if isolated || interior {
        return isolated;
    }

    (row == 0 && line_missing(|c| at(0, c), cols))
        || (row + 1 == rows && line_missing(|c| at(rows - 1, c), cols))
        || (col == 0 && line_missing(|r| at(r, 0), rows))
        || (col + 1 == cols && line_missing(|r| at(r, cols - 1), rows))
}

/// Classifies the missing cells of `grid` that must not be filled.
///
/// A missing cell is a true gap when all of its in-bounds neighbours (8-connected) are
/// missing too. A missing cell on the border is also a true gap when the whole border row or
/// column it lies on is missing, i.e. the material never reaches that edge. Partial runs
/// along a border, corner notches included, are filled. Cells flagged by an earlier fill
/// stay flagged while missing.
pub fn classify_true_gaps(grid: &FieldGrid) -> GapMask {
    let missing = grid.missing_mask();
    let (rows, cols) = (grid.rows, grid.cols);

    let mask = (0..rows * cols)
        .into_par_iter()
        .map(|idx| {
            let (row, col) = (idx / cols, idx % cols);
            missing[idx] && (grid.gaps[idx] || is_true_gap(&missing, rows, cols, row, col))
        })
        .collect();

    GapMask { rows, cols, mask }
}

/// Fills missing cells of `grid` with `method`, leaving true gaps missing.
pub fn fill_gaps(grid: &mut FieldGrid, method: Method) -> FillReport {
    fill_gaps_with(grid, &method)
}

/// Fills every missing cell that is not a true gap with an estimate from `interpolator`,
/// using the populated cells as samples at their `(col, row)` coordinates.
///
/// Real values are never changed. Estimates that are undefined or non-finite leave the cell
/// missing. The gap classification is stored on the grid, which makes a second fill a
/// no-op.
#[tracing::instrument(level = "info", skip(grid, interpolator), fields(rows = grid.rows, cols = grid.cols))]
pub fn fill_gaps_with<I: ScatteredInterpolator + ?Sized>(
    grid: &mut FieldGrid,
    interpolator: &I,
) -> FillReport {
    let missing = grid.missing_count();
    if missing == 0 {
        return FillReport::default();
    }

    let gaps = classify_true_gaps(grid);
    grid.gaps = gaps.mask;

    let position = |idx: usize| Vec2::new((idx % grid.cols) as f64, (idx / grid.cols) as f64);
    let samples: Vec<Sample> = grid
        .values
        .iter()
        .enumerate()
        .filter_map(|(idx, v)| {
            v.map(|value| Sample {
                position: position(idx),
                value,
            })
        })
        .collect();
    // Gap cells are never queried, so they come out of the fill missing.
    let targets: Vec<usize> = (0..grid.num_cells())
        .filter(|&idx| grid.values[idx].is_none() && !grid.gaps[idx])
        .collect();
    let queries: Vec<Vec2> = targets.iter().map(|&idx| position(idx)).collect();

    let estimates = if samples.is_empty() || queries.is_empty() {
        vec![None; queries.len()]
    } else {
        interpolator.interpolate(&samples, &queries)
    };

    let mut filled = 0;
    for (&idx, estimate) in targets.iter().zip(estimates) {
        let estimate = estimate.filter(|v| v.is_finite());
        filled += estimate.is_some() as usize;
        grid.values[idx] = estimate;
    }

    let report = FillReport {
        missing,
        gaps: grid.gaps.iter().filter(|&&g| g).count(),
        filled,
        unresolved: targets.len() - filled,
    };
    tracing::info!(
        missing = report.missing,
        gaps = report.gaps,
        filled = report.filled,
        unresolved = report.unresolved,
        "filled missing cells"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scalar;
    use proptest::prelude::*;

    fn grid_with(n: usize, value: Scalar, missing: &[(usize, usize)]) -> FieldGrid {
        let mut grid = FieldGrid::new(n, n);
        for i in 0..n {
            for j in 0..n {
                if !missing.contains(&(i, j)) {
                    grid.set(i, j, Some(value));
                }
            }
        }
        grid
    }

    const METHODS: [Method; 3] = [Method::Nearest, Method::Linear, Method::Cubic];

    #[test]
    fn interior_hole_is_filled() {
        for &method in METHODS.iter() {
            let mut grid = grid_with(5, 1., &[(2, 2)]);
            let report = fill_gaps(&mut grid, method);

            assert_eq!(grid.missing_count(), 0, "{}", method);
            assert!((grid.get(2, 2).unwrap() - 1.).abs() < 1e-6, "{}", method);
            assert_eq!(report.filled, 1);
            assert_eq!(report.gaps, 0);
        }
    }

    #[test]
    fn single_hole_in_a_large_grid() {
        let mut grid = FieldGrid::new(133, 199);
        for i in 0..grid.num_cells() {
            grid.values[i] = Some(1.);
        }
        let hole = grid.coord_to_index(66, 99);
        grid.values[hole] = None;

        let report = fill_gaps(&mut grid, Method::Linear);

        assert_eq!(report.filled, 1);
        assert!((grid.get(66, 99).unwrap() - 1.).abs() < 1e-12);
    }

    #[test]
    fn missing_edge_column_is_a_true_gap() {
        let column: Vec<_> = (0..5).map(|i| (i, 4)).collect();
        for &method in METHODS.iter() {
            let mut grid = grid_with(5, 1., &column);
            let before = grid.clone();
            let report = fill_gaps(&mut grid, method);

            assert_eq!(report.gaps, 5);
            assert_eq!(report.filled, 0);
            assert_eq!(grid.values, before.values);
            assert!((0..5).all(|i| grid.gaps[grid.coord_to_index(i, 4)]));
        }
    }

    #[test]
    fn interior_block_is_a_gap_at_its_core_only() {
        let hole: Vec<_> = itertools::iproduct!(1..6, 1..6).collect();
        let mut grid = grid_with(7, 2., &hole);
        let gaps = classify_true_gaps(&grid);

        assert_eq!(gaps.count(), 9);
        assert!(gaps.is_gap(3, 3));
        assert!(!gaps.is_gap(1, 1));

        fill_gaps(&mut grid, Method::Linear);
        assert_eq!(grid.missing_count(), 9);
        assert!((grid.get(1, 3).unwrap() - 2.).abs() < 1e-12);
    }

    #[test]
    fn ragged_border_cell_is_filled() {
        let mut grid = grid_with(5, 2., &[(0, 2)]);
        assert_eq!(classify_true_gaps(&grid).count(), 0);

        fill_gaps(&mut grid, Method::Linear);
        assert!((grid.get(0, 2).unwrap() - 2.).abs() < 1e-12);
    }

    #[test]
    fn partial_border_runs_are_filled() {
        // Three missing cells in the middle of the bottom row.
        let mut grid = grid_with(5, 2., &[(0, 1), (0, 2), (0, 3)]);
        assert_eq!(classify_true_gaps(&grid).count(), 0);

        fill_gaps(&mut grid, Method::Nearest);
        assert_eq!(grid.missing_count(), 0);

        // Same run pushed into the corner.
        let grid = grid_with(5, 2., &[(0, 0), (0, 1), (0, 2)]);
        assert_eq!(classify_true_gaps(&grid).count(), 0);
    }

    #[test]
    fn corner_notch_next_to_data_is_filled() {
        let mut grid = grid_with(5, 2., &[(0, 0), (0, 1)]);
        let report = fill_gaps(&mut grid, Method::Nearest);

        assert_eq!(report.gaps, 0);
        assert_eq!(report.filled, 2);
        assert_eq!(grid.get(0, 0), Some(2.));
        assert_eq!(grid.get(0, 1), Some(2.));
    }

    #[test]
    fn missing_bottom_row_is_a_true_gap() {
        let row: Vec<_> = (0..5).map(|j| (0, j)).collect();
        let mut grid = grid_with(5, 2., &row);
        let report = fill_gaps(&mut grid, Method::Nearest);

        assert_eq!(report.gaps, 5);
        assert_eq!(report.filled, 0);
        assert!((0..5).all(|j| grid.is_missing(0, j)));
    }

    #[test]
    fn complete_grid_is_untouched() {
        let mut grid = grid_with(3, 1., &[]);
        let before = grid.clone();

        assert_eq!(fill_gaps(&mut grid, Method::Cubic), FillReport::default());
        assert_eq!(grid, before);
    }

    #[test]
    fn all_missing_grid_stays_missing() {
        let mut grid = FieldGrid::new(3, 4);
        let report = fill_gaps(&mut grid, Method::Nearest);

        assert_eq!(report.gaps, 12);
        assert_eq!(grid.missing_count(), 12);
    }

    #[test]
    fn nearest_fills_outside_hull_linear_does_not() {
        // A populated 3x3 block in the middle of a 5x5 grid plus one populated corner, so the
        // bottom row and left column are not gaps but stick out of the samples' hull.
        let mut values = vec![vec![None; 5]; 5];
        for (i, j) in itertools::iproduct!(1..4, 1..4) {
            values[i][j] = Some(1.);
        }
        values[0][0] = Some(1.);
        let mut linear = FieldGrid::from_rows(&values).unwrap();
        let mut nearest = linear.clone();

        let l = fill_gaps(&mut linear, Method::Linear);
        let n = fill_gaps(&mut nearest, Method::Nearest);

        assert!(l.unresolved > 0);
        assert_eq!(n.unresolved, 0);
        assert_eq!(l.gaps, n.gaps);
    }

    proptest! {
        #[test]
        fn filling_is_idempotent(
            cells in proptest::collection::vec(proptest::option::weighted(0.7, -5.0f64..5.), 42),
            method_index in 0usize..3,
        ) {
            let rows: Vec<Vec<Option<Scalar>>> = cells.chunks(7).map(|r| r.to_vec()).collect();
            let mut grid = FieldGrid::from_rows(&rows).unwrap();
            let method = METHODS[method_index];

            fill_gaps(&mut grid, method);
            let once = grid.clone();
            fill_gaps(&mut grid, method);

            prop_assert_eq!(&grid, &once);
        }

        #[test]
        fn real_values_are_never_changed(
            cells in proptest::collection::vec(proptest::option::weighted(0.6, -5.0f64..5.), 36),
        ) {
            let rows: Vec<Vec<Option<Scalar>>> = cells.chunks(6).map(|r| r.to_vec()).collect();
            let before = FieldGrid::from_rows(&rows).unwrap();
            let mut grid = before.clone();

            fill_gaps(&mut grid, Method::Linear);

            for (a, b) in before.values.iter().zip(&grid.values) {
                if a.is_some() {
                    prop_assert_eq!(a, b);
                }
            }
            for (idx, &gap) in grid.gaps.iter().enumerate() {
                if gap {
                    prop_assert!(grid.values[idx].is_none());
                }
            }
        }
    }
}
