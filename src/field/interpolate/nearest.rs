use super::{Sample, ScatteredInterpolator};
use crate::{Scalar, Vec2};
use kiddo::{ImmutableKdTree, SquaredEuclidean};
use rayon::prelude::*;

/// Builds a k-d tree over the sample positions. Items are indices into `samples`.
pub(super) fn build_kdtree(samples: &[Sample]) -> ImmutableKdTree<Scalar, 2> {
    let entries: Vec<[Scalar; 2]> = samples
        .iter()
        .map(|s| [s.position.x, s.position.y])
        .collect();
    ImmutableKdTree::new_from_slice(&entries)
}

/// Index of the sample closest to `q`, the lowest index among samples at the same
/// distance.
fn nearest_index(tree: &ImmutableKdTree<Scalar, 2>, len: usize, q: &Vec2) -> usize {
    let query = [q.x, q.y];
    let closest = tree.nearest_one::<SquaredEuclidean>(&query);

    // Pull in more neighbours until every sample tied with the closest one is seen.
    let mut n = 4;
    loop {
        let found = tree.nearest_n::<SquaredEuclidean>(&query, n.min(len));
        let tied = found
            .iter()
            .filter(|nn| nn.distance <= closest.distance)
            .map(|nn| nn.item as usize)
            .min()
            .unwrap_or(closest.item as usize);
        let exhausted = found.len() < n || found.last().map_or(true, |nn| nn.distance > closest.distance);
        if exhausted {
            return tied;
        }
        n *= 2;
    }
}

/// Value of the closest sample. Ties go to the sample listed first. Defined everywhere.
pub struct Nearest;

impl ScatteredInterpolator for Nearest {
    fn interpolate(&self, samples: &[Sample], queries: &[Vec2]) -> Vec<Option<Scalar>> {
        if samples.is_empty() {
            return vec![None; queries.len()];
        }
        let tree = build_kdtree(samples);

        queries
            .par_iter()
            .map(|q| Some(samples[nearest_index(&tree, samples.len(), q)].value))
            .collect()
    }
}
