use super::{Sample, ScatteredInterpolator, Triangulation};
use crate::{Scalar, Vec2};
use rayon::prelude::*;

/// Piecewise linear interpolation over the Delaunay triangulation of the samples.
///
/// Undefined outside the samples' convex hull.
pub struct Linear;

impl ScatteredInterpolator for Linear {
    fn interpolate(&self, samples: &[Sample], queries: &[Vec2]) -> Vec<Option<Scalar>> {
        let points: Vec<Vec2> = samples.iter().map(|s| s.position).collect();
        let triangulation = Triangulation::new(&points);

        queries
            .par_iter()
            .map(|q| barycentric_estimate(&triangulation, samples, q))
            .collect()
    }
}

pub(super) fn barycentric_estimate(
    triangulation: &Triangulation,
    samples: &[Sample],
    q: &Vec2,
) -> Option<Scalar> {
    let weights = triangulation.locate(q)?;
    Some(weights.iter().map(|&(i, w)| w * samples[i].value).sum())
}
