use super::linear::barycentric_estimate;
use super::nearest::build_kdtree;
use super::{Sample, ScatteredInterpolator, Triangulation};
use crate::{Scalar, Vec2};
use kiddo::SquaredEuclidean;
use na::{DMatrix, DVector};
use rayon::prelude::*;

/// Smooth interpolation with a thin plate spline fitted to the nearest samples of each
/// query.
///
/// Like [`super::Linear`] it is only defined inside the samples' convex hull. When the local
/// fit is singular (all neighbours collinear, say) the linear estimate is used instead.
pub struct ThinPlate {
    pub neighbours: usize,
}

impl Default for ThinPlate {
    fn default() -> Self {
        ThinPlate { neighbours: 16 }
    }
}

fn kernel(r2: Scalar) -> Scalar {
    if r2 > 0. {
        0.5 * r2 * r2.ln()
    } else {
        0.
    }
}

impl ThinPlate {
    /// Fits `r^2 log r` radial terms plus a plane to `local`, with coordinates taken
    /// relative to `q`, and evaluates the fit at `q`.
    fn fit(&self, local: &[&Sample], q: &Vec2) -> Option<Scalar> {
        let n = local.len();
        let m = n + 3;
        let rel: Vec<Vec2> = local.iter().map(|s| s.position - q).collect();

        let mut a = DMatrix::<Scalar>::zeros(m, m);
        let mut b = DVector::<Scalar>::zeros(m);
        for i in 0..n {
            for j in 0..i {
                let phi = kernel((rel[i] - rel[j]).norm_squared());
                a[(i, j)] = phi;
                a[(j, i)] = phi;
            }
            let affine = [1., rel[i].x, rel[i].y];
            for (k, &v) in affine.iter().enumerate() {
                a[(i, n + k)] = v;
                a[(n + k, i)] = v;
            }
            b[i] = local[i].value;
        }

        let coeffs = a.lu().solve(&b)?;
        // At q every relative coordinate of the plane term is zero.
        let estimate = (0..n)
            .map(|i| coeffs[i] * kernel(rel[i].norm_squared()))
            .sum::<Scalar>()
            + coeffs[n];

        Some(estimate).filter(|e| e.is_finite())
    }
}

impl ScatteredInterpolator for ThinPlate {
    fn interpolate(&self, samples: &[Sample], queries: &[Vec2]) -> Vec<Option<Scalar>> {
        let points: Vec<Vec2> = samples.iter().map(|s| s.position).collect();
        let triangulation = Triangulation::new(&points);
        if triangulation.triangles().is_empty() {
            return vec![None; queries.len()];
        }
        let tree = build_kdtree(samples);
        let k = self.neighbours.max(3).min(samples.len());

        queries
            .par_iter()
            .map(|q| {
                let fallback = barycentric_estimate(&triangulation, samples, q)?;

                let local: Vec<&Sample> = tree
                    .nearest_n::<SquaredEuclidean>(&[q.x, q.y], k)
                    .into_iter()
                    .map(|nn| &samples[nn.item as usize])
                    .collect();

                Some(self.fit(&local, q).unwrap_or(fallback))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;

    fn lattice(n: usize, f: impl Fn(Scalar, Scalar) -> Scalar) -> Vec<Sample> {
        iproduct!(0..n, 0..n)
            .map(|(i, j)| (j as Scalar, i as Scalar))
            .map(|(x, y)| Sample::new(x, y, f(x, y)))
            .collect()
    }

    #[test]
    fn reproduces_constants_and_planes() {
        let queries = [Vec2::new(2., 2.), Vec2::new(0.5, 3.25), Vec2::new(4., 0.)];

        let constant = ThinPlate::default().interpolate(&lattice(5, |_, _| 1.), &queries);
        assert!(constant.iter().all(|e| (e.unwrap() - 1.).abs() < 1e-9));

        let plane = |x: Scalar, y: Scalar| 3. * x + y - 1.;
        let estimates = ThinPlate::default().interpolate(&lattice(5, plane), &queries);
        for (q, e) in queries.iter().zip(estimates) {
            assert!((e.unwrap() - plane(q.x, q.y)).abs() < 1e-8);
        }
    }

    #[test]
    fn smooth_field_is_close() {
        let f = |x: Scalar, y: Scalar| (0.3 * x).sin() + (0.2 * y).cos();
        let samples = lattice(9, f);
        let q = Vec2::new(3.5, 4.5);

        let e = ThinPlate::default().interpolate(&samples, &[q])[0].unwrap();
        assert!((e - f(q.x, q.y)).abs() < 5e-2);
    }

    #[test]
    fn undefined_outside_hull() {
        let e = ThinPlate::default().interpolate(&lattice(3, |x, _| x), &[Vec2::new(5., 5.)]);
        assert_eq!(e, vec![None]);
    }

    #[test]
    fn three_samples_fit_a_plane() {
        let samples = [
            Sample::new(0., 0., 0.),
            Sample::new(1., 0., 1.),
            Sample::new(0., 1., 2.),
        ];
        let e = ThinPlate { neighbours: 3 }.interpolate(&samples, &[Vec2::new(0.25, 0.25)])[0]
            .unwrap();
        assert!((e - 0.75).abs() < 1e-9);
    }
}
