use crate::{Scalar, Vec2};
use std::collections::{HashMap, HashSet};

/// Upper bound on global flip passes. Exact inputs settle long before this; it only guards
/// against rounding making two flips undo each other forever.
const MAX_FLIP_PASSES: usize = 1000;

/// Slack allowed on barycentric weights when locating a point, so points on an edge are
/// found regardless of which side rounding puts them.
const LOCATE_EPS: Scalar = 1e-12;

/// Twice the signed area of `abc`; positive when counter-clockwise.
pub(crate) fn orient(a: &Vec2, b: &Vec2, c: &Vec2) -> Scalar {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Positive when `d` lies strictly inside the circumcircle of the counter-clockwise
/// triangle `abc`.
pub(crate) fn in_circle(a: &Vec2, b: &Vec2, c: &Vec2, d: &Vec2) -> Scalar {
    let (adx, ady) = (a.x - d.x, a.y - d.y);
    let (bdx, bdy) = (b.x - d.x, b.y - d.y);
    let (cdx, cdy) = (c.x - d.x, c.y - d.y);

    (adx * adx + ady * ady) * (bdx * cdy - cdx * bdy)
        + (bdx * bdx + bdy * bdy) * (cdx * ady - adx * cdy)
        + (cdx * cdx + cdy * cdy) * (adx * bdy - bdx * ady)
}

/// Delaunay triangulation of a planar point set, covering exactly its convex hull.
///
/// Built by fanning the convex hull, inserting the remaining points one at a time and
/// flipping edges until every edge is locally Delaunay. Duplicate and non-finite points
/// are ignored; fewer than three non-collinear points give an empty triangulation.
pub struct Triangulation {
    points: Vec<Vec2>,
    triangles: Vec<[usize; 3]>,
    index: TriangleIndex,
    stats: BuildStats,
}

/// Work done while building a [`Triangulation`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Triangles visited while walking to the triangle containing each inserted point.
    pub walk_steps: usize,
    /// Insertions whose walk failed and fell back to scanning every triangle.
    pub scans: usize,
    pub flips: usize,
}

impl Triangulation {
    pub fn new(points: &[Vec2]) -> Self {
        let points = points.to_vec();

        let mut order: Vec<usize> = (0..points.len())
            .filter(|&i| points[i].x.is_finite() && points[i].y.is_finite())
            .collect();
        order.sort_by(|&a, &b| {
            points[a]
                .x
                .total_cmp(&points[b].x)
                .then(points[a].y.total_cmp(&points[b].y))
        });
        order.dedup_by(|a, b| points[*a] == points[*b]);

        let hull = convex_hull(&points, &order);
        let mut mesh = Mesh::default();
        if hull.len() >= 3 {
            for k in 1..hull.len() - 1 {
                mesh.add([hull[0], hull[k], hull[k + 1]]);
            }
            // Inserting into a Delaunay mesh and legalizing around the new point keeps it
            // Delaunay, which is what lets point location walk instead of scan.
            mesh.make_delaunay(&points);

            let on_hull: HashSet<usize> = hull.iter().copied().collect();
            order.retain(|p| !on_hull.contains(p));
            snake_order(&points, &mut order);
            for &p in &order {
                mesh.insert(&points, p);
            }
            mesh.make_delaunay(&points);
        }

        let stats = mesh.stats;
        let triangles: Vec<[usize; 3]> = mesh.tris.into_iter().flatten().collect();
        let index = TriangleIndex::new(&points, &triangles);

        tracing::trace!(
            points = points.len(),
            hull = hull.len(),
            triangles = triangles.len(),
            walk_steps = stats.walk_steps,
            scans = stats.scans,
            flips = stats.flips,
            "triangulated samples"
        );

        Triangulation {
            points,
            triangles,
            index,
            stats,
        }
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Counter-clockwise vertex indices into [`Triangulation::points`].
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// The vertices of the triangle containing `q` with their barycentric weights, or
    /// `None` when `q` is outside the convex hull.
    pub fn locate(&self, q: &Vec2) -> Option<[(usize, Scalar); 3]> {
        self.index.candidates(q).iter().find_map(|&t| {
            let [a, b, c] = self.triangles[t];
            let (pa, pb, pc) = (&self.points[a], &self.points[b], &self.points[c]);
            let area = orient(pa, pb, pc);

            let wa = orient(pb, pc, q) / area;
            let wb = orient(pc, pa, q) / area;
            let wc = orient(pa, pb, q) / area;

            if wa >= -LOCATE_EPS && wb >= -LOCATE_EPS && wc >= -LOCATE_EPS {
                Some([(a, wa), (b, wb), (c, wc)])
            } else {
                None
            }
        })
    }

    pub fn contains(&self, q: &Vec2) -> bool {
        self.locate(q).is_some()
    }
}

/// Counter-clockwise convex hull of `sorted` (indices sorted by x then y, no duplicates),
/// without collinear points.
fn convex_hull(points: &[Vec2], sorted: &[usize]) -> Vec<usize> {
    if sorted.len() < 3 {
        return sorted.to_vec();
    }

    let mut hull = half_hull(points, sorted.iter().copied());
    hull.extend(half_hull(points, sorted.iter().rev().copied()));
    hull
}

fn half_hull(points: &[Vec2], order: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut chain: Vec<usize> = Vec::new();
    for i in order {
        while chain.len() >= 2
            && orient(
                &points[chain[chain.len() - 2]],
                &points[chain[chain.len() - 1]],
                &points[i],
            ) <= 0.
        {
            chain.pop();
        }
        chain.push(i);
    }
    chain.pop();
    chain
}

/// Reorders `order` into strips along x, alternating direction along y from strip to
/// strip, so consecutive points are close together.
fn snake_order(points: &[Vec2], order: &mut [usize]) {
    if order.len() < 2 {
        return;
    }
    let (min, max) = order.iter().map(|&i| points[i]).fold(
        (Vec2::from_element(Scalar::INFINITY), Vec2::from_element(Scalar::NEG_INFINITY)),
        |(lo, hi), p| (lo.inf(&p), hi.sup(&p)),
    );
    let size = max - min;
    let spacing = (size.x * size.y / order.len() as Scalar).sqrt();
    let width = if spacing > 0. { 2. * spacing } else { size.x.max(1.) };
    let strip = |i: usize| ((points[i].x - min.x) / width).floor() as i64;

    order.sort_by(|&a, &b| {
        let (sa, sb) = (strip(a), strip(b));
        let along = if sa % 2 == 0 {
            points[a].y.total_cmp(&points[b].y)
        } else {
            points[b].y.total_cmp(&points[a].y)
        };
        sa.cmp(&sb)
            .then(along)
            .then(points[a].x.total_cmp(&points[b].x))
    });
}

/// Triangle soup with a directed-edge lookup. Removed triangles leave a `None` behind.
#[derive(Default)]
struct Mesh {
    tris: Vec<Option<[usize; 3]>>,
    edges: HashMap<(usize, usize), usize>,
    stats: BuildStats,
}

impl Mesh {
    fn add(&mut self, t: [usize; 3]) -> usize {
        let id = self.tris.len();
        self.tris.push(Some(t));
        for k in 0..3 {
            self.edges.insert((t[k], t[(k + 1) % 3]), id);
        }
        id
    }

    fn remove(&mut self, id: usize) -> Option<[usize; 3]> {
        let t = self.tris[id].take()?;
        for k in 0..3 {
            self.edges.remove(&(t[k], t[(k + 1) % 3]));
        }
        Some(t)
    }

    /// The triangle holding the directed edge `u -> v`, and its third vertex.
    fn third(&self, u: usize, v: usize) -> Option<(usize, usize)> {
        let id = *self.edges.get(&(u, v))?;
        let t = self.tris[id]?;
        let w = t.iter().copied().find(|&x| x != u && x != v)?;
        Some((id, w))
    }

    /// Orientation of `q` against the edge opposite each vertex of `t`.
    fn orientations(points: &[Vec2], t: &[usize; 3], q: &Vec2) -> [Scalar; 3] {
        [
            orient(&points[t[1]], &points[t[2]], q),
            orient(&points[t[2]], &points[t[0]], q),
            orient(&points[t[0]], &points[t[1]], q),
        ]
    }

    /// Walks from the most recently added triangle towards `q`, crossing any edge `q` lies
    /// beyond. Terminates on a Delaunay mesh; the step cap only guards against rounding.
    fn walk(&mut self, points: &[Vec2], q: &Vec2) -> Option<(usize, [usize; 3], [Scalar; 3])> {
        let mut id = self.tris.len().checked_sub(1)?;
        for _ in 0..self.tris.len() {
            self.stats.walk_steps += 1;
            let t = self.tris[id]?;
            let o = Self::orientations(points, &t, q);
            match (0..3).find(|&k| o[k] < 0.) {
                None => return Some((id, t, o)),
                Some(k) => id = self.third(t[(k + 2) % 3], t[(k + 1) % 3])?.0,
            }
        }
        None
    }

    fn scan(&mut self, points: &[Vec2], q: &Vec2) -> Option<(usize, [usize; 3], [Scalar; 3])> {
        self.stats.scans += 1;
        self.tris.iter().enumerate().find_map(|(id, t)| {
            let t = (*t)?;
            let o = Self::orientations(points, &t, q);
            if o.iter().all(|&v| v >= 0.) {
                Some((id, t, o))
            } else {
                None
            }
        })
    }

    fn insert(&mut self, points: &[Vec2], p: usize) {
        let q = &points[p];
        let found = match self.walk(points, q) {
            Some(found) => Some(found),
            None => self.scan(points, q),
        };
        let (id, [a, b, c], o) = match found {
            Some(found) => found,
            None => return,
        };

        let on_edges = o.iter().filter(|&&v| v == 0.).count();
        if on_edges >= 2 {
            // Coincides with a vertex.
            return;
        }

        self.remove(id);
        let mut pending = Vec::with_capacity(4);
        if on_edges == 0 {
            self.add([a, b, p]);
            self.add([b, c, p]);
            self.add([c, a, p]);
            pending.extend_from_slice(&[(a, b), (b, c), (c, a)]);
        } else {
            // Rotate so that p sits on the edge u -> v.
            let (u, v, w) = if o[2] == 0. {
                (a, b, c)
            } else if o[0] == 0. {
                (b, c, a)
            } else {
                (c, a, b)
            };
            self.add([w, u, p]);
            self.add([v, w, p]);
            pending.extend_from_slice(&[(w, u), (v, w)]);

            if let Some((other, x)) = self.third(v, u) {
                self.remove(other);
                self.add([x, v, p]);
                self.add([u, x, p]);
                pending.extend_from_slice(&[(x, v), (u, x)]);
            }
        }

        while let Some((u, v)) = pending.pop() {
            if let Some((x, _)) = self.flip_if_illegal(points, u, v, Some(p)) {
                pending.push((u, x));
                pending.push((x, v));
            }
        }
    }

    /// Flips the edge `u -> v` when the vertex across it lies inside the circumcircle of
    /// the triangle on this side. With `apex` set, only flips if that triangle's third
    /// vertex is `apex`. Returns the vertex across the old edge and the apex.
    fn flip_if_illegal(
        &mut self,
        points: &[Vec2],
        u: usize,
        v: usize,
        apex: Option<usize>,
    ) -> Option<(usize, usize)> {
        let (t1, w) = self.third(u, v)?;
        if apex.map_or(false, |apex| apex != w) {
            return None;
        }
        let (t2, q) = self.third(v, u)?;

        let (pu, pv, pw, pq) = (&points[u], &points[v], &points[w], &points[q]);
        let convex = orient(pu, pq, pw) > 0. && orient(pq, pv, pw) > 0.;
        if !convex || in_circle(pu, pv, pw, pq) <= 0. {
            return None;
        }

        self.remove(t1);
        self.remove(t2);
        self.add([u, q, w]);
        self.add([q, v, w]);
        self.stats.flips += 1;
        Some((q, w))
    }

    fn make_delaunay(&mut self, points: &[Vec2]) {
        for _ in 0..MAX_FLIP_PASSES {
            let mut edges: Vec<(usize, usize)> =
                self.edges.keys().copied().filter(|(u, v)| u < v).collect();
            edges.sort_unstable();

            let mut flipped = false;
            for (u, v) in edges {
                flipped |= self.flip_if_illegal(points, u, v, None).is_some();
            }
            if !flipped {
                return;
            }
        }
        tracing::warn!("delaunay flips did not settle");
    }
}

/// Uniform bucket grid over the triangles' bounding boxes.
struct TriangleIndex {
    origin: Vec2,
    cell: Scalar,
    nx: usize,
    ny: usize,
    buckets: Vec<Vec<usize>>,
}

impl TriangleIndex {
    fn new(points: &[Vec2], triangles: &[[usize; 3]]) -> Self {
        let mut min = Vec2::from_element(Scalar::INFINITY);
        let mut max = Vec2::from_element(Scalar::NEG_INFINITY);
        for p in triangles.iter().flatten().map(|&i| points[i]) {
            min = min.inf(&p);
            max = max.sup(&p);
        }

        if triangles.is_empty() {
            return TriangleIndex {
                origin: Vec2::zeros(),
                cell: 1.,
                nx: 0,
                ny: 0,
                buckets: Vec::new(),
            };
        }

        let size = max - min;
        let cell = (size.x * size.y / triangles.len() as Scalar)
            .sqrt()
            .max(size.max() / 1024.)
            .max(Scalar::MIN_POSITIVE);
        let nx = (size.x / cell).floor() as usize + 1;
        let ny = (size.y / cell).floor() as usize + 1;

        let mut index = TriangleIndex {
            origin: min,
            cell,
            nx,
            ny,
            buckets: vec![Vec::new(); nx * ny],
        };

        for (id, t) in triangles.iter().enumerate() {
            let (lo, hi) = t.iter().map(|&i| points[i]).fold(
                (Vec2::from_element(Scalar::INFINITY), Vec2::from_element(Scalar::NEG_INFINITY)),
                |(lo, hi), p| (lo.inf(&p), hi.sup(&p)),
            );
            let (x0, y0) = index.bin(&lo);
            let (x1, y1) = index.bin(&hi);
            for (bx, by) in itertools::iproduct!(x0..=x1, y0..=y1) {
                index.buckets[by * nx + bx].push(id);
            }
        }

        index
    }

    fn bin(&self, p: &Vec2) -> (usize, usize) {
        let rel = (p - self.origin) / self.cell;
        let clamp = |v: Scalar, n: usize| (v.floor().max(0.) as usize).min(n - 1);
        (clamp(rel.x, self.nx), clamp(rel.y, self.ny))
    }

    fn candidates(&self, q: &Vec2) -> &[usize] {
        if self.buckets.is_empty() {
            return &[];
        }
        let max = self.origin + Vec2::new(self.nx as Scalar, self.ny as Scalar) * self.cell;
        let slack = self.cell * 1e-9;
        if q.x < self.origin.x - slack
            || q.y < self.origin.y - slack
            || q.x > max.x + slack
            || q.y > max.y + slack
        {
            return &[];
        }
        let (bx, by) = self.bin(q);
        &self.buckets[by * self.nx + bx]
    }
}
