//! Bowyer-Watson Delaunay triangulation in the plane.
//!
//! Quadratic in the number of sites, which is fine for option chains (a few
//! hundred strikes across a handful of expiries). Callers should remove exact
//! duplicate sites first; a duplicate is simply left out of the mesh.

use std::collections::HashMap;

pub type Point2 = [f64; 2];

/// Triangles with less (doubled) area than this are skipped by point location
const DEGENERATE_AREA: f64 = 1e-18;

/// Twice the signed area of (a, b, c); positive when counter-clockwise.
pub fn orient(a: Point2, b: Point2, c: Point2) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

#[derive(Debug, Clone, Copy)]
struct Circumcircle {
    cx: f64,
    cy: f64,
    r2: f64,
}

impl Circumcircle {
    fn through(a: Point2, b: Point2, c: Point2) -> Self {
        let (bx, by) = (b[0] - a[0], b[1] - a[1]);
        let (cx, cy) = (c[0] - a[0], c[1] - a[1]);
        let d = 2.0 * (bx * cy - by * cx);
        if d == 0.0 {
            // Collinear: no finite circle. Any later insertion removes it.
            return Self {
                cx: (a[0] + b[0] + c[0]) / 3.0,
                cy: (a[1] + b[1] + c[1]) / 3.0,
                r2: f64::INFINITY,
            };
        }
        let b2 = bx * bx + by * by;
        let c2 = cx * cx + cy * cy;
        let ux = (cy * b2 - by * c2) / d;
        let uy = (bx * c2 - cx * b2) / d;
        Self {
            cx: a[0] + ux,
            cy: a[1] + uy,
            r2: ux * ux + uy * uy,
        }
    }

    fn contains(&self, p: Point2) -> bool {
        let dx = p[0] - self.cx;
        let dy = p[1] - self.cy;
        dx * dx + dy * dy < self.r2
    }
}

#[derive(Debug, Clone, Copy)]
struct Tri {
    v: [usize; 3],
    circle: Circumcircle,
}

impl Tri {
    fn new(points: &[Point2], v: [usize; 3]) -> Self {
        Self {
            v,
            circle: Circumcircle::through(points[v[0]], points[v[1]], points[v[2]]),
        }
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.v;
        [(a, b), (b, c), (c, a)]
    }
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A triangulated point set
#[derive(Debug, Clone)]
pub struct Triangulation {
    pub points: Vec<Point2>,
    /// Counter-clockwise vertex indices into `points`
    pub triangles: Vec<[usize; 3]>,
}

impl Triangulation {
    /// Triangles are listed in insertion order, so the result is deterministic
    /// for a given point order.
    pub fn new(points: &[Point2]) -> Self {
        let n = points.len();
        if n < 3 {
            return Self {
                points: points.to_vec(),
                triangles: Vec::new(),
            };
        }

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            min_x = min_x.min(p[0]);
            min_y = min_y.min(p[1]);
            max_x = max_x.max(p[0]);
            max_y = max_y.max(p[1]);
        }
        let span = (max_x - min_x).max(max_y - min_y).max(1e-12);
        let (mid_x, mid_y) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
        let m = 20.0 * span;

        // Super triangle far enough out that hull edges survive its removal.
        let mut all = points.to_vec();
        all.push([mid_x - 2.0 * m, mid_y - m]);
        all.push([mid_x + 2.0 * m, mid_y - m]);
        all.push([mid_x, mid_y + 2.0 * m]);

        let mut tris = vec![Tri::new(&all, [n, n + 1, n + 2])];

        for i in 0..n {
            let p = all[i];
            let (bad, good): (Vec<Tri>, Vec<Tri>) =
                tris.into_iter().partition(|t| t.circle.contains(p));

            let mut edge_count: HashMap<(usize, usize), usize> = HashMap::new();
            for tri in &bad {
                for (a, b) in tri.edges() {
                    *edge_count.entry(edge_key(a, b)).or_insert(0) += 1;
                }
            }

            tris = good;
            for tri in &bad {
                for (a, b) in tri.edges() {
                    if edge_count[&edge_key(a, b)] == 1 {
                        // `p` lies left of every cavity edge, keeping (a, b, p) CCW.
                        tris.push(Tri::new(&all, [a, b, i]));
                    }
                }
            }
        }

        let triangles = tris
            .into_iter()
            .filter(|t| t.v.iter().all(|&v| v < n))
            .map(|t| {
                let [a, b, c] = t.v;
                if orient(points[a], points[b], points[c]) < 0.0 {
                    [a, c, b]
                } else {
                    [a, b, c]
                }
            })
            .collect();

        Self {
            points: points.to_vec(),
            triangles,
        }
    }

    /// Barycentric weights of `p` in triangle `idx`, or `None` for a sliver.
    pub fn barycentric(&self, idx: usize, p: Point2) -> Option<[f64; 3]> {
        let [a, b, c] = self.triangles[idx].map(|v| self.points[v]);
        let det = orient(a, b, c);
        if det.abs() < DEGENERATE_AREA {
            return None;
        }
        let l1 = orient(p, b, c) / det;
        let l2 = orient(a, p, c) / det;
        Some([l1, l2, 1.0 - l1 - l2])
    }

    /// Find a triangle containing `p`, allowing weights down to `-eps` so that
    /// nodes on the hull boundary are not lost to rounding. Returned weights are
    /// clamped to be non-negative and renormalised to sum to one.
    pub fn locate(&self, p: Point2, eps: f64) -> Option<(usize, [f64; 3])> {
        for idx in 0..self.triangles.len() {
            let Some(w) = self.barycentric(idx, p) else {
                continue;
            };
            if w.iter().all(|&x| x >= -eps) {
                let clamped = w.map(|x| x.max(0.0));
                let total: f64 = clamped.iter().sum();
                return Some((idx, clamped.map(|x| x / total)));
            }
        }
        None
    }

    /// Sorted, de-duplicated neighbour lists for every vertex.
    pub fn neighbors(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.points.len()];
        for &[a, b, c] in &self.triangles {
            adj[a].extend([b, c]);
            adj[b].extend([a, c]);
            adj[c].extend([a, b]);
        }
        for list in &mut adj {
            list.sort_unstable();
            list.dedup();
        }
        adj
    }
}
