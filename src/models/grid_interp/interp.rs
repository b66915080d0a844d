use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use super::delaunay::{Point2, Triangulation};
use super::types::*;
use crate::error::{SurfaceError, SurfaceResult};
use crate::surface::types::SurfacePoint;

/// Relative tolerance under which two coordinates name the same site
const SITE_TOLERANCE: f64 = 1e-12;
/// Barycentric slack for nodes sitting on the hull boundary
const HULL_TOLERANCE: f64 = 1e-7;
/// Perturbation (in unit-square coordinates) that breaks exact cocircularity of
/// grid-like quote layouts
const JITTER: f64 = 1e-9;
const JITTER_SEED: u64 = 0x1f5e_ed00;

fn same_coord(a: f64, b: f64) -> bool {
    (a - b).abs() <= SITE_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// Drop non-finite points, then average sigma over points sharing a (T, K) site.
///
/// The result is sorted by expiry, then strike.
pub fn merge_duplicate_sites(points: &[SurfacePoint]) -> Vec<SurfacePoint> {
    let mut sorted: Vec<SurfacePoint> = points
        .iter()
        .filter(|p| p.t.is_finite() && p.k.is_finite() && p.sigma.is_finite())
        .copied()
        .collect();
    sorted.sort_by(|a, b| a.t.total_cmp(&b.t).then(a.k.total_cmp(&b.k)));

    let mut merged: Vec<SurfacePoint> = Vec::with_capacity(sorted.len());
    let mut count = 0usize;
    for p in sorted {
        match merged.last_mut() {
            Some(last) if same_coord(last.t, p.t) && same_coord(last.k, p.k) => {
                // Running mean over the group
                count += 1;
                last.sigma += (p.sigma - last.sigma) / count as f64;
            }
            _ => {
                merged.push(p);
                count = 1;
            }
        }
    }
    merged
}

/// `n` evenly spaced values from `start` to `end`, both included exactly.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut axis: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            axis[n - 1] = end;
            axis
        }
    }
}

/// Affine map of the (T, K) bounding box onto the unit square, so that
/// triangulation and distances do not depend on the units of either axis.
struct UnitScale {
    t0: f64,
    t_span: f64,
    k0: f64,
    k_span: f64,
}

impl UnitScale {
    fn apply(&self, t: f64, k: f64) -> Point2 {
        [(t - self.t0) / self.t_span, (k - self.k0) / self.k_span]
    }
}

/// Least-squares gradient at every site from its triangulation neighbours,
/// each weighted by inverse squared distance. Sites whose neighbours are all
/// collinear with them get a zero gradient.
fn estimate_gradients(tri: &Triangulation, values: &[f64]) -> Vec<[f64; 2]> {
    tri.neighbors()
        .iter()
        .enumerate()
        .map(|(i, nbrs)| {
            let p = tri.points[i];
            let (mut a11, mut a12, mut a22) = (0.0, 0.0, 0.0);
            let (mut b1, mut b2) = (0.0, 0.0);
            for &j in nbrs {
                let dx = tri.points[j][0] - p[0];
                let dy = tri.points[j][1] - p[1];
                let d2 = dx * dx + dy * dy;
                if d2 == 0.0 {
                    continue;
                }
                let w = 1.0 / d2;
                let df = values[j] - values[i];
                a11 += w * dx * dx;
                a12 += w * dx * dy;
                a22 += w * dy * dy;
                b1 += w * dx * df;
                b2 += w * dy * df;
            }
            let det = a11 * a22 - a12 * a12;
            if !(det.abs() > 1e-12 * (a11 * a22).abs()) || !det.is_finite() {
                return [0.0, 0.0];
            }
            [(a22 * b1 - a12 * b2) / det, (a11 * b2 - a12 * b1) / det]
        })
        .collect()
}

fn linear_value(tri: &Triangulation, values: &[f64], idx: usize, w: [f64; 3]) -> f64 {
    let [a, b, c] = tri.triangles[idx];
    w[0] * values[a] + w[1] * values[b] + w[2] * values[c]
}

/// Cubic Bézier triangle through the three vertex values whose edge control
/// points follow the vertex gradients.
fn cubic_value(
    tri: &Triangulation,
    values: &[f64],
    grads: &[[f64; 2]],
    idx: usize,
    w: [f64; 3],
) -> f64 {
    let [i1, i2, i3] = tri.triangles[idx];
    let (p1, p2, p3) = (tri.points[i1], tri.points[i2], tri.points[i3]);
    let (f1, f2, f3) = (values[i1], values[i2], values[i3]);
    let (g1, g2, g3) = (grads[i1], grads[i2], grads[i3]);

    let toward = |g: [f64; 2], from: Point2, to: Point2| {
        (g[0] * (to[0] - from[0]) + g[1] * (to[1] - from[1])) / 3.0
    };

    let b210 = f1 + toward(g1, p1, p2);
    let b201 = f1 + toward(g1, p1, p3);
    let b120 = f2 + toward(g2, p2, p1);
    let b021 = f2 + toward(g2, p2, p3);
    let b102 = f3 + toward(g3, p3, p1);
    let b012 = f3 + toward(g3, p3, p2);

    let edge_mean = (b210 + b201 + b120 + b021 + b102 + b012) / 6.0;
    let vertex_mean = (f1 + f2 + f3) / 3.0;
    let b111 = edge_mean + (edge_mean - vertex_mean) / 2.0;

    let [u, v, s] = w;
    f1 * u * u * u
        + f2 * v * v * v
        + f3 * s * s * s
        + 3.0 * (b210 * u * u * v + b201 * u * u * s)
        + 3.0 * (b120 * u * v * v + b021 * v * v * s)
        + 3.0 * (b102 * u * s * s + b012 * v * s * s)
        + 6.0 * b111 * u * v * s
}

/// Index of the closest site; ties go to the lowest index.
fn nearest_site(coords: &[Point2], p: Point2) -> usize {
    let mut best = 0;
    let mut best_d2 = f64::INFINITY;
    for (i, c) in coords.iter().enumerate() {
        let d2 = (c[0] - p[0]).powi(2) + (c[1] - p[1]).powi(2);
        if d2 < best_d2 {
            best = i;
            best_d2 = d2;
        }
    }
    best
}

/// Interpolate scattered (T, K, sigma) points onto a regular grid.
///
/// The axes span the observed expiry and strike ranges with `spec` nodes each.
/// Nodes inside the convex hull of the sites take the `method` value; nodes
/// outside it (and any node the method leaves non-finite) take the value of the
/// nearest site, and are counted in [`RawGrid::filled_cells`].
///
/// Every returned value is finite. Linear values stay within the range of the
/// site values; cubic values may not. Collinear sites have an empty hull, so
/// every node is filled; `check_point_set` rejects such sets before this runs.
pub fn interpolate_surface(
    points: &[SurfacePoint],
    spec: &GridSpec,
    method: InterpMethod,
) -> SurfaceResult<RawGrid> {
    if spec.time_points < 2 || spec.strike_points < 2 {
        return Err(SurfaceError::invalid_input(format!(
            "grid must be at least 2x2, got {}x{}",
            spec.time_points, spec.strike_points
        )));
    }

    let sites = merge_duplicate_sites(points);
    if sites.is_empty() {
        return Err(SurfaceError::invalid_input("no finite points to interpolate"));
    }

    let (mut t_min, mut t_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut k_min, mut k_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for s in &sites {
        t_min = t_min.min(s.t);
        t_max = t_max.max(s.t);
        k_min = k_min.min(s.k);
        k_max = k_max.max(s.k);
    }
    if !(t_max > t_min) || !(k_max > k_min) {
        return Err(SurfaceError::invalid_input(
            "points span a single expiry or strike, grid axes would be degenerate",
        ));
    }

    let time_axis = linspace(t_min, t_max, spec.time_points);
    let strike_axis = linspace(k_min, k_max, spec.strike_points);
    let scale = UnitScale {
        t0: t_min,
        t_span: t_max - t_min,
        k0: k_min,
        k_span: k_max - k_min,
    };

    let mut rng = StdRng::seed_from_u64(JITTER_SEED);
    let coords: Vec<Point2> = sites
        .iter()
        .map(|s| {
            let [x, y] = scale.apply(s.t, s.k);
            [
                x + JITTER * rng.gen_range(-1.0..1.0),
                y + JITTER * rng.gen_range(-1.0..1.0),
            ]
        })
        .collect();
    let values: Vec<f64> = sites.iter().map(|s| s.sigma).collect();

    let tri = Triangulation::new(&coords);
    let gradients = match method {
        InterpMethod::Linear => None,
        InterpMethod::Cubic => Some(estimate_gradients(&tri, &values)),
    };

    let mut filled_cells = 0;
    let mut grid = Vec::with_capacity(time_axis.len());
    for &t in &time_axis {
        let mut row = Vec::with_capacity(strike_axis.len());
        for &k in &strike_axis {
            let p = scale.apply(t, k);
            let value = match tri.locate(p, HULL_TOLERANCE) {
                Some((idx, w)) => match &gradients {
                    None => linear_value(&tri, &values, idx, w),
                    Some(g) => cubic_value(&tri, &values, g, idx, w),
                },
                None => f64::NAN,
            };
            if value.is_finite() {
                row.push(value);
            } else {
                filled_cells += 1;
                row.push(values[nearest_site(&coords, p)]);
            }
        }
        grid.push(row);
    }

    debug!(
        sites = sites.len(),
        triangles = tri.triangles.len(),
        filled_cells,
        ?method,
        "interpolated surface grid"
    );

    Ok(RawGrid {
        time_axis,
        strike_axis,
        values: grid,
        filled_cells,
        sites: sites.len(),
    })
}
