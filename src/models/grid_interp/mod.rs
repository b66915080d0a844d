//! Scattered-to-grid interpolation
//!
//! Maps solved (T, K, sigma) sites onto a regular time × strike grid. Sites are
//! triangulated (Delaunay) in coordinates normalised to the unit square, then
//! each grid node inside the convex hull is evaluated either linearly
//! (barycentric, bounded by the input range) or with piecewise cubic Bézier
//! triangles (smoother, but can overshoot). Nodes outside the hull take the
//! value of the nearest site.

pub mod delaunay;
pub mod interp;
pub mod types;

pub use interp::*;
pub use types::*;
