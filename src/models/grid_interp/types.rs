use serde::{Deserialize, Serialize};

/// Interpolation scheme used inside the convex hull of the sites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpMethod {
    /// Barycentric over the triangulation. Never leaves [min σ, max σ].
    #[default]
    Linear,
    /// Cubic Bézier triangles from vertex values and estimated gradients.
    /// Smoother, but overshoots between sparse, steep sites.
    Cubic,
}

/// Number of nodes along each axis; both ends of the observed range are included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub time_points: usize,
    pub strike_points: usize,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            time_points: 30,
            strike_points: 30,
        }
    }
}

/// Interpolated grid before validation. Values may lie outside the sigma bounds
/// but are always finite.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGrid {
    pub time_axis: Vec<f64>,
    pub strike_axis: Vec<f64>,
    /// `values[i][j]` at `time_axis[i]`, `strike_axis[j]`
    pub values: Vec<Vec<f64>>,
    /// Nodes outside the hull that took the nearest site's value
    pub filled_cells: usize,
    /// Distinct sites after duplicate averaging
    pub sites: usize,
}

impl RawGrid {
    pub fn min_value(&self) -> f64 {
        self.values.iter().flatten().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_value(&self) -> f64 {
        self.values
            .iter()
            .flatten()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}
