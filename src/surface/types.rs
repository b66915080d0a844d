use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{SurfaceError, SurfaceResult};
use crate::models::grid_interp::types::InterpMethod;
use crate::models::implied_vol::types::SolveStats;
use crate::surface::filter::FilterStats;
use crate::surface::validate::ValidationReport;

/// Lower bound on any volatility visible outside the solver loop.
pub const SIGMA_MIN: f64 = 0.01;
/// Upper bound on any volatility visible outside the solver loop.
pub const SIGMA_MAX: f64 = 5.0;

/// Option right. Calls and puts produce independent surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    #[serde(alias = "calls", alias = "Call", alias = "C", alias = "c")]
    Call,
    #[serde(alias = "puts", alias = "Put", alias = "P", alias = "p")]
    Put,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OptionType::Call => "calls",
            OptionType::Put => "puts",
        })
    }
}

impl FromStr for OptionType {
    type Err = SurfaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "call" | "calls" | "c" => Ok(OptionType::Call),
            "put" | "puts" | "p" => Ok(OptionType::Put),
            other => Err(SurfaceError::invalid_input(format!(
                "Invalid option type: {}",
                other
            ))),
        }
    }
}

/// One market quote after the caller has converted expiry dates to year fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub option_type: OptionType,
    /// Strike price
    pub strike: f64,
    /// Time to expiration in years
    pub years_to_exp: f64,
    /// Observed option price (last trade or mid)
    pub market_price: f64,
}

impl OptionQuote {
    pub fn new(option_type: OptionType, strike: f64, years_to_exp: f64, market_price: f64) -> Self {
        Self {
            option_type,
            strike,
            years_to_exp,
            market_price,
        }
    }

    pub fn call(strike: f64, years_to_exp: f64, market_price: f64) -> Self {
        Self::new(OptionType::Call, strike, years_to_exp, market_price)
    }

    pub fn put(strike: f64, years_to_exp: f64, market_price: f64) -> Self {
        Self::new(OptionType::Put, strike, years_to_exp, market_price)
    }

    /// Spot over strike; above 1 means in-the-money for a call.
    pub fn moneyness(&self, spot: f64) -> f64 {
        spot / self.strike
    }
}

/// Market context shared by every quote of a request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    /// Spot price of the underlying
    pub spot: f64,
    /// Continuously compounded risk-free rate
    pub r: f64,
    /// Continuous dividend yield
    pub q: f64,
}

impl MarketContext {
    pub fn new(spot: f64, r: f64, q: f64) -> Self {
        Self { spot, r, q }
    }

    /// Rejects contexts no quote could be priced against.
    pub fn validate(&self) -> SurfaceResult<()> {
        if !(self.spot > 0.0) || !self.spot.is_finite() {
            return Err(SurfaceError::invalid_input(format!(
                "spot price must be positive and finite, got {}",
                self.spot
            )));
        }
        if !self.r.is_finite() {
            return Err(SurfaceError::invalid_input(format!(
                "risk-free rate must be finite, got {}",
                self.r
            )));
        }
        if !self.q.is_finite() || self.q < 0.0 {
            return Err(SurfaceError::invalid_input(format!(
                "dividend yield must be finite and non-negative, got {}",
                self.q
            )));
        }
        Ok(())
    }
}

/// A solved (T, K, sigma) site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfacePoint {
    pub t: f64,
    pub k: f64,
    pub sigma: f64,
}

/// Quality metadata attached to every built surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDiagnostics {
    pub filter: FilterStats,
    pub solve: SolveStats,
    /// Distinct (T, K) sites after duplicate quotes were averaged
    pub distinct_sites: usize,
    /// Grid cells outside the convex hull, filled from the nearest site
    pub filled_cells: usize,
    pub validation: ValidationReport,
}

impl SurfaceDiagnostics {
    /// True when part of the grid came from nearest-neighbour extrapolation.
    pub fn extrapolation_filled(&self) -> bool {
        self.filled_cells > 0
    }
}

/// Dense implied-volatility surface for one option type.
///
/// `sigma_grid[i][j]` is the volatility at `time_axis[i]` and `strike_axis[j]`.
/// Both axes are strictly ascending and every cell lies in `[SIGMA_MIN, SIGMA_MAX]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilitySurface {
    pub option_type: OptionType,
    pub time_axis: Vec<f64>,
    pub strike_axis: Vec<f64>,
    pub sigma_grid: Vec<Vec<f64>>,
    pub method: InterpMethod,
    /// Converged quotes that fed the interpolation
    pub points_used: usize,
    /// Converged quotes as solved, for scatter overlays
    pub raw_points: Vec<SurfacePoint>,
    pub diagnostics: SurfaceDiagnostics,
}

impl VolatilitySurface {
    /// (time rows, strike columns)
    pub fn dims(&self) -> (usize, usize) {
        (self.time_axis.len(), self.strike_axis.len())
    }

    pub fn sigma_at(&self, time_idx: usize, strike_idx: usize) -> Option<f64> {
        self.sigma_grid.get(time_idx)?.get(strike_idx).copied()
    }

    pub fn cells(&self) -> impl Iterator<Item = f64> + '_ {
        self.sigma_grid.iter().flat_map(|row| row.iter().copied())
    }

    pub fn min_sigma(&self) -> f64 {
        self.cells().fold(f64::INFINITY, f64::min)
    }

    pub fn max_sigma(&self) -> f64 {
        self.cells().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Outcome of one option type's build.
pub type SurfaceOutcome = Result<VolatilitySurface, SurfaceError>;

/// Result bundle for one request: both option types plus the context they were built from.
#[derive(Debug, Clone)]
pub struct SurfaceBundle {
    pub context: MarketContext,
    pub calls: SurfaceOutcome,
    pub puts: SurfaceOutcome,
}

impl SurfaceBundle {
    pub fn get(&self, option_type: OptionType) -> &SurfaceOutcome {
        match option_type {
            OptionType::Call => &self.calls,
            OptionType::Put => &self.puts,
        }
    }

    /// Convert to the shape handed to a response layer.
    pub fn to_response(&self) -> SurfaceResponse {
        let errors: Vec<String> = [&self.calls, &self.puts]
            .iter()
            .filter_map(|outcome| outcome.as_ref().err().map(|e| e.to_string()))
            .collect();

        SurfaceResponse {
            success: self.calls.is_ok() || self.puts.is_ok(),
            spot_price: self.context.spot,
            risk_free_rate: self.context.r,
            dividend_yield: self.context.q,
            surfaces: SurfaceSet {
                calls: self.calls.as_ref().ok().cloned(),
                puts: self.puts.as_ref().ok().cloned(),
            },
            error: if errors.is_empty() {
                None
            } else {
                Some(errors.join("; "))
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSet {
    pub calls: Option<VolatilitySurface>,
    pub puts: Option<VolatilitySurface>,
}

/// Structured response: `{success, surfaces: {calls, puts}, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceResponse {
    pub success: bool,
    pub spot_price: f64,
    pub risk_free_rate: f64,
    pub dividend_yield: f64,
    pub surfaces: SurfaceSet,
    pub error: Option<String>,
}
