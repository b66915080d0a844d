use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SurfaceError, SurfaceResult};
use crate::models::grid_interp::types::{GridSpec, InterpMethod};
use crate::surface::types::{SIGMA_MAX, SIGMA_MIN};

/// Quote screening thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Quotes priced below this are dropped (sub-penny prices do not invert)
    #[serde(default = "default_price_floor")]
    pub price_floor: f64,
    /// Quotes expiring sooner than this (years) are dropped
    #[serde(default = "default_time_floor")]
    pub time_floor: f64,
    /// Calls with S/K above this are too deep in-the-money
    #[serde(default = "default_call_max_moneyness")]
    pub call_max_moneyness: f64,
    /// Puts with S/K below this are too deep in-the-money
    #[serde(default = "default_put_min_moneyness")]
    pub put_min_moneyness: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            price_floor: default_price_floor(),
            time_floor: default_time_floor(),
            call_max_moneyness: default_call_max_moneyness(),
            put_min_moneyness: default_put_min_moneyness(),
        }
    }
}

/// Newton-Raphson settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Starting volatility
    #[serde(default = "default_initial_sigma")]
    pub initial_sigma: f64,
    /// Absolute price error at which the solve is accepted
    #[serde(default = "default_price_tolerance")]
    pub price_tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Vega below this means the iteration can make no progress
    #[serde(default = "default_vega_floor")]
    pub vega_floor: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            initial_sigma: default_initial_sigma(),
            price_tolerance: default_price_tolerance(),
            max_iterations: default_max_iterations(),
            vega_floor: default_vega_floor(),
        }
    }
}

/// Output grid layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_grid_points")]
    pub time_points: usize,
    #[serde(default = "default_grid_points")]
    pub strike_points: usize,
    #[serde(default)]
    pub method: InterpMethod,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            time_points: default_grid_points(),
            strike_points: default_grid_points(),
            method: InterpMethod::default(),
        }
    }
}

impl GridConfig {
    pub fn spec(&self) -> GridSpec {
        GridSpec {
            time_points: self.time_points,
            strike_points: self.strike_points,
        }
    }
}

/// Main configuration struct for surface construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Fewest distinct (T, K) sites a surface may be built from
    #[serde(default = "default_min_points")]
    pub min_points: usize,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub grid: GridConfig,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            min_points: default_min_points(),
            filter: FilterConfig::default(),
            solver: SolverConfig::default(),
            grid: GridConfig::default(),
        }
    }
}

impl SurfaceConfig {
    /// Linear interpolation with the default thresholds
    pub fn standard() -> Self {
        Self::default()
    }

    /// Cubic interpolation; relies on the validator to clip overshoot
    pub fn smooth() -> Self {
        Self {
            grid: GridConfig {
                method: InterpMethod::Cubic,
                ..GridConfig::default()
            },
            ..Self::default()
        }
    }

    /// Tight price tolerance and a finer grid for offline analysis
    pub fn high_precision() -> Self {
        Self {
            solver: SolverConfig {
                price_tolerance: 1e-6,
                max_iterations: 200,
                ..SolverConfig::default()
            },
            grid: GridConfig {
                time_points: 50,
                strike_points: 50,
                method: InterpMethod::Linear,
            },
            ..Self::default()
        }
    }

    /// Cubic grid with the historical five-point minimum
    pub fn legacy() -> Self {
        Self {
            min_points: 5,
            ..Self::smooth()
        }
    }

    /// Parse from TOML; missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: SurfaceConfig = toml::from_str(s).context("Failed to parse surface config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize surface config")
    }

    /// Reject settings the pipeline cannot honour.
    pub fn validate(&self) -> SurfaceResult<()> {
        let f = &self.filter;
        if !(f.price_floor >= 0.0) || !(f.time_floor >= 0.0) {
            return Err(SurfaceError::invalid_input(
                "filter floors must be non-negative",
            ));
        }
        if !(f.put_min_moneyness > 0.0) || !(f.call_max_moneyness > 0.0) {
            return Err(SurfaceError::invalid_input(
                "moneyness thresholds must be positive",
            ));
        }

        let s = &self.solver;
        if !(SIGMA_MIN..=SIGMA_MAX).contains(&s.initial_sigma) {
            return Err(SurfaceError::invalid_input(format!(
                "initial sigma {} outside [{}, {}]",
                s.initial_sigma, SIGMA_MIN, SIGMA_MAX
            )));
        }
        if !(s.price_tolerance > 0.0) || !(s.vega_floor > 0.0) || s.max_iterations == 0 {
            return Err(SurfaceError::invalid_input(
                "solver tolerance, vega floor and max iterations must be positive",
            ));
        }

        if self.grid.time_points < 2 || self.grid.strike_points < 2 {
            return Err(SurfaceError::invalid_input(format!(
                "grid must be at least 2x2, got {}x{}",
                self.grid.time_points, self.grid.strike_points
            )));
        }
        if self.min_points < 3 {
            return Err(SurfaceError::invalid_input(format!(
                "min_points must be at least 3, got {}",
                self.min_points
            )));
        }
        Ok(())
    }
}

fn default_price_floor() -> f64 {
    0.01
}

fn default_time_floor() -> f64 {
    0.01
}

fn default_call_max_moneyness() -> f64 {
    1.10
}

fn default_put_min_moneyness() -> f64 {
    0.90
}

fn default_initial_sigma() -> f64 {
    0.20
}

fn default_price_tolerance() -> f64 {
    1e-3
}

fn default_max_iterations() -> usize {
    100
}

fn default_vega_floor() -> f64 {
    1e-8
}

fn default_grid_points() -> usize {
    30
}

fn default_min_points() -> usize {
    4
}
