use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::surface::types::OptionQuote;

/// A converged implied volatility
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVol {
    pub sigma: f64,
    /// Newton updates performed before the price matched
    pub iterations: usize,
}

/// Why a single quote could not be inverted
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SolveFailure {
    /// Non-positive or non-finite strike, expiry, price or spot
    #[error("invalid quote: {0}")]
    InvalidQuote(&'static str),

    /// Vega too small for the Newton step to make progress
    #[error("degenerate vega {vega:.3e} at sigma={sigma:.4} after {iterations} iterations")]
    DegenerateVega {
        sigma: f64,
        vega: f64,
        iterations: usize,
    },

    /// Price tolerance not met within the iteration budget
    #[error("no convergence after {iterations} iterations (sigma={sigma:.4}, residual={residual:.3e})")]
    NonConvergence {
        sigma: f64,
        residual: f64,
        iterations: usize,
    },
}

/// A quote together with its solver outcome. Consumed once by the interpolator.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedPoint {
    pub quote: OptionQuote,
    pub outcome: Result<ImpliedVol, SolveFailure>,
}

impl SolvedPoint {
    pub fn sigma(&self) -> Option<f64> {
        self.outcome.as_ref().ok().map(|iv| iv.sigma)
    }

    pub fn is_converged(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Per-reason tally of a batch of solves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveStats {
    pub attempted: usize,
    pub converged: usize,
    pub invalid_quote: usize,
    pub degenerate_vega: usize,
    pub non_convergence: usize,
}

impl SolveStats {
    pub fn from_points(points: &[SolvedPoint]) -> Self {
        let mut stats = SolveStats {
            attempted: points.len(),
            ..Default::default()
        };
        for point in points {
            match point.outcome {
                Ok(_) => stats.converged += 1,
                Err(SolveFailure::InvalidQuote(_)) => stats.invalid_quote += 1,
                Err(SolveFailure::DegenerateVega { .. }) => stats.degenerate_vega += 1,
                Err(SolveFailure::NonConvergence { .. }) => stats.non_convergence += 1,
            }
        }
        stats
    }

    /// Quotes dropped by the solver
    pub fn failed(&self) -> usize {
        self.attempted - self.converged
    }
}
