//! Synthetic option chains priced off a parametric smile.
//!
//! Used by the demos and tests to produce realistic quote sets without a
//! market-data provider. Generation is deterministic for a given seed.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::models::bs::bs_price;
use crate::surface::types::{MarketContext, OptionQuote, OptionType, SIGMA_MAX, SIGMA_MIN};

/// Quadratic smile in log-moneyness with a square-root term structure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmileParams {
    pub atm_vol: f64,
    /// Slope in ln(K/S); negative gives the usual equity skew
    pub skew: f64,
    pub curvature: f64,
    /// Added to the ATM level per unit of sqrt(T)
    pub term_slope: f64,
}

impl Default for SmileParams {
    fn default() -> Self {
        Self {
            atm_vol: 0.22,
            skew: -0.25,
            curvature: 0.8,
            term_slope: 0.03,
        }
    }
}

pub fn smile_vol(params: &SmileParams, spot: f64, strike: f64, t: f64) -> f64 {
    let x = (strike / spot).ln();
    let level = params.atm_vol + params.term_slope * t.sqrt();
    (level + params.skew * x + params.curvature * x * x).clamp(SIGMA_MIN, SIGMA_MAX)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSpec {
    pub context: MarketContext,
    pub expiries: Vec<f64>,
    pub strikes: Vec<f64>,
    pub smile: SmileParams,
    /// Relative price noise; each price is scaled by `1 + noise * u`, `u` uniform in [-1, 1]
    pub noise: f64,
    pub seed: u64,
}

impl Default for ChainSpec {
    fn default() -> Self {
        Self {
            context: MarketContext::new(100.0, 0.02, 0.0),
            expiries: vec![1.0 / 12.0, 0.25, 0.5, 1.0],
            strikes: (0..=8).map(|i| 80.0 + 5.0 * i as f64).collect(),
            smile: SmileParams::default(),
            noise: 0.0,
            seed: 42,
        }
    }
}

/// A call and a put at every (expiry, strike), priced with Black-Scholes-Merton
/// at the smile volatility.
pub fn generate_chain(spec: &ChainSpec) -> Vec<OptionQuote> {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let MarketContext { spot, r, q } = spec.context;

    let mut quotes = Vec::with_capacity(2 * spec.expiries.len() * spec.strikes.len());
    for &t in &spec.expiries {
        for &k in &spec.strikes {
            let sigma = smile_vol(&spec.smile, spot, k, t);
            for option_type in [OptionType::Call, OptionType::Put] {
                let mut price = bs_price(option_type, spot, k, r, q, t, sigma);
                if spec.noise > 0.0 {
                    price *= 1.0 + spec.noise * rng.gen_range(-1.0..=1.0);
                }
                quotes.push(OptionQuote::new(option_type, k, t, price));
            }
        }
    }
    quotes
}
