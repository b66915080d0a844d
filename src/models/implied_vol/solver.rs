use rayon::prelude::*;
use tracing::trace;

use super::types::*;
use crate::models::bs::{bs_price, bs_vega};
use crate::surface::config::SolverConfig;
use crate::surface::types::{MarketContext, OptionQuote, SIGMA_MAX, SIGMA_MIN};

fn check_inputs(quote: &OptionQuote, ctx: &MarketContext) -> Result<(), SolveFailure> {
    if !(ctx.spot > 0.0) || !ctx.spot.is_finite() {
        return Err(SolveFailure::InvalidQuote("spot must be positive"));
    }
    if !(quote.strike > 0.0) || !quote.strike.is_finite() {
        return Err(SolveFailure::InvalidQuote("strike must be positive"));
    }
    if !(quote.years_to_exp > 0.0) || !quote.years_to_exp.is_finite() {
        return Err(SolveFailure::InvalidQuote("time to expiry must be positive"));
    }
    if !(quote.market_price > 0.0) || !quote.market_price.is_finite() {
        return Err(SolveFailure::InvalidQuote("market price must be positive"));
    }
    if !ctx.r.is_finite() || !ctx.q.is_finite() {
        return Err(SolveFailure::InvalidQuote("rates must be finite"));
    }
    Ok(())
}

/// Solve one quote for its implied volatility.
///
/// Starts from `config.initial_sigma` and applies
/// `σ ← clip(σ − (price(σ) − market) / vega(σ), SIGMA_MIN, SIGMA_MAX)` until the
/// price error drops below `config.price_tolerance`.
///
/// # Errors
///
/// * [`SolveFailure::InvalidQuote`] for non-positive strike, expiry, price or spot
/// * [`SolveFailure::DegenerateVega`] when vega falls below `config.vega_floor`
/// * [`SolveFailure::NonConvergence`] when `config.max_iterations` is exhausted
///
/// A value pinned at a bound is never returned as a success unless it actually
/// reprices the quote.
pub fn solve_implied_vol(
    quote: &OptionQuote,
    ctx: &MarketContext,
    config: &SolverConfig,
) -> Result<ImpliedVol, SolveFailure> {
    solve_implied_vol_traced(quote, ctx, config, |_, _| {})
}

/// Same as [`solve_implied_vol`], calling `on_iterate(iteration, sigma)` for every
/// iterate the pricing function is evaluated at.
pub fn solve_implied_vol_traced<F>(
    quote: &OptionQuote,
    ctx: &MarketContext,
    config: &SolverConfig,
    mut on_iterate: F,
) -> Result<ImpliedVol, SolveFailure>
where
    F: FnMut(usize, f64),
{
    check_inputs(quote, ctx)?;

    let (s, k, t) = (ctx.spot, quote.strike, quote.years_to_exp);
    let (r, q) = (ctx.r, ctx.q);
    let target = quote.market_price;
    let price_at = |sigma: f64| bs_price(quote.option_type, s, k, r, q, t, sigma);

    let mut sigma = config.initial_sigma.clamp(SIGMA_MIN, SIGMA_MAX);

    for iteration in 0..config.max_iterations {
        debug_assert!((SIGMA_MIN..=SIGMA_MAX).contains(&sigma));
        on_iterate(iteration, sigma);

        let residual = price_at(sigma) - target;
        if residual.abs() < config.price_tolerance {
            return Ok(ImpliedVol {
                sigma,
                iterations: iteration,
            });
        }

        let vega = bs_vega(s, k, r, q, t, sigma);
        // Negated comparison also catches NaN
        if !(vega.abs() >= config.vega_floor) {
            return Err(SolveFailure::DegenerateVega {
                sigma,
                vega,
                iterations: iteration,
            });
        }

        sigma = (sigma - residual / vega).clamp(SIGMA_MIN, SIGMA_MAX);
    }

    on_iterate(config.max_iterations, sigma);
    let residual = price_at(sigma) - target;
    if residual.abs() < config.price_tolerance {
        Ok(ImpliedVol {
            sigma,
            iterations: config.max_iterations,
        })
    } else {
        Err(SolveFailure::NonConvergence {
            sigma,
            residual,
            iterations: config.max_iterations,
        })
    }
}

/// Solve every quote independently across the rayon pool.
///
/// Returns once all solves have finished; the output order matches `quotes`.
pub fn solve_all(
    quotes: &[OptionQuote],
    ctx: &MarketContext,
    config: &SolverConfig,
) -> Vec<SolvedPoint> {
    quotes
        .par_iter()
        .map(|quote| {
            let outcome = solve_implied_vol(quote, ctx, config);
            if let Err(ref failure) = outcome {
                trace!(
                    strike = quote.strike,
                    years_to_exp = quote.years_to_exp,
                    %failure,
                    "quote dropped by solver"
                );
            }
            SolvedPoint {
                quote: *quote,
                outcome,
            }
        })
        .collect()
}
