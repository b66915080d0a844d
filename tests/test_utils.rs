#![allow(dead_code)] // Each test binary uses a different subset

use iv_surface_lib::models::bs::bs_price;
use iv_surface_lib::{
    load_chain_csv, quotes_from_chain, MarketContext, OptionQuote, OptionType, VolatilitySurface,
    SIGMA_MAX, SIGMA_MIN,
};

/// Spot, rate and dividend yield the CSV fixture was priced with
pub const FIXTURE_SPOT: f64 = 100.0;
pub const FIXTURE_RATE: f64 = 0.02;

pub fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
}

/// Load the bundled option chain and convert it to quotes
pub fn load_fixture_quotes() -> Vec<OptionQuote> {
    let rows = load_chain_csv(fixture_path("chain.csv")).expect("fixture chain should load");
    quotes_from_chain(&rows)
}

pub fn fixture_context() -> MarketContext {
    MarketContext::new(FIXTURE_SPOT, FIXTURE_RATE, 0.0)
}

/// Quote priced exactly at `sigma`
pub fn priced_quote(
    option_type: OptionType,
    ctx: &MarketContext,
    strike: f64,
    years_to_exp: f64,
    sigma: f64,
) -> OptionQuote {
    let price = bs_price(option_type, ctx.spot, strike, ctx.r, ctx.q, years_to_exp, sigma);
    OptionQuote::new(option_type, strike, years_to_exp, price)
}

/// One quote per (expiry, strike) priced from `vol(t, k)`
pub fn grid_chain(
    option_type: OptionType,
    ctx: &MarketContext,
    expiries: &[f64],
    strikes: &[f64],
    vol: impl Fn(f64, f64) -> f64,
) -> Vec<OptionQuote> {
    expiries
        .iter()
        .flat_map(|&t| strikes.iter().map(move |&k| (t, k)))
        .map(|(t, k)| priced_quote(option_type, ctx, k, t, vol(t, k)))
        .collect()
}

pub fn assert_surface_invariants(surface: &VolatilitySurface) {
    let (rows, cols) = surface.dims();
    assert_eq!(surface.sigma_grid.len(), rows);
    assert!(surface.sigma_grid.iter().all(|row| row.len() == cols));
    assert!(
        surface.time_axis.windows(2).all(|w| w[1] > w[0]),
        "time axis not strictly ascending"
    );
    assert!(
        surface.strike_axis.windows(2).all(|w| w[1] > w[0]),
        "strike axis not strictly ascending"
    );
    for v in surface.cells() {
        assert!(
            (SIGMA_MIN..=SIGMA_MAX).contains(&v),
            "sigma {} outside [{}, {}]",
            v,
            SIGMA_MIN,
            SIGMA_MAX
        );
    }
}

/// Route library logs to the test harness; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
