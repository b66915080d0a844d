//! # IV-Surface-Lib: Implied Volatility Surfaces from Option Quotes
//!
//! `iv-surface-lib` turns sparse, noisy option quotes into a dense implied-volatility
//! surface over time-to-expiry and strike, suitable for visualization and downstream
//! pricing.
//!
//! ## Core Features
//!
//! - **Quote screening**: price and expiry floors plus a moneyness band that drops
//!   deep in-the-money contracts
//! - **Implied volatility**: bounded Newton-Raphson on the Black-Scholes-Merton price,
//!   with typed per-quote failures instead of silently clipped values
//! - **Interpolation**: Delaunay-based linear or cubic interpolation onto a regular grid,
//!   with nearest-neighbour fill outside the convex hull
//! - **Validation**: every returned volatility lies in `[0.01, 5.0]`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use iv_surface_lib::{build_iv_surface, default_configs, MarketContext, OptionQuote};
//!
//! # fn load_quotes() -> Vec<OptionQuote> { vec![] }
//! let quotes: Vec<OptionQuote> = load_quotes();
//! let ctx = MarketContext::new(100.0, 0.02, 0.0);
//!
//! let bundle = build_iv_surface(&quotes, &ctx, &default_configs::standard())?;
//! match &bundle.calls {
//!     Ok(surface) => println!("calls: {:?} grid from {} points", surface.dims(), surface.points_used),
//!     Err(e) => println!("calls unavailable: {}", e),
//! }
//! # Ok::<(), iv_surface_lib::SurfaceError>(())
//! ```
//!
//! ## Configuration Presets
//!
//! - `standard()`: linear interpolation, default thresholds
//! - `smooth()`: cubic interpolation, relying on the validator to clip overshoot
//! - `high_precision()`: tighter solver tolerance and a finer grid
//! - `legacy()`: cubic with a five-point minimum

// ================================================================================================
// MODULES
// ================================================================================================

pub mod data;
pub mod error;
pub mod models;
pub mod surface;
pub mod synthetic;

// ================================================================================================
// PUBLIC RE-EXPORTS
// ================================================================================================

pub use error::{SurfaceError, SurfaceResult};

pub use surface::{
    config::{FilterConfig, GridConfig, SolverConfig, SurfaceConfig},
    filter::{filter_quotes, FilterStats},
    pipeline::{build_surface, build_surfaces, BuildStage},
    types::{
        MarketContext, OptionQuote, OptionType, SurfaceBundle, SurfaceDiagnostics, SurfacePoint,
        SurfaceResponse, SurfaceSet, VolatilitySurface, SIGMA_MAX, SIGMA_MIN,
    },
    validate::ValidationReport,
};

pub use models::{
    grid_interp::{interpolate_surface, GridSpec, InterpMethod, RawGrid},
    implied_vol::{solve_all, solve_implied_vol, ImpliedVol, SolveFailure, SolveStats, SolvedPoint},
};

pub use data::{load_chain_csv, quotes_from_chain, ChainRow};

// ================================================================================================
// DEFAULT CONFIGURATIONS
// ================================================================================================

/// Pre-configured surface settings for common use cases.
///
/// # Available Configurations
///
/// - [`standard()`]: linear interpolation, recommended default
/// - [`smooth()`]: cubic interpolation
/// - [`high_precision()`]: offline analysis
/// - [`legacy()`]: historical behaviour
pub mod default_configs {
    use crate::surface::config::SurfaceConfig;

    /// Linear interpolation with the default thresholds.
    ///
    /// **Characteristics:**
    /// - 30×30 grid
    /// - Price tolerance: $0.001, up to 100 iterations
    /// - Interior values never leave the range of the solved points
    ///
    /// # Example
    ///
    /// ```rust
    /// use iv_surface_lib::default_configs;
    ///
    /// let config = default_configs::standard();
    /// assert_eq!(config.grid.time_points, 30);
    /// ```
    pub fn standard() -> SurfaceConfig {
        SurfaceConfig::standard()
    }

    /// Cubic interpolation for a smoother-looking surface.
    ///
    /// The raw cubic grid can overshoot between sparse, steep points; the
    /// validator clips it to `[0.01, 5.0]` and records how many cells it moved.
    pub fn smooth() -> SurfaceConfig {
        SurfaceConfig::smooth()
    }

    /// Tight solver tolerance ($1e-6) with 200 iterations on a 50×50 grid.
    pub fn high_precision() -> SurfaceConfig {
        SurfaceConfig::high_precision()
    }

    /// Cubic interpolation with a five-point minimum per option type.
    pub fn legacy() -> SurfaceConfig {
        SurfaceConfig::legacy()
    }
}

/// Build call and put surfaces for one request.
///
/// This is the main entry point. Quotes are screened, solved for implied
/// volatility in parallel, interpolated onto the configured grid and clipped to
/// `[SIGMA_MIN, SIGMA_MAX]`, independently for calls and puts.
///
/// # Arguments
///
/// * `quotes` - Calls and puts, with expiries already converted to year fractions
/// * `ctx` - Spot price, risk-free rate and dividend yield shared by every quote
/// * `config` - Thresholds, solver settings and grid layout. Use [`default_configs`]
///   for common presets.
///
/// # Returns
///
/// A [`SurfaceBundle`] holding one outcome per option type. A type with too few
/// usable quotes yields [`SurfaceError::InsufficientData`] in its slot without
/// affecting the other.
///
/// # Errors
///
/// * [`SurfaceError::InvalidInput`] for a non-positive spot, non-finite rates, or an
///   invalid configuration
pub fn build_iv_surface(
    quotes: &[OptionQuote],
    ctx: &MarketContext,
    config: &SurfaceConfig,
) -> SurfaceResult<SurfaceBundle> {
    build_surfaces(quotes, ctx, config)
}
