use std::fmt;

use tracing::{debug, info, info_span, warn};

use crate::error::{SurfaceError, SurfaceResult};
use crate::models::grid_interp::{interpolate_surface, merge_duplicate_sites};
use crate::models::implied_vol::{solve_all, SolveStats};
use crate::surface::config::SurfaceConfig;
use crate::surface::filter::filter_quotes;
use crate::surface::types::*;
use crate::surface::validate::{check_point_set, validate_grid};

/// Stages one option type passes through; used to tag log events and failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Filtering,
    Solving,
    Interpolating,
    Validating,
    Done,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildStage::Filtering => "filtering",
            BuildStage::Solving => "solving",
            BuildStage::Interpolating => "interpolating",
            BuildStage::Validating => "validating",
            BuildStage::Done => "done",
        })
    }
}

/// Build the surface for one option type from a mixed quote list.
///
/// Quotes of the other type are ignored. Per-quote solver failures only shrink
/// the point set; the build fails when too little data is left or when the
/// inputs themselves are invalid.
pub fn build_surface(
    option_type: OptionType,
    quotes: &[OptionQuote],
    ctx: &MarketContext,
    config: &SurfaceConfig,
) -> SurfaceResult<VolatilitySurface> {
    let span = info_span!("build_surface", %option_type);
    let _guard = span.enter();

    ctx.validate()?;
    config.validate()?;

    let mut stage = BuildStage::Filtering;
    let result = run_stages(option_type, quotes, ctx, config, &mut stage);
    match &result {
        Ok(surface) => info!(
            points_used = surface.points_used,
            clipped_cells = surface.diagnostics.validation.clipped_cells,
            filled_cells = surface.diagnostics.filled_cells,
            "surface built"
        ),
        Err(e) => warn!(%stage, error = %e, "surface build failed"),
    }
    result
}

fn run_stages(
    option_type: OptionType,
    quotes: &[OptionQuote],
    ctx: &MarketContext,
    config: &SurfaceConfig,
    stage: &mut BuildStage,
) -> SurfaceResult<VolatilitySurface> {
    let of_type: Vec<OptionQuote> = quotes
        .iter()
        .filter(|q| q.option_type == option_type)
        .copied()
        .collect();
    let (filtered, filter_stats) = filter_quotes(&of_type, ctx.spot, &config.filter);
    if filtered.is_empty() {
        return Err(SurfaceError::insufficient(
            option_type,
            0,
            format!("no quotes survived filtering ({} received)", of_type.len()),
        ));
    }

    *stage = BuildStage::Solving;
    // Returns only after every solve has finished.
    let solved = solve_all(&filtered, ctx, &config.solver);
    let solve_stats = SolveStats::from_points(&solved);
    if solve_stats.failed() > 0 {
        warn!(
            failed = solve_stats.failed(),
            degenerate_vega = solve_stats.degenerate_vega,
            non_convergence = solve_stats.non_convergence,
            invalid_quote = solve_stats.invalid_quote,
            "dropped quotes the solver could not invert"
        );
    }
    let raw_points: Vec<SurfacePoint> = solved
        .iter()
        .filter_map(|p| {
            p.sigma().map(|sigma| SurfacePoint {
                t: p.quote.years_to_exp,
                k: p.quote.strike,
                sigma,
            })
        })
        .collect();
    debug!(
        %stage,
        converged = solve_stats.converged,
        attempted = solve_stats.attempted,
        "solved quotes"
    );

    *stage = BuildStage::Interpolating;
    let sites = merge_duplicate_sites(&raw_points);
    check_point_set(option_type, &sites, config.min_points)?;
    let raw = interpolate_surface(&sites, &config.grid.spec(), config.grid.method)?;
    if raw.filled_cells > 0 {
        debug!(
            filled_cells = raw.filled_cells,
            "filled cells outside the hull from nearest points"
        );
    }

    *stage = BuildStage::Validating;
    let (sigma_grid, validation) = validate_grid(&raw)?;

    *stage = BuildStage::Done;
    Ok(VolatilitySurface {
        option_type,
        time_axis: raw.time_axis,
        strike_axis: raw.strike_axis,
        sigma_grid,
        method: config.grid.method,
        points_used: raw_points.len(),
        diagnostics: SurfaceDiagnostics {
            filter: filter_stats,
            solve: solve_stats,
            distinct_sites: raw.sites,
            filled_cells: raw.filled_cells,
            validation,
        },
        raw_points,
    })
}

/// Build call and put surfaces for one request.
///
/// The two types run concurrently and fail independently: an
/// `InsufficientData` for puts leaves the call surface intact. Only an invalid
/// market context or configuration fails the whole request.
pub fn build_surfaces(
    quotes: &[OptionQuote],
    ctx: &MarketContext,
    config: &SurfaceConfig,
) -> SurfaceResult<SurfaceBundle> {
    ctx.validate()?;
    config.validate()?;

    let (calls, puts) = rayon::join(
        || build_surface(OptionType::Call, quotes, ctx, config),
        || build_surface(OptionType::Put, quotes, ctx, config),
    );

    Ok(SurfaceBundle {
        context: *ctx,
        calls,
        puts,
    })
}
