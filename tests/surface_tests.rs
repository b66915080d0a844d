mod test_utils;

use iv_surface_lib::surface::validate::validate_grid;
use iv_surface_lib::synthetic::{generate_chain, ChainSpec};
use iv_surface_lib::{
    build_iv_surface, default_configs, filter_quotes, interpolate_surface, FilterConfig, GridSpec,
    InterpMethod, MarketContext, OptionQuote, OptionType, SurfaceConfig, SurfaceError,
    SurfacePoint, SIGMA_MAX, SIGMA_MIN,
};
use proptest::prelude::*;
use test_utils::*;

/// Builds both surfaces from the bundled chain and checks the filter tally.
#[test]
fn test_fixture_chain_builds_both_surfaces() {
    init_tracing();
    let quotes = load_fixture_quotes();
    assert_eq!(quotes.len(), 52, "zero-volume rows should be skipped");

    let bundle = build_iv_surface(&quotes, &fixture_context(), &default_configs::standard())
        .expect("valid context");

    let calls = bundle.calls.as_ref().expect("calls surface");
    let puts = bundle.puts.as_ref().expect("puts surface");
    assert_surface_invariants(calls);
    assert_surface_invariants(puts);

    assert_eq!(calls.diagnostics.filter.input, 26);
    assert_eq!(calls.diagnostics.filter.dropped_moneyness, 8);
    assert_eq!(puts.diagnostics.filter.dropped_moneyness, 4);
    assert_eq!(calls.points_used, 18);
    assert_eq!(puts.points_used, 22);
    assert_eq!(calls.raw_points.len(), calls.points_used);
    assert_eq!(calls.dims(), (30, 30));

    // Linear values stay inside the range of the solved points
    let lo = calls.raw_points.iter().map(|p| p.sigma).fold(f64::INFINITY, f64::min);
    let hi = calls.raw_points.iter().map(|p| p.sigma).fold(f64::NEG_INFINITY, f64::max);
    assert!(calls.min_sigma() >= lo - 1e-9);
    assert!(calls.max_sigma() <= hi + 1e-9);
}

#[test]
fn test_every_preset_returns_bounded_surfaces() {
    let quotes = generate_chain(&ChainSpec {
        noise: 0.01,
        ..ChainSpec::default()
    });
    let ctx = ChainSpec::default().context;

    for config in [
        default_configs::standard(),
        default_configs::smooth(),
        default_configs::high_precision(),
        default_configs::legacy(),
    ] {
        let bundle = build_iv_surface(&quotes, &ctx, &config).unwrap();
        for outcome in [&bundle.calls, &bundle.puts] {
            let surface = outcome.as_ref().expect("surface should build");
            assert_surface_invariants(surface);
            assert_eq!(surface.method, config.grid.method);
            assert_eq!(
                surface.dims(),
                (config.grid.time_points, config.grid.strike_points)
            );
        }
    }
}

#[test]
fn test_config_file_drives_pipeline() {
    let config = SurfaceConfig::from_toml_file(fixture_path("surface.toml")).unwrap();
    assert_eq!(config.grid.method, InterpMethod::Cubic);
    assert_eq!(config.filter.put_min_moneyness, 0.90);

    let bundle = build_iv_surface(&load_fixture_quotes(), &fixture_context(), &config).unwrap();
    let calls = bundle.calls.as_ref().unwrap();
    assert_eq!(calls.dims(), (20, 25));
    assert!(calls
        .raw_points
        .iter()
        .all(|p| FIXTURE_SPOT / p.k <= 1.05));
    assert_surface_invariants(calls);
}

/// Three usable puts cannot make a surface, but calls are unaffected.
#[test]
fn test_insufficient_puts_do_not_block_calls() {
    let ctx = MarketContext::new(100.0, 0.02, 0.0);
    let mut quotes = grid_chain(
        OptionType::Call,
        &ctx,
        &[0.25, 0.5, 1.0],
        &[95.0, 100.0, 105.0, 110.0],
        |_, _| 0.25,
    );
    quotes.push(priced_quote(OptionType::Put, &ctx, 90.0, 0.25, 0.3));
    quotes.push(priced_quote(OptionType::Put, &ctx, 100.0, 0.5, 0.3));
    quotes.push(priced_quote(OptionType::Put, &ctx, 105.0, 1.0, 0.3));
    // Filtered out: below the price floor, and inside the time floor
    quotes.push(OptionQuote::put(60.0, 0.25, 0.001));
    quotes.push(OptionQuote::put(100.0, 0.005, 1.0));

    let bundle = build_iv_surface(&quotes, &ctx, &default_configs::standard()).unwrap();
    assert_surface_invariants(bundle.calls.as_ref().unwrap());
    assert!(matches!(
        bundle.puts,
        Err(SurfaceError::InsufficientData {
            option_type: OptionType::Put,
            points: 3,
            ..
        })
    ));
}

#[test]
fn test_single_expiry_is_insufficient() {
    let ctx = MarketContext::new(100.0, 0.02, 0.0);
    let quotes = grid_chain(
        OptionType::Call,
        &ctx,
        &[0.5],
        &[95.0, 100.0, 105.0, 110.0, 115.0],
        |_, _| 0.25,
    );
    let bundle = build_iv_surface(&quotes, &ctx, &default_configs::standard()).unwrap();
    match &bundle.calls {
        Err(SurfaceError::InsufficientData { reason, .. }) => {
            assert!(reason.contains("single expiry"))
        }
        other => panic!("expected InsufficientData, got {:?}", other),
    }
    // No puts were supplied at all
    assert!(bundle.puts.as_ref().unwrap_err().is_insufficient_data());
}

#[test]
fn test_near_expiry_penny_quote_never_reaches_solver() {
    let quote = OptionQuote::call(100.0, 0.001, 0.001);
    let (kept, stats) = filter_quotes(&[quote], 100.0, &FilterConfig::default());
    assert!(kept.is_empty());
    assert_eq!(stats.retained, 0);
    assert_eq!(stats.dropped(), 1);
}

/// Steep sigma jump across strikes makes the raw cubic grid undershoot zero.
#[test]
fn test_cubic_overshoot_clipped_by_validator() {
    let mut points = Vec::new();
    for &t in &[0.25, 0.5] {
        for (&k, &sigma) in [90.0, 95.0, 100.0, 105.0]
            .iter()
            .zip(&[0.05, 0.08, 2.0, 2.5])
        {
            points.push(SurfacePoint { t, k, sigma });
        }
    }

    let raw = interpolate_surface(&points, &GridSpec::default(), InterpMethod::Cubic).unwrap();
    assert!(raw.min_value() < SIGMA_MIN, "raw cubic min {}", raw.min_value());

    let (grid, report) = validate_grid(&raw).unwrap();
    assert!(report.clipped_cells > 0);
    let min = grid.iter().flatten().copied().fold(f64::INFINITY, f64::min);
    let max = grid.iter().flatten().copied().fold(f64::NEG_INFINITY, f64::max);
    assert!(min >= SIGMA_MIN);
    assert!(max <= SIGMA_MAX);

    // Same points through the linear scheme need no clipping at all
    let raw = interpolate_surface(&points, &GridSpec::default(), InterpMethod::Linear).unwrap();
    assert_eq!(validate_grid(&raw).unwrap().1.clipped_cells, 0);
}

#[test]
fn test_invalid_spot_is_a_request_error() {
    let quotes = load_fixture_quotes();
    for spot in [0.0, -5.0, f64::NAN] {
        let ctx = MarketContext::new(spot, 0.02, 0.0);
        assert!(matches!(
            build_iv_surface(&quotes, &ctx, &default_configs::standard()),
            Err(SurfaceError::InvalidInput(_))
        ));
    }
}

#[test]
fn test_response_json_shape() {
    let bundle = build_iv_surface(
        &load_fixture_quotes(),
        &fixture_context(),
        &default_configs::standard(),
    )
    .unwrap();
    let json = serde_json::to_value(bundle.to_response()).unwrap();

    assert_eq!(json["success"], true);
    assert!(json["error"].is_null());
    assert_eq!(json["spot_price"], 100.0);
    let calls = &json["surfaces"]["calls"];
    assert_eq!(calls["time_axis"].as_array().unwrap().len(), 30);
    assert_eq!(calls["strike_axis"].as_array().unwrap().len(), 30);
    assert_eq!(calls["sigma_grid"].as_array().unwrap().len(), 30);
    assert_eq!(calls["points_used"], 18);
    assert_eq!(calls["method"], "linear");
    assert!(calls["diagnostics"]["validation"]["clipped_cells"].is_u64());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_retained_quotes_inside_moneyness_band(
        raw in prop::collection::vec(
            (any::<bool>(), 40.0f64..200.0, 0.0f64..2.0, 0.0f64..40.0),
            1..60,
        )
    ) {
        let spot = 100.0;
        let quotes: Vec<OptionQuote> = raw
            .iter()
            .map(|&(is_call, k, t, price)| {
                let option_type = if is_call { OptionType::Call } else { OptionType::Put };
                OptionQuote::new(option_type, k, t, price)
            })
            .collect();
        let (kept, stats) = filter_quotes(&quotes, spot, &FilterConfig::default());

        prop_assert_eq!(stats.input, quotes.len());
        prop_assert_eq!(stats.retained + stats.dropped(), quotes.len());
        for q in &kept {
            prop_assert!(q.market_price >= 0.01);
            prop_assert!(q.years_to_exp >= 0.01);
            match q.option_type {
                OptionType::Call => {
                    prop_assert!(spot / q.strike <= 1.10);
                }
                OptionType::Put => {
                    prop_assert!(spot / q.strike >= 0.90);
                }
            }
        }
    }

    #[test]
    fn prop_linear_grid_within_input_range(
        sites in prop::collection::vec(
            (0.05f64..2.0, 80.0f64..120.0, 0.05f64..1.5),
            6..40,
        )
    ) {
        let points: Vec<SurfacePoint> = sites
            .iter()
            .map(|&(t, k, sigma)| SurfacePoint { t, k, sigma })
            .collect();
        let lo = points.iter().map(|p| p.sigma).fold(f64::INFINITY, f64::min);
        let hi = points.iter().map(|p| p.sigma).fold(f64::NEG_INFINITY, f64::max);

        let spec = GridSpec { time_points: 15, strike_points: 15 };
        let grid = interpolate_surface(&points, &spec, InterpMethod::Linear).unwrap();
        prop_assert!(grid.min_value() >= lo - 1e-12);
        prop_assert!(grid.max_value() <= hi + 1e-12);
    }
}
