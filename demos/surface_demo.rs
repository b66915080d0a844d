// Example: surface_demo.rs
// Builds call and put surfaces from a synthetic option chain (or a CSV chain)
// and prints a summary plus the JSON response.
//
// Usage:
//     cargo run --example surface_demo
//     cargo run --example surface_demo -- <chain.csv> <spot> [config.toml]
//
// Set RUST_LOG=iv_surface_lib=debug to see per-stage logging.

use std::env;

use anyhow::{Context, Result};
use iv_surface_lib::synthetic::{generate_chain, ChainSpec};
use iv_surface_lib::{
    build_iv_surface, default_configs, load_chain_csv, quotes_from_chain, MarketContext,
    OptionType, SurfaceConfig,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let (quotes, ctx) = if args.len() >= 3 {
        let rows = load_chain_csv(&args[1])?;
        let spot: f64 = args[2].parse().context("spot must be a number")?;
        (quotes_from_chain(&rows), MarketContext::new(spot, 0.02, 0.0))
    } else {
        let spec = ChainSpec {
            noise: 0.01,
            ..ChainSpec::default()
        };
        (generate_chain(&spec), spec.context)
    };
    let config = match args.get(3) {
        Some(path) => SurfaceConfig::from_toml_file(path)?,
        None => default_configs::standard(),
    };

    println!("IV surface demo");
    println!("===============");
    println!(
        "Spot: {:.2}  r: {:.3}  q: {:.3}  quotes: {}  method: {:?}\n",
        ctx.spot,
        ctx.r,
        ctx.q,
        quotes.len(),
        config.grid.method
    );

    let bundle = build_iv_surface(&quotes, &ctx, &config)?;

    for option_type in [OptionType::Call, OptionType::Put] {
        match bundle.get(option_type) {
            Ok(surface) => {
                let d = &surface.diagnostics;
                println!("{}:", option_type);
                println!(
                    "   Filter: {} in, {} kept ({} price, {} time, {} moneyness dropped)",
                    d.filter.input,
                    d.filter.retained,
                    d.filter.dropped_price,
                    d.filter.dropped_time,
                    d.filter.dropped_moneyness
                );
                println!(
                    "   Solver: {} converged, {} failed",
                    d.solve.converged,
                    d.solve.failed()
                );
                println!(
                    "   Grid: {}x{}, sigma in [{:.4}, {:.4}], mean {:.4}",
                    surface.dims().0,
                    surface.dims().1,
                    surface.min_sigma(),
                    surface.max_sigma(),
                    d.validation.mean
                );
                println!(
                    "   Clipped cells: {}  Filled cells: {}\n",
                    d.validation.clipped_cells, d.filled_cells
                );
            }
            Err(e) => println!("{}: {}\n", option_type, e),
        }
    }

    let json = serde_json::to_string_pretty(&bundle.to_response())?;
    println!("Response ({} bytes):", json.len());
    let preview: String = json.lines().take(12).collect::<Vec<_>>().join("\n");
    println!("{}\n...", preview);
    Ok(())
}
