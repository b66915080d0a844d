use iv_surface_lib::{build_iv_surface, default_configs, MarketContext, OptionQuote};

fn main() {
    // A handful of quotes on two expiries
    let ctx = MarketContext::new(100.0, 0.02, 0.0);
    let quotes = vec![
        OptionQuote::call(95.0, 0.25, 7.35),
        OptionQuote::call(100.0, 0.25, 4.25),
        OptionQuote::call(105.0, 0.25, 2.05),
        OptionQuote::call(95.0, 0.5, 9.05),
        OptionQuote::call(100.0, 0.5, 6.10),
        OptionQuote::call(105.0, 0.5, 3.85),
    ];

    println!("IV-surface-lib Default Configuration Examples\n");

    let presets = [
        ("standard", "recommended default", default_configs::standard()),
        ("smooth", "nicer plots, relies on clipping", default_configs::smooth()),
        ("high_precision", "offline analysis", default_configs::high_precision()),
        ("legacy", "historical five-point minimum", default_configs::legacy()),
    ];

    for (i, (name, use_case, config)) in presets.iter().enumerate() {
        println!("{}. {} ({}):", i + 1, name, use_case);
        println!("   Method: {:?}", config.grid.method);
        println!(
            "   Grid: {}x{}",
            config.grid.time_points, config.grid.strike_points
        );
        println!(
            "   Price tolerance: {:.1e}, max iterations: {}",
            config.solver.price_tolerance, config.solver.max_iterations
        );
        println!("   Minimum points: {}", config.min_points);

        match build_iv_surface(&quotes, &ctx, config) {
            Ok(bundle) => match &bundle.calls {
                Ok(surface) => println!(
                    "   Calls: {} points, sigma in [{:.4}, {:.4}]\n",
                    surface.points_used,
                    surface.min_sigma(),
                    surface.max_sigma()
                ),
                Err(e) => println!("   Calls: {}\n", e),
            },
            Err(e) => println!("   Request failed: {}\n", e),
        }
    }

    println!("TOML for the smooth preset:\n");
    match default_configs::smooth().to_toml_string() {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to render config: {}", e),
    }
}
