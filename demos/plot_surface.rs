// Example: plot_surface.rs
// Builds a call surface from a synthetic chain and renders it as an SVG heatmap
// (time on the x axis, strike on the y axis) with the solved points overlaid.
//
// Usage:
//     cargo run --example plot_surface -- [linear|cubic]
//
// The output image is written to iv_surface.svg in the working directory.

use std::env;
use std::error::Error;

use iv_surface_lib::synthetic::{generate_chain, ChainSpec};
use iv_surface_lib::{build_iv_surface, default_configs, VolatilitySurface};
use plotters::prelude::*;

/// Blue (low) to red (high)
fn heat_color(value: f64, lo: f64, hi: f64) -> HSLColor {
    let x = if hi > lo { (value - lo) / (hi - lo) } else { 0.5 };
    HSLColor(0.66 * (1.0 - x.clamp(0.0, 1.0)), 0.8, 0.5)
}

/// Cell edges halfway between axis nodes
fn edges(axis: &[f64]) -> Vec<f64> {
    let n = axis.len();
    let mut out = Vec::with_capacity(n + 1);
    out.push(axis[0] - (axis[1] - axis[0]) / 2.0);
    for w in axis.windows(2) {
        out.push((w[0] + w[1]) / 2.0);
    }
    out.push(axis[n - 1] + (axis[n - 1] - axis[n - 2]) / 2.0);
    out
}

fn plot(surface: &VolatilitySurface, path: &str) -> Result<(), Box<dyn Error>> {
    let t_edges = edges(&surface.time_axis);
    let k_edges = edges(&surface.strike_axis);
    let (lo, hi) = (surface.min_sigma(), surface.max_sigma());

    let root = SVGBackend::new(path, (1280, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(
            format!(
                "{} IV surface ({:?}) | sigma {:.1}%..{:.1}% | {} points, {} clipped",
                surface.option_type,
                surface.method,
                lo * 100.0,
                hi * 100.0,
                surface.points_used,
                surface.diagnostics.validation.clipped_cells
            ),
            ("sans-serif", 26),
        )
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            t_edges[0]..t_edges[t_edges.len() - 1],
            k_edges[0]..k_edges[k_edges.len() - 1],
        )?;

    chart
        .configure_mesh()
        .x_desc("Time to expiry (years)")
        .y_desc("Strike ($)")
        .disable_mesh()
        .draw()?;

    chart.draw_series(surface.sigma_grid.iter().enumerate().flat_map(|(i, row)| {
        let t_edges = &t_edges;
        let k_edges = &k_edges;
        row.iter().enumerate().map(move |(j, &sigma)| {
            Rectangle::new(
                [(t_edges[i], k_edges[j]), (t_edges[i + 1], k_edges[j + 1])],
                heat_color(sigma, lo, hi).filled(),
            )
        })
    }))?;

    chart.draw_series(
        surface
            .raw_points
            .iter()
            .map(|p| Circle::new((p.t, p.k), 3, BLACK.filled())),
    )?;

    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = match env::args().nth(1).as_deref() {
        Some("cubic") => default_configs::smooth(),
        _ => default_configs::standard(),
    };
    let spec = ChainSpec {
        noise: 0.01,
        ..ChainSpec::default()
    };
    let quotes = generate_chain(&spec);

    let bundle = build_iv_surface(&quotes, &spec.context, &config)?;
    let surface = bundle.calls.as_ref().map_err(|e| e.to_string())?;

    println!(
        "Built {:?} call surface: {}x{} grid from {} points",
        config.grid.method,
        surface.dims().0,
        surface.dims().1,
        surface.points_used
    );
    plot(surface, "iv_surface.svg")?;
    println!("Chart saved to iv_surface.svg");
    Ok(())
}
