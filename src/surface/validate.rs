use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use tracing::{debug, warn};

use crate::error::{SurfaceError, SurfaceResult};
use crate::models::grid_interp::delaunay::{orient, Point2};
use crate::models::grid_interp::types::RawGrid;
use crate::surface::types::{OptionType, SurfacePoint, SIGMA_MAX, SIGMA_MIN};

/// Relative tolerance for counting distinct expiries and strikes
const AXIS_TOLERANCE: f64 = 1e-12;

/// Doubled triangle area, in the unit square, below which sites count as collinear
const COLLINEAR_AREA: f64 = 1e-9;

/// Quality metadata from clipping one grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Cells moved onto a sigma bound
    pub clipped_cells: usize,
    pub clipped_low: usize,
    pub clipped_high: usize,
    /// Extremes before clipping
    pub raw_min: f64,
    pub raw_max: f64,
    /// Statistics of the clipped grid
    pub mean: f64,
    pub median: f64,
}

fn distinct_count(mut values: Vec<f64>) -> usize {
    values.sort_by(f64::total_cmp);
    values.dedup_by(|a, b| (*a - *b).abs() <= AXIS_TOLERANCE * a.abs().max(b.abs()).max(1.0));
    values.len()
}

/// True when the sites, scaled to the unit square, enclose a non-zero area.
/// Assumes at least two distinct expiries and strikes.
fn spans_area(sites: &[SurfacePoint]) -> bool {
    let bounds = |f: fn(&SurfacePoint) -> f64| {
        sites
            .iter()
            .map(f)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
    };
    let (t0, t1) = bounds(|p| p.t);
    let (k0, k1) = bounds(|p| p.k);
    let coords: Vec<Point2> = sites
        .iter()
        .map(|p| [(p.t - t0) / (t1 - t0), (p.k - k0) / (k1 - k0)])
        .collect();

    let a = coords[0];
    let dist2 = |p: &Point2| (p[0] - a[0]).powi(2) + (p[1] - a[1]).powi(2);
    let b = coords
        .iter()
        .copied()
        .max_by(|p, q| dist2(p).total_cmp(&dist2(q)))
        .unwrap_or(a);
    coords.iter().any(|&c| orient(a, b, c).abs() > COLLINEAR_AREA)
}

/// Fail with `InsufficientData` when the merged point set cannot support a surface:
/// fewer than `min_points` distinct sites, a single expiry or strike, or sites
/// that all lie on one line and so have no hull to interpolate inside.
pub fn check_point_set(
    option_type: OptionType,
    sites: &[SurfacePoint],
    min_points: usize,
) -> SurfaceResult<()> {
    let n = sites.len();
    if n < min_points {
        return Err(SurfaceError::insufficient(
            option_type,
            n,
            format!("{} usable points, need at least {}", n, min_points),
        ));
    }
    if distinct_count(sites.iter().map(|p| p.t).collect()) < 2 {
        return Err(SurfaceError::insufficient(
            option_type,
            n,
            "points span a single expiry",
        ));
    }
    if distinct_count(sites.iter().map(|p| p.k).collect()) < 2 {
        return Err(SurfaceError::insufficient(
            option_type,
            n,
            "points span a single strike",
        ));
    }
    if !spans_area(sites) {
        return Err(SurfaceError::insufficient(
            option_type,
            n,
            "points lie on a single line",
        ));
    }
    Ok(())
}

/// Clip every cell of `raw` into `[SIGMA_MIN, SIGMA_MAX]`.
///
/// Clipping runs unconditionally, whatever method produced the grid. A
/// grid without cells or a non-finite cell means the interpolator broke its contract and is reported as
/// `InvalidInput` instead of being clipped.
pub fn validate_grid(raw: &RawGrid) -> SurfaceResult<(Vec<Vec<f64>>, ValidationReport)> {
    if raw.values.iter().all(|row| row.is_empty()) {
        return Err(SurfaceError::invalid_input("interpolated grid has no cells"));
    }
    if let Some(bad) = raw.values.iter().flatten().find(|v| !v.is_finite()) {
        return Err(SurfaceError::invalid_input(format!(
            "interpolated grid contains a non-finite value ({})",
            bad
        )));
    }

    let mut report = ValidationReport {
        raw_min: raw.min_value(),
        raw_max: raw.max_value(),
        ..Default::default()
    };

    let clipped: Vec<Vec<f64>> = raw
        .values
        .iter()
        .map(|row| {
            row.iter()
                .map(|&v| {
                    if v < SIGMA_MIN {
                        report.clipped_low += 1;
                        SIGMA_MIN
                    } else if v > SIGMA_MAX {
                        report.clipped_high += 1;
                        SIGMA_MAX
                    } else {
                        v
                    }
                })
                .collect()
        })
        .collect();
    report.clipped_cells = report.clipped_low + report.clipped_high;

    let cells: Vec<f64> = clipped.iter().flatten().copied().collect();
    report.mean = Statistics::mean(&cells);
    report.median = Data::new(cells).median();

    if report.clipped_cells > 0 {
        warn!(
            clipped_low = report.clipped_low,
            clipped_high = report.clipped_high,
            raw_min = report.raw_min,
            raw_max = report.raw_max,
            "clipped interpolated volatilities to bounds"
        );
    } else {
        debug!(mean = report.mean, median = report.median, "grid within bounds");
    }

    Ok((clipped, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::grid_interp::{interpolate_surface, GridSpec, InterpMethod};

    fn site(t: f64, k: f64, sigma: f64) -> SurfacePoint {
        SurfacePoint { t, k, sigma }
    }

    fn raw(values: Vec<Vec<f64>>) -> RawGrid {
        RawGrid {
            time_axis: (0..values.len()).map(|i| i as f64 + 1.0).collect(),
            strike_axis: (0..values[0].len()).map(|j| 90.0 + j as f64).collect(),
            values,
            filled_cells: 0,
            sites: 4,
        }
    }

    #[test]
    fn test_check_point_set() {
        let ok = vec![
            site(0.25, 90.0, 0.2),
            site(0.25, 100.0, 0.2),
            site(0.5, 90.0, 0.2),
            site(0.5, 100.0, 0.2),
        ];
        assert!(check_point_set(OptionType::Call, &ok, 4).is_ok());

        let err = check_point_set(OptionType::Put, &ok[..3], 4).unwrap_err();
        assert_eq!(
            err,
            SurfaceError::InsufficientData {
                option_type: OptionType::Put,
                points: 3,
                reason: "3 usable points, need at least 4".to_string(),
            }
        );

        let one_expiry: Vec<_> = [90.0, 95.0, 100.0, 105.0]
            .iter()
            .map(|&k| site(0.5, k, 0.2))
            .collect();
        assert!(check_point_set(OptionType::Call, &one_expiry, 4)
            .unwrap_err()
            .is_insufficient_data());

        let one_strike: Vec<_> = [0.1, 0.2, 0.3, 0.4]
            .iter()
            .map(|&t| site(t, 100.0, 0.2))
            .collect();
        assert!(check_point_set(OptionType::Call, &one_strike, 4).is_err());
    }

    #[test]
    fn test_diagonal_sites_are_insufficient() {
        let diagonal: Vec<_> = (0..6)
            .map(|i| site(0.25 + 0.25 * i as f64, 90.0 + 5.0 * i as f64, 0.2))
            .collect();
        match check_point_set(OptionType::Call, &diagonal, 4) {
            Err(SurfaceError::InsufficientData { points, reason, .. }) => {
                assert_eq!(points, 6);
                assert!(reason.contains("single line"), "{}", reason);
            }
            other => panic!("expected InsufficientData, got {:?}", other),
        }

        // One site off the line is enough
        let mut bent = diagonal.clone();
        bent[3].k += 2.0;
        assert!(check_point_set(OptionType::Call, &bent, 4).is_ok());
    }

    #[test]
    fn test_clips_and_counts() {
        let grid = raw(vec![vec![-0.3, 0.2], vec![0.4, 7.5]]);
        let (clipped, report) = validate_grid(&grid).unwrap();

        assert_eq!(clipped, vec![vec![SIGMA_MIN, 0.2], vec![0.4, SIGMA_MAX]]);
        assert_eq!(report.clipped_low, 1);
        assert_eq!(report.clipped_high, 1);
        assert_eq!(report.clipped_cells, 2);
        assert_eq!(report.raw_min, -0.3);
        assert_eq!(report.raw_max, 7.5);
        assert!((report.mean - (0.01 + 0.2 + 0.4 + 5.0) / 4.0).abs() < 1e-12);
        assert!((report.median - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_in_bounds_grid_untouched() {
        let grid = raw(vec![vec![0.2, 0.25], vec![0.3, 0.35]]);
        let (clipped, report) = validate_grid(&grid).unwrap();
        assert_eq!(clipped, grid.values);
        assert_eq!(report.clipped_cells, 0);
    }

    #[test]
    fn test_non_finite_rejected() {
        let grid = raw(vec![vec![0.2, f64::NAN], vec![0.3, 0.35]]);
        assert!(matches!(validate_grid(&grid), Err(SurfaceError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_grid_rejected() {
        let empty = RawGrid {
            time_axis: Vec::new(),
            strike_axis: Vec::new(),
            values: Vec::new(),
            filled_cells: 0,
            sites: 0,
        };
        assert!(matches!(validate_grid(&empty), Err(SurfaceError::InvalidInput(_))));

        let empty_rows = RawGrid {
            values: vec![Vec::new(), Vec::new()],
            ..empty
        };
        assert!(matches!(validate_grid(&empty_rows), Err(SurfaceError::InvalidInput(_))));
    }

    #[test]
    fn test_cubic_overshoot_is_clipped() {
        // Steep jump between the second and third strike makes the cubic patch dip below zero.
        let mut points = Vec::new();
        for &t in &[0.25, 0.5] {
            for (&k, &sigma) in [90.0, 95.0, 100.0, 105.0].iter().zip(&[0.05, 0.08, 2.0, 2.5]) {
                points.push(site(t, k, sigma));
            }
        }
        let grid = interpolate_surface(&points, &GridSpec::default(), InterpMethod::Cubic).unwrap();
        assert!(grid.min_value() < SIGMA_MIN, "raw min {}", grid.min_value());

        let (clipped, report) = validate_grid(&grid).unwrap();
        assert!(report.clipped_low > 0);
        assert!(clipped
            .iter()
            .flatten()
            .all(|v| (SIGMA_MIN..=SIGMA_MAX).contains(v)));
    }
}
