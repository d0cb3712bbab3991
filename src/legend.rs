use polars::prelude::*;
use statrs::distribution::{Continuous, Normal};
use tracing::debug;

use crate::error::{BrainMappError, Result};
use crate::types::SurfaceMap;

pub const DEFAULT_GRID_POINTS: usize = 200;
const AXIS_PAD_FRACTION: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct BetaLegend {
    pub colormap: String,
    pub significant_range: (f64, f64),
    pub axis_range: (f64, f64),
    pub blank_band: Option<f64>,
    pub grid: Vec<f64>,
    // Empty when the sample is too small or has no spread.
    pub density: Vec<f64>,
    pub colored: Vec<bool>,
}

pub fn beta_legend(map: &SurfaceMap, n_points: usize, colorblind: bool) -> Result<Option<BetaLegend>> {
    if n_points < 2 {
        return Err(BrainMappError::InvalidArgument(
            "legend grid needs at least two points".to_string(),
        ));
    }

    let significant: Vec<f64> = map
        .betas
        .iter()
        .flat_map(|(_, v)| v.iter().copied())
        .filter(|v| !v.is_nan())
        .collect();
    let Some((min_sig, max_sig)) = finite_range(&significant) else {
        return Ok(None);
    };

    let observed: Vec<f64> = map
        .all_observed_betas
        .iter()
        .flat_map(|(_, v)| v.iter().copied())
        .filter(|v| !v.is_nan())
        .collect();
    let (min_obs, max_obs) = finite_range(&observed).unwrap_or((min_sig, max_sig));

    let grid = linspace(min_obs, max_obs, n_points);
    let (colormap, blank_band) = if max_sig < 0.0 && min_sig < 0.0 {
        ("viridis", None)
    } else if max_sig > 0.0 && min_sig > 0.0 {
        (if colorblind { "viridis_r" } else { "hot_r" }, None)
    } else {
        let t = significant
            .iter()
            .map(|v| v.abs())
            .fold(f64::INFINITY, f64::min);
        ("viridis", Some(t))
    };
    let colored = grid
        .iter()
        .map(|&x| match blank_band {
            Some(t) => x > t || x < -t,
            None => x > min_sig && x < max_sig,
        })
        .collect();

    let nonzero: Vec<f64> = observed.into_iter().filter(|&v| v != 0.0).collect();
    let density = gaussian_kde(&nonzero, &grid)?.unwrap_or_default();
    debug!(
        "Beta legend: {} observed values, significant range [{min_sig}, {max_sig}]",
        nonzero.len()
    );

    let pad = (max_obs - min_obs).abs() * AXIS_PAD_FRACTION;
    Ok(Some(BetaLegend {
        colormap: colormap.to_string(),
        significant_range: (min_sig, max_sig),
        axis_range: (min_obs - pad, max_obs + pad),
        blank_band,
        grid,
        density,
        colored,
    }))
}

fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.iter().filter(|v| v.is_finite()) {
        min = min.min(*v);
        max = max.max(*v);
    }
    (min.is_finite() && max.is_finite()).then_some((min, max))
}

pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

pub fn gaussian_kde(sample: &[f64], points: &[f64]) -> Result<Option<Vec<f64>>> {
    let n = sample.len();
    if n < 2 {
        return Ok(None);
    }
    let mean = sample.iter().sum::<f64>() / n as f64;
    let var = sample.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let bandwidth = var.sqrt() * (n as f64).powf(-0.2);
    if !(bandwidth > 0.0 && bandwidth.is_finite()) {
        return Ok(None);
    }
    let kernel = Normal::new(0.0, bandwidth)
        .map_err(|e| BrainMappError::InvalidArgument(format!("kernel bandwidth: {e}")))?;
    let density = points
        .iter()
        .map(|&x| sample.iter().map(|&xi| kernel.pdf(x - xi)).sum::<f64>() / n as f64)
        .collect();
    Ok(Some(density))
}

pub fn legend_frame(legend: &BetaLegend) -> anyhow::Result<DataFrame> {
    let density: Vec<f64> = if legend.density.len() == legend.grid.len() {
        legend.density.clone()
    } else {
        vec![f64::NAN; legend.grid.len()]
    };
    let df = df!(
        "beta" => legend.grid.clone(),
        "density" => density,
        "colored" => legend.colored.clone()
    )?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Hemi;

    fn map(betas: Vec<f64>, observed: Vec<f64>) -> SurfaceMap {
        SurfaceMap {
            cluster_labels: Hemi::new(vec![0; betas.len()], vec![]),
            betas: Hemi::new(betas, vec![]),
            all_observed_betas: Hemi::new(observed, vec![]),
        }
    }

    #[test]
    fn no_significant_betas_gives_no_legend() {
        let m = map(vec![f64::NAN; 3], vec![0.1, 0.2, 0.3]);
        assert!(beta_legend(&m, DEFAULT_GRID_POINTS, false).unwrap().is_none());
    }

    #[test]
    fn positive_map_uses_hot_unless_colorblind() {
        let m = map(vec![f64::NAN, 0.5, 0.8], vec![-0.2, 0.5, 0.8]);
        let legend = beta_legend(&m, 11, false).unwrap().unwrap();
        assert_eq!(legend.colormap, "hot_r");
        assert_eq!(legend.grid.len(), 11);
        assert_eq!(legend.density.len(), 11);
        assert!(legend.blank_band.is_none());
        assert!(!legend.colored[0]);
        assert!((legend.axis_range.0 - (-0.2 - 0.01)).abs() < 1e-12);

        let legend = beta_legend(&m, 11, true).unwrap().unwrap();
        assert_eq!(legend.colormap, "viridis_r");
    }

    #[test]
    fn mixed_sign_map_blanks_the_middle() {
        let m = map(vec![-0.6, 0.3, f64::NAN, f64::NAN], vec![-0.6, 0.3, 0.0, 0.6]);
        let legend = beta_legend(&m, 4, false).unwrap().unwrap();
        assert_eq!(legend.blank_band, Some(0.3));
        // grid: -0.6, -0.2, 0.2, 0.6
        assert_eq!(legend.colored, vec![true, false, false, true]);
    }

    #[test]
    fn legend_frame_has_one_row_per_grid_point() {
        let m = map(vec![f64::NAN, 0.5, 0.8], vec![-0.2, 0.5, 0.8]);
        let legend = beta_legend(&m, 11, false).unwrap().unwrap();
        let df = legend_frame(&legend).unwrap();
        assert_eq!(df.height(), 11);
        assert_eq!(df.width(), 3);

        let flat = map(vec![0.5, 0.5], vec![0.5, 0.5]);
        let legend = beta_legend(&flat, 5, false).unwrap().unwrap();
        assert!(legend.density.is_empty());
        let df = legend_frame(&legend).unwrap();
        assert_eq!(df.height(), 5);
    }

    #[test]
    fn kde_integrates_to_about_one() {
        let sample: Vec<f64> = (0..50).map(|i| (i as f64 / 7.0).sin()).collect();
        let grid = linspace(-4.0, 4.0, 801);
        let density = gaussian_kde(&sample, &grid).unwrap().unwrap();
        let area: f64 = density.iter().sum::<f64>() * 0.01;
        assert!((area - 1.0).abs() < 1e-3);
        assert!(gaussian_kde(&[1.0, 1.0], &grid).unwrap().is_none());
    }
}
