use std::ops::Range;
use std::str::FromStr;

use crate::error::BrainMappError;
use crate::extract::MapResults;
use crate::overlap::OverlapOutcome;
use crate::types::{Hemi, Hemisphere, MeshSurface, Resolution, prefix};

const EMPTY_DARKNESS: f64 = 0.3;
const MAP_DARKNESS: f64 = 0.6;
const OVERLAP_DARKNESS: f64 = 0.7;
const SINGLE_CLUSTER_SAMPLES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Betas,
    Clusters,
}

impl FromStr for DisplayMode {
    type Err = BrainMappError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "betas" | "beta" => Ok(DisplayMode::Betas),
            "clusters" | "cluster" => Ok(DisplayMode::Clusters),
            other => Err(BrainMappError::InvalidArgument(format!(
                "unknown display mode '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub resolution: Resolution,
    pub surface: MeshSurface,
    pub cluster_colormap: String,
    pub overlap_colors: [String; 3],
    pub colorblind: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            surface: MeshSurface::default(),
            cluster_colormap: "tab20".to_string(),
            overlap_colors: [
                "#F2A93B".to_string(),
                "#3B8EF2".to_string(),
                "#D6336C".to_string(),
            ],
            colorblind: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshId {
    pub resolution: Resolution,
    pub surface: MeshSurface,
    pub hemi: Hemisphere,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Colormap {
    Named(String),
    Sampled {
        base: String,
        samples: usize,
        take: Range<usize>,
    },
    Listed(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub values: Vec<f64>,
    pub colormap: Colormap,
    pub vmin: f64,
    pub vmax: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfacePayload {
    pub mesh: MeshId,
    pub bg_darkness: f64,
    pub overlay: Option<Overlay>,
}

fn mesh(config: &RenderConfig, hemi: Hemisphere) -> MeshId {
    MeshId {
        resolution: config.resolution,
        surface: config.surface,
        hemi,
    }
}

fn empty_payload(config: &RenderConfig, hemi: Hemisphere) -> SurfacePayload {
    SurfacePayload {
        mesh: mesh(config, hemi),
        bg_darkness: EMPTY_DARKNESS,
        overlay: None,
    }
}

pub fn map_payloads(
    results: &MapResults,
    mode: DisplayMode,
    config: &RenderConfig,
) -> Hemi<SurfacePayload> {
    let n_nodes = config.resolution.n_nodes();
    results.n_clusters.map(|hemi, &n_clusters| {
        if n_clusters == 0 {
            return empty_payload(config, hemi);
        }
        let overlay = match mode {
            DisplayMode::Betas => beta_overlay(results, hemi, n_nodes),
            DisplayMode::Clusters => cluster_overlay(results, hemi, n_nodes, config),
        };
        SurfacePayload {
            mesh: mesh(config, hemi),
            bg_darkness: MAP_DARKNESS,
            overlay: Some(overlay),
        }
    })
}

fn beta_overlay(results: &MapResults, hemi: Hemisphere, n_nodes: usize) -> Overlay {
    let values = prefix(results.map.betas.get(hemi), n_nodes);
    let (vmin, vmax) = (results.min_beta, results.max_beta);
    let (colormap, threshold) = if vmax < 0.0 && vmin < 0.0 {
        ("viridis", vmax)
    } else if vmax > 0.0 && vmin > 0.0 {
        ("viridis_r", vmin)
    } else {
        ("viridis", min_abs(results.map.betas.get(hemi)))
    };
    Overlay {
        values,
        colormap: Colormap::Named(colormap.to_string()),
        vmin,
        vmax,
        threshold,
    }
}

fn min_abs(values: &[f64]) -> f64 {
    values
        .iter()
        .filter(|v| !v.is_nan())
        .map(|v| v.abs())
        .reduce(f64::min)
        .unwrap_or(f64::NAN)
}

fn cluster_overlay(
    results: &MapResults,
    hemi: Hemisphere,
    n_nodes: usize,
    config: &RenderConfig,
) -> Overlay {
    let n = *results.n_clusters.get(hemi);
    let values = prefix(results.map.cluster_labels.get(hemi), n_nodes)
        .into_iter()
        .map(f64::from)
        .collect();
    Overlay {
        values,
        colormap: cluster_colormap(&config.cluster_colormap, hemi, n, results.total_clusters()),
        vmin: 1.0,
        vmax: n as f64,
        threshold: 1.0,
    }
}

pub fn cluster_colormap(base: &str, hemi: Hemisphere, n_clusters: usize, total: usize) -> Colormap {
    let samples = if total > 1 { total } else { SINGLE_CLUSTER_SAMPLES };
    if n_clusters > 1 {
        let take = match hemi {
            Hemisphere::Left => 0..n_clusters.min(samples),
            Hemisphere::Right => samples.saturating_sub(n_clusters)..samples,
        };
        return Colormap::Sampled {
            base: base.to_string(),
            samples,
            take,
        };
    }
    match hemi {
        Hemisphere::Left => Colormap::Sampled {
            base: base.to_string(),
            samples,
            take: 0..samples,
        },
        Hemisphere::Right => Colormap::Sampled {
            base: format!("{base}_r"),
            samples: SINGLE_CLUSTER_SAMPLES,
            take: 0..SINGLE_CLUSTER_SAMPLES,
        },
    }
}

pub fn overlap_payloads(outcome: &OverlapOutcome, config: &RenderConfig) -> Hemi<SurfacePayload> {
    let n_nodes = config.resolution.n_nodes();
    outcome.overlap_map().map(|hemi, codes| SurfacePayload {
        mesh: mesh(config, hemi),
        bg_darkness: OVERLAP_DARKNESS,
        overlay: Some(Overlay {
            values: prefix(codes, n_nodes).into_iter().map(f64::from).collect(),
            colormap: Colormap::Listed(config.overlap_colors.to_vec()),
            vmin: 1.0,
            vmax: 3.0,
            threshold: 1.0,
        }),
    })
}
