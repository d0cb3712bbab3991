use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::io::read_surface_values;
use crate::qc::{check_cluster_label, check_dir_exists, check_equal_length};
use crate::types::{Hemi, Hemisphere, SurfaceMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSelection {
    pub group: String,
    pub model: String,
    pub measure: String,
}

impl ResultSelection {
    pub fn new(group: impl Into<String>, model: impl Into<String>, measure: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            model: model.into(),
            measure: measure.into(),
        }
    }

    pub fn model_dir(&self, results_dir: &Path) -> PathBuf {
        results_dir.join(&self.group).join(&self.model)
    }

    pub fn cluster_file(&self, results_dir: &Path, hemi: Hemisphere, extension: &str) -> PathBuf {
        self.model_dir(results_dir).join(format!(
            "{}h.{}.{}.ocn.{extension}",
            hemi.prefix(),
            self.measure,
            self.model
        ))
    }

    pub fn beta_file(&self, results_dir: &Path, hemi: Hemisphere, extension: &str) -> PathBuf {
        self.model_dir(results_dir).join(format!(
            "{}h.{}.est.{}.{extension}",
            hemi.prefix(),
            self.measure,
            self.model
        ))
    }
}

#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub results_dir: PathBuf,
    pub selection: ResultSelection,
    pub extension: String,
}

impl ExtractConfig {
    pub fn new(results_dir: impl Into<PathBuf>, selection: ResultSelection) -> Self {
        Self {
            results_dir: results_dir.into(),
            selection,
            extension: "mgh".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MapResults {
    pub min_beta: f64,
    pub max_beta: f64,
    // Mean of the per-hemisphere means.
    pub mean_beta: f64,
    pub n_clusters: Hemi<usize>,
    pub map: SurfaceMap,
}

impl MapResults {
    pub fn total_clusters(&self) -> usize {
        self.n_clusters.left + self.n_clusters.right
    }

    pub fn has_clusters(&self) -> bool {
        self.total_clusters() > 0
    }

    pub fn info_message(&self) -> String {
        if !self.has_clusters() {
            return "0 clusters identified (in the left or the right hemisphere).".to_string();
        }
        format!(
            "{} clusters identified ({} in the left and {} in the right hemisphere). \
             Mean beta value [range] = {:.2} [{:.2}; {:.2}]",
            self.total_clusters(),
            self.n_clusters.left,
            self.n_clusters.right,
            self.mean_beta,
            self.min_beta,
            self.max_beta
        )
    }
}

struct HemiExtract {
    labels: Vec<u32>,
    betas: Vec<f64>,
    observed: Vec<f64>,
    n_clusters: usize,
}

pub fn extract_results(config: &ExtractConfig) -> Result<MapResults> {
    let model_dir = config.selection.model_dir(&config.results_dir);
    check_dir_exists(&model_dir)?;

    let left = extract_hemisphere(config, Hemisphere::Left)?;
    let right = extract_hemisphere(config, Hemisphere::Right)?;

    let per_hemi = [left.betas.as_slice(), right.betas.as_slice()].map(nan_stats);
    let min_beta = nan_reduce(per_hemi.iter().map(|s| s.min), f64::min);
    let max_beta = nan_reduce(per_hemi.iter().map(|s| s.max), f64::max);
    let means: Vec<f64> = per_hemi.iter().map(|s| s.mean).filter(|m| !m.is_nan()).collect();
    let mean_beta = if means.is_empty() {
        f64::NAN
    } else {
        means.iter().sum::<f64>() / means.len() as f64
    };

    let results = MapResults {
        min_beta,
        max_beta,
        mean_beta,
        n_clusters: Hemi::new(left.n_clusters, right.n_clusters),
        map: SurfaceMap {
            cluster_labels: Hemi::new(left.labels, right.labels),
            betas: Hemi::new(left.betas, right.betas),
            all_observed_betas: Hemi::new(left.observed, right.observed),
        },
    };
    info!(
        "{}/{}/{}: {} clusters ({} left, {} right)",
        config.selection.group,
        config.selection.model,
        config.selection.measure,
        results.total_clusters(),
        results.n_clusters.left,
        results.n_clusters.right
    );
    Ok(results)
}

fn extract_hemisphere(config: &ExtractConfig, hemi: Hemisphere) -> Result<HemiExtract> {
    let sel = &config.selection;
    let cluster_path = sel.cluster_file(&config.results_dir, hemi, &config.extension);
    let beta_path = sel.beta_file(&config.results_dir, hemi, &config.extension);

    let labels = read_surface_values(&cluster_path)?
        .into_iter()
        .enumerate()
        .map(|(i, v)| check_cluster_label(v, i, &cluster_path))
        .collect::<Result<Vec<u32>>>()?;
    let observed = read_surface_values(&beta_path)?;

    let (betas, n_clusters) = if labels.iter().all(|&l| l == 0) {
        debug!("{hemi} hemisphere: no significant clusters");
        (vec![f64::NAN; labels.len()], 0)
    } else {
        check_equal_length(
            labels.len(),
            observed.len(),
            &cluster_path.display().to_string(),
            &beta_path.display().to_string(),
        )?;
        (mask_betas(&labels, &observed), count_clusters(&labels))
    };

    Ok(HemiExtract {
        labels,
        betas,
        observed,
        n_clusters,
    })
}

pub fn mask_betas(labels: &[u32], betas: &[f64]) -> Vec<f64> {
    labels
        .iter()
        .zip(betas)
        .map(|(&label, &beta)| if label == 0 { f64::NAN } else { beta })
        .collect()
}

// Cluster ids are numbered densely from 1, so the largest label is the count.
pub fn count_clusters(labels: &[u32]) -> usize {
    labels.iter().copied().max().unwrap_or(0) as usize
}

pub fn distinct_cluster_ids(labels: &[u32]) -> BTreeSet<u32> {
    labels.iter().copied().filter(|&l| l > 0).collect()
}

#[derive(Debug, Clone, Copy)]
struct NanStats {
    min: f64,
    max: f64,
    mean: f64,
}

fn nan_stats(values: &[f64]) -> NanStats {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut n = 0usize;
    for &v in values.iter().filter(|v| !v.is_nan()) {
        min = min.min(v);
        max = max.max(v);
        sum += v;
        n += 1;
    }
    if n == 0 {
        return NanStats {
            min: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
        };
    }
    NanStats {
        min,
        max,
        mean: sum / n as f64,
    }
}

fn nan_reduce(values: impl Iterator<Item = f64>, f: fn(f64, f64) -> f64) -> f64 {
    values.filter(|v| !v.is_nan()).reduce(f).unwrap_or(f64::NAN)
}
