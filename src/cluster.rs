use std::collections::BTreeMap;

use polars::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::qc::check_equal_length;
use crate::types::{ClusterSummary, Hemi, Hemisphere};

#[derive(Default)]
struct Accumulator {
    size: usize,
    n: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Accumulator {
    fn push(&mut self, beta: f64) {
        self.size += 1;
        if beta.is_nan() {
            return;
        }
        if self.n == 0 {
            self.min = beta;
            self.max = beta;
        } else {
            self.min = self.min.min(beta);
            self.max = self.max.max(beta);
        }
        self.n += 1;
        self.sum += beta;
    }

    fn finish(self, hemi: Hemisphere, cluster_id: u32) -> ClusterSummary {
        let (mean, min, max) = if self.n == 0 {
            (f64::NAN, f64::NAN, f64::NAN)
        } else {
            (self.sum / self.n as f64, self.min, self.max)
        };
        ClusterSummary {
            hemi,
            cluster_id,
            size: self.size,
            mean,
            min,
            max,
        }
    }
}

pub fn cluster_summary_table(
    cluster_labels: &Hemi<Vec<u32>>,
    betas: &Hemi<Vec<f64>>,
) -> Result<Vec<ClusterSummary>> {
    let mut rows = Vec::new();
    for (hemi, labels) in cluster_labels.iter() {
        if labels.iter().all(|&l| l == 0) {
            continue;
        }
        let hemi_betas = betas.get(hemi);
        check_equal_length(
            labels.len(),
            hemi_betas.len(),
            &format!("{hemi} cluster labels"),
            &format!("{hemi} betas"),
        )?;

        let mut groups: BTreeMap<u32, Accumulator> = BTreeMap::new();
        for (&label, &beta) in labels.iter().zip(hemi_betas) {
            if label == 0 {
                continue;
            }
            groups.entry(label).or_default().push(beta);
        }
        debug!("{hemi} hemisphere: {} clusters summarised", groups.len());
        rows.extend(groups.into_iter().map(|(id, acc)| acc.finish(hemi, id)));
    }
    Ok(rows)
}

pub fn cluster_summary_frame(rows: &[ClusterSummary]) -> anyhow::Result<DataFrame> {
    let hemi: Vec<&str> = rows.iter().map(|r| r.hemi.name()).collect();
    let cluster: Vec<String> = rows.iter().map(ClusterSummary::label).collect();
    let size: Vec<u64> = rows.iter().map(|r| r.size as u64).collect();
    let mean: Vec<f64> = rows.iter().map(|r| r.mean).collect();
    let min: Vec<f64> = rows.iter().map(|r| r.min).collect();
    let max: Vec<f64> = rows.iter().map(|r| r.max).collect();
    let df = df!(
        "hemi" => hemi,
        "cluster" => cluster,
        "size" => size,
        "mean" => mean,
        "min" => min,
        "max" => max
    )?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarises_left_clusters_in_id_order() {
        let labels = Hemi::new(vec![0, 1, 1, 2, 0], vec![0; 5]);
        let betas = Hemi::new(
            vec![f64::NAN, 0.5, 0.7, -0.3, f64::NAN],
            vec![f64::NAN; 5],
        );
        let rows = cluster_summary_table(&labels, &betas).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].hemi, Hemisphere::Left);
        assert_eq!(rows[0].cluster_id, 1);
        assert_eq!(rows[0].size, 2);
        assert!((rows[0].mean - 0.6).abs() < 1e-12);
        assert_eq!(rows[0].min, 0.5);
        assert_eq!(rows[0].max, 0.7);

        assert_eq!(rows[1].label(), "Cluster 2");
        assert_eq!(rows[1].size, 1);
        assert_eq!(rows[1].mean, -0.3);
        assert_eq!(rows[1].min, -0.3);
        assert_eq!(rows[1].max, -0.3);
    }

    #[test]
    fn right_follows_left_and_ids_are_per_hemisphere() {
        let labels = Hemi::new(vec![2, 1], vec![1, 1, 0]);
        let betas = Hemi::new(vec![0.2, 0.1], vec![1.0, 3.0, f64::NAN]);
        let rows = cluster_summary_table(&labels, &betas).unwrap();
        let keys: Vec<(Hemisphere, u32)> = rows.iter().map(|r| (r.hemi, r.cluster_id)).collect();
        assert_eq!(
            keys,
            vec![
                (Hemisphere::Left, 1),
                (Hemisphere::Left, 2),
                (Hemisphere::Right, 1)
            ]
        );
        assert_eq!(rows[2].mean, 2.0);
    }

    #[test]
    fn nan_betas_inside_a_cluster_are_excluded() {
        let labels = Hemi::new(vec![1, 1, 1], vec![0]);
        let betas = Hemi::new(vec![1.0, f64::NAN, 2.0], vec![f64::NAN]);
        let rows = cluster_summary_table(&labels, &betas).unwrap();
        assert_eq!(rows[0].size, 3);
        assert_eq!(rows[0].mean, 1.5);
    }

    #[test]
    fn frame_has_one_row_per_cluster() {
        let labels = Hemi::new(vec![1, 2], vec![1]);
        let betas = Hemi::new(vec![0.1, 0.2], vec![0.3]);
        let rows = cluster_summary_table(&labels, &betas).unwrap();
        let df = cluster_summary_frame(&rows).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 6);
    }
}
