use std::collections::BTreeMap;
use std::path::Path;

use polars::prelude::*;
use tracing::{info, warn};

use crate::error::Result;
use crate::extract::{ExtractConfig, ResultSelection, extract_results};
use crate::qc::check_equal_length;
use crate::types::{CategoryCount, Hemi, OverlapCategory, OverlapResult, SurfaceMap};

// Distinct bits keep every sum in {0, 1, 2, 3} unambiguous.
pub const MARKER_A: u8 = 1;
pub const MARKER_B: u8 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum OverlapOutcome {
    Overlap(OverlapResult),
    Empty { overlap_map: Hemi<Vec<u8>> },
}

impl OverlapOutcome {
    pub fn overlap_map(&self) -> &Hemi<Vec<u8>> {
        match self {
            OverlapOutcome::Overlap(result) => &result.overlap_map,
            OverlapOutcome::Empty { overlap_map } => overlap_map,
        }
    }

    pub fn result(&self) -> Option<&OverlapResult> {
        match self {
            OverlapOutcome::Overlap(result) => Some(result),
            OverlapOutcome::Empty { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, OverlapOutcome::Empty { .. })
    }
}

pub fn binarize(labels: &[u32], marker: u8) -> Vec<u8> {
    labels
        .iter()
        .map(|&l| if l > 0 { marker } else { 0 })
        .collect()
}

pub fn compute_overlap(map_a: &SurfaceMap, map_b: &SurfaceMap) -> Result<OverlapOutcome> {
    let mut merged: BTreeMap<u8, usize> = BTreeMap::new();
    let mut overlap_map: Hemi<Vec<u8>> = Hemi::default();

    for (hemi, labels_a) in map_a.cluster_labels.iter() {
        let labels_b = map_b.cluster_labels.get(hemi);
        check_equal_length(
            labels_a.len(),
            labels_b.len(),
            &format!("{hemi} hemisphere of map A"),
            &format!("{hemi} hemisphere of map B"),
        )?;

        let combined: Vec<u8> = binarize(labels_a, MARKER_A)
            .into_iter()
            .zip(binarize(labels_b, MARKER_B))
            .map(|(a, b)| a + b)
            .collect();

        for &code in combined.iter().filter(|&&c| c != 0) {
            *merged.entry(code).or_insert(0) += 1;
        }
        *overlap_map.get_mut(hemi) = combined;
    }

    let total: usize = merged.values().sum();
    if total == 0 {
        warn!("No significant vertices in either map; overlap is empty");
        return Ok(OverlapOutcome::Empty { overlap_map });
    }

    let counts: Vec<(OverlapCategory, CategoryCount)> = merged
        .into_iter()
        .filter_map(|(code, count)| {
            OverlapCategory::from_code(code).map(|category| {
                (
                    category,
                    CategoryCount {
                        count,
                        percent: percent_of(count, total),
                    },
                )
            })
        })
        .collect();

    let result = OverlapResult {
        overlap_map,
        counts,
    };
    info!(
        "Overlap: {} shared, {} only A, {} only B (of {total} vertices)",
        result.category(OverlapCategory::Both).count,
        result.category(OverlapCategory::OnlyA).count,
        result.category(OverlapCategory::OnlyB).count
    );
    Ok(OverlapOutcome::Overlap(result))
}

fn percent_of(count: usize, total: usize) -> f64 {
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

pub fn overlap_from_dir(
    results_dir: &Path,
    a: &ResultSelection,
    b: &ResultSelection,
    extension: &str,
) -> Result<OverlapOutcome> {
    let load = |selection: &ResultSelection| {
        let mut config = ExtractConfig::new(results_dir, selection.clone());
        config.extension = extension.to_string();
        extract_results(&config)
    };
    let first = load(a)?;
    let second = load(b)?;
    compute_overlap(&first.map, &second.map)
}

pub fn overlap_message(outcome: &OverlapOutcome, label_a: &str, label_b: &str) -> String {
    let Some(result) = outcome.result() else {
        return "No significant vertices in either map".to_string();
    };
    let text = |category: OverlapCategory| {
        let c = result.category(category);
        format!("{:.1}% ({} vertices)", c.percent, c.count)
    };
    format!(
        "There was a {} overlap between the terms selected; {} was unique to {label_a}; {} was unique to {label_b}",
        text(OverlapCategory::Both),
        text(OverlapCategory::OnlyA),
        text(OverlapCategory::OnlyB)
    )
}

pub fn overlap_counts_frame(
    result: &OverlapResult,
    label_a: &str,
    label_b: &str,
) -> anyhow::Result<DataFrame> {
    let describe = |category: OverlapCategory| match category {
        OverlapCategory::OnlyA => format!("only {label_a}"),
        OverlapCategory::OnlyB => format!("only {label_b}"),
        OverlapCategory::Both => "both".to_string(),
    };
    let code: Vec<u32> = OverlapCategory::ALL.iter().map(|c| u32::from(c.code())).collect();
    let category: Vec<String> = OverlapCategory::ALL.iter().map(|&c| describe(c)).collect();
    let vertices: Vec<u64> = OverlapCategory::ALL
        .iter()
        .map(|&c| result.category(c).count as u64)
        .collect();
    let percent: Vec<f64> = OverlapCategory::ALL
        .iter()
        .map(|&c| result.category(c).percent)
        .collect();
    let df = df!(
        "code" => code,
        "category" => category,
        "vertices" => vertices,
        "percent" => percent
    )?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BrainMappError;

    fn labels_only(left: Vec<u32>, right: Vec<u32>) -> SurfaceMap {
        SurfaceMap {
            cluster_labels: Hemi::new(left, right),
            ..Default::default()
        }
    }

    #[test]
    fn codes_unique_and_shared_vertices() {
        let a = labels_only(vec![1, 1, 0, 0], vec![0, 0]);
        let b = labels_only(vec![0, 1, 1, 0], vec![0, 0]);
        let outcome = compute_overlap(&a, &b).unwrap();
        assert_eq!(outcome.overlap_map().left, vec![1, 3, 2, 0]);
        assert_eq!(outcome.overlap_map().right, vec![0, 0]);

        let result = outcome.result().unwrap();
        for category in OverlapCategory::ALL {
            assert_eq!(result.category(category).count, 1);
            assert_eq!(result.category(category).percent, 33.3);
        }
    }

    #[test]
    fn inputs_are_not_mutated() {
        let a = labels_only(vec![4, 0, 7], vec![2]);
        let b = labels_only(vec![0, 5, 7], vec![0]);
        let before = (a.clone(), b.clone());
        compute_overlap(&a, &b).unwrap();
        let again = compute_overlap(&a, &b).unwrap();
        assert_eq!((a, b), before);
        assert_eq!(again.overlap_map().left, vec![1, 2, 3]);
    }

    #[test]
    fn counts_merge_across_hemispheres() {
        let a = labels_only(vec![1, 1, 0], vec![3, 3, 3, 0]);
        let b = labels_only(vec![0, 1, 0], vec![0, 0, 1, 1]);
        let result = compute_overlap(&a, &b).unwrap().result().unwrap().clone();
        assert_eq!(result.category(OverlapCategory::OnlyA).count, 3);
        assert_eq!(result.category(OverlapCategory::Both).count, 2);
        assert_eq!(result.category(OverlapCategory::OnlyB).count, 1);
        assert_eq!(result.category(OverlapCategory::OnlyA).percent, 50.0);
        assert_eq!(result.category(OverlapCategory::Both).percent, 33.3);
        assert_eq!(result.category(OverlapCategory::OnlyB).percent, 16.7);
    }

    #[test]
    fn absent_category_is_not_listed() {
        let a = labels_only(vec![1, 1], vec![0]);
        let b = labels_only(vec![1, 1], vec![0]);
        let result = compute_overlap(&a, &b).unwrap().result().unwrap().clone();
        assert_eq!(result.counts.len(), 1);
        assert_eq!(result.category(OverlapCategory::Both).percent, 100.0);
        assert_eq!(result.category(OverlapCategory::OnlyA).count, 0);
    }

    #[test]
    fn no_significant_vertices_is_empty_not_an_error() {
        let a = labels_only(vec![0, 0], vec![0]);
        let b = labels_only(vec![0, 0], vec![0]);
        let outcome = compute_overlap(&a, &b).unwrap();
        assert!(outcome.is_empty());
        assert_eq!(outcome.overlap_map().left, vec![0, 0]);
        assert_eq!(
            overlap_message(&outcome, "A", "B"),
            "No significant vertices in either map"
        );
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let a = labels_only(vec![1, 0, 0], vec![0]);
        let b = labels_only(vec![1, 0], vec![0]);
        assert!(matches!(
            compute_overlap(&a, &b),
            Err(BrainMappError::IncompatibleMap(_))
        ));
    }

    #[test]
    fn message_reports_each_category() {
        let a = labels_only(vec![1, 1, 0, 0], vec![0]);
        let b = labels_only(vec![0, 1, 1, 0], vec![0]);
        let outcome = compute_overlap(&a, &b).unwrap();
        let msg = overlap_message(&outcome, "m1 (thickness)", "m2 (area)");
        assert_eq!(
            msg,
            "There was a 33.3% (1 vertices) overlap between the terms selected; \
             33.3% (1 vertices) was unique to m1 (thickness); \
             33.3% (1 vertices) was unique to m2 (area)"
        );
    }

    #[test]
    fn counts_frame_lists_all_categories() {
        let a = labels_only(vec![1, 1], vec![0]);
        let b = labels_only(vec![1, 0], vec![0]);
        let outcome = compute_overlap(&a, &b).unwrap();
        let df = overlap_counts_frame(outcome.result().unwrap(), "A", "B").unwrap();
        assert_eq!(df.height(), 3);
    }
}
