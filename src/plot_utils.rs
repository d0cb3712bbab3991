use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn ensure_plots_dir(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir.to_path_buf())
}

pub fn plot_path(dir: &Path, prefix: Option<&str>, name: &str) -> PathBuf {
    let file_name = match prefix {
        Some(pfx) => format!("{pfx}_{name}.html"),
        None => format!("{name}.html"),
    };
    dir.join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_prepended() {
        let dir = Path::new("Plots");
        assert_eq!(
            plot_path(dir, Some("m1"), "cluster_means"),
            PathBuf::from("Plots/m1_cluster_means.html")
        );
        assert_eq!(plot_path(dir, None, "overlap"), PathBuf::from("Plots/overlap.html"));
    }
}
