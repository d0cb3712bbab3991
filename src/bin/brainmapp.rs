use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use plotly::common::color::NamedColor;
use plotly::common::{Line, Marker, MarkerSymbol, Mode};
use plotly::layout::Axis;
use plotly::{Bar, Layout, Plot, Scatter};
use tracing::debug;

use brainmapp::cluster::{cluster_summary_frame, cluster_summary_table};
use brainmapp::extract::{ExtractConfig, ResultSelection, extract_results};
use brainmapp::index::detect_models;
use brainmapp::io::write_dataframe;
use brainmapp::legend::{DEFAULT_GRID_POINTS, beta_legend, legend_frame};
use brainmapp::logging::{init_tracing, log_line, warn_line};
use brainmapp::overlap::{
    OverlapOutcome, compute_overlap, overlap_counts_frame, overlap_message,
};
use brainmapp::plot_utils::{ensure_plots_dir, plot_path};
use brainmapp::render::RenderConfig;
use brainmapp::types::{ClusterSummary, OverlapCategory, Resolution};

#[derive(Parser)]
#[command(name = "brainmapp")]
#[command(about = "Inspect and compare vertex-wise statistical surface maps", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    verbose: bool,
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone)]
struct Selection {
    #[arg(long, required = true)]
    group: String,
    #[arg(long, required = true)]
    model: String,
    #[arg(long, required = true)]
    measure: String,
}

#[derive(Subcommand)]
enum Command {
    Models {
        #[arg(long, required = true)]
        results_dir: PathBuf,
    },
    Summary {
        #[arg(long, required = true)]
        results_dir: PathBuf,
        #[command(flatten)]
        selection: Selection,
        #[arg(long, default_value = "mgh")]
        ext: String,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        legend_output: Option<PathBuf>,
        #[arg(long)]
        colorblind: bool,
        #[arg(long)]
        save_plot: bool,
        #[arg(long, default_value = "Plots")]
        plot_dir: PathBuf,
        #[arg(long)]
        plot_prefix: Option<String>,
    },
    Overlap {
        #[arg(long, required = true)]
        results_dir: PathBuf,
        #[arg(long, required = true)]
        group_a: String,
        #[arg(long, required = true)]
        model_a: String,
        #[arg(long, required = true)]
        measure_a: String,
        #[arg(long, required = true)]
        group_b: String,
        #[arg(long, required = true)]
        model_b: String,
        #[arg(long, required = true)]
        measure_b: String,
        #[arg(long, default_value = "mgh")]
        ext: String,
        #[arg(long)]
        resolution: Option<String>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        save_plot: bool,
        #[arg(long, default_value = "Plots")]
        plot_dir: PathBuf,
        #[arg(long)]
        plot_prefix: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mut log = match &cli.log_file {
        Some(path) => Some(File::create(path).with_context(|| format!("create {}", path.display()))?),
        None => None,
    };

    match cli.command {
        Command::Models { results_dir } => {
            let index = detect_models(&results_dir)?;
            if index.is_empty() {
                warn_line(log.as_mut(), &format!("No groups found in {}", results_dir.display()))?;
            }
            for (group, models) in &index {
                log_line(log.as_mut(), &format!("{group}: {}", models.join(", ")))?;
            }
        }
        Command::Summary {
            results_dir,
            selection,
            ext,
            output,
            legend_output,
            colorblind,
            save_plot,
            plot_dir,
            plot_prefix,
        } => {
            let selection = ResultSelection::new(selection.group, selection.model, selection.measure);
            let mut config = ExtractConfig::new(results_dir, selection);
            config.extension = ext;
            let results = extract_results(&config)?;
            log_line(log.as_mut(), &results.info_message())?;

            if let Some(path) = legend_output {
                match beta_legend(&results.map, DEFAULT_GRID_POINTS, colorblind)? {
                    Some(legend) => {
                        debug!(
                            "Beta legend: {} over [{:.3}, {:.3}], significant [{:.3}, {:.3}]",
                            legend.colormap,
                            legend.axis_range.0,
                            legend.axis_range.1,
                            legend.significant_range.0,
                            legend.significant_range.1
                        );
                        write_dataframe(&legend_frame(&legend)?, &path)?;
                        log_line(log.as_mut(), &format!("Legend data written to {}", path.display()))?;
                    }
                    None => warn_line(log.as_mut(), "No significant betas; legend not written")?,
                }
            }

            let rows = cluster_summary_table(&results.map.cluster_labels, &results.map.betas)?;
            for row in &rows {
                log_line(
                    log.as_mut(),
                    &format!(
                        "{:<5} {:<12} size={:<6} mean={:.3} [{:.3}; {:.3}]",
                        row.hemi.name(),
                        row.label(),
                        row.size,
                        row.mean,
                        row.min,
                        row.max
                    ),
                )?;
            }
            if let Some(path) = output {
                write_dataframe(&cluster_summary_frame(&rows)?, &path)?;
                log_line(log.as_mut(), &format!("Cluster table written to {}", path.display()))?;
            }
            if save_plot && !rows.is_empty() {
                ensure_plots_dir(&plot_dir)?;
                let path = plot_path(&plot_dir, plot_prefix.as_deref(), "cluster_means");
                write_cluster_means_plot(&rows, &path);
                log_line(log.as_mut(), &format!("Plot written to {}", path.display()))?;
            }
        }
        Command::Overlap {
            results_dir,
            group_a,
            model_a,
            measure_a,
            group_b,
            model_b,
            measure_b,
            ext,
            resolution,
            output,
            save_plot,
            plot_dir,
            plot_prefix,
        } => {
            let label_a = format!("{model_a} ({measure_a})");
            let label_b = format!("{model_b} ({measure_b})");
            let load = |group: String, model: String, measure: String| {
                let mut config =
                    ExtractConfig::new(&results_dir, ResultSelection::new(group, model, measure));
                config.extension = ext.clone();
                extract_results(&config)
            };
            let mut map_a = load(group_a, model_a, measure_a)?.map;
            let mut map_b = load(group_b, model_b, measure_b)?.map;
            if let Some(resolution) = resolution {
                let resolution: Resolution = resolution.parse()?;
                map_a = map_a.truncated(resolution);
                map_b = map_b.truncated(resolution);
            }

            let outcome = compute_overlap(&map_a, &map_b)?;
            log_line(log.as_mut(), &overlap_message(&outcome, &label_a, &label_b))?;

            let OverlapOutcome::Overlap(result) = &outcome else {
                return Ok(());
            };
            if let Some(path) = output {
                write_dataframe(&overlap_counts_frame(result, &label_a, &label_b)?, &path)?;
                log_line(log.as_mut(), &format!("Overlap table written to {}", path.display()))?;
            }
            if save_plot {
                ensure_plots_dir(&plot_dir)?;
                let path = plot_path(&plot_dir, plot_prefix.as_deref(), "overlap");
                let labels = [format!("only {label_a}"), format!("only {label_b}"), "both".to_string()];
                let colors = RenderConfig::default().overlap_colors;
                let mut plot = Plot::new();
                for ((category, label), color) in OverlapCategory::ALL.iter().zip(labels).zip(colors) {
                    let trace = Bar::new(vec![label.clone()], vec![result.category(*category).percent])
                        .name(&label)
                        .marker(Marker::new().color(color));
                    plot.add_trace(trace);
                }
                plot.set_layout(
                    Layout::new().y_axis(Axis::new().title("Significant vertices (%)".to_string())),
                );
                plot.write_html(&path);
                log_line(log.as_mut(), &format!("Plot written to {}", path.display()))?;
            }
        }
    }

    Ok(())
}

fn write_cluster_means_plot(rows: &[ClusterSummary], path: &Path) {
    let mut plot = Plot::new();
    for row in rows.iter().filter(|r| r.mean.is_finite()) {
        let label = format!("{} {} (size = {})", row.hemi.name(), row.label(), row.size);
        let range = Scatter::new(vec![row.min, row.max], vec![label.clone(), label.clone()])
            .mode(Mode::Lines)
            .line(Line::default().color(NamedColor::DarkGray).width(2.0))
            .show_legend(false);
        let mean = Scatter::new(vec![row.mean], vec![label.clone()])
            .mode(Mode::Markers)
            .marker(
                Marker::new()
                    .symbol(MarkerSymbol::Diamond)
                    .color(NamedColor::Black)
                    .size(10),
            )
            .name(&label);
        plot.add_trace(range);
        plot.add_trace(mean);
    }
    let x_axis = Axis::new().title("Mean beta value".to_string()).zero_line(true);
    plot.set_layout(Layout::new().x_axis(x_axis).show_legend(false));
    plot.write_html(path);
}
