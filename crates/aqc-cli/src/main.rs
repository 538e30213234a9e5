//! AQC run comparison CLI

mod config;
mod report;
mod snapshot;

use anyhow::Result;
use aqc_check::{Execution, RunComparisonSession};
use aqc_core::{ComparisonSpec, RunId};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{PlotConfig, PlotsConfig, RunsConfig, read_config};
use crate::report::{CompareReport, PlotReport};

#[derive(Parser)]
#[command(name = "aqc")]
#[command(about = "AQC - compare per-run monitoring histograms against a reference pass")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare every configured plot of the current runs against the reference runs
    Compare {
        /// Runs configuration of the pass under test (JSON or YAML)
        #[arg(long)]
        runs: PathBuf,

        /// Runs configuration of the reference pass (JSON or YAML)
        #[arg(long)]
        reference: PathBuf,

        /// Plots configuration (JSON or YAML)
        #[arg(long)]
        plots: PathBuf,

        /// Root of the `<year>/<period>/<pass>/<run>/` input tree
        #[arg(long, default_value = "inputs")]
        input_dir: PathBuf,

        /// Only compare this run
        #[arg(long)]
        run: Option<RunId>,

        /// Also emit ratio histograms and per-bin verdicts
        #[arg(long)]
        include_ratios: bool,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Threads (0 = auto). 1 compares runs sequentially.
        #[arg(long, default_value = "1")]
        threads: usize,
    },

    /// Check a plots configuration without loading any data
    ValidateConfig {
        /// Plots configuration (JSON or YAML)
        #[arg(long)]
        plots: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Compare {
            runs,
            reference,
            plots,
            input_dir,
            run,
            include_ratios,
            output,
            threads,
        } => cmd_compare(
            &runs,
            &reference,
            &plots,
            &input_dir,
            run,
            include_ratios,
            output.as_ref(),
            threads,
        ),
        Commands::ValidateConfig { plots } => cmd_validate_config(&plots),
    }
}

/// Read the plots file and validate every plot's spec.
///
/// Any invalid plot aborts before data is loaded.
fn load_plots(path: &Path) -> Result<(String, Vec<(PlotConfig, ComparisonSpec)>)> {
    let cfg: PlotsConfig = read_config(path)?;
    tracing::info!(id = %cfg.id, "loaded plots configuration");
    let Some(plots) = cfg.plots else {
        tracing::warn!(path = %path.display(), "key \"plots\" not found in configuration");
        return Ok((cfg.id, Vec::new()));
    };
    let mut checked = Vec::with_capacity(plots.len());
    for plot in plots {
        let spec = plot.to_spec()?;
        tracing::debug!(plot = %plot.display_name(), "new plot");
        checked.push((plot, spec));
    }
    Ok((cfg.id, checked))
}

#[allow(clippy::too_many_arguments)]
fn cmd_compare(
    runs_path: &Path,
    reference_path: &Path,
    plots_path: &Path,
    input_dir: &Path,
    target_run: Option<RunId>,
    include_ratios: bool,
    output: Option<&PathBuf>,
    threads: usize,
) -> Result<()> {
    let (id, plots) = load_plots(plots_path)?;
    let runs_cfg: RunsConfig = read_config(runs_path)?;
    let ref_cfg: RunsConfig = read_config(reference_path)?;

    let execution = if threads == 1 {
        Execution::Sequential
    } else {
        if threads > 1 {
            // Best-effort; if a global pool already exists, keep going.
            let _ = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global();
        }
        Execution::Parallel
    };

    // The reference pass is read for the same run list as the current pass.
    let run_list = &runs_cfg.runs;
    tracing::info!(
        runs = run_list.len(),
        year = %runs_cfg.year,
        period = %runs_cfg.period,
        pass = %runs_cfg.pass,
        reco_type = %runs_cfg.reco_type,
        beam_type = %runs_cfg.beam_type,
        reference_pass = %ref_cfg.pass,
        "opening inputs"
    );
    let files = snapshot::open_run_files(&runs_cfg, input_dir, run_list);
    let ref_files = snapshot::open_run_files(&ref_cfg, input_dir, run_list);
    tracing::info!(current = files.len(), reference = ref_files.len(), "input files opened");

    let mut report = CompareReport::new(&id);
    for (plot, spec) in plots {
        let path = plot.path();
        let current = snapshot::load_plot(&files, &path);
        let reference = snapshot::load_plot(&ref_files, &path);

        let mut session = RunComparisonSession::new(spec)?.with_execution(execution);
        if let Some(run) = target_run {
            session = session.with_target_run(run);
        }
        let result = session.run_detailed(&current, &reference);
        if !result.flagged.is_empty() {
            tracing::info!(plot = %plot.display_name(), bad_runs = ?result.flagged, "bad runs found");
        }
        report.push(PlotReport::from_session(&plot, result, include_ratios));
    }

    write_json(output, serde_json::to_value(&report)?)
}

fn cmd_validate_config(plots_path: &Path) -> Result<()> {
    let (id, plots) = load_plots(plots_path)?;
    let output = serde_json::json!({
        "id": id,
        "valid": true,
        "plots": plots
            .iter()
            .map(|(plot, spec)| serde_json::json!({ "plot": plot.display_name(), "spec": spec }))
            .collect::<Vec<_>>(),
    });
    write_json(None, output)
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
