//! Run command implementation.

use super::{apply_edits, load_graph};
use crate::cli::RunArgs;
use crate::config::{Config, OutputFormat};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strata_calibration::CurveRegistry;
use strata_sampler::{ChainWorker, ProgressEvent, SamplerConfig, DEFAULT_HPD_MASS};
use tokio::sync::mpsc;

/// Execute the run command.
pub async fn execute_run(args: RunArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let table = formatter.format() == OutputFormat::Table;

    let mut graph = load_graph(&args.model)?;
    for (edit, report) in apply_edits(&mut graph, &args.edits)? {
        if table {
            println!("{}", formatter.format_report(&edit, &report));
        }
    }

    let curve_name = args
        .curve
        .clone()
        .or_else(|| config.settings.curve.clone())
        .ok_or_else(|| {
            CliError::InvalidInput(
                "No calibration curve given. Use --curve or set settings.curve".to_string(),
            )
        })?;
    let mut curves = config.curves.clone();
    if let Some(dir) = &args.curves_dir {
        curves.directory = dir.clone();
    }
    let curve = CurveRegistry::new(curves)?.load(&curve_name)?;

    let sampler_config = sampler_config(&args, config);
    sampler_config.validate().map_err(CliError::Config)?;

    let worker = ChainWorker::new(sampler_config, args.chains);
    let chains = worker.chains();
    let (tx, rx) = mpsc::channel(256);
    let printer = tokio::spawn(print_progress(rx, chains, table));

    let outcome = worker.run(Arc::new(graph), curve, Some(tx)).await;
    printer.await.ok();
    let results = outcome?;

    for (chain, chain_results) in results.iter().enumerate() {
        let path = chain_path(&args.out, chain, chains);
        let record = chain_results.to_serializable()?;
        fs::write(&path, record.to_json()?)?;
        tracing::info!("Wrote results of chain {} to {}", chain, path.display());

        if table {
            println!("{}", formatter.format_metrics(chain, chain_results.metrics()));
            println!(
                "{}",
                formatter.success(&format!("Results written to {}", path.display()))
            );
        }
    }

    if let Some(first) = results.first() {
        let summaries = first.summarize().all_summaries(DEFAULT_HPD_MASS);
        println!("{}", formatter.format_summaries(&summaries)?);
    }
    Ok(())
}

/// Preset, else the config file's `[sampler]`, else defaults; then flags.
fn sampler_config(args: &RunArgs, config: &Config) -> SamplerConfig {
    let mut sampler = match args.preset {
        Some(preset) => preset.into(),
        None => config.sampler.clone().unwrap_or_default(),
    };

    if let Some(samples) = args.samples {
        sampler.min_accepted_samples = samples;
        if args.burn_in.is_none() && sampler.burn_in >= samples {
            sampler.burn_in = samples / 5;
        }
        sampler.max_sweeps = sampler.max_sweeps.max(samples);
    }
    if let Some(burn_in) = args.burn_in {
        sampler.burn_in = burn_in;
    }
    if let Some(seed) = args.seed {
        sampler.seed = Some(seed);
    }
    sampler
}

/// Output file of one chain: `results.json`, or `results-0.json`,
/// `results-1.json`, ... when several chains run.
pub fn chain_path(out: &Path, chain: usize, chains: usize) -> PathBuf {
    if chains <= 1 {
        return out.to_path_buf();
    }
    let stem = out
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results".to_string());
    let name = match out.extension() {
        Some(ext) => format!("{}-{}.{}", stem, chain, ext.to_string_lossy()),
        None => format!("{}-{}", stem, chain),
    };
    out.with_file_name(name)
}

/// Show the slowest chain's progress on stderr until every chain is done.
async fn print_progress(mut rx: mpsc::Receiver<ProgressEvent>, chains: usize, show: bool) {
    let mut percents = vec![0.0f64; chains];
    let mut shown = -1.0;
    while let Some(event) = rx.recv().await {
        if let Some(slot) = percents.get_mut(event.chain) {
            *slot = event.percent;
        }
        let slowest = percents.iter().copied().fold(f64::INFINITY, f64::min);
        if show && slowest > shown {
            shown = slowest;
            eprint!("\rSampling: {:>5.1}%", slowest);
            std::io::stderr().flush().ok();
        }
    }
    if show && shown >= 0.0 {
        eprintln!();
    }
}
