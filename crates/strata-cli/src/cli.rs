//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Strata - Build chronology models and sample calendar dates for them.
#[derive(Debug, Parser)]
#[command(name = "strata")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ./strata.toml if present)
    #[arg(short, long, global = true, env = "STRATA_CONFIG")]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (labels only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a model, apply edits and show the resulting graph
    Check(CheckArgs),

    /// Sample calendar dates for a model
    Run(RunArgs),

    /// Summarise a saved results file
    Summary(SummaryArgs),

    /// List the calibration curves that can be loaded
    Curves(CurvesArgs),
}

/// Edits applied to a model after it is built, in the order listed here.
#[derive(Debug, Clone, Default, Args)]
pub struct EditArgs {
    /// Remove a context (repeatable)
    #[arg(long = "remove", value_name = "CONTEXT")]
    pub remove: Vec<String>,

    /// Treat a context as residual (repeatable)
    #[arg(long = "residual", value_name = "CONTEXT")]
    pub residual: Vec<String>,

    /// Treat a context as intrusive (repeatable)
    #[arg(long = "intrusive", value_name = "CONTEXT")]
    pub intrusive: Vec<String>,
}

impl EditArgs {
    /// Whether no edit was requested
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.residual.is_empty() && self.intrusive.is_empty()
    }
}

/// Arguments for the check command.
#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Model file (JSON tables)
    pub model: PathBuf,

    #[command(flatten)]
    pub edits: EditArgs,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Model file (JSON tables)
    pub model: PathBuf,

    /// Calibration curve name
    #[arg(short = 'C', long)]
    pub curve: Option<String>,

    /// Directory holding curve files
    #[arg(long, env = "STRATA_CURVES_DIR")]
    pub curves_dir: Option<PathBuf>,

    /// Sampler preset
    #[arg(short, long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Accepted samples per node (overrides config and preset)
    #[arg(short = 'n', long)]
    pub samples: Option<usize>,

    /// Burn-in sweeps (overrides config and preset)
    #[arg(long)]
    pub burn_in: Option<usize>,

    /// RNG seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Independent chains to run in parallel
    #[arg(long, default_value = "1")]
    pub chains: usize,

    /// Where to write the results record
    #[arg(short, long, default_value = "results.json")]
    pub out: PathBuf,

    #[command(flatten)]
    pub edits: EditArgs,
}

/// Arguments for the summary command.
#[derive(Debug, Parser)]
pub struct SummaryArgs {
    /// Results file written by `run`
    pub results: PathBuf,

    /// Probability mass of the HPD regions (0.0-1.0)
    #[arg(short, long, default_value = "0.95")]
    pub mass: f64,
}

/// Arguments for the curves command.
#[derive(Debug, Parser)]
pub struct CurvesArgs {
    /// Directory holding curve files
    #[arg(long, env = "STRATA_CURVES_DIR")]
    pub curves_dir: Option<PathBuf>,
}

/// Sampler preset argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PresetArg {
    /// Short runs for checking a model
    Quick,
    /// Balanced defaults
    Default,
    /// Long runs for final results
    Thorough,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<PresetArg> for strata_sampler::SamplerConfig {
    fn from(preset: PresetArg) -> Self {
        match preset {
            PresetArg::Quick => strata_sampler::SamplerConfig::quick(),
            PresetArg::Default => strata_sampler::SamplerConfig::default(),
            PresetArg::Thorough => strata_sampler::SamplerConfig::thorough(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from([
            "strata",
            "run",
            "model.json",
            "--curve",
            "intcal20",
            "--chains",
            "4",
            "--residual",
            "A",
            "--residual",
            "B",
        ]);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.curve.as_deref(), Some("intcal20"));
                assert_eq!(args.chains, 4);
                assert_eq!(args.edits.residual, vec!["A", "B"]);
                assert!(args.edits.remove.is_empty());
                assert_eq!(args.out, PathBuf::from("results.json"));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["strata", "summary", "out.json", "-vv", "--format", "json"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        match cli.command {
            Command::Summary(args) => assert_eq!(args.mass, 0.95),
            _ => panic!("Expected Summary command"),
        }
    }

    #[test]
    fn test_preset_conversion() {
        let config: strata_sampler::SamplerConfig = PresetArg::Thorough.into();
        assert_eq!(config, strata_sampler::SamplerConfig::thorough());
    }

    #[test]
    fn test_edits_empty() {
        let cli = Cli::parse_from(["strata", "check", "model.json"]);
        match cli.command {
            Command::Check(args) => assert!(args.edits.is_empty()),
            _ => panic!("Expected Check command"),
        }
    }
}
