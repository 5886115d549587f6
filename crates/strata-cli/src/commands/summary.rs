//! Summary command implementation.

use crate::cli::SummaryArgs;
use crate::config::OutputFormat;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::fs;
use strata_sampler::{NodeSummary, SamplingRecord, SamplingResults};

/// Execute the summary command.
pub fn execute_summary(args: SummaryArgs, formatter: &Formatter) -> Result<()> {
    if !(args.mass > 0.0 && args.mass <= 1.0) {
        return Err(CliError::InvalidInput(format!(
            "HPD mass must be in (0, 1], got {}",
            args.mass
        )));
    }

    let text = fs::read_to_string(&args.results)?;
    let (summaries, diagnostics) = summarize_record(&text, args.mass)?;

    if formatter.format() == OutputFormat::Table {
        for diagnostic in &diagnostics {
            println!("{}", formatter.warning(diagnostic));
        }
    }
    println!("{}", formatter.format_summaries(&summaries)?);
    Ok(())
}

/// Posterior summaries of a saved record plus any load diagnostics.
pub fn summarize_record(text: &str, mass: f64) -> Result<(Vec<NodeSummary>, Vec<String>)> {
    let (record, diagnostics) = SamplingRecord::from_json(text)?;
    let results = SamplingResults::from_record(&record);
    Ok((results.summarize().all_summaries(mass), diagnostics))
}
