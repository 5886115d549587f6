//! Check command implementation.

use super::{apply_edits, load_graph};
use crate::cli::CheckArgs;
use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the check command.
pub fn execute_check(args: CheckArgs, formatter: &Formatter) -> Result<()> {
    let mut graph = load_graph(&args.model)?;
    let reports = apply_edits(&mut graph, &args.edits)?;

    // Edit reports would corrupt machine-readable output
    if formatter.format() == OutputFormat::Table {
        for (edit, report) in &reports {
            println!("{}", formatter.format_report(edit, report));
        }
    }
    println!("{}", formatter.format_graph(&graph)?);

    if formatter.format() == OutputFormat::Table {
        println!(
            "{}",
            formatter.success(&format!("Model '{}' is valid", args.model.display()))
        );
    }
    Ok(())
}
