//! Curves command implementation.

use crate::cli::CurvesArgs;
use crate::config::{Config, OutputFormat};
use crate::error::Result;
use crate::output::Formatter;
use strata_calibration::CurveRegistry;

/// Execute the curves command.
pub fn execute_curves(args: CurvesArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut curves = config.curves.clone();
    if let Some(dir) = args.curves_dir {
        curves.directory = dir;
    }
    let directory = curves.directory.clone();
    let names = CurveRegistry::new(curves)?.available();

    match formatter.format() {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
        OutputFormat::Quiet => println!("{}", names.join("\n")),
        OutputFormat::Table if names.is_empty() => {
            println!(
                "{}",
                formatter.warning(&format!("No curves found in {}", directory.display()))
            );
        }
        OutputFormat::Table => {
            println!(
                "{}",
                formatter.info(&format!("Curves in {}:", directory.display()))
            );
            for name in names {
                println!("  {}", name);
            }
        }
    }
    Ok(())
}
