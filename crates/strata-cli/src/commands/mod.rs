//! Command implementations.

pub mod check;
pub mod curves;
pub mod run;
pub mod summary;

pub use self::check::execute_check;
pub use self::curves::execute_curves;
pub use self::run::execute_run;
pub use self::summary::execute_summary;

use crate::cli::EditArgs;
use crate::error::{CliError, Result};
use std::fs;
use std::path::Path;
use strata_graph::{ChronologyGraph, MaintenanceReport, ModelInput};

/// Read a model file and build its graph.
pub fn load_graph(path: &Path) -> Result<ChronologyGraph> {
    let text = fs::read_to_string(path).map_err(|e| {
        CliError::InvalidInput(format!("Cannot read model '{}': {}", path.display(), e))
    })?;
    let input = ModelInput::from_json(&text)?;
    Ok(ChronologyGraph::build(&input)?)
}

/// Apply the requested edits in order: removals, then residual, then intrusive.
///
/// Stops at the first failing edit; earlier edits stay applied.
pub fn apply_edits(
    graph: &mut ChronologyGraph,
    edits: &EditArgs,
) -> Result<Vec<(String, MaintenanceReport)>> {
    let mut reports = Vec::new();
    for label in &edits.remove {
        reports.push((format!("remove {}", label), graph.remove_context(label)?));
    }
    for label in &edits.residual {
        reports.push((format!("residual {}", label), graph.reclassify_residual(label)?));
    }
    for label in &edits.intrusive {
        reports.push((format!("intrusive {}", label), graph.reclassify_intrusive(label)?));
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MODEL: &str = r#"{
        "contexts": [
            {"label": "A", "phase": "1", "measurement": {"age": 3010, "error": 30}},
            {"label": "B", "phase": "1"},
            {"label": "C", "phase": "1"}
        ],
        "stratigraphy": [{"above": "B", "below": "A"}, {"above": "C", "below": "B"}],
        "group_relationships": []
    }"#;

    fn model_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MODEL.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_graph() {
        let file = model_file();
        let graph = load_graph(file.path()).unwrap();
        assert_eq!(graph.context_count(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_graph(Path::new("/nonexistent/model.json"));
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_apply_edits_in_order() {
        let file = model_file();
        let mut graph = load_graph(file.path()).unwrap();
        let edits = EditArgs {
            remove: vec!["C".to_string()],
            residual: vec!["A".to_string()],
            intrusive: Vec::new(),
        };
        let reports = apply_edits(&mut graph, &edits).unwrap();
        let names: Vec<&str> = reports.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["remove C", "residual A"]);
        assert!(graph.context_id("C").is_none());
    }

    #[test]
    fn test_unknown_context_fails() {
        let file = model_file();
        let mut graph = load_graph(file.path()).unwrap();
        let edits = EditArgs {
            remove: vec!["Z".to_string()],
            ..EditArgs::default()
        };
        assert!(matches!(apply_edits(&mut graph, &edits), Err(CliError::Graph(_))));
    }
}
