//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use strata_domain::NodeId;
use strata_graph::{ChronologyGraph, MaintenanceNotice, MaintenanceReport};
use strata_sampler::{NodeSummary, RunMetrics};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a built graph.
    pub fn format_graph(&self, graph: &ChronologyGraph) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&graph.view())?),
            OutputFormat::Table => Ok(self.format_graph_table(graph)),
            OutputFormat::Quiet => Ok(graph
                .node_ids()
                .map(|id| graph.node_label(id))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Phases, then contexts, as tables.
    fn format_graph_table(&self, graph: &ChronologyGraph) -> String {
        let mut phases = Builder::default();
        phases.push_record(["Phase", "Contexts", "Start", "End", "Next"]);
        let relationships = graph.relationships();
        for (position, &pid) in graph.phase_order().iter().enumerate() {
            let Some(phase) = graph.phase(pid) else {
                continue;
            };
            let next = relationships
                .get(position)
                .map(|r| r.as_str().to_string())
                .unwrap_or_else(|| "-".to_string());
            phases.push_record([
                phase.label.clone(),
                graph.phase_contexts(pid).len().to_string(),
                graph.node_label(phase.alpha),
                graph.node_label(phase.beta),
                next,
            ]);
        }

        let mut contexts = Builder::default();
        contexts.push_record(["Context", "Phase", "Kind", "14C age", "Earlier", "Later"]);
        for (id, ctx) in graph.contexts() {
            let phase = graph
                .phase(ctx.phase)
                .map(|p| p.label.clone())
                .unwrap_or_default();
            let age = ctx
                .measurement
                .map(|m| format!("{:.0} ± {:.0}", m.age, m.error))
                .unwrap_or_else(|| "-".to_string());
            let labels = |ids: Vec<NodeId>| {
                ids.into_iter()
                    .map(|n| graph.node_label(n))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            contexts.push_record([
                ctx.label.clone(),
                phase,
                ctx.kind.to_string(),
                age,
                labels(graph.predecessors(id).collect()),
                labels(graph.successors(id).collect()),
            ]);
        }

        let header = self.colorize(
            &format!(
                "{} contexts, {} phases, {} nodes, {} edges",
                graph.context_count(),
                graph.phase_count(),
                graph.node_count(),
                graph.edge_count()
            ),
            "cyan",
        );
        format!(
            "{}\n{}\n{}",
            header,
            Self::styled(phases),
            Self::styled(contexts)
        )
    }

    /// Format the outcome of one edit.
    pub fn format_report(&self, edit: &str, report: &MaintenanceReport) -> String {
        let mut lines = Vec::new();
        if report.is_noop() {
            lines.push(self.info(&format!("{}: no change", edit)));
        } else {
            lines.push(self.success(&format!("{}: {}", edit, report.summary())));
        }
        for phase in &report.contracted_phases {
            lines.push(self.info(&format!("Phase '{}' emptied and contracted", phase)));
        }
        for notice in &report.notices {
            match notice {
                MaintenanceNotice::RelationshipAssumed {
                    older,
                    younger,
                    relationship,
                } => lines.push(self.warning(&format!(
                    "Phases '{}' and '{}' now treated as {}",
                    older, younger, relationship
                ))),
            }
        }
        lines.join("\n")
    }

    /// Format posterior summaries.
    pub fn format_summaries(&self, summaries: &[NodeSummary]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(summaries)?),
            OutputFormat::Table => Ok(self.format_summaries_table(summaries)),
            OutputFormat::Quiet => Ok(summaries
                .iter()
                .map(|s| format!("{}\t{:.0}", s.label, s.median))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_summaries_table(&self, summaries: &[NodeSummary]) -> String {
        if summaries.is_empty() {
            return self.colorize("No samples found.", "yellow");
        }

        let mass = summaries[0].mass;
        let mut builder = Builder::default();
        builder.push_record([
            "Node".to_string(),
            "Samples".to_string(),
            "Mean".to_string(),
            "Median".to_string(),
            "SD".to_string(),
            format!("{:.0}% HPD", mass * 100.0),
        ]);
        for s in summaries {
            let hpd = s
                .hpd
                .iter()
                .map(|(lo, hi)| format!("{} to {}", format_year(*lo), format_year(*hi)))
                .collect::<Vec<_>>()
                .join("; ");
            builder.push_record([
                s.label.clone(),
                s.samples.to_string(),
                format_year(s.mean),
                format_year(s.median),
                format!("{:.0}", s.std_dev),
                hpd,
            ]);
        }
        Self::styled(builder)
    }

    /// Format the metrics of a finished chain.
    pub fn format_metrics(&self, chain: usize, metrics: &RunMetrics) -> String {
        self.info(&format!(
            "Chain {}: {} sweeps, {:.1}% accepted, {:.2}s",
            chain,
            metrics.sweeps,
            metrics.acceptance_rate() * 100.0,
            metrics.elapsed_secs
        ))
    }

    fn styled(builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Calendar year with an era suffix: year 0 and earlier are BC.
pub fn format_year(year: f64) -> String {
    let rounded = year.round() as i64;
    if rounded <= 0 {
        format!("{} BC", 1 - rounded)
    } else {
        format!("AD {}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_domain::GroupRelationship;
    use strata_graph::ModelInput;

    fn graph() -> ChronologyGraph {
        ChronologyGraph::build(
            &ModelInput::new()
                .dated_context("A", "1", 3010.0, 30.0)
                .context("B", "1")
                .context("C", "2")
                .above("B", "A")
                .relate("1", "2", GroupRelationship::Gap),
        )
        .unwrap()
    }

    #[test]
    fn test_format_year() {
        assert_eq!(format_year(1066.2), "AD 1066");
        assert_eq!(format_year(0.0), "1 BC");
        assert_eq!(format_year(-1199.6), "1201 BC");
    }

    #[test]
    fn test_graph_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_graph(&graph()).unwrap();
        assert!(output.starts_with("3 contexts, 2 phases"));
        assert!(output.contains("3010 ± 30"));
        assert!(output.contains("gap"));
    }

    #[test]
    fn test_graph_json_is_the_view() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_graph(&graph()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["phases"], serde_json::json!(["1", "2"]));
        assert!(value["nodes"].as_array().unwrap().len() >= 3);
    }

    #[test]
    fn test_graph_quiet_lists_labels() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_graph(&graph()).unwrap();
        assert!(output.lines().any(|l| l == "A"));
        assert!(output.lines().any(|l| l == "b_2"));
    }

    #[test]
    fn test_report_mentions_assumed_relationship() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let report = MaintenanceReport {
            contracted_phases: vec!["2".to_string()],
            notices: vec![MaintenanceNotice::RelationshipAssumed {
                older: "1".to_string(),
                younger: "3".to_string(),
                relationship: GroupRelationship::Gap,
            }],
            ..MaintenanceReport::default()
        };
        let output = formatter.format_report("remove B", &report);
        assert!(output.contains("Phase '2' emptied"));
        assert!(output.contains("'1' and '3' now treated as gap"));
    }

    #[test]
    fn test_summaries_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let summary = NodeSummary::from_samples("A", &[-1000.0, -999.0, -998.0], 0.95).unwrap();
        let output = formatter.format_summaries(&[summary]).unwrap();
        assert!(output.contains("95% HPD"));
        assert!(output.contains("1000 BC"));
        assert!(formatter.format_summaries(&[]).unwrap().contains("No samples"));
    }
}
