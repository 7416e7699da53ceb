//! Markdown and JSON report generation.
//!
//! Renders a displayed analysis for the terminal. The narrative is emitted
//! verbatim; it is already Markdown.

use crate::graph::{cluster_sizes, most_connected};
use crate::models::{AnalysisResult, Graph, HistoryItem, Metrics};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What is being shown alongside the result.
#[derive(Debug, Clone, Copy)]
pub struct ReportView<'a> {
    /// The projected graph currently visible.
    pub graph: &'a Graph,
    /// Active cluster filter.
    pub cluster: Option<&'a str>,
    pub share_link: Option<&'a str>,
    pub max_hotspots: usize,
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(result: &AnalysisResult, view: &ReportView<'_>) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Code Fable: {}\n\n", result.full_name()));
    output.push_str(&generate_metadata_section(result, view, Utc::now()));
    output.push_str(&generate_narrative_section(&result.narrative));
    output.push_str(&generate_graph_section(result, view));
    output.push_str(&generate_hotspots_section(&result.metrics, view.max_hotspots));
    output.push_str(&generate_clusters_section(result, view.cluster));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(
    result: &AnalysisResult,
    view: &ReportView<'_>,
    generated_at: DateTime<Utc>,
) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Repository:** {}\n", result.full_name()));
    section.push_str(&format!("- **Result ID:** `{}`\n", result.id));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(link) = view.share_link {
        section.push_str(&format!("- **Share:** {}\n", link));
    }
    section.push('\n');

    section
}

fn generate_narrative_section(narrative: &str) -> String {
    if narrative.trim().is_empty() {
        return String::new();
    }

    format!("## Narrative\n\n{}\n\n", narrative.trim_end())
}

fn generate_graph_section(result: &AnalysisResult, view: &ReportView<'_>) -> String {
    let mut section = String::new();

    section.push_str("## Dependency Graph\n\n");
    match view.cluster {
        Some(cluster) => section.push_str(&format!(
            "*Filtered to cluster `{}`: {} of {} nodes, {} of {} links*\n\n",
            cluster,
            view.graph.nodes.len(),
            result.graph.nodes.len(),
            view.graph.links.len(),
            result.graph.links.len()
        )),
        None => section.push_str(&format!(
            "*{} nodes, {} links*\n\n",
            view.graph.nodes.len(),
            view.graph.links.len()
        )),
    }

    let connected = most_connected(view.graph, 5);
    if !connected.is_empty() {
        section.push_str("### Most Connected Files\n\n");
        section.push_str("| File | Links |\n");
        section.push_str("|:---|:---:|\n");
        for (id, degree) in connected {
            section.push_str(&format!("| `{}` | {} |\n", id, degree));
        }
        section.push('\n');
    }

    section
}

/// Hotspots in the order the backend ranked them.
fn generate_hotspots_section(metrics: &Metrics, limit: usize) -> String {
    let hotspots = &metrics.hotspots;
    let mut section = String::new();

    section.push_str("## Hotspots\n\n");
    if hotspots.is_empty() {
        section.push_str("No hotspots were reported.\n\n");
        return section;
    }

    for (i, path) in hotspots.iter().take(limit).enumerate() {
        match metrics.churn.get(path) {
            Some(lines) => {
                section.push_str(&format!("{}. `{}` ({} lines changed)\n", i + 1, path, lines))
            }
            None => section.push_str(&format!("{}. `{}`\n", i + 1, path)),
        }
    }
    if hotspots.len() > limit {
        section.push_str(&format!("\n*...and {} more*\n", hotspots.len() - limit));
    }
    section.push('\n');

    section
}

fn generate_clusters_section(result: &AnalysisResult, active: Option<&str>) -> String {
    let mut section = String::new();

    section.push_str("## Architecture Clusters\n\n");
    let sizes = cluster_sizes(result);
    if sizes.is_empty() {
        section.push_str("No clusters were reported.\n\n");
        return section;
    }

    section.push_str("| Cluster | Members | Graph Nodes |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for size in sizes {
        let marker = if active == Some(size.name.as_str()) {
            " (shown)"
        } else {
            ""
        };
        section.push_str(&format!(
            "| {}{} | {} | {} |\n",
            size.name, marker, size.members, size.nodes
        ));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by codefable*\n".to_string()
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    result: &'a AnalysisResult,
    cluster: Option<&'a str>,
    visible_graph: &'a Graph,
    #[serde(skip_serializing_if = "Option::is_none")]
    share_link: Option<&'a str>,
}

/// Generate a JSON report.
pub fn generate_json_report(result: &AnalysisResult, view: &ReportView<'_>) -> Result<String> {
    let report = JsonReport {
        generated_at: Utc::now(),
        result,
        cluster: view.cluster,
        visible_graph: view.graph,
        share_link: view.share_link,
    };
    serde_json::to_string_pretty(&report).map_err(Into::into)
}

/// Render the history listing, newest first.
pub fn generate_history_listing(items: &[HistoryItem]) -> String {
    if items.is_empty() {
        return "No analyses yet.\n".to_string();
    }

    let mut listing = String::new();
    for item in items {
        listing.push_str(&format!("{:<40} {}\n", item.to_string(), item.id));
    }
    listing
}
