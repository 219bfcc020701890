//! pytutor-report: Progress summaries as text tables, JSON and Markdown.

pub mod markdown;
pub mod summary;
pub mod text;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};

pub use summary::{ProgressSummary, StageSummary};

/// Output format for a progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Text,
    Json,
    Markdown,
}

impl FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            "markdown" | "md" => Ok(Format::Markdown),
            other => anyhow::bail!("unknown format '{other}' (expected text, json or markdown)"),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Text => write!(f, "text"),
            Format::Json => write!(f, "json"),
            Format::Markdown => write!(f, "markdown"),
        }
    }
}

/// Pretty JSON for a summary.
pub fn generate_json(summary: &ProgressSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize progress summary")
}

/// Render a summary in the requested format.
pub fn render(summary: &ProgressSummary, format: Format) -> Result<String> {
    Ok(match format {
        Format::Text => text::render_text(summary),
        Format::Json => generate_json(summary)?,
        Format::Markdown => markdown::render_markdown(summary),
    })
}

/// Write a rendered summary to a file.
pub fn write_report(summary: &ProgressSummary, format: Format, path: &Path) -> Result<()> {
    let content = render(summary, format)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("failed to write {format} report to {}", path.display()))?;
    Ok(())
}
