//! Run reports.
//!
//! One [`FileReport`] per processed file, rendered as human-readable text or
//! as JSON for tooling.

use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::modules::TrackedLibrary;
use crate::transform::{InjectedImport, TransformOutput};

/// Report format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// One line per file plus a summary
    #[default]
    Text,
    /// A single JSON document
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!(
                "Unknown report format: '{}'. Valid formats: text, json",
                s
            )),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Unchanged,
    Rewritten,
    Failed,
}

/// What happened to one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub injected: Vec<InjectedImport>,
    pub removed_imports: usize,
    pub rewrites: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn from_output(path: &Path, output: &TransformOutput) -> Self {
        Self {
            path: path.display().to_string(),
            status: if output.changed {
                FileStatus::Rewritten
            } else {
                FileStatus::Unchanged
            },
            injected: output.injected.clone(),
            removed_imports: output.removed_imports,
            rewrites: output.rewrites,
            error: None,
        }
    }

    pub fn failed(path: &Path, error: impl std::fmt::Display) -> Self {
        Self {
            path: path.display().to_string(),
            status: FileStatus::Failed,
            injected: Vec::new(),
            removed_imports: 0,
            rewrites: 0,
            error: Some(error.to_string()),
        }
    }
}

/// Totals over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files: usize,
    pub rewritten: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub injected_imports: usize,
}

impl RunSummary {
    pub fn from_reports(reports: &[FileReport]) -> Self {
        reports.iter().fold(
            RunSummary {
                files: reports.len(),
                ..RunSummary::default()
            },
            |mut summary, report| {
                match report.status {
                    FileStatus::Rewritten => summary.rewritten += 1,
                    FileStatus::Unchanged => summary.unchanged += 1,
                    FileStatus::Failed => summary.failed += 1,
                }
                summary.injected_imports += report.injected.len();
                summary
            },
        )
    }
}

#[derive(Serialize)]
struct JsonRun<'a> {
    summary: RunSummary,
    files: &'a [FileReport],
}

/// Write the run report in `format`.
pub fn write_run<W: Write>(
    format: ReportFormat,
    reports: &[FileReport],
    writer: &mut W,
) -> io::Result<()> {
    let summary = RunSummary::from_reports(reports);
    match format {
        ReportFormat::Json => {
            let run = JsonRun {
                summary,
                files: reports,
            };
            let json = serde_json::to_string_pretty(&run)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writeln!(writer, "{}", json)
        }
        ReportFormat::Text => {
            for report in reports {
                match report.status {
                    FileStatus::Unchanged => {}
                    FileStatus::Rewritten => {
                        writeln!(
                            writer,
                            "rewrote {} ({} imports injected, {} removed, {} sites)",
                            report.path,
                            report.injected.len(),
                            report.removed_imports,
                            report.rewrites
                        )?;
                        for import in &report.injected {
                            writeln!(writer, "  + {}", import.render())?;
                        }
                    }
                    FileStatus::Failed => writeln!(
                        writer,
                        "failed  {}: {}",
                        report.path,
                        report.error.as_deref().unwrap_or("unknown error")
                    )?,
                }
            }
            writeln!(
                writer,
                "{} files: {} rewritten, {} unchanged, {} failed",
                summary.files, summary.rewritten, summary.unchanged, summary.failed
            )
        }
    }
}

#[derive(Serialize)]
struct JsonMethod<'a> {
    symbol: &'a str,
    path: &'a str,
}

#[derive(Serialize)]
struct JsonMethods<'a> {
    library: &'a TrackedLibrary,
    methods: Vec<JsonMethod<'a>>,
}

/// Write the method index of one library.
pub fn write_methods<W: Write>(
    format: ReportFormat,
    library: &TrackedLibrary,
    symbols: &[(&str, &str)],
    writer: &mut W,
) -> io::Result<()> {
    match format {
        ReportFormat::Json => {
            let listing = JsonMethods {
                library,
                methods: symbols
                    .iter()
                    .map(|&(symbol, path)| JsonMethod { symbol, path })
                    .collect(),
            };
            let json = serde_json::to_string_pretty(&listing)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writeln!(writer, "{}", json)
        }
        ReportFormat::Text => {
            writeln!(writer, "{} ({} methods)", library, symbols.len())?;
            for (symbol, path) in symbols {
                writeln!(writer, "  {:<24} {}", symbol, path)?;
            }
            Ok(())
        }
    }
}
