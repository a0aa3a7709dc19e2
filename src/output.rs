//! Report formatting for the command-line tool.
//!
//! Turns per-file outcomes into human-readable text or JSON.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::diagnostic::DiagnosticList;
use crate::error::{DocumentError, XsdError};

/// Outcome of checking one document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileStatus {
    /// No error diagnostics (warnings may still be present)
    Valid,
    /// The document parsed but does not conform
    Invalid { error_count: usize },
    /// The document is not well-formed XML
    Malformed,
    /// The file could not be read or the engine could not validate it
    Error { message: String },
}

impl FileStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, FileStatus::Valid)
    }
}

/// Result of checking one document
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
    pub diagnostics: DiagnosticList,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl FileReport {
    /// Build a report from a validation result
    pub fn from_validation(
        path: PathBuf,
        result: Result<DiagnosticList, XsdError>,
        duration: Duration,
    ) -> Self {
        let (status, diagnostics) = match result {
            Ok(diagnostics) if diagnostics.has_errors() => (
                FileStatus::Invalid {
                    error_count: diagnostics.error_count(),
                },
                diagnostics,
            ),
            Ok(diagnostics) => (FileStatus::Valid, diagnostics),
            Err(XsdError::Document(DocumentError::Malformed { diagnostics, .. })) => {
                (FileStatus::Malformed, diagnostics)
            }
            Err(XsdError::Setup(failure)) => {
                let diagnostics = failure.diagnostics().cloned().unwrap_or_default();
                (
                    FileStatus::Error {
                        message: failure.to_string(),
                    },
                    diagnostics,
                )
            }
            Err(e) => (
                FileStatus::Error {
                    message: e.to_string(),
                },
                DiagnosticList::new(),
            ),
        };
        Self {
            path,
            status,
            diagnostics,
            duration,
        }
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Aggregated results of one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub schema: PathBuf,
    pub total_files: usize,
    pub valid_files: usize,
    pub invalid_files: usize,
    pub malformed_files: usize,
    pub error_files: usize,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub total_duration: Duration,
    pub files: Vec<FileReport>,
}

impl RunSummary {
    pub fn new(schema: PathBuf, files: Vec<FileReport>, total_duration: Duration) -> Self {
        let mut summary = Self {
            schema,
            total_files: files.len(),
            total_duration,
            ..Default::default()
        };
        for file in &files {
            match file.status {
                FileStatus::Valid => summary.valid_files += 1,
                FileStatus::Invalid { .. } => summary.invalid_files += 1,
                FileStatus::Malformed => summary.malformed_files += 1,
                FileStatus::Error { .. } => summary.error_files += 1,
            }
        }
        summary.files = files;
        summary
    }

    /// Whether every document validated without errors
    pub fn all_valid(&self) -> bool {
        self.valid_files == self.total_files
    }
}

/// Output formatter for validation results
pub struct Output {
    verbosity: VerbosityLevel,
    format: OutputFormat,
    show_warnings: bool,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel, format: OutputFormat, show_warnings: bool) -> Self {
        Self {
            verbosity,
            format,
            show_warnings,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    /// Disable ANSI colours regardless of the terminal
    pub fn without_colors(mut self) -> Self {
        self.show_colors = false;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_results(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Json => self.format_json(summary),
            OutputFormat::Human => self.format_human(summary),
        }
    }

    fn format_json(&self, summary: &RunSummary) -> String {
        let value = if self.show_warnings {
            serde_json::to_string_pretty(summary)
        } else {
            let mut filtered = summary.clone();
            for file in &mut filtered.files {
                file.diagnostics = std::mem::take(&mut file.diagnostics).without_warnings();
            }
            serde_json::to_string_pretty(&filtered)
        };
        // Serializing plain data with string keys cannot fail.
        value.unwrap_or_default()
    }

    fn format_human(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        for file in &summary.files {
            if self.verbosity == VerbosityLevel::Quiet && file.status.is_valid() {
                continue;
            }
            output.push_str(&self.format_file_result(file));
            output.push('\n');
        }

        if self.verbosity == VerbosityLevel::Quiet {
            if !summary.all_valid() {
                output.push_str(&format!(
                    "Invalid: {} Malformed: {} Errors: {}\n",
                    summary.invalid_files, summary.malformed_files, summary.error_files
                ));
            }
        } else {
            output.push_str(&self.format_summary(summary));
        }

        output
    }

    pub fn format_file_result(&self, result: &FileReport) -> String {
        let path_display = result.path.display();
        let duration_str = format_duration(result.duration);

        let mut output = match &result.status {
            FileStatus::Valid => {
                let warnings = result.diagnostics.warning_count();
                if warnings > 0 && self.show_warnings {
                    format!(
                        "{}  {} ({}) - {} warning{}",
                        self.colorize("✓ VALID", "32"),
                        path_display,
                        duration_str,
                        warnings,
                        plural(warnings)
                    )
                } else {
                    format!(
                        "{}  {} ({})",
                        self.colorize("✓ VALID", "32"),
                        path_display,
                        duration_str
                    )
                }
            }
            FileStatus::Invalid { error_count } => format!(
                "{}  {} ({}) - {} error{}",
                self.colorize("✗ INVALID", "31"),
                path_display,
                duration_str,
                error_count,
                plural(*error_count)
            ),
            FileStatus::Malformed => format!(
                "{}  {} ({})",
                self.colorize("✗ MALFORMED", "31"),
                path_display,
                duration_str
            ),
            FileStatus::Error { message } => format!(
                "{}  {} ({}) - {}",
                self.colorize("⚠ ERROR", "33"),
                path_display,
                duration_str,
                message
            ),
        };

        if self.verbosity >= VerbosityLevel::Verbose {
            for diagnostic in &result.diagnostics {
                if diagnostic.is_warning() && !self.show_warnings {
                    continue;
                }
                output.push_str(&format!("\n    {}", diagnostic));
            }
        }
        output
    }

    fn format_summary(&self, summary: &RunSummary) -> String {
        let mut output = String::new();
        output.push_str("\nValidation Summary:\n");
        output.push_str(&format!("  Schema: {}\n", summary.schema.display()));
        output.push_str(&format!("  Total files: {}\n", summary.total_files));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Valid:", "32"),
            summary.valid_files
        ));

        if summary.invalid_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Invalid:", "31"),
                summary.invalid_files
            ));
        }
        if summary.malformed_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Malformed:", "31"),
                summary.malformed_files
            ));
        }
        if summary.error_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Errors:", "33"),
                summary.error_files
            ));
        }

        output.push_str(&format!(
            "  Duration: {}\n",
            format_duration(summary.total_duration)
        ));
        output
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
