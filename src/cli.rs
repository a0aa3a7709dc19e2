use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{Config, OutputFormatConfig};

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show failures and the final counts
    Quiet,
    /// Show one line per file plus a summary
    #[default]
    Normal,
    /// Also show every diagnostic
    Verbose,
}

impl VerbosityLevel {
    pub fn from_config(config: &Config) -> Self {
        if config.output.quiet {
            VerbosityLevel::Quiet
        } else if config.output.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

impl From<OutputFormatConfig> for OutputFormat {
    fn from(format: OutputFormatConfig) -> Self {
        match format {
            OutputFormatConfig::Human => OutputFormat::Human,
            OutputFormatConfig::Json => OutputFormat::Json,
        }
    }
}

/// How compile and validate are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExecutionMode {
    /// Inline on the main thread, one file after another
    Sync,
    /// On a bounded pool of blocking workers
    Async,
}

/// Validate XML documents against a W3C XML Schema
#[derive(Parser, Debug, Clone)]
#[command(name = "xsd-validate")]
#[command(about = "Validate XML documents against an XSD schema using libxml2")]
#[command(version)]
pub struct Cli {
    /// Schema file (.xsd)
    #[arg(help = "XSD schema to compile")]
    pub schema: PathBuf,

    /// Documents to validate
    #[arg(required = true, help = "XML documents to validate")]
    pub files: Vec<PathBuf>,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Maximum concurrent operations in async mode
    #[arg(
        short = 't',
        long = "threads",
        help = "Maximum number of concurrent operations"
    )]
    pub threads: Option<usize>,

    /// Execution mode
    #[arg(short = 'm', long = "mode", value_enum)]
    pub mode: Option<ExecutionMode>,

    /// Report format
    #[arg(short = 'f', long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", help = "Print every diagnostic")]
    pub verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Hide warning-severity diagnostics
    #[arg(long = "no-warnings")]
    pub no_warnings: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.schema.is_file() {
            return Err(format!(
                "Schema file does not exist: {}",
                self.schema.display()
            ));
        }
        if let Some(threads) = self.threads
            && threads == 0
        {
            return Err("Number of threads must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::NamedTempFile;

    #[test]
    fn test_basic_cli_parsing() {
        let cli = Cli::try_parse_from(["xsd-validate", "schema.xsd", "a.xml", "b.xml"]).unwrap();
        assert_eq!(cli.schema, PathBuf::from("schema.xsd"));
        assert_eq!(
            cli.files,
            vec![PathBuf::from("a.xml"), PathBuf::from("b.xml")]
        );
        assert_eq!(cli.mode, None);
        assert_eq!(cli.format, None);
        assert!(!cli.no_warnings);
    }

    #[test]
    fn test_documents_are_required() {
        assert!(Cli::try_parse_from(["xsd-validate", "schema.xsd"]).is_err());
    }

    #[test]
    fn test_value_enums() {
        let cli = Cli::try_parse_from([
            "xsd-validate",
            "--mode",
            "sync",
            "--format",
            "json",
            "schema.xsd",
            "a.xml",
        ])
        .unwrap();
        assert_eq!(cli.mode, Some(ExecutionMode::Sync));
        assert_eq!(cli.format, Some(OutputFormat::Json));

        assert!(
            Cli::try_parse_from(["xsd-validate", "--mode", "parallel", "schema.xsd", "a.xml"])
                .is_err()
        );
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["xsd-validate", "-v", "-q", "schema.xsd", "a.xml"]).is_err());
    }

    #[test]
    fn test_validate_paths_and_threads() {
        let cli = Cli::try_parse_from(["xsd-validate", "/nonexistent/schema.xsd", "a.xml"]).unwrap();
        assert!(cli.validate().unwrap_err().contains("does not exist"));

        let schema = NamedTempFile::new().unwrap();
        let schema_path = schema.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["xsd-validate", "-t", "0", schema_path, "a.xml"]).unwrap();
        assert!(cli.validate().is_err());

        let cli = Cli::try_parse_from(["xsd-validate", "-t", "2", schema_path, "a.xml"]).unwrap();
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_verbosity_from_config() {
        let mut config = Config::default();
        assert_eq!(VerbosityLevel::from_config(&config), VerbosityLevel::Normal);
        config.output.verbose = true;
        assert_eq!(VerbosityLevel::from_config(&config), VerbosityLevel::Verbose);
        config.output.verbose = false;
        config.output.quiet = true;
        assert_eq!(VerbosityLevel::from_config(&config), VerbosityLevel::Quiet);
    }
}
