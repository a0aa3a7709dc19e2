use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use futures::future::join_all;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use libxml_xsd::cli::{Cli, OutputFormat, VerbosityLevel};
use libxml_xsd::config::{Config, ConfigManager, ExecutionModeConfig};
use libxml_xsd::output::{FileReport, Output, RunSummary};
use libxml_xsd::{AsyncRunner, RunnerConfig, Schema, XsdError};

const EXIT_FINDINGS: u8 = 1;
const EXIT_SETUP: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(&cli);

    if let Err(e) = cli.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::from(EXIT_SETUP);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_SETUP)
        }
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = ConfigManager::load_config(&cli)
        .await
        .context("Failed to load configuration")?;
    debug!(?config, "effective configuration");

    let started = Instant::now();
    let reports = match config.runner.mode {
        // Sync mode drives the engine inline; the runtime moves its other work off this thread.
        ExecutionModeConfig::Sync => {
            tokio::task::block_in_place(|| run_sync(&cli.schema, &cli.files))?
        }
        ExecutionModeConfig::Async => run_async(&config, &cli.schema, &cli.files).await?,
    };

    let summary = RunSummary::new(cli.schema.clone(), reports, started.elapsed());
    info!(
        total = summary.total_files,
        valid = summary.valid_files,
        "validation finished"
    );

    let output = Output::new(
        VerbosityLevel::from_config(&config),
        OutputFormat::from(config.output.format),
        config.output.show_warnings,
    );
    let rendered = output.format_results(&summary);
    if rendered.is_empty() || rendered.ends_with('\n') {
        print!("{}", rendered);
    } else {
        println!("{}", rendered);
    }

    if summary.all_valid() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_FINDINGS))
    }
}

fn run_sync(schema_path: &Path, files: &[PathBuf]) -> Result<Vec<FileReport>> {
    let schema = Schema::parse_file(schema_path).map_err(|e| schema_error(schema_path, e))?;

    let reports = files
        .iter()
        .map(|path| {
            let started = Instant::now();
            let result = schema.validate_file(path);
            FileReport::from_validation(path.clone(), result, started.elapsed())
        })
        .collect();

    Ok(reports)
}

async fn run_async(
    config: &Config,
    schema_path: &Path,
    files: &[PathBuf],
) -> Result<Vec<FileReport>> {
    let runner = AsyncRunner::new(RunnerConfig::from(config));
    debug!(
        workers = runner.config().max_concurrent_operations,
        "async runner ready"
    );

    let schema = runner
        .compile_schema_file(schema_path)
        .await
        .map_err(|e| schema_error(schema_path, e))?;

    let tasks = files.iter().map(|path| {
        let runner = runner.clone();
        let schema = schema.clone();
        async move {
            let started = Instant::now();
            let result = runner.validate_file(&schema, path).await;
            FileReport::from_validation(path.clone(), result, started.elapsed())
        }
    });
    let reports = join_all(tasks).await;

    Ok(reports)
}

/// Attach the schema path and any compile diagnostics to a schema failure
fn schema_error(path: &Path, error: XsdError) -> anyhow::Error {
    let mut message = format!("Cannot use schema {}: {}", path.display(), error);
    let diagnostics = match &error {
        XsdError::Setup(failure) => failure.diagnostics().cloned(),
        XsdError::Document(libxml_xsd::DocumentError::Malformed { diagnostics, .. }) => {
            Some(diagnostics.clone())
        }
        _ => None,
    };
    for diagnostic in diagnostics.iter().flatten() {
        message.push_str(&format!("\n    {}", diagnostic));
    }
    anyhow::anyhow!(message)
}
