mod args;
mod config;

use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use poster_engine::{EngineError, FileSink, FontLoader, OutputLayout, Renderer, RunReport};
use tracing_subscriber::EnvFilter;

use crate::args::Cli;
use crate::config::{AppConfig, DEFAULT_LOG_FILTER};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match config.dotenv {
        Some(path) => tracing::info!("Loaded .env from: {path}"),
        None => tracing::debug!("No .env file found, using system environment variables"),
    }

    match run(&cli, &config) {
        Ok(report) => {
            if let Err(e) = print_report(&report, cli.summary_json) {
                eprintln!("Error: {e:#}");
                return ExitCode::from(2);
            }
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli, config: &AppConfig) -> anyhow::Result<RunReport> {
    let request = cli
        .to_request()
        .validate()
        .context("invalid request")?;

    let fonts = FontLoader::new(config.font_path(cli.font.clone()).as_deref());
    let mut sink = FileSink::new(OutputLayout::from_output_path(
        &request.request().output,
        &request.request().format,
    ));

    tracing::info!(
        versions = ?request.versions(),
        resolution = request.request().resolution,
        dir = %sink.layout().dir.display(),
        font = ?fonts.source(),
        "Rendering QR posters"
    );

    let report = Renderer::for_request(&request, fonts)
        .with_policy(cli.failure_policy())
        .run(&request, &mut sink);
    Ok(report)
}

fn print_report(report: &RunReport, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        let json = serde_json::to_string_pretty(&report.summary())
            .context("serialize run summary")?;
        println!("{json}");
        return Ok(());
    }

    for e in &report.asset_errors {
        eprintln!("Warning: {e} (layer skipped)");
    }
    for artifact in report.rendered() {
        println!(
            "QR version {} saved to {} ({}x{})",
            artifact.version,
            artifact.path.display(),
            artifact.width,
            artifact.height
        );
    }
    for failure in report.failed() {
        eprintln!(
            "QR version {} failed during {:?}: {}",
            failure.version, failure.stage, failure.error
        );
        if let Some(hint) = hint_for(&failure.error) {
            eprintln!("  hint: {hint}");
        }
    }
    if report.aborted {
        eprintln!("Stopped after the first failure (--fail-fast)");
    }
    Ok(())
}

fn hint_for(error: &EngineError) -> Option<&'static str> {
    match error {
        EngineError::TitleTooSmall { .. } => {
            Some("shorten the title, raise --text-scale-factor or raise --resolution")
        }
        EngineError::EncodingCapacityExceeded { .. } => {
            Some("use a higher --min-version or a lower --ec-level")
        }
        EngineError::UnsupportedOutputFormat(_) => Some("try --format png or --format jpg"),
        _ => None,
    }
}
