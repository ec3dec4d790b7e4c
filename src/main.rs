//! Company Harvester main entry point
//!
//! This is the command-line interface for the company-profile harvester.

use anyhow::Context;
use clap::Parser;
use company_harvester::config::{load_config_with_hash, Config};
use company_harvester::crawler::parse_selector_overrides;
use company_harvester::job::{run_self_tests, DEFAULT_OUTPUT_NAME, DEFAULT_SEARCH_PAGES};
use company_harvester::{
    server, ExtractionLevel, JobOrchestrator, JobRunner, JobSpec, JobState, OutputFormat,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Company Harvester: collects company profiles from the public web
///
/// Starts from a search query or explicit seed URLs, rotates browsing
/// identities, extracts contact and social data and exports the records as
/// CSV, JSON or SQLite.
#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(version = "1.0.0")]
#[command(about = "Company profile harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH", default_value = "config.toml")]
    config: PathBuf,

    /// Search query whose results are harvested
    #[arg(long, conflicts_with = "urls")]
    query: Option<String>,

    /// Seed URLs to harvest (space separated)
    #[arg(long, num_args = 1..)]
    urls: Vec<String>,

    /// Extraction level: basic, medium or advanced
    #[arg(long, default_value_t = ExtractionLevel::Basic)]
    level: ExtractionLevel,

    /// Number of search result pages to collect
    #[arg(long, default_value_t = DEFAULT_SEARCH_PAGES)]
    pages: u32,

    /// Same-domain discovery depth for seed URLs
    #[arg(long, default_value_t = 0)]
    depth: u32,

    /// Selector overrides as a JSON object of field -> rule list
    #[arg(long, value_name = "JSON")]
    selectors: Option<String>,

    /// Export format: csv, json or sqlite
    #[arg(long, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Export file base name (extension is added)
    #[arg(short, long, default_value = DEFAULT_OUTPUT_NAME)]
    output: String,

    /// Serve the HTTP control surface instead of running a job
    #[arg(long, conflicts_with = "test")]
    web: bool,

    /// Address the control surface binds to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port the control surface listens on
    #[arg(long, default_value_t = 5001)]
    port: u16,

    /// Run the self-test checks and exit
    #[arg(long)]
    test: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(&cli.config)?;
    let orchestrator =
        JobOrchestrator::from_config(config).context("failed to set up the session engine")?;

    if cli.web {
        handle_web(orchestrator, &cli.host, cli.port, build_spec(&cli)).await
    } else if cli.test {
        handle_self_test(&orchestrator).await
    } else {
        handle_job(&orchestrator, build_spec(&cli)).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("company_harvester=info,warn"),
            1 => EnvFilter::new("company_harvester=debug,info"),
            2 => EnvFilter::new("company_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration, falling back to defaults when the file is absent
fn load_configuration(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        tracing::warn!(
            "Configuration file {} not found, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Translates the command line into a job
fn build_spec(cli: &Cli) -> JobSpec {
    let spec = match &cli.query {
        Some(query) => JobSpec::query(query.clone(), cli.pages),
        None if !cli.urls.is_empty() => JobSpec::seeds(split_urls(&cli.urls)),
        None => JobSpec::default(),
    };

    spec.with_level(cli.level)
        .with_depth(cli.depth)
        .with_selector_overrides(selector_overrides(cli.selectors.as_deref()))
        .with_output(cli.format, cli.output.clone())
}

/// Accepts both repeated values and a single quoted, space-separated list
fn split_urls(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| value.split_whitespace())
        .map(str::to_string)
        .collect()
}

fn selector_overrides(raw: Option<&str>) -> BTreeMap<String, Vec<String>> {
    let Some(raw) = raw else {
        return BTreeMap::new();
    };

    match parse_selector_overrides(raw) {
        Ok(overrides) => overrides,
        Err(e) => {
            tracing::error!("Ignoring selectors: {}", e);
            BTreeMap::new()
        }
    }
}

/// Handles --web: serves the control surface until interrupted
///
/// The job described by the remaining arguments is exposed as `POST /run`.
async fn handle_web(
    orchestrator: JobOrchestrator,
    host: &str,
    port: u16,
    cli_job: JobSpec,
) -> anyhow::Result<()> {
    let runner = JobRunner::new(orchestrator);
    server::serve(host, port, runner, Some(cli_job))
        .await
        .context("control surface stopped")?;
    Ok(())
}

/// Handles --test: prints the report and exits non-zero on any failure
async fn handle_self_test(orchestrator: &JobOrchestrator) -> anyhow::Result<()> {
    println!("=== Harvester Self-Test ===\n");

    let report = run_self_tests(orchestrator.config(), orchestrator.launcher()).await;

    println!("  Email extraction:    {}", pass_fail(report.email_extraction));
    println!("  URL validation:      {}", pass_fail(report.url_validation));
    println!("  Selector extraction: {}", pass_fail(report.selector_extraction));

    if !report.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}

fn pass_fail(passed: bool) -> &'static str {
    if passed {
        "PASS"
    } else {
        "FAIL"
    }
}

/// Runs a single job in the foreground and prints its outcome
async fn handle_job(orchestrator: &JobOrchestrator, spec: JobSpec) -> anyhow::Result<()> {
    let status = orchestrator.run(spec).await;

    println!("\n=== Job {} ===", status.state);
    println!("  URLs scraped: {}/{}", status.urls_scraped, status.total_urls);
    println!("  Errors:       {}", status.error_count);
    println!("  Message:      {}", status.message);
    if let Some(path) = &status.output_path {
        println!("  Output:       {}", path.display());
    }

    if status.state == JobState::Failed {
        std::process::exit(1);
    }
    Ok(())
}
