//! # Contact Sleuth CLI
//!
//! Command-line interface for the Contact Sleuth library (`contact_sleuth_core`).
//! This binary parses arguments, sets up configuration, initializes the core
//! sleuth, then either collects businesses into a CSV file or resolves a
//! single business.

use contact_sleuth_core::{
    collect_records, find_business_email, initialize_sleuth, write_csv_file, Config,
    ConfigBuilder, ContactSleuth, Record, Resolution, RunSummary, StageOutcome,
};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Finds public contact emails for local businesses.",
    long_about = "Contact Sleuth walks a business discovery feed and resolves each business's contact email through a static scrape, a headless browser and a web search, scoring every candidate for trust."
)]
struct AppArgs {
    /// Path to the output CSV file.
    #[arg(
        short,
        long,
        default_value = "contacts.csv",
        env = "CONTACT_SLEUTH_OUTPUT"
    )]
    output: String,

    /// Number of records to collect.
    #[arg(short, long, env = "CONTACT_SLEUTH_TARGET")]
    target: Option<usize>,

    /// Maximum number of concurrent resolutions.
    #[arg(short, long, env = "CONTACT_SLEUTH_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Discovery query; repeat to run several. Replaces the configured list.
    #[arg(short, long = "query")]
    queries: Vec<String>,

    /// Business name to resolve (enables single business mode).
    #[arg(long, env = "CONTACT_SLEUTH_NAME")]
    name: Option<String>,

    /// Website of the business given with --name.
    #[arg(long, env = "CONTACT_SLEUTH_WEBSITE", requires = "name")]
    website: Option<String>,

    /// Path to a configuration file (TOML format). CLI args override file settings.
    #[arg(long, env = "CONTACT_SLEUTH_CONFIG")]
    config_file: Option<String>,

    /// SerpApi key used for discovery and the fallback search.
    #[arg(long, env = "CONTACT_SLEUTH_SERPAPI_KEY", hide_env_values = true)]
    serpapi_key: Option<String>,

    /// URL of a running WebDriver (e.g. chromedriver) for the dynamic stage.
    #[arg(long, env = "CONTACT_SLEUTH_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// User agent string for HTTP and browser requests.
    #[arg(long, env = "CONTACT_SLEUTH_USER_AGENT")]
    user_agent: Option<String>,

    /// HTTP request timeout in seconds.
    #[arg(long, env = "CONTACT_SLEUTH_REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    /// Browser navigation timeout in seconds.
    #[arg(long, env = "CONTACT_SLEUTH_NAVIGATION_TIMEOUT")]
    navigation_timeout: Option<u64>,

    /// Country name appended to fallback search queries.
    #[arg(long, env = "CONTACT_SLEUTH_COUNTRY")]
    country: Option<String>,

    /// Country TLD that earns the scoring bonus (e.g. "qa").
    #[arg(long, env = "CONTACT_SLEUTH_COUNTRY_TLD")]
    country_tld: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_thread_names(true)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting up tracing subscriber failed")?;

    tracing::info!(
        "Contact Sleuth CLI v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let args = AppArgs::parse();
    tracing::debug!(
        "Parsed CLI arguments: output={}, target={:?}, queries={:?}, name={:?}",
        args.output,
        args.target,
        args.queries,
        args.name
    );

    let config = Arc::new(build_config(&args)?);
    tracing::debug!("Effective configuration loaded from {:?}", config.loaded_config_path);

    let sleuth = match initialize_sleuth(config.clone()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Initialization error: {}", e);
            return Err(anyhow::anyhow!(
                "Failed to initialize ContactSleuth core: {}",
                e
            ));
        }
    };

    let start_time = Instant::now();
    let execution_result = match args.name.as_deref() {
        Some(name) => process_single_mode(&sleuth, name, args.website.as_deref()).await,
        None => process_collection_mode(&config, &sleuth, &args, start_time).await,
    };

    if let Err(e) = execution_result {
        tracing::error!("Execution failed: {}", e);
        return Err(e);
    }

    tracing::info!(
        "Finished successfully. Total duration: {:.2?}",
        start_time.elapsed()
    );
    Ok(())
}

fn build_config(args: &AppArgs) -> Result<Config> {
    let mut config_builder = ConfigBuilder::new();

    if let Some(ref path) = args.config_file {
        config_builder = config_builder.config_file(path);
    }
    if let Some(t) = args.target {
        config_builder = config_builder.target_count(t);
    }
    if let Some(c) = args.concurrency {
        config_builder = config_builder.max_concurrency(c);
    }
    if !args.queries.is_empty() {
        config_builder = config_builder.search_queries(args.queries.clone());
    }
    if let Some(ref key) = args.serpapi_key {
        config_builder = config_builder.serpapi_key(Some(key));
    }
    if let Some(ref url) = args.webdriver_url {
        config_builder = config_builder.webdriver_url(Some(url));
    }
    if let Some(ref ua) = args.user_agent {
        config_builder = config_builder.user_agent(ua);
    }
    if let Some(t) = args.request_timeout {
        config_builder = config_builder.request_timeout(Duration::from_secs(t));
    }
    if let Some(t) = args.navigation_timeout {
        config_builder = config_builder.navigation_timeout(Duration::from_secs(t));
    }
    if let Some(ref country) = args.country {
        config_builder = config_builder.country_qualifier(country);
    }
    if let Some(ref tld) = args.country_tld {
        config_builder = config_builder.country_tld(tld);
    }

    config_builder.build().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to build configuration: {}", e)
    })
}

async fn process_single_mode(
    sleuth: &ContactSleuth,
    name: &str,
    website: Option<&str>,
) -> Result<()> {
    tracing::info!("Running in Single Business mode.");
    let start_time = Instant::now();

    let resolution = find_business_email(sleuth, name, website).await;
    print_single_result(name, website, &resolution);

    tracing::info!("Single mode finished. Duration: {:.2?}", start_time.elapsed());
    Ok(())
}

async fn process_collection_mode(
    config: &Config,
    sleuth: &ContactSleuth,
    args: &AppArgs,
    start_time: Instant,
) -> Result<()> {
    let target = config.target_count;
    tracing::info!(
        "Running in Collection mode. Target: {}, Queries: {}, Output: '{}'",
        target,
        config.search_queries.len(),
        args.output
    );

    let output_path = Path::new(&args.output);
    if let Some(parent_dir) = output_path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            tracing::debug!("Creating output directory: {}", parent_dir.display());
            std::fs::create_dir_all(parent_dir).with_context(|| {
                format!(
                    "Failed to create output directory '{}'",
                    parent_dir.display()
                )
            })?;
        }
    }
    File::create(output_path).with_context(|| {
        format!(
            "Cannot write to output file '{}'. Check permissions.",
            args.output
        )
    })?;
    tracing::debug!("Output path '{}' seems writable.", args.output);

    let pb = ProgressBar::new(target as u64);
    pb.set_style(ProgressStyle::default_bar()
         .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) | {msg}")
         .context("Failed to set progress bar template")?
         .progress_chars("=> "));
    pb.set_message("Collecting businesses...");

    let records = collect_records(sleuth, target, |record, count| {
        pb.set_position(count as u64);
        pb.set_message(record.company_name.clone());
    })
    .await
    .context("Collection could not start")?;

    pb.finish_with_message(format!("Collected {} records", records.len()));

    tracing::info!("Saving {} records to '{}'...", records.len(), args.output);
    write_csv_file(output_path, &records)
        .with_context(|| format!("Failed to write CSV to '{}'", args.output))?;
    tracing::info!("Results saved successfully.");

    log_summary(&records, target, start_time.elapsed());
    Ok(())
}

/// Logs a summary of the run using `tracing::info`.
fn log_summary(records: &[Record], target: usize, duration: Duration) {
    let summary = RunSummary::from_records(records);

    tracing::info!("-------------------- Collection Summary --------------------");
    tracing::info!("Target Records              : {}", target);
    tracing::info!("Records Collected           : {}", summary.records);
    tracing::info!("  - With Email              : {}", summary.with_email);
    tracing::info!("  - Without Email           : {}", summary.records - summary.with_email);
    tracing::info!("Hit Rate                    : {:.1}%", summary.hit_rate());
    tracing::info!("Total Time Taken            : {:.2?}", duration);
    if duration.as_secs_f64() > 0.01 && summary.records > 0 {
        let rate = (summary.records as f64) / duration.as_secs_f64();
        tracing::info!("Processing Rate             : {:.2} records/sec", rate);
    }
    tracing::info!("------------------------------------------------------------");
}

/// Prints the outcome for one business to standard output.
fn print_single_result(name: &str, website: Option<&str>, resolution: &Resolution) {
    const BLUE: &str = "\x1b[34m";
    const GREEN: &str = "\x1b[32m";
    const YELLOW: &str = "\x1b[33m";
    const RESET: &str = "\x1b[0m";

    println!("\n{BLUE}===== Contact Sleuth Result ====={RESET}");
    println!("Name:    {}", name);
    println!("Website: {}", website.unwrap_or("N/A"));

    match (&resolution.email, resolution.stage) {
        (Some(email), Some(stage)) => {
            println!("\n{GREEN}Status: FOUND{RESET}");
            println!("Email:   {GREEN}{}{RESET}", email);
            println!("Stage:   {}", stage);
        }
        _ => println!("\n{YELLOW}Status: NO EMAIL FOUND{RESET}"),
    }

    println!("\n{BLUE}Stages:{RESET}");
    for (stage, outcome) in &resolution.outcomes {
        let detail = match outcome {
            StageOutcome::Found(email) => format!("found {}", email),
            StageOutcome::NoCandidate => "no selectable candidate".to_string(),
            StageOutcome::Unavailable(reason) => format!("skipped ({})", reason),
        };
        println!("- {:<8} {}", stage.to_string(), detail);
    }
    println!("{BLUE}================================={RESET}\n");
}
