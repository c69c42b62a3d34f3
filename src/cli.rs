//! CLI parsing and orchestration. Parses args, runs scrape -> CSV or JSON. Maps errors to exit codes.

use crate::config;
use crate::model::BookRecord;
use crate::output::{write_records, OutputFormat, WriteError};
use crate::scraper::{
    scrape_books, MalformedEntryBehavior, PoliteClient, ScrapeError, ScrapeOptions,
};
use clap::Parser;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Scrape(#[from] ScrapeError),

    #[error("{0}")]
    Write(#[from] WriteError),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Scrape(_) => 2,
            CliRunError::Write(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "bookscrape")]
#[command(about = "Scrape book catalogue listings and write CSV or JSON")]
#[command(
    after_help = "Config file keys (output_dir, output_format, user_agent, request_delay_secs, timeout_secs, max_pages, follow_pagination, malformed_entries) are documented in the README. CLI flags override config."
)]
pub struct Args {
    /// Catalogue page URL(s). Multiple seeds are scraped sequentially into one record list.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Output path. Default: {output_dir or .}/books.{ext} where ext depends on --format.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: csv or json (default json; config key output_format).
    #[arg(long, value_parser = parse_format)]
    pub format: Option<OutputFormat>,

    /// Stop after this many catalogue pages per seed URL.
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Scrape only the given page(s); do not follow next-page links.
    #[arg(long)]
    pub no_pagination: bool,

    /// Follow next-page links even when the config file disables pagination.
    #[arg(long, conflicts_with = "no_pagination")]
    pub paginate: bool,

    /// How to handle entries with missing fields: skip (default) or fail.
    #[arg(long, value_parser = parse_malformed_behavior)]
    pub malformed_entries: Option<MalformedEntryBehavior>,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Delay between requests in seconds (overrides config; default 1).
    #[arg(long)]
    pub delay: Option<u64>,

    /// Request timeout in seconds (overrides config; default 20).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Suppress progress output (errors only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Print verbose error chain.
    #[arg(long)]
    pub verbose: bool,

    /// Fetch the first page of each seed only, print record count and output path, write nothing.
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    match s.to_lowercase().as_str() {
        "csv" => Ok(OutputFormat::Csv),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!(
            "Invalid --format value: '{}'. Use csv or json.",
            s
        )),
    }
}

fn parse_malformed_behavior(s: &str) -> Result<MalformedEntryBehavior, String> {
    match s.to_lowercase().as_str() {
        "skip" => Ok(MalformedEntryBehavior::Skip),
        "fail" => Ok(MalformedEntryBehavior::Fail),
        _ => Err(format!(
            "Invalid --malformed-entries value: '{}'. Use skip or fail.",
            s
        )),
    }
}

/// Resolve the malformed-entry policy: flag, then config, then Skip. An
/// invalid config value is an error, same as an invalid output_format.
fn resolve_malformed_behavior(
    flag: Option<MalformedEntryBehavior>,
    config_value: Option<&str>,
) -> Result<MalformedEntryBehavior, String> {
    match flag {
        Some(m) => Ok(m),
        None => match config_value {
            Some(s) => parse_malformed_behavior(s),
            None => Ok(MalformedEntryBehavior::Skip),
        },
    }
}

/// Resolve pagination: either flag overrides the config; default is to follow.
fn resolve_follow_pagination(no_pagination: bool, paginate: bool, config_value: Option<bool>) -> bool {
    if no_pagination {
        false
    } else if paginate {
        true
    } else {
        config_value.unwrap_or(true)
    }
}

fn extension_for_format(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Csv => "csv",
        OutputFormat::Json => "json",
    }
}

/// Ensure output path parent exists; writing happens only after the scrape succeeds.
fn validate_output_path(path: &Path) -> Result<(), CliRunError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(CliRunError::InvalidInput(format!(
                "Cannot write output: {}: parent directory does not exist.",
                path.display()
            )));
        }
    }
    Ok(())
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;

    let effective_output_dir: PathBuf = config
        .as_ref()
        .and_then(|c| c.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let format = match args.format {
        Some(f) => f,
        None => match config.as_ref().and_then(|c| c.output_format.as_deref()) {
            Some(s) => parse_format(s).map_err(CliRunError::InvalidInput)?,
            None => OutputFormat::Json,
        },
    };

    const DEFAULT_DELAY_SECS: u64 = 1;
    const DEFAULT_TIMEOUT_SECS: u64 = 20;
    let delay_secs = args
        .delay
        .or_else(|| config.as_ref().and_then(|c| c.request_delay_secs))
        .unwrap_or(DEFAULT_DELAY_SECS);
    let timeout_secs = args
        .timeout
        .or_else(|| config.as_ref().and_then(|c| c.timeout_secs))
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let user_agent = args
        .user_agent
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.user_agent.clone()));

    let mut builder = PoliteClient::builder()
        .delay_secs(delay_secs)
        .timeout_secs(timeout_secs);
    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }
    let mut client = builder
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

    let progress_state: RefCell<Option<indicatif::ProgressBar>> = RefCell::new(None);
    let progress_cb = |pages: u32, records: u32| {
        let mut state = progress_state.borrow_mut();
        let pb = state.get_or_insert_with(|| {
            let bar = indicatif::ProgressBar::new_spinner();
            bar.set_style(
                indicatif::ProgressStyle::default_spinner()
                    .template("{spinner} {msg} ({elapsed})")
                    .unwrap()
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        pb.set_message(format!("Page {}: {} books", pages, records));
    };
    let progress: Option<&dyn Fn(u32, u32)> = if args.quiet { None } else { Some(&progress_cb) };

    let malformed = resolve_malformed_behavior(
        args.malformed_entries,
        config.as_ref().and_then(|c| c.malformed_entries.as_deref()),
    )
    .map_err(CliRunError::InvalidInput)?;

    let follow_pagination = resolve_follow_pagination(
        args.no_pagination,
        args.paginate,
        config.as_ref().and_then(|c| c.follow_pagination),
    );

    let max_pages = if args.dry_run {
        Some(1)
    } else {
        args.max_pages
            .or_else(|| config.as_ref().and_then(|c| c.max_pages))
    };

    let scrape_opts = ScrapeOptions {
        progress,
        max_pages,
        follow_pagination,
        malformed,
    };

    let mut records: Vec<BookRecord> = Vec::new();
    for url in &args.urls {
        records.extend(scrape_books(url, &mut client, &scrape_opts)?);
    }

    if let Some(pb) = progress_state.borrow_mut().take() {
        pb.disable_steady_tick();
        pb.finish_and_clear();
    }

    let output_path = match &args.output {
        Some(p) => p.clone(),
        None => {
            let ext = extension_for_format(format);
            effective_output_dir.join(format!("books.{}", ext))
        }
    };

    if args.dry_run {
        eprintln!("Records: {}", records.len());
        eprintln!("Output: {}", output_path.display());
        return Ok(());
    }

    validate_output_path(&output_path)?;
    write_records(&records, format, &output_path)?;

    if !args.quiet {
        eprintln!("Wrote {} ({} records)", output_path.display(), records.len());
    }
    Ok(())
}
