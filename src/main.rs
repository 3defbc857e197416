//! Quote-Harvest main entry point
//!
//! Command-line interface for the paginated quote scraper.

use anyhow::Context;
use clap::Parser;
use quote_harvest::{run_crawl, CrawlSession};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Quote-Harvest: a polite paginated quote scraper
///
/// Crawls a quote site page by page, respecting robots.txt and rate
/// limits, and appends one JSON record per quote to the output file.
#[derive(Parser, Debug)]
#[command(name = "quote-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite paginated quote scraper", long_about = None)]
struct Cli {
    /// Starting URL
    #[arg(long, value_name = "URL")]
    start: String,

    /// Maximum pages to crawl
    #[arg(long, default_value_t = 5)]
    max_pages: u32,

    /// Minimum delay between requests in milliseconds
    #[arg(long, default_value_t = 700)]
    delay_ms: u64,

    /// Log what would be crawled without network access or output writes
    #[arg(long)]
    dry_run: bool,

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

    let start_url = Url::parse(&cli.start)
        .with_context(|| format!("invalid start URL: {}", cli.start))?;

    let session = CrawlSession::new(start_url, cli.max_pages, cli.delay_ms, cli.dry_run);

    // Any stop reason, including the degraded fetch-failure stop, exits 0;
    // only infrastructure errors surface as a nonzero exit
    run_crawl(session).await.context("crawl failed")?;

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("quote_harvest=info,warn"),
            1 => EnvFilter::new("quote_harvest=debug,info"),
            2 => EnvFilter::new("quote_harvest=trace,debug"),
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
