// src/main.rs
// =============================================================================
// Entry point for the email-harvester CLI.
//
// What happens here:
// 1. Parse command-line arguments with clap
// 2. Load the crawl configuration (defaults, JSON file, flag overrides)
// 3. Run the orchestrator against the seed URLs
// 4. Print findings as a table or JSON
// 5. Exit with a proper code (0 = success, 1 = some seeds failed, 2 = error)
// =============================================================================

mod classify; // src/classify/ - HR rules and adaptive learning
mod cli; //      src/cli.rs - command-line parsing
mod config; //   src/config.rs - crawl tuning knobs
mod crawl; //    src/crawl/ - frontier, session, orchestrator
mod events; //   src/events.rs - progress events and sinks
mod extract; //  src/extract/ - email and link extraction
mod fetcher; //  src/fetcher/ - HTTP client with retries
mod store; //    src/store/ - email persistence

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands, ScanOptions};
use config::CrawlConfig;
use crawl::{CrawlRequest, CrawlResponse, Orchestrator};
use events::{ConsoleSink, NullSink, ProgressSink};
use extract::EmailFinding;
use store::MemoryStore;

#[tokio::main]
async fn main() {
    // RUST_LOG controls verbosity; progress output goes through the event
    // sink, so tracing stays quiet unless asked for
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { seed_urls, options } => crawl_seeds(seed_urls, 1, options).await,
        Commands::Bulk {
            file,
            concurrency,
            options,
        } => {
            let seed_urls = read_seed_file(&file)?;
            if seed_urls.is_empty() {
                println!("⚠️  No seed URLs found in {}", file.display());
                return Ok(0);
            }
            crawl_seeds(seed_urls, concurrency, options).await
        }
    }
}

async fn crawl_seeds(
    seed_urls: Vec<String>,
    concurrency: usize,
    options: ScanOptions,
) -> Result<i32> {
    let mut config = load_config(options.config.as_deref())?;
    config.max_concurrent_seeds = concurrency.max(1);
    if options.share_knowledge {
        config.share_knowledge_across_seeds = true;
    }

    // JSON mode keeps stdout machine-readable: no progress lines
    let sink: Arc<dyn ProgressSink> = if options.json {
        Arc::new(NullSink)
    } else {
        Arc::new(ConsoleSink)
    };
    let store = Arc::new(MemoryStore::new());

    let orchestrator = Orchestrator::new(config, store, sink)?;
    let mut response = orchestrator
        .run(CrawlRequest {
            seed_urls,
            max_pages_per_seed: options.max_pages,
            thorough: options.thorough,
        })
        .await;

    if options.hr_only {
        for result in &mut response.seed_results {
            result.findings.retain(|f| f.is_hr_related);
        }
    }

    print_response(&response, options.json)?;

    Ok(exit_code_for(&response))
}

// Exit code for a completed crawl: 0 when HR addresses were found, 1 when
// the crawl came back empty-handed - the scan's negative outcome, like a
// link checker exiting 1 on broken links. That includes the case where
// every seed failed validation: the batch still completed, it just found
// nothing. Internal errors exit 2 through main's error path.
fn exit_code_for(response: &CrawlResponse) -> i32 {
    if response.aggregate.hr_emails_found > 0 {
        0
    } else {
        1
    }
}

// Loads the crawl configuration, defaulting every field not present in the
// file (or everything, when no file is given)
fn load_config(path: Option<&Path>) -> Result<CrawlConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("invalid config file {}", path.display()))
        }
        None => Ok(CrawlConfig::default()),
    }
}

// Reads a bulk seed file: one URL per line, blank lines and # comments
// skipped
fn read_seed_file(path: &PathBuf) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn print_response(response: &CrawlResponse, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
    } else {
        for result in &response.seed_results {
            print_findings_table(&result.seed_url, &result.findings);
        }
    }
    Ok(())
}

// Prints one seed's findings as a human-readable table
fn print_findings_table(seed_url: &str, findings: &[EmailFinding]) {
    println!();
    println!("📋 Findings for {}", seed_url);

    if findings.is_empty() {
        println!("   (no email addresses found)");
        return;
    }

    println!("{:<40} {:<10} {:<6} {:<40}", "EMAIL", "TYPE", "CONF", "SOURCE");
    println!("{}", "=".repeat(98));

    for finding in findings {
        let kind = if finding.is_hr_related { "✅ HR" } else { "  other" };
        println!(
            "{:<40} {:<10} {:<6.2} {:<40}",
            truncate_display(&finding.address, 38),
            kind,
            finding.confidence,
            truncate_display(&finding.source_url, 38),
        );
    }

    let hr_count = findings.iter().filter(|f| f.is_hr_related).count();
    println!();
    println!("📊 Summary:");
    println!("   ✅ HR-related: {}", hr_count);
    println!("   📧 Other: {}", findings.len() - hr_count);
    println!("   📋 Total: {}", findings.len());
}

// Truncates a value for fixed-width display, char-boundary safe
fn truncate_display(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        let kept: String = value.chars().take(max).collect();
        format!("{}...", kept)
    } else {
        value.to_string()
    }
}
