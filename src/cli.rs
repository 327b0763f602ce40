// src/cli.rs
// =============================================================================
// Command-line interface, built with clap's derive API.
//
// Two subcommands:
// - scan: crawl one or more seed URLs given directly on the command line
// - bulk: crawl every URL listed in a text file (one per line, # comments)
//
// Advanced tuning (retries, delays, body limits, ...) comes from a JSON
// config file via --config; the flags here only cover the knobs people
// reach for on every run.
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "email-harvester",
    version,
    about = "Crawls company websites to discover HR and recruiting email addresses",
    long_about = "email-harvester maps a site's structure, prioritizes career and contact \
                  pages, and extracts email addresses with HR classification. Results print \
                  as a table or JSON."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl one or more seed URLs
    ///
    /// Example: email-harvester scan https://acme.com --max-pages 50
    Scan {
        /// Seed URLs to crawl (each is crawled within its own domain)
        #[arg(required = true)]
        seed_urls: Vec<String>,

        #[command(flatten)]
        options: ScanOptions,
    },

    /// Crawl every URL listed in a file (one per line, # starts a comment)
    ///
    /// Example: email-harvester bulk targets.txt --concurrency 3
    Bulk {
        /// Path to a text file of seed URLs
        file: PathBuf,

        /// How many seeds to crawl at the same time
        #[arg(long, default_value_t = 1)]
        concurrency: usize,

        #[command(flatten)]
        options: ScanOptions,
    },
}

// Flags shared by both subcommands
#[derive(Args, Debug)]
pub struct ScanOptions {
    /// Maximum pages to fetch per seed (overrides the config file)
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Use the larger thorough-mode page budget
    #[arg(long)]
    pub thorough: bool,

    /// Print the full result as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Only report HR-classified addresses
    #[arg(long)]
    pub hr_only: bool,

    /// Path to a JSON crawl-configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Carry learned HR patterns from one seed to the next
    #[arg(long)]
    pub share_knowledge: bool,
}
