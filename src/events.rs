// src/events.rs
// =============================================================================
// Progress events emitted while a crawl runs.
//
// The orchestrator doesn't print anything itself - it hands structured
// events to a ProgressSink. The console sink renders them as the familiar
// human-readable progress lines; a server layer could just as easily
// serialize them (they all derive Serialize) and stream them to a client.
//
// Event order for one crawl:
//   CrawlStarted
//     SeedStarted -> (PageScanned | EmailDiscovered | Checkpoint)* ->
//     SeedCompleted | SeedFailed
//   ... repeated per seed ...
//   CrawlCompleted
// =============================================================================

use serde::Serialize;

use crate::crawl::{AggregateStats, CrawlStats, Priority};

// One structured progress event
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    CrawlStarted {
        seed_count: usize,
    },
    SeedStarted {
        seed_url: String,
        max_pages: usize,
    },
    /// One page finished (fetched or failed), in either phase
    PageScanned {
        seed_url: String,
        page_url: String,
        priority: Priority,
        phase: Phase,
        emails_on_page: usize,
        pages_scanned: usize,
    },
    /// A genuinely new address passed deduplication
    EmailDiscovered {
        seed_url: String,
        address: String,
        is_hr_related: bool,
    },
    /// Emitted every N extraction pages
    Checkpoint {
        seed_url: String,
        pages_scanned: usize,
        emails_found: usize,
        emails_stored: usize,
    },
    SeedCompleted {
        seed_url: String,
        stats: CrawlStats,
    },
    /// Top-level precondition failure for one seed (bad URL); the batch
    /// continues with the remaining seeds
    SeedFailed {
        seed_url: String,
        error: String,
    },
    CrawlCompleted {
        stats: AggregateStats,
    },
}

// The crawl phase a page event belongs to
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovery,
    Extraction,
}

// Consumes progress events as the crawl produces them
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &ProgressEvent);
}

// Renders events as human-readable console lines
pub struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn emit(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::CrawlStarted { seed_count } => {
                println!("🔍 Starting crawl of {} seed URL(s)", seed_count);
            }
            ProgressEvent::SeedStarted { seed_url, max_pages } => {
                println!("{}", "=".repeat(50));
                println!("🌐 Scanning {} (up to {} pages)", seed_url, max_pages);
                println!("{}", "=".repeat(50));
            }
            ProgressEvent::PageScanned {
                page_url,
                priority,
                phase,
                emails_on_page,
                pages_scanned,
                ..
            } => {
                let marker = match priority {
                    Priority::Critical => "⭐",
                    Priority::High => "🔍",
                    _ => "  ",
                };
                let phase_tag = match phase {
                    Phase::Discovery => "MAPPING",
                    Phase::Extraction => "EXTRACT",
                };
                if *emails_on_page > 0 {
                    println!(
                        "  [{} {}] {} {} - 📧 {} email(s)",
                        phase_tag, pages_scanned, marker, page_url, emails_on_page
                    );
                } else {
                    println!("  [{} {}] {} {}", phase_tag, pages_scanned, marker, page_url);
                }
            }
            ProgressEvent::EmailDiscovered {
                address,
                is_hr_related,
                ..
            } => {
                let tag = if *is_hr_related { "HR" } else { "general" };
                println!("    📧 {} ({})", address, tag);
            }
            ProgressEvent::Checkpoint {
                pages_scanned,
                emails_found,
                emails_stored,
                ..
            } => {
                println!(
                    "  📊 Progress: {} pages | {} emails | {} stored",
                    pages_scanned, emails_found, emails_stored
                );
            }
            ProgressEvent::SeedCompleted { seed_url, stats } => {
                println!(
                    "✅ Completed {}: {} pages, {} emails ({} HR), {} stored, {} error(s)",
                    seed_url,
                    stats.pages_scanned,
                    stats.emails_found,
                    stats.hr_emails_found,
                    stats.emails_stored,
                    stats.errors
                );
            }
            ProgressEvent::SeedFailed { seed_url, error } => {
                println!("❌ {}: {}", seed_url, error);
            }
            ProgressEvent::CrawlCompleted { stats } => {
                println!("{}", "=".repeat(50));
                println!(
                    "🏁 Crawl complete: {} pages, {} emails ({} HR), {} stored",
                    stats.pages_scanned,
                    stats.emails_found,
                    stats.hr_emails_found,
                    stats.emails_stored
                );
            }
        }
    }
}

// Discards every event; used in tests and by embedders that only want the
// final result object
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: &ProgressEvent) {}
}
