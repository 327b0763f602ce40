// src/crawl/mod.rs
// =============================================================================
// This module drives the crawl itself.
//
// Submodules:
// - frontier: Priority tiers and the ordered URL queue
// - session: Per-seed mutable state (visited set, findings, counters)
// - orchestrator: The two-phase state machine that ties everything together
//
// The design is two-phase on purpose: a first mapping pass catalogs the
// site's structure and tiers its URLs, then a second pass spends the
// remaining page budget extracting emails from the best pages first.
// Knowing the whole navigation structure before committing the budget is
// what keeps a 100-page crawl from spending 90 pages on blog archives.
// =============================================================================

mod frontier;
mod orchestrator;
mod session;

pub use frontier::{classify_priority, prioritize, Frontier, Priority};
pub use orchestrator::{CrawlRequest, CrawlResponse, Orchestrator, SeedResult};
pub use session::{AggregateStats, CrawlStats};
