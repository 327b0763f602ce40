// src/config.rs
// =============================================================================
// All tuning knobs for a crawl live in this one struct.
//
// The defaults mirror the behavior we want out of the box:
// - 100 pages per seed (300 in thorough mode)
// - 2 retries per fetch with exponential backoff
// - 10 MB body ceiling so one huge page can't blow up memory
// - polite delays between fetches (shorter for career pages)
//
// Everything here is plain data so it can be loaded from JSON with serde,
// overridden from the CLI, or zeroed out in tests (delays especially).
// =============================================================================

use serde::Deserialize;
use std::time::Duration;

// Configuration for one crawl invocation
//
// Cloned into the orchestrator at the start of a crawl; components never
// read ambient/global settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Maximum pages fetched per seed URL (discovery + extraction combined)
    pub max_pages_per_seed: usize,

    /// Page budget used instead of max_pages_per_seed when thorough mode is on
    pub thorough_max_pages: usize,

    /// Hard cap on discovery-phase pages; the effective discovery budget is
    /// min(discovery_page_cap, effective_max_pages / 2)
    pub discovery_page_cap: usize,

    /// Retries per fetch after the first attempt (so N retries = N+1 attempts)
    pub max_retries: u32,

    /// Retries used for critical-tier pages (career/jobs pages matter more)
    pub critical_page_retries: u32,

    /// Timeout for a single fetch attempt, in seconds
    pub fetch_timeout_secs: u64,

    /// Reject any response body larger than this many bytes
    pub max_body_bytes: usize,

    /// Base backoff delay in milliseconds; doubles on each retry
    pub backoff_base_ms: u64,

    /// Add up to 250ms of random jitter to each backoff delay
    pub backoff_jitter: bool,

    /// Delay before fetching a critical-tier page, in milliseconds
    pub critical_page_delay_ms: u64,

    /// Delay before fetching any other page, in milliseconds
    /// Set both delays to 0 in tests.
    pub regular_page_delay_ms: u64,

    /// Maximum characters of context kept around each discovered email
    pub context_max_len: usize,

    /// Levenshtein distance threshold for adaptive reclassification
    pub edit_distance_threshold: usize,

    /// Hard ceiling on findings kept in memory per seed; extra findings are
    /// dropped (counted, not stored) once the cap is hit
    pub max_findings_per_seed: usize,

    /// Emit a progress checkpoint event every N extraction pages
    pub progress_every_pages: usize,

    /// How many seed URLs may crawl at the same time (1 = sequential)
    pub max_concurrent_seeds: usize,

    /// Share learned HR domains/local-parts across all seeds in one batch
    /// instead of resetting per seed
    pub share_knowledge_across_seeds: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        CrawlConfig {
            max_pages_per_seed: 100,
            thorough_max_pages: 300,
            discovery_page_cap: 100,
            max_retries: 2,
            critical_page_retries: 4,
            fetch_timeout_secs: 20,
            max_body_bytes: 10 * 1024 * 1024,
            backoff_base_ms: 1000,
            backoff_jitter: true,
            critical_page_delay_ms: 300,
            regular_page_delay_ms: 500,
            context_max_len: 200,
            edit_distance_threshold: 2,
            max_findings_per_seed: 2000,
            progress_every_pages: 5,
            max_concurrent_seeds: 1,
            share_knowledge_across_seeds: false,
        }
    }
}

impl CrawlConfig {
    /// The page budget for one seed, taking thorough mode into account
    pub fn effective_max_pages(&self, thorough: bool) -> usize {
        if thorough {
            self.thorough_max_pages
        } else {
            self.max_pages_per_seed
        }
    }

    /// The discovery-phase budget: half the resolved page budget, capped.
    /// Takes the budget rather than the thorough flag because a request may
    /// override the page budget explicitly.
    pub fn discovery_budget(&self, max_pages: usize) -> usize {
        self.discovery_page_cap.min(max_pages / 2).max(1)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Returns a config with all politeness delays zeroed, for tests
    #[cfg(test)]
    pub fn for_tests() -> Self {
        CrawlConfig {
            critical_page_delay_ms: 0,
            regular_page_delay_ms: 0,
            backoff_base_ms: 0,
            backoff_jitter: false,
            ..Default::default()
        }
    }
}
