// src/crawl/frontier.rs
// =============================================================================
// URL prioritization and the crawl frontier.
//
// Every candidate URL lands in one of four tiers by pattern matching
// against its path and query:
//   critical - career/jobs/apply/recruiting pages (the whole point)
//   high     - recruiting-adjacent terms (internship, talent, vacancy)
//   medium   - contact/about/team/leadership pages (HR contact info)
//   low      - everything else
//
// The frontier is a set of per-tier queues: pop always drains the highest
// non-empty tier, and within a tier URLs come out in insertion order. That
// ordering is a correctness property for the two-phase crawl, not a nice-
// to-have - critical pages must be fetched before the page budget runs out
// on low-value ones.
//
// Inserts are idempotent: a URL that was ever enqueued, or that the caller
// already visited, is silently dropped.
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

// Career and jobs pages - these MUST be crawled first
static CRITICAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)careers?/?($|/)|jobs?/?($|/)|work.*?with.*?us/?$|join.*?us/?$",
        r"(?i)employment/?($|/)|vacancies/?($|/)|openings/?($|/)|positions/?($|/)",
        r"(?i)careers?\.html|jobs?\.html|careers?\.php|jobs?\.php|recruitment|hiring",
        r"(?i)apply.*?now|apply.*?job|join.*?team|careers?.*?page|jobs?.*?page",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

// Likely to contain job info
static HIGH_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)recruit|apply|application|vacancy|position|opportunity",
        r"(?i)internship|graduate|employment|talent|job.*?listing|career.*?listing",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

// Might contain contact info for HR
static MEDIUM_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)contact|about.*?us|team|people|staff|directory|department|meet.*?team",
        r"(?i)our.*?people|who.*?we.*?are|leadership|management|hr.*?team|hr.*?department",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

// Coarse priority bucket for a URL
//
// Declared highest-first so the derived Ord sorts critical < low, matching
// the order the frontier drains them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    fn index(self) -> usize {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

// Classifies a URL into its priority tier
//
// Critical patterns win over high, high over medium; anything unmatched
// is low.
pub fn classify_priority(url: &str) -> Priority {
    if CRITICAL_PATTERNS.iter().any(|p| p.is_match(url)) {
        Priority::Critical
    } else if HIGH_PATTERNS.iter().any(|p| p.is_match(url)) {
        Priority::High
    } else if MEDIUM_PATTERNS.iter().any(|p| p.is_match(url)) {
        Priority::Medium
    } else {
        Priority::Low
    }
}

// Orders URLs highest tier first, stable within each tier
pub fn prioritize<I>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut buckets: [Vec<String>; 4] = Default::default();
    for url in urls {
        buckets[classify_priority(&url).index()].push(url);
    }
    buckets.into_iter().flatten().collect()
}

// The ordered collection of URLs awaiting a fetch attempt
#[derive(Debug, Default)]
pub struct Frontier {
    queues: [VecDeque<String>; 4],
    ever_queued: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Frontier::default()
    }

    // Adds a URL unless it was already queued or already visited
    //
    // Returns true if the URL was actually added.
    pub fn insert(&mut self, url: String, visited: &HashSet<String>) -> bool {
        if visited.contains(&url) || self.ever_queued.contains(&url) {
            return false;
        }
        let priority = classify_priority(&url);
        self.ever_queued.insert(url.clone());
        self.queues[priority.index()].push_back(url);
        true
    }

    // Removes and returns the next URL: highest tier first, insertion order
    // within a tier
    pub fn pop(&mut self) -> Option<(String, Priority)> {
        for (index, queue) in self.queues.iter_mut().enumerate() {
            if let Some(url) = queue.pop_front() {
                let priority = match index {
                    0 => Priority::Critical,
                    1 => Priority::High,
                    2 => Priority::Medium,
                    _ => Priority::Low,
                };
                return Some((url, priority));
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }
}
