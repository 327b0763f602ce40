// src/crawl/session.rs
// =============================================================================
// Per-seed crawl state, owned by the orchestrator.
//
// Everything that used to be tempting to keep as ambient globals lives here
// instead: the visited set, the case-insensitive found-email set, the tier
// catalogs built during discovery, the error list, and the counters. One
// session per seed URL, created at Start, dropped after Completed - which
// is what makes concurrent multi-seed crawls safe by construction.
//
// Invariants enforced here:
// - the found-email set never holds two entries differing only by case
// - the findings list never exceeds its configured cap (extras are counted
//   and dropped, not an error)
// - visited is append-only for the life of one phase
// =============================================================================

use serde::Serialize;
use std::collections::HashSet;

use crate::classify::ClassificationKnowledge;
use crate::crawl::frontier::Priority;
use crate::extract::EmailFinding;

// Counters for one seed's crawl, reported at completion and checkpoints
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlStats {
    pub pages_scanned: usize,
    pub emails_found: usize,
    pub hr_emails_found: usize,
    pub emails_stored: usize,
    pub errors: usize,
    pub duration_secs: u64,
}

// Summed stats across every seed in a batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateStats {
    pub seeds_processed: usize,
    pub seeds_failed: usize,
    pub pages_scanned: usize,
    pub emails_found: usize,
    pub hr_emails_found: usize,
    pub emails_stored: usize,
    pub duration_secs: u64,
}

impl AggregateStats {
    pub fn absorb(&mut self, stats: &CrawlStats) {
        self.seeds_processed += 1;
        self.pages_scanned += stats.pages_scanned;
        self.emails_found += stats.emails_found;
        self.hr_emails_found += stats.hr_emails_found;
        self.emails_stored += stats.emails_stored;
        self.duration_secs += stats.duration_secs;
    }
}

// All mutable state for crawling one seed URL
#[derive(Debug)]
pub struct CrawlSession {
    pub seed_url: String,
    pub visited: HashSet<String>,
    pub errors: Vec<String>,
    pub stats: CrawlStats,
    pub knowledge: ClassificationKnowledge,

    // Tier catalogs built during discovery, in discovery order
    critical_pages: Vec<String>,
    high_value_pages: Vec<String>,
    regular_pages: Vec<String>,
    pages_with_emails: Vec<String>,

    // Deduplicated findings; the set is keyed on the lowercased address
    found_emails: HashSet<String>,
    findings: Vec<EmailFinding>,
    max_findings: usize,
    findings_dropped: usize,
}

impl CrawlSession {
    pub fn new(
        seed_url: &str,
        knowledge: ClassificationKnowledge,
        max_findings: usize,
    ) -> Self {
        CrawlSession {
            seed_url: seed_url.to_string(),
            visited: HashSet::new(),
            errors: Vec::new(),
            stats: CrawlStats::default(),
            knowledge,
            critical_pages: Vec::new(),
            high_value_pages: Vec::new(),
            regular_pages: Vec::new(),
            pages_with_emails: Vec::new(),
            found_emails: HashSet::new(),
            findings: Vec::new(),
            max_findings,
            findings_dropped: 0,
        }
    }

    /// Marks a URL visited; returns false if it already was
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    /// Resets the visited set between discovery and extraction - phase 2
    /// deliberately re-walks pages the mapping pass already fetched
    pub fn reset_visited(&mut self) {
        self.visited.clear();
    }

    pub fn note_error(&mut self, message: String) {
        tracing::warn!(seed = %self.seed_url, "{}", message);
        self.errors.push(message);
        self.stats.errors = self.errors.len();
    }

    // Files a discovered page into its tier catalog
    //
    // Critical and high tiers both land in the critical catalog (they get
    // fetched first in phase 2); medium is "high value"; low is regular.
    pub fn catalog_page(&mut self, url: &str, priority: Priority) {
        let url = url.to_string();
        match priority {
            Priority::Critical | Priority::High => self.critical_pages.push(url),
            Priority::Medium => self.high_value_pages.push(url),
            Priority::Low => self.regular_pages.push(url),
        }
    }

    /// Remembers that a page contained at least one email during discovery
    pub fn mark_page_with_emails(&mut self, url: &str) {
        if !self.pages_with_emails.iter().any(|u| u == url) {
            self.pages_with_emails.push(url.to_string());
        }
    }

    // The phase-2 walk order: critical pages, then pages known to contain
    // emails, then high-value pages, then the rest - capped at the budget
    pub fn extraction_order(&self, budget: usize) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();

        let groups = [
            &self.critical_pages,
            &self.pages_with_emails,
            &self.high_value_pages,
            &self.regular_pages,
        ];
        for group in groups {
            for url in group {
                if order.len() >= budget {
                    return order;
                }
                if seen.insert(url.clone()) {
                    order.push(url.clone());
                }
            }
        }
        order
    }

    /// True if this address (case-insensitive) hasn't been recorded yet
    pub fn is_new_email(&self, address: &str) -> bool {
        !self.found_emails.contains(&address.to_lowercase())
    }

    // Records a finding if its address is new for this crawl
    //
    // Returns true when the finding was actually kept. Past the findings
    // cap the address is still remembered (so dedup and counters stay
    // correct) but the finding itself is dropped to bound memory.
    pub fn record_finding(&mut self, finding: EmailFinding) -> bool {
        let key = finding.address.to_lowercase();
        if !self.found_emails.insert(key) {
            return false;
        }

        self.stats.emails_found += 1;
        if finding.is_hr_related {
            self.stats.hr_emails_found += 1;
        }

        if self.findings.len() >= self.max_findings {
            self.findings_dropped += 1;
            tracing::warn!(
                seed = %self.seed_url,
                dropped = self.findings_dropped,
                "findings cap reached, dropping finding"
            );
            return true;
        }

        self.findings.push(finding);
        true
    }

    pub fn findings(&self) -> &[EmailFinding] {
        &self.findings
    }

    /// Consumes the session, yielding its findings, errors, and knowledge
    pub fn finish(self) -> (Vec<EmailFinding>, Vec<String>, ClassificationKnowledge) {
        (self.findings, self.errors, self.knowledge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> CrawlSession {
        CrawlSession::new("https://acme.com/", ClassificationKnowledge::new(2), 100)
    }

    fn finding(address: &str) -> EmailFinding {
        EmailFinding {
            address: address.to_lowercase(),
            source_url: "https://acme.com/".to_string(),
            context: "ctx".to_string(),
            is_hr_related: false,
            confidence: 0.0,
        }
    }

    #[test]
    fn test_case_insensitive_dedup() {
        let mut session = session();
        assert!(session.record_finding(finding("Jobs@Acme.com")));
        assert!(!session.record_finding(finding("jobs@acme.com")));
        assert_eq!(session.findings().len(), 1);
        assert_eq!(session.stats.emails_found, 1);
    }

    #[test]
    fn test_findings_cap() {
        let mut session =
            CrawlSession::new("https://acme.com/", ClassificationKnowledge::new(2), 2);
        assert!(session.record_finding(finding("a@acme.com")));
        assert!(session.record_finding(finding("b@acme.com")));
        // Still counted as found, but not kept in memory
        assert!(session.record_finding(finding("c@acme.com")));
        assert_eq!(session.findings().len(), 2);
        assert_eq!(session.stats.emails_found, 3);
        // And still deduplicated
        assert!(!session.record_finding(finding("c@acme.com")));
    }

    #[test]
    fn test_extraction_order_groups_and_caps() {
        let mut session = session();
        session.catalog_page("https://acme.com/news", Priority::Low);
        session.catalog_page("https://acme.com/careers", Priority::Critical);
        session.catalog_page("https://acme.com/contact", Priority::Medium);
        session.mark_page_with_emails("https://acme.com/news");

        let order = session.extraction_order(10);
        assert_eq!(
            order,
            vec![
                "https://acme.com/careers",
                "https://acme.com/news", // has emails: ahead of high-value
                "https://acme.com/contact",
            ]
        );

        // The page-with-emails entry isn't duplicated when it shows up in
        // its tier group again, and the budget caps the list
        let capped = session.extraction_order(1);
        assert_eq!(capped, vec!["https://acme.com/careers"]);
    }

    #[test]
    fn test_visited_reset_between_phases() {
        let mut session = session();
        assert!(session.mark_visited("https://acme.com/a"));
        assert!(!session.mark_visited("https://acme.com/a"));
        session.reset_visited();
        assert!(session.mark_visited("https://acme.com/a"));
    }
}
