// src/crawl/orchestrator.rs
// =============================================================================
// The two-phase crawl state machine.
//
// Per seed URL: Start -> Discovery -> Extraction -> Completed | Failed
//
// - Start: validate the URL, build a fresh session. A malformed seed fails
//   only that seed; the rest of the batch continues.
// - Discovery: drain the frontier in priority order up to the discovery
//   budget. Each page gets fetched, its tier catalogued, its links fed back
//   into the frontier. Critical pages get an opportunistic quick email scan
//   so a careers-page address is never lost to a later budget cut.
// - Extraction: re-walk the catalogued pages (critical first, then pages
//   known to hold emails, then high-value, then the rest) up to the
//   remaining budget, doing full extraction + classification + adaptive
//   learning on each. New HR addresses go straight to the store.
// - Completed: stats plus all findings. Every page failing to fetch is
//   still a Completed crawl - per-page failures land in the error list,
//   never abort the run.
//
// Multiple seeds run sequentially by default, or concurrently (bounded)
// when configured; each seed owns its session, so there is no shared
// mutable state between them.
// =============================================================================

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

use crate::classify::ClassificationKnowledge;
use crate::config::CrawlConfig;
use crate::events::{Phase, ProgressEvent, ProgressSink};
use crate::extract::{extract_emails, extract_links, EmailFinding};
use crate::fetcher::{PageFetcher, Renderer, RetryPolicy};
use crate::store::{EmailStore, StoreStatus};

use super::frontier::{classify_priority, Frontier, Priority};
use super::session::{AggregateStats, CrawlSession, CrawlStats};

// A crawl request: transport-agnostic, shaped for JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlRequest {
    pub seed_urls: Vec<String>,
    /// Overrides the configured per-seed page budget when set
    pub max_pages_per_seed: Option<usize>,
    /// Use the larger thorough-mode page budget
    #[serde(default)]
    pub thorough: bool,
}

// Everything one seed produced
#[derive(Debug, Clone, Serialize)]
pub struct SeedResult {
    pub seed_url: String,
    pub stats: CrawlStats,
    pub findings: Vec<EmailFinding>,
    pub errors: Vec<String>,
}

// The full response for a batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlResponse {
    pub seed_results: Vec<SeedResult>,
    pub aggregate: AggregateStats,
    /// Request-level errors (malformed seed URLs); per-page errors live in
    /// each seed's result
    pub errors: Vec<String>,
}

// Drives crawls: owns the fetcher, the store handle, and the progress sink
pub struct Orchestrator {
    fetcher: PageFetcher,
    store: Arc<dyn EmailStore>,
    sink: Arc<dyn ProgressSink>,
    config: CrawlConfig,
}

impl Orchestrator {
    pub fn new(
        config: CrawlConfig,
        store: Arc<dyn EmailStore>,
        sink: Arc<dyn ProgressSink>,
    ) -> anyhow::Result<Self> {
        let fetcher = PageFetcher::new(config.fetch_timeout(), config.max_body_bytes)?;
        Ok(Orchestrator {
            fetcher,
            store,
            sink,
            config,
        })
    }

    /// Attach a headless-browser collaborator for JS-rendered sites
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.fetcher = self.fetcher.with_renderer(renderer);
        self
    }

    // Runs a whole batch of seeds
    //
    // Always returns a response object - partial findings plus an error
    // list - even when every page fetch failed.
    pub async fn run(&self, request: CrawlRequest) -> CrawlResponse {
        self.sink.emit(&ProgressEvent::CrawlStarted {
            seed_count: request.seed_urls.len(),
        });

        // An explicit per-request budget wins; otherwise thorough mode
        // picks between the two configured budgets
        let max_pages = request
            .max_pages_per_seed
            .unwrap_or_else(|| self.config.effective_max_pages(request.thorough));

        let mut response = CrawlResponse::default();

        // Start: validate every seed up front. A bad URL fails that seed
        // only and the batch moves on.
        let mut valid_seeds = Vec::new();
        for seed in &request.seed_urls {
            match Url::parse(seed) {
                Ok(_) => valid_seeds.push(seed.clone()),
                Err(e) => {
                    let message = format!("Invalid URL format: {} ({})", seed, e);
                    self.sink.emit(&ProgressEvent::SeedFailed {
                        seed_url: seed.clone(),
                        error: message.clone(),
                    });
                    response.errors.push(message);
                    response.aggregate.seeds_failed += 1;
                }
            }
        }

        if self.config.share_knowledge_across_seeds || self.config.max_concurrent_seeds <= 1 {
            // Sequential path; also the only way knowledge can be carried
            // from one seed to the next
            let mut knowledge =
                ClassificationKnowledge::new(self.config.edit_distance_threshold);
            for seed in valid_seeds {
                let (result, returned) = self.run_seed(&seed, max_pages, knowledge).await;
                knowledge = if self.config.share_knowledge_across_seeds {
                    returned
                } else {
                    ClassificationKnowledge::new(self.config.edit_distance_threshold)
                };
                response.aggregate.absorb(&result.stats);
                response.seed_results.push(result);
            }
        } else {
            // Bounded concurrency across seeds; each gets fresh knowledge
            let threshold = self.config.edit_distance_threshold;
            let results: Vec<(SeedResult, ClassificationKnowledge)> =
                stream::iter(valid_seeds)
                    .map(|seed| async move {
                        self.run_seed(&seed, max_pages, ClassificationKnowledge::new(threshold))
                            .await
                    })
                    .buffered(self.config.max_concurrent_seeds)
                    .collect()
                    .await;
            for (result, _) in results {
                response.aggregate.absorb(&result.stats);
                response.seed_results.push(result);
            }
        }

        self.sink.emit(&ProgressEvent::CrawlCompleted {
            stats: response.aggregate.clone(),
        });
        response
    }

    // Runs the full state machine for one seed, returning its result and
    // the (possibly grown) classification knowledge
    async fn run_seed(
        &self,
        seed_url: &str,
        max_pages: usize,
        knowledge: ClassificationKnowledge,
    ) -> (SeedResult, ClassificationKnowledge) {
        let started = Instant::now();
        self.sink.emit(&ProgressEvent::SeedStarted {
            seed_url: seed_url.to_string(),
            max_pages,
        });

        let mut session =
            CrawlSession::new(seed_url, knowledge, self.config.max_findings_per_seed);
        let discovery_budget = self.config.discovery_budget(max_pages);

        self.discovery_phase(&mut session, seed_url, discovery_budget).await;

        // Phase 2 re-walks catalogued pages, so the visited set starts over
        session.reset_visited();
        let remaining = max_pages.saturating_sub(session.stats.pages_scanned);
        self.extraction_phase(&mut session, remaining).await;

        session.stats.duration_secs = started.elapsed().as_secs();
        self.sink.emit(&ProgressEvent::SeedCompleted {
            seed_url: seed_url.to_string(),
            stats: session.stats.clone(),
        });

        let stats = session.stats.clone();
        let (findings, errors, knowledge) = session.finish();
        (
            SeedResult {
                seed_url: seed_url.to_string(),
                stats,
                findings,
                errors,
            },
            knowledge,
        )
    }

    // Phase 1: map the site, tier its URLs, quick-scan critical pages
    async fn discovery_phase(
        &self,
        session: &mut CrawlSession,
        seed_url: &str,
        discovery_budget: usize,
    ) {
        let mut frontier = Frontier::new();
        frontier.insert(seed_url.to_string(), &session.visited);

        let mut scanned = 0usize;
        while scanned < discovery_budget {
            let (url, priority) = match frontier.pop() {
                Some(next) => next,
                None => break,
            };
            if !session.mark_visited(&url) {
                continue;
            }
            scanned += 1;

            self.pace(priority).await;

            let mut emails_on_page = 0;
            match self.fetcher.fetch(&url, self.retry_policy(priority)).await {
                Some(page) => {
                    session.catalog_page(&url, priority);

                    // Opportunistic scan: an HR address on a critical page
                    // is stored right away instead of waiting for phase 2
                    if priority == Priority::Critical {
                        let findings =
                            extract_emails(&page.html, &url, self.config.context_max_len);
                        emails_on_page = findings.len();
                        if !findings.is_empty() {
                            session.mark_page_with_emails(&url);
                        }
                        for finding in findings {
                            if !finding.is_hr_related {
                                continue;
                            }
                            session.knowledge.learn(&finding);
                            if session.is_new_email(&finding.address) {
                                self.sink.emit(&ProgressEvent::EmailDiscovered {
                                    seed_url: session.seed_url.clone(),
                                    address: finding.address.clone(),
                                    is_hr_related: true,
                                });
                                self.persist(session, &finding).await;
                                session.record_finding(finding);
                            }
                        }
                    }

                    for link in extract_links(&page.html, &url) {
                        frontier.insert(link, &session.visited);
                    }
                }
                None => {
                    session.note_error(format!("Failed to fetch during discovery: {}", url));
                }
            }

            session.stats.pages_scanned += 1;
            self.sink.emit(&ProgressEvent::PageScanned {
                seed_url: session.seed_url.clone(),
                page_url: url,
                priority,
                phase: Phase::Discovery,
                emails_on_page,
                pages_scanned: session.stats.pages_scanned,
            });
        }
    }

    // Phase 2: full extraction over the catalogued, prioritized pages
    async fn extraction_phase(&self, session: &mut CrawlSession, budget: usize) {
        let order = session.extraction_order(budget);
        debug!(
            seed = %session.seed_url,
            pages = order.len(),
            "starting extraction phase"
        );

        let mut since_checkpoint = 0usize;
        for url in order {
            if !session.mark_visited(&url) {
                continue;
            }
            let priority = classify_priority(&url);

            self.pace(priority).await;

            let mut emails_on_page = 0;
            match self.fetcher.fetch(&url, self.retry_policy(priority)).await {
                Some(page) => {
                    let findings = extract_emails(&page.html, &url, self.config.context_max_len);
                    emails_on_page = findings.len();

                    for finding in findings {
                        // Learn from static-rule hits, then give the misses
                        // a second chance against what we've learned
                        let finding = if finding.is_hr_related {
                            session.knowledge.learn(&finding);
                            finding
                        } else {
                            session.knowledge.reclassify(finding)
                        };

                        if session.is_new_email(&finding.address) {
                            self.sink.emit(&ProgressEvent::EmailDiscovered {
                                seed_url: session.seed_url.clone(),
                                address: finding.address.clone(),
                                is_hr_related: finding.is_hr_related,
                            });
                            if finding.is_hr_related {
                                self.persist(session, &finding).await;
                            }
                            session.record_finding(finding);
                        }
                    }
                }
                None => {
                    session.note_error(format!("Failed to fetch: {}", url));
                }
            }

            session.stats.pages_scanned += 1;
            self.sink.emit(&ProgressEvent::PageScanned {
                seed_url: session.seed_url.clone(),
                page_url: url,
                priority,
                phase: Phase::Extraction,
                emails_on_page,
                pages_scanned: session.stats.pages_scanned,
            });

            since_checkpoint += 1;
            if since_checkpoint >= self.config.progress_every_pages {
                since_checkpoint = 0;
                self.sink.emit(&ProgressEvent::Checkpoint {
                    seed_url: session.seed_url.clone(),
                    pages_scanned: session.stats.pages_scanned,
                    emails_found: session.stats.emails_found,
                    emails_stored: session.stats.emails_stored,
                });
            }
        }
    }

    // Hands one HR finding to the store; storage failure is logged and
    // counted, never fatal. The address stays in the found set either way
    // so it isn't retried pointlessly within this run.
    async fn persist(&self, session: &mut CrawlSession, finding: &EmailFinding) {
        match self.store.store_email(finding).await {
            Ok(outcome) => match outcome.status {
                StoreStatus::Inserted => {
                    session.stats.emails_stored += 1;
                    debug!(address = %finding.address, "stored");
                }
                StoreStatus::Exists => {
                    debug!(address = %finding.address, "already in store");
                }
            },
            Err(e) => {
                session.note_error(format!("Failed to store {}: {}", finding.address, e));
            }
        }
    }

    // Courtesy delay between fetches; critical pages wait less. Zero in
    // tests.
    async fn pace(&self, priority: Priority) {
        let delay_ms = if priority == Priority::Critical {
            self.config.critical_page_delay_ms
        } else {
            self.config.regular_page_delay_ms
        };
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    fn retry_policy(&self, priority: Priority) -> RetryPolicy {
        let retries = if priority == Priority::Critical {
            self.config.critical_page_retries
        } else {
            self.config.max_retries
        };
        RetryPolicy::new(
            retries,
            Duration::from_millis(self.config.backoff_base_ms),
            self.config.backoff_jitter,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullSink;
    use crate::store::MemoryStore;

    fn orchestrator(store: Arc<MemoryStore>) -> Orchestrator {
        Orchestrator::new(CrawlConfig::for_tests(), store, Arc::new(NullSink)).unwrap()
    }

    // Records every emitted event for sequence assertions
    #[derive(Default)]
    struct CapturingSink(std::sync::Mutex<Vec<ProgressEvent>>);

    impl ProgressSink for CapturingSink {
        fn emit(&self, event: &ProgressEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[tokio::test]
    async fn test_full_two_phase_crawl() {
        let mut server = mockito::Server::new_async().await;

        let _root = server
            .mock("GET", "/")
            .with_header("content-type", "text/html")
            .with_body(
                r#"<html><body>
                    <a href="/careers">Careers</a>
                    <a href="/team">Team</a>
                    <a href="https://elsewhere.example/jobs">External</a>
                    <a href="/logo.png">Logo</a>
                </body></html>"#,
            )
            .create_async()
            .await;
        let _careers = server
            .mock("GET", "/careers")
            .with_header("content-type", "text/html")
            .with_body(r#"<a href="mailto:jobs@acme-corp.com">Apply here</a>"#)
            .create_async()
            .await;
        let _team = server
            .mock("GET", "/team")
            .with_header("content-type", "text/html")
            .with_body(r#"<p>Questions about openings? recruiting@acme-corp.com</p>"#)
            .create_async()
            .await;

        let store = Arc::new(MemoryStore::new());
        let orchestrator = orchestrator(store.clone());

        let response = orchestrator
            .run(CrawlRequest {
                seed_urls: vec![format!("{}/", server.url())],
                max_pages_per_seed: Some(10),
                thorough: false,
            })
            .await;

        assert!(response.errors.is_empty());
        assert_eq!(response.seed_results.len(), 1);

        let result = &response.seed_results[0];
        // 3 discovery pages + the same 3 re-walked in extraction
        assert_eq!(result.stats.pages_scanned, 6);
        assert_eq!(result.stats.emails_found, 2);
        assert_eq!(result.stats.hr_emails_found, 2);
        assert_eq!(result.stats.emails_stored, 2);
        assert!(result.errors.is_empty());

        let addresses: Vec<&str> =
            result.findings.iter().map(|f| f.address.as_str()).collect();
        assert!(addresses.contains(&"jobs@acme-corp.com"));
        assert!(addresses.contains(&"recruiting@acme-corp.com"));

        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_event_stream_and_checkpoint_cadence() {
        let mut server = mockito::Server::new_async().await;

        let _root = server
            .mock("GET", "/")
            .with_header("content-type", "text/html")
            .with_body(
                r#"<a href="/p1">1</a><a href="/p2">2</a><a href="/p3">3</a>
                   <a href="/p4">4</a><a href="/p5">5</a>"#,
            )
            .create_async()
            .await;
        let mut page_mocks = Vec::new();
        for n in 1..=5 {
            let mock = server
                .mock("GET", format!("/p{}", n).as_str())
                .with_header("content-type", "text/html")
                .with_body("<p>nothing here</p>")
                .create_async()
                .await;
            page_mocks.push(mock);
        }

        let sink = Arc::new(CapturingSink::default());
        let store = Arc::new(MemoryStore::new());
        let orchestrator =
            Orchestrator::new(CrawlConfig::for_tests(), store, sink.clone()).unwrap();

        orchestrator
            .run(CrawlRequest {
                seed_urls: vec![format!("{}/", server.url())],
                max_pages_per_seed: Some(20),
                thorough: false,
            })
            .await;

        let events = sink.0.lock().unwrap();
        assert!(matches!(
            events.first(),
            Some(ProgressEvent::CrawlStarted { seed_count: 1 })
        ));
        assert!(matches!(events.get(1), Some(ProgressEvent::SeedStarted { .. })));
        assert!(matches!(
            events.get(events.len() - 2),
            Some(ProgressEvent::SeedCompleted { .. })
        ));
        assert!(matches!(events.last(), Some(ProgressEvent::CrawlCompleted { .. })));

        // 6 pages mapped in discovery, the same 6 re-walked in extraction
        let scanned = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::PageScanned { .. }))
            .count();
        assert_eq!(scanned, 12);

        // 6 extraction pages at a cadence of 5 -> exactly one checkpoint,
        // fired after the 5th extraction page (6 discovery + 5 = 11)
        let checkpoints: Vec<&ProgressEvent> = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Checkpoint { .. }))
            .collect();
        assert_eq!(checkpoints.len(), 1);
        if let ProgressEvent::Checkpoint { pages_scanned, .. } = checkpoints[0] {
            assert_eq!(*pages_scanned, 11);
        }
    }

    #[tokio::test]
    async fn test_invalid_seed_fails_alone_batch_continues() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/")
            .with_header("content-type", "text/html")
            .with_body("<p>hr@acme-corp.com</p>")
            .create_async()
            .await;

        let store = Arc::new(MemoryStore::new());
        let orchestrator = orchestrator(store.clone());

        let response = orchestrator
            .run(CrawlRequest {
                seed_urls: vec!["not a url".to_string(), format!("{}/", server.url())],
                max_pages_per_seed: Some(4),
                thorough: false,
            })
            .await;

        // The malformed seed is a request-level error; the good seed ran
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.aggregate.seeds_failed, 1);
        assert_eq!(response.aggregate.seeds_processed, 1);
        assert_eq!(response.seed_results.len(), 1);
        assert_eq!(response.seed_results[0].stats.emails_found, 1);
    }

    #[tokio::test]
    async fn test_all_fetches_failing_still_completes() {
        let mut server = mockito::Server::new_async().await;
        let _broken = server
            .mock("GET", "/")
            .with_status(500)
            .create_async()
            .await;

        let store = Arc::new(MemoryStore::new());
        let orchestrator = orchestrator(store.clone());

        let response = orchestrator
            .run(CrawlRequest {
                seed_urls: vec![format!("{}/", server.url())],
                max_pages_per_seed: Some(4),
                thorough: false,
            })
            .await;

        // Zero successful pages is a valid, non-exceptional outcome
        assert!(response.errors.is_empty());
        let result = &response.seed_results[0];
        assert_eq!(result.stats.pages_scanned, 1);
        assert_eq!(result.stats.emails_found, 0);
        assert_eq!(result.errors.len(), 1);
        assert!(result.findings.is_empty());
    }

    struct StaticRenderer(String);

    #[async_trait::async_trait]
    impl Renderer for StaticRenderer {
        async fn render(&self, _url: &str) -> Option<String> {
            Some(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_renderer_backed_crawl() {
        // No HTTP server at all: every page comes from the renderer
        let store = Arc::new(MemoryStore::new());
        let orchestrator = orchestrator(store.clone()).with_renderer(Arc::new(
            StaticRenderer("<p>recruiting@acme-corp.com</p>".to_string()),
        ));

        let response = orchestrator
            .run(CrawlRequest {
                seed_urls: vec!["https://acme-corp.example/".to_string()],
                max_pages_per_seed: Some(4),
                thorough: false,
            })
            .await;

        let result = &response.seed_results[0];
        assert_eq!(result.stats.emails_found, 1);
        assert_eq!(result.stats.hr_emails_found, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_adaptive_reclassification_across_pages() {
        let mut server = mockito::Server::new_async().await;

        // Discovery order is priority-driven: /careers (critical) is scanned
        // before /misc, so its confirmed HR address seeds the knowledge that
        // later upgrades the near-miss "carers@" local part
        let _root = server
            .mock("GET", "/")
            .with_header("content-type", "text/html")
            .with_body(
                r#"<a href="/careers">Careers</a><a href="/misc">Misc</a>"#,
            )
            .create_async()
            .await;
        let _careers = server
            .mock("GET", "/careers")
            .with_header("content-type", "text/html")
            .with_body(r#"<p>careers@acme-corp.com</p>"#)
            .create_async()
            .await;
        let _misc = server
            .mock("GET", "/misc")
            .with_header("content-type", "text/html")
            .with_body(r#"<p>carers@other-domain.org</p>"#)
            .create_async()
            .await;

        let store = Arc::new(MemoryStore::new());
        let orchestrator = orchestrator(store.clone());

        let response = orchestrator
            .run(CrawlRequest {
                seed_urls: vec![format!("{}/", server.url())],
                max_pages_per_seed: Some(10),
                thorough: false,
            })
            .await;

        let result = &response.seed_results[0];
        let upgraded = result
            .findings
            .iter()
            .find(|f| f.address == "carers@other-domain.org")
            .expect("near-miss address should be found");
        assert!(upgraded.is_hr_related);
        assert!(upgraded.context.contains("Reclassified as HR"));
        assert_eq!(result.stats.hr_emails_found, 2);
    }
}
