// src/fetcher/http.rs
// =============================================================================
// The page fetcher: URL in, HTML-or-None out.
//
// Key behavior:
// - Sends a realistic browser-like request signature (some sites serve
//   stripped-down pages to obvious bots)
// - Retries transport failures with exponential backoff via RetryPolicy
// - Rejects non-HTML content types WITHOUT downloading the body
// - Rejects bodies over the configured byte ceiling, aborting mid-download
//   if the server didn't declare a Content-Length
// - Never returns an error: all failure modes collapse to None, so the
//   crawl loop treats "page unavailable" as a normal, non-exceptional value
//
// When a Renderer collaborator is configured (for client-side-rendered
// sites), we ask it first and fall back to plain HTTP if it comes up empty.
// =============================================================================

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::render::Renderer;
use super::retry::RetryPolicy;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

// One successfully fetched page
//
// Ephemeral: owned by the fetch call, consumed by the orchestrator for that
// iteration, never persisted.
#[derive(Debug, Clone)]
pub struct PageResult {
    /// The URL that was fetched
    pub url: String,
    /// The page HTML
    pub html: String,
    /// How many attempts it took (1 = first try succeeded)
    pub attempts: u32,
    /// Wall-clock time spent across all attempts
    pub elapsed: Duration,
}

// Fetches pages with retries, timeouts, and size caps
pub struct PageFetcher {
    client: Client,
    max_body_bytes: usize,
    renderer: Option<Arc<dyn Renderer>>,
}

impl PageFetcher {
    // Builds the fetcher with a shared connection-pooling client
    //
    // Parameters:
    //   timeout: per-attempt timeout
    //   max_body_bytes: reject any body larger than this
    pub fn new(timeout: Duration, max_body_bytes: usize) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .default_headers(headers)
            .build()?;

        Ok(PageFetcher {
            client,
            max_body_bytes,
            renderer: None,
        })
    }

    /// Attach a headless-browser collaborator for JS-rendered pages
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    // Fetches a page, retrying per the given policy
    //
    // Returns Some(PageResult) on success, None after all attempts are
    // exhausted or when the content is not an acceptable HTML document.
    // This function never errors - failure is a value here.
    pub async fn fetch(&self, url: &str, policy: RetryPolicy) -> Option<PageResult> {
        let started = Instant::now();

        // A rendered page, if we have a renderer and it produced one,
        // satisfies the same contract as a plain fetch
        if let Some(renderer) = &self.renderer {
            if let Some(html) = renderer.render(url).await {
                return Some(PageResult {
                    url: url.to_string(),
                    html,
                    attempts: 1,
                    elapsed: started.elapsed(),
                });
            }
            debug!(url, "renderer returned nothing, falling back to plain HTTP");
        }

        for attempt in 0..policy.total_attempts() {
            debug!(
                url,
                attempt = attempt + 1,
                total = policy.total_attempts(),
                "fetching"
            );

            match self.fetch_once(url).await {
                FetchOutcome::Html(html) => {
                    return Some(PageResult {
                        url: url.to_string(),
                        html,
                        attempts: attempt + 1,
                        elapsed: started.elapsed(),
                    });
                }
                FetchOutcome::Rejected(reason) => {
                    // Wrong content type or oversized body - retrying would
                    // just download the same thing again
                    debug!(url, reason, "rejected response");
                    return None;
                }
                FetchOutcome::Failed(reason) => {
                    warn!(
                        url,
                        attempt = attempt + 1,
                        total = policy.total_attempts(),
                        reason,
                        "fetch attempt failed"
                    );
                    if attempt + 1 < policy.total_attempts() {
                        tokio::time::sleep(policy.delay_for(attempt)).await;
                    }
                }
            }
        }

        None
    }

    // One GET attempt with content-type and size guards
    async fn fetch_once(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                let reason = if e.is_timeout() {
                    "timeout".to_string()
                } else {
                    e.to_string()
                };
                return FetchOutcome::Failed(reason);
            }
        };

        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::Failed(format!("HTTP {}", status.as_u16()));
        }

        // Probe the headers before touching the body: a PDF or a zip is
        // rejected here without a single body byte downloaded
        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            let content_type = content_type.to_str().unwrap_or("").to_lowercase();
            if !content_type.is_empty()
                && !content_type.contains("html")
                && !content_type.contains("xml")
            {
                return FetchOutcome::Rejected(format!("non-document content type: {}", content_type));
            }
        }

        if let Some(declared) = response.content_length() {
            if declared as usize > self.max_body_bytes {
                return FetchOutcome::Rejected(format!("declared body size {} over limit", declared));
            }
        }

        // Stream the body so we can abort as soon as it exceeds the cap,
        // even when the server didn't declare a Content-Length
        let mut body: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => {
                    if body.len() + chunk.len() > self.max_body_bytes {
                        return FetchOutcome::Rejected("body exceeded size limit".to_string());
                    }
                    body.extend_from_slice(&chunk);
                }
                Err(e) => return FetchOutcome::Failed(e.to_string()),
            }
        }

        FetchOutcome::Html(String::from_utf8_lossy(&body).into_owned())
    }
}

// Internal result of a single attempt
//
// Failed is retryable (network hiccup, server error); Rejected is not
// (the content itself is unacceptable).
enum FetchOutcome {
    Html(String),
    Rejected(String),
    Failed(String),
}
