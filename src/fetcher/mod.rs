// src/fetcher/mod.rs
// =============================================================================
// This module retrieves raw HTML for URLs.
//
// Submodules:
// - retry: One retry policy (max attempts + exponential backoff) shared by
//   every fetch path, instead of ad-hoc loops per call site
// - http: The PageFetcher itself - browser-like headers, timeouts,
//   content-type and size guards
// - render: The optional headless-browser collaborator contract, for pages
//   that only exist after client-side scripts run
//
// The one rule of this module: fetching never throws. A page that cannot be
// retrieved is reported as None so the crawl loop stays a total function.
// =============================================================================

mod http;
mod render;
mod retry;

pub use http::PageFetcher;
pub use render::Renderer;
pub use retry::RetryPolicy;
