// src/fetcher/render.rs
// =============================================================================
// The headless-browser collaborator contract.
//
// Some career portals render their content entirely with client-side
// JavaScript, so a plain GET returns an empty shell. For those sites the
// fetcher can delegate to a Renderer: something that navigates a real
// browser page, waits for the network to go idle (scrolling to trigger lazy
// content if needed), and hands back the rendered document.
//
// The browser's lifecycle (one instance, one page per fetch, page closed
// afterwards) is the implementor's concern. Toward the rest of the engine
// the contract is identical to a plain fetch: URL in, HTML-or-None out.
// =============================================================================

use async_trait::async_trait;

/// Renders a URL to its final HTML, or None when rendering fails.
///
/// Implementations live outside this crate (e.g. a chromiumoxide-backed
/// browser pool); tests use simple stubs.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str) -> Option<String>;
}
