// src/extract/links.rs
// =============================================================================
// This module extracts crawlable links from a page.
//
// Rules, in order:
// 1. Resolve every <a href> against the page URL (relative links included)
// 2. Drop fragments, mailto:/tel:/javascript:, and anything unparsable
// 3. Keep only http/https links on the SAME hostname - this crawler never
//    leaves the target site
// 4. Drop file downloads (.pdf, .zip, images, media, ...) - they're not
//    HTML documents so there's nothing to crawl in them
// 5. Drop path patterns that historically carry no HR signal (cart/checkout,
//    auth flows, CMS internals, legal boilerplate, blog archives) - this
//    list is a precision/recall tuning knob, not a correctness requirement
//
// The result is deduplicated; ordering is irrelevant because the frontier
// re-prioritizes everything downstream.
// =============================================================================

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

// File extensions that can't contain crawlable HTML
const EXCLUDED_EXTENSIONS: &[&str] = &[
    // Documents
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".csv",
    // Images
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico", ".bmp",
    // Audio / video
    ".mp4", ".mp3", ".avi", ".mov", ".wav", ".webm", ".ogg",
    // Archives
    ".zip", ".rar", ".tar", ".gz", ".7z",
    // Fonts, styles, scripts
    ".woff", ".woff2", ".ttf", ".eot", ".css", ".js",
];

// Path substrings that rarely lead to HR contact info
const EXCLUDED_PATH_PATTERNS: &[&str] = &[
    // CMS / admin internals
    "/wp-admin", "/wp-login", "/wp-json", "/wp-content/uploads", "/cgi-bin",
    // Shopping flows
    "/cart", "/checkout", "/basket", "/add-to-cart",
    // Auth flows
    "/login", "/signin", "/sign-in", "/signup", "/sign-up", "/register", "/logout",
    // Legal boilerplate
    "/privacy", "/terms", "/cookie-policy", "/legal/",
    // Media and blog archives
    "/blog/tag/", "/blog/category/", "/category/", "/tag/", "/feed", "/rss",
];

// Extracts all crawlable same-domain links from a page
//
// Parameters:
//   html: the page HTML
//   base_url: the URL the page was fetched from (for resolving relative links)
//
// Returns: deduplicated Vec of absolute URLs on the same hostname
pub fn extract_links(html: &str, base_url: &str) -> Vec<String> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let base = match Url::parse(base_url) {
        Ok(url) => url,
        Err(_) => return links,
    };
    let base_host = match base.host_str() {
        Some(host) => host.to_string(),
        None => return links,
    };

    let document = Html::parse_document(html);

    for element in document.select(&ANCHOR_SELECTOR) {
        let href = match element.value().attr("href") {
            Some(href) => href,
            None => continue,
        };

        // Strip the fragment; a bare "#section" leaves nothing to crawl
        let href = href.split('#').next().unwrap_or("");
        if href.is_empty() {
            continue;
        }

        let resolved = match base.join(href) {
            Ok(url) => url,
            Err(_) => continue,
        };

        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }

        // Same-hostname restriction: never expand across domains
        if resolved.host_str() != Some(base_host.as_str()) {
            continue;
        }

        if is_excluded_path(resolved.path()) {
            continue;
        }

        let mut resolved = resolved;
        resolved.set_fragment(None);
        let absolute = resolved.to_string();

        if seen.insert(absolute.clone()) {
            links.push(absolute);
        }
    }

    links
}

// True if the path points at a non-document file or a low-signal section
fn is_excluded_path(path: &str) -> bool {
    let path = path.to_lowercase();

    if EXCLUDED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return true;
    }

    EXCLUDED_PATH_PATTERNS
        .iter()
        .any(|pattern| path.contains(pattern))
}
