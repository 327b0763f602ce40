// src/extract/mod.rs
// =============================================================================
// This module pulls structure out of fetched HTML.
//
// Submodules:
// - links: Finds same-domain links worth crawling next (and filters out the
//   ones that aren't documents or carry no HR signal)
// - emails: Finds email addresses in page text, captures the surrounding
//   context, and classifies each one as HR-related or not
//
// Both submodules are pure functions over (html, url) - no network, no
// shared state - which keeps them trivially testable.
// =============================================================================

mod emails;
mod links;

pub use emails::{extract_emails, EmailFinding};
pub use links::extract_links;
