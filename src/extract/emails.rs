// src/extract/emails.rs
// =============================================================================
// This module finds email addresses in a page and classifies them.
//
// Extraction walks the DOM in document order (the same order a person
// reading the page would see things) and looks at three sources:
// 1. mailto: links - the most explicit way a page publishes an address
// 2. Text nodes - addresses written out in the page copy
// 3. A raw-text regex sweep as a fallback when the DOM walk found nothing
//    (malformed markup, addresses hiding in comments or scripts)
//
// For every address we capture the enclosing element's inner HTML as
// context (truncated to a configured length) - that context feeds the
// classifier and survives into the store for auditability.
//
// Findings are immutable values. Later stages that want to change a
// classification go through EmailFinding::upgrade, which returns a new
// value and can only ever move non-HR -> HR, never the other way.
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::HashSet;

use crate::classify::rules;

// local-part@domain.tld with a length-bounded alphabetic TLD
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

static MAILTO_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href^='mailto:']").unwrap());

// Every element in the body, in document order, body itself included so
// stray top-level text nodes aren't missed
static BODY_ELEMENTS_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body, body *").unwrap());

const NO_CONTEXT: &str = "No context found";

// One extracted, classified email address
#[derive(Debug, Clone, Serialize)]
pub struct EmailFinding {
    /// The address, lowercased
    pub address: String,
    /// The page it was found on
    pub source_url: String,
    /// Trimmed inner HTML of the enclosing element, length-bounded
    pub context: String,
    /// Whether this looks like an HR contact
    pub is_hr_related: bool,
    /// Accumulated classification confidence, 0.0..=1.0
    pub confidence: f32,
}

impl EmailFinding {
    // Returns an HR-classified copy of this finding
    //
    // The only way a classification changes after creation. Appends the
    // given audit note to the context and raises (never lowers) confidence
    // to the given floor.
    pub fn upgrade(mut self, note: &str, confidence_floor: f32) -> EmailFinding {
        self.is_hr_related = true;
        self.confidence = self.confidence.max(confidence_floor);
        if !note.is_empty() {
            self.context.push_str(note);
        }
        self
    }
}

// Extracts and classifies every email address on a page
//
// Parameters:
//   html: the page HTML
//   source_url: the URL the page came from (feeds classification)
//   context_max_len: maximum characters of context kept per finding
//
// Returns: all discovered addresses in document order, HR-related or not -
// downstream decides whether to filter. Deduplicated case-insensitively
// within the page.
pub fn extract_emails(html: &str, source_url: &str, context_max_len: usize) -> Vec<EmailFinding> {
    let mut findings: Vec<EmailFinding> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let document = Html::parse_document(html);

    // Pass 1: mailto links carry the address in an attribute, so a pure
    // text-node walk would miss them
    for anchor in document.select(&MAILTO_SELECTOR) {
        if let Some(href) = anchor.value().attr("href") {
            if let Some(raw) = href.strip_prefix("mailto:") {
                let address = raw.split('?').next().unwrap_or("").trim();
                if !address.is_empty() && EMAIL_RE.is_match(address) {
                    let context = element_context(anchor, context_max_len);
                    push_finding(&mut findings, &mut seen, address, source_url, context, context_max_len);
                }
            }
        }
    }

    // Pass 2: document-order walk over every element's direct text nodes
    for element in document.select(&BODY_ELEMENTS_SELECTOR) {
        for child in element.children() {
            let text = match child.value().as_text() {
                Some(text) => text,
                None => continue,
            };
            for m in EMAIL_RE.find_iter(text) {
                let context = element_context(element, context_max_len);
                push_finding(&mut findings, &mut seen, m.as_str(), source_url, context, context_max_len);
            }
        }
    }

    // Pass 3: degraded fallback. If the DOM walk produced nothing, sweep the
    // raw text so malformed markup doesn't cost us a page's findings.
    if findings.is_empty() {
        for m in EMAIL_RE.find_iter(html) {
            push_finding(
                &mut findings,
                &mut seen,
                m.as_str(),
                source_url,
                NO_CONTEXT.to_string(),
                context_max_len,
            );
        }
    }

    apply_page_overrides(findings, source_url)
}

// Classifies and appends one address, skipping per-page duplicates
fn push_finding(
    findings: &mut Vec<EmailFinding>,
    seen: &mut HashSet<String>,
    address: &str,
    source_url: &str,
    context: String,
    context_max_len: usize,
) {
    let address = address.to_lowercase();
    if !seen.insert(address.clone()) {
        return;
    }

    let context = if context.trim().is_empty() {
        NO_CONTEXT.to_string()
    } else {
        truncate(&context, context_max_len)
    };

    let local_part = address.split('@').next().unwrap_or("");
    let (is_hr_related, confidence) =
        rules::classify_address(local_part, &context.to_lowercase(), source_url);

    findings.push(EmailFinding {
        address,
        source_url: source_url.to_string(),
        context,
        is_hr_related,
        confidence,
    });
}

// Page-level overrides:
// - A careers page whose findings ALL came back non-HR promotes everything;
//   a careers page's contact emails are almost certainly HR-relevant.
// - A contact/about page with at most 3 findings promotes them too, with a
//   lower-confidence note - the general inbox often fields HR inquiries.
fn apply_page_overrides(findings: Vec<EmailFinding>, source_url: &str) -> Vec<EmailFinding> {
    if findings.is_empty() || findings.iter().any(|f| f.is_hr_related) {
        return findings;
    }

    if rules::is_careers_page(source_url) {
        findings
            .into_iter()
            .map(|f| f.upgrade("", 0.6))
            .collect()
    } else if rules::is_contact_page(source_url) && findings.len() <= 3 {
        findings
            .into_iter()
            .map(|f| f.upgrade(" [Found on contact page - may handle HR inquiries]", 0.3))
            .collect()
    } else {
        findings
    }
}

// The enclosing element's trimmed inner HTML, falling back to the parent's
fn element_context(element: ElementRef, max_len: usize) -> String {
    let own = element.inner_html().trim().to_string();
    if !own.is_empty() {
        return truncate(&own, max_len);
    }

    let parent_html = element
        .parent()
        .and_then(ElementRef::wrap)
        .map(|parent| parent.inner_html().trim().to_string())
        .unwrap_or_default();
    truncate(&parent_html, max_len)
}

// Character-safe truncation with a trailing ellipsis marker
fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_len).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_LEN: usize = 200;

    #[test]
    fn test_mailto_link_extracted_and_classified() {
        let html = r#"<html><body><a href="mailto:jobs@acme.com">Jobs</a></body></html>"#;
        let findings = extract_emails(html, "https://acme.com/careers", MAX_LEN);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].address, "jobs@acme.com");
        assert_eq!(findings[0].source_url, "https://acme.com/careers");
        assert!(findings[0].is_hr_related);
    }

    #[test]
    fn test_text_node_email_with_context() {
        let html = r#"<p>Send applications to our recruiter at talent@acme.com today</p>"#;
        let findings = extract_emails(html, "https://acme.com/team", MAX_LEN);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].address, "talent@acme.com");
        assert!(findings[0].context.contains("recruiter"));
        assert!(findings[0].is_hr_related);
    }

    #[test]
    fn test_careers_page_promotion() {
        // Only a generic address, no HR keywords anywhere - but the page URL
        // is a careers page, so the finding gets promoted
        let html = r#"<p>Reach us: info@acme.com</p>"#;
        let findings = extract_emails(html, "https://acme.com/careers/openings", MAX_LEN);

        assert_eq!(findings.len(), 1);
        assert!(findings[0].is_hr_related);
    }

    #[test]
    fn test_contact_page_promotion_with_note() {
        let html = r#"<p>Mail: info@acme.com</p>"#;
        let findings = extract_emails(html, "https://acme.com/contact", MAX_LEN);

        assert_eq!(findings.len(), 1);
        assert!(findings[0].is_hr_related);
        assert!(findings[0].context.contains("may handle HR inquiries"));
    }

    #[test]
    fn test_contact_page_with_many_findings_not_promoted() {
        let html = r#"
            <p>a@acme.com</p> <p>b@acme.com</p>
            <p>c@acme.com</p> <p>d@acme.com</p>
        "#;
        let findings = extract_emails(html, "https://acme.com/contact", MAX_LEN);

        assert_eq!(findings.len(), 4);
        assert!(findings.iter().all(|f| !f.is_hr_related));
    }

    #[test]
    fn test_case_insensitive_dedup_within_page() {
        let html = r#"<p>Jobs@Acme.com</p><p>jobs@acme.com</p>"#;
        let findings = extract_emails(html, "https://acme.com/", MAX_LEN);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].address, "jobs@acme.com");
    }

    #[test]
    fn test_all_addresses_returned_regardless_of_classification() {
        let html = r#"<p>hr@acme.com</p><p>webmaster@acme.com</p>"#;
        let findings = extract_emails(html, "https://acme.com/news", MAX_LEN);

        assert_eq!(findings.len(), 2);
        assert!(findings.iter().any(|f| f.is_hr_related));
        assert!(findings.iter().any(|f| !f.is_hr_related));
    }

    #[test]
    fn test_context_truncated() {
        let filler = "x".repeat(500);
        let html = format!("<p>{} hr@acme.com</p>", filler);
        let findings = extract_emails(&html, "https://acme.com/", 100);

        assert_eq!(findings.len(), 1);
        assert!(findings[0].context.chars().count() <= 103); // 100 + "..."
        assert!(findings[0].context.ends_with("..."));
    }

    #[test]
    fn test_fallback_raw_scan_finds_hidden_address() {
        // Address only present in a comment: invisible to the DOM walk,
        // caught by the raw-text fallback with the placeholder context
        let html = r#"<html><body><!-- escalate to hr@acme.com --><p>nothing</p></body></html>"#;
        let findings = extract_emails(html, "https://acme.com/", MAX_LEN);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].address, "hr@acme.com");
        assert_eq!(findings[0].context, "No context found");
    }

    #[test]
    fn test_upgrade_is_monotonic() {
        let finding = EmailFinding {
            address: "info@acme.com".to_string(),
            source_url: "https://acme.com/".to_string(),
            context: "ctx".to_string(),
            is_hr_related: false,
            confidence: 0.5,
        };
        let upgraded = finding.upgrade(" [note]", 0.3);
        assert!(upgraded.is_hr_related);
        // The floor never lowers an existing confidence
        assert_eq!(upgraded.confidence, 0.5);
        assert!(upgraded.context.ends_with(" [note]"));
    }
}
