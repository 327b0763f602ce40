// src/classify/rules.rs
// =============================================================================
// Static HR classification heuristics.
//
// An address is classified by OR-ing independent signals, each of which also
// contributes to a numeric confidence score:
//   (a) the local part contains an HR-indicative token ("recruit", "career")
//   (b) the local part IS a common HR mailbox name ("jobs", "hr", "careers")
//   (c) the local part is an HR token plus trailing digits ("careers2024")
//   (d) the surrounding page text mentions an HR keyword
//   (e) the page URL itself looks like a careers page
//
// On top of the per-address signals there are two page-level overrides
// (applied by the extractor): a careers page whose findings all came back
// non-HR promotes everything, and a contact/about page with at most three
// findings promotes them with a lower-confidence note.
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;

// Tokens that flag a local part as HR-related when they appear anywhere in it
const HR_LOCAL_TOKENS: &[&str] = &[
    "hr",
    "recruit",
    "career",
    "job",
    "talent",
    "people",
    "human",
    "resource",
    "hiring",
    "apply",
    "application",
    "personnel",
    "staffing",
];

// Whole local parts that are common HR mailbox names
const HR_MAILBOX_NAMES: &[&str] = &[
    "jobs",
    "job",
    "careers",
    "career",
    "hr",
    "recruiting",
    "recruitment",
    "recruit",
    "talent",
    "apply",
    "applications",
    "hiring",
    "employment",
    "vacancies",
    "personnel",
    "humanresources",
    "resumes",
    "resume",
    "cv",
];

// Keywords that flag the surrounding context as HR-related
const HR_CONTEXT_KEYWORDS: &[&str] = &[
    "human resource",
    "hr department",
    "recruitment",
    "recruiting",
    "career",
    "job",
    "apply",
    "hiring",
    "talent",
    "position",
    "employment",
    "opportunity",
    "application",
    "resume",
    "cv",
    "vacanc",
    "join our team",
];

// "careers2024", "jobs1", "hr2" - an HR token with trailing digits
static HR_TOKEN_DIGITS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)(jobs?|careers?|hr|recruit(?:ing|ment)?|talent|hiring|apply)\d+$").unwrap()
});

// Career/jobs page URLs - the strongest page-level signal
static CAREERS_PAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/(careers?|jobs?|employment|vacancies|opportunities|positions|openings|recruitment|hiring)(/|\.|$)")
        .unwrap()
});

// Contact/about page URLs - weaker, but general inboxes there often field
// HR inquiries too
static CONTACT_PAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/(contact|about)([-_]?us)?(/|\.|$)").unwrap());

// Signal weights; OR-ed signals accumulate into a confidence score.
// Heuristic tuning constants carried over from field use - no deeper rationale.
const WEIGHT_LOCAL_TOKEN: f32 = 0.4;
const WEIGHT_MAILBOX_NAME: f32 = 0.5;
const WEIGHT_TOKEN_DIGITS: f32 = 0.3;
const WEIGHT_CONTEXT: f32 = 0.2;
const WEIGHT_URL: f32 = 0.2;

// Classifies one address
//
// Parameters:
//   local_part: the part before the '@', already lowercased
//   context: surrounding page text, already lowercased
//   source_url: the page the address was found on
//
// Returns: (is_hr_related, confidence in 0.0..=1.0)
pub fn classify_address(local_part: &str, context: &str, source_url: &str) -> (bool, f32) {
    let mut confidence = 0.0f32;
    let mut is_hr = false;

    if HR_LOCAL_TOKENS.iter().any(|token| local_part.contains(token)) {
        confidence += WEIGHT_LOCAL_TOKEN;
        is_hr = true;
    }
    if HR_MAILBOX_NAMES.iter().any(|name| local_part == *name) {
        confidence += WEIGHT_MAILBOX_NAME;
        is_hr = true;
    }
    if HR_TOKEN_DIGITS_RE.is_match(local_part) {
        confidence += WEIGHT_TOKEN_DIGITS;
        is_hr = true;
    }
    if HR_CONTEXT_KEYWORDS.iter().any(|kw| context.contains(kw)) {
        confidence += WEIGHT_CONTEXT;
        is_hr = true;
    }
    // The URL signal only boosts confidence; an address on a careers page
    // isn't HR by itself, but it's worth more when other signals fired
    if is_careers_page(source_url) {
        confidence += WEIGHT_URL;
    }

    (is_hr, confidence.min(1.0))
}

/// True when the URL path looks like a careers/jobs page
pub fn is_careers_page(url: &str) -> bool {
    CAREERS_PAGE_RE.is_match(url)
}

/// True when the URL path looks like a contact or about page
pub fn is_contact_page(url: &str) -> bool {
    CONTACT_PAGE_RE.is_match(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_mailbox_names_classify_as_hr() {
        for local in ["jobs", "careers", "hr", "recruiting", "talent"] {
            let (is_hr, confidence) = classify_address(local, "", "https://acme.com/");
            assert!(is_hr, "{} should be HR", local);
            assert!(confidence >= 0.5);
        }
    }

    #[test]
    fn test_token_substring_matches() {
        let (is_hr, _) = classify_address("acme-recruiting-team", "", "https://acme.com/");
        assert!(is_hr);
    }

    #[test]
    fn test_token_with_trailing_digits() {
        let (is_hr, _) = classify_address("careers2024", "", "https://acme.com/x");
        assert!(is_hr);
    }

    #[test]
    fn test_context_keyword_classifies() {
        let (is_hr, confidence) =
            classify_address("info", "send your resume here", "https://acme.com/misc");
        assert!(is_hr);
        assert_eq!(confidence, 0.2);
    }

    #[test]
    fn test_careers_url_boosts_confidence_only() {
        // No address or context signal: the URL alone never classifies
        let (is_hr, confidence) =
            classify_address("info", "", "https://acme.com/careers/apply");
        assert!(!is_hr);
        assert_eq!(confidence, 0.2);

        // But it raises the score when another signal fired
        let (_, boosted) =
            classify_address("info", "send your resume here", "https://acme.com/careers/apply");
        assert!(boosted > confidence);
    }

    #[test]
    fn test_plain_address_on_plain_page_is_not_hr() {
        let (is_hr, confidence) = classify_address("info", "our office address", "https://acme.com/news");
        assert!(!is_hr);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn test_careers_page_detection() {
        assert!(is_careers_page("https://acme.com/careers"));
        assert!(is_careers_page("https://acme.com/jobs/openings"));
        assert!(is_careers_page("https://acme.com/careers.html"));
        assert!(is_careers_page("https://acme.com/vacancies/"));
        assert!(!is_careers_page("https://acme.com/products"));
    }

    #[test]
    fn test_contact_page_detection() {
        assert!(is_contact_page("https://acme.com/contact"));
        assert!(is_contact_page("https://acme.com/about-us"));
        assert!(is_contact_page("https://acme.com/about_us/"));
        assert!(!is_contact_page("https://acme.com/careers"));
    }
}
