// src/classify/learning.rs
// =============================================================================
// The adaptive classification layer.
//
// As a crawl confirms HR emails through the static rules, we remember two
// things about them: their domain and their local part. Later findings that
// the static rules missed get a second chance:
// - same domain as a known HR email -> upgrade
// - local part within a small edit distance of a known HR local part
//   (catches "carers" next to "careers", "recruitng" next to "recruiting")
//   -> upgrade
//
// Upgrades are one-directional and append an audit note to the context so a
// human can see why the classification changed. All of this state lives for
// one crawl invocation only; nothing is persisted across runs.
// =============================================================================

use std::collections::HashSet;

use crate::extract::EmailFinding;

// Confidence assigned to findings upgraded by pattern matching; deliberately
// below what the static rules produce for a direct hit
const RECLASSIFIED_CONFIDENCE: f32 = 0.4;

const RECLASSIFIED_NOTE: &str = " [Reclassified as HR due to pattern matching]";

// Domains and local parts observed on confirmed HR emails, for one crawl run
//
// Grows monotonically; created fresh at the start of each crawl invocation
// (per seed by default, per batch when knowledge sharing is configured).
#[derive(Debug, Default)]
pub struct ClassificationKnowledge {
    known_hr_domains: HashSet<String>,
    known_hr_local_parts: HashSet<String>,
    /// Maximum edit distance for a local-part to count as a near-miss
    edit_distance_threshold: usize,
}

impl ClassificationKnowledge {
    pub fn new(edit_distance_threshold: usize) -> Self {
        ClassificationKnowledge {
            known_hr_domains: HashSet::new(),
            known_hr_local_parts: HashSet::new(),
            edit_distance_threshold,
        }
    }

    // Records the domain and local part of a confirmed HR finding
    //
    // Call this for every finding the static rules classified as HR; the
    // sets only ever grow.
    pub fn learn(&mut self, finding: &EmailFinding) {
        if !finding.is_hr_related {
            return;
        }
        if let Some((local, domain)) = finding.address.split_once('@') {
            self.known_hr_local_parts.insert(local.to_string());
            self.known_hr_domains.insert(domain.to_string());
        }
    }

    // Decides whether a non-HR finding should be upgraded
    //
    // Returns true when the finding's domain is known, or its local part is
    // within the edit-distance threshold of a known HR local part.
    pub fn should_upgrade(&self, finding: &EmailFinding) -> bool {
        if finding.is_hr_related {
            return false;
        }
        let (local, domain) = match finding.address.split_once('@') {
            Some(parts) => parts,
            None => return false,
        };

        if self.known_hr_domains.contains(domain) {
            return true;
        }

        self.known_hr_local_parts
            .iter()
            .any(|known| levenshtein_distance(local, known) <= self.edit_distance_threshold)
    }

    // Applies the upgrade if warranted, returning a new finding
    //
    // Findings are immutable values: reclassification produces a fresh
    // EmailFinding with the audit note appended, never an in-place mutation.
    pub fn reclassify(&self, finding: EmailFinding) -> EmailFinding {
        if self.should_upgrade(&finding) {
            finding.upgrade(RECLASSIFIED_NOTE, RECLASSIFIED_CONFIDENCE)
        } else {
            finding
        }
    }
}

// Standard single-character insert/delete/substitute edit distance
//
// Classic dynamic-programming formulation, rolling a single row to keep
// memory at O(min(a, b)).
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=a.len()).collect();
    let mut current = vec![0usize; a.len() + 1];

    for (i, b_char) in b.iter().enumerate() {
        current[0] = i + 1;
        for (j, a_char) in a.iter().enumerate() {
            let substitution_cost = if a_char == b_char { 0 } else { 1 };
            current[j + 1] = (previous[j] + substitution_cost) // substitution
                .min(current[j] + 1) // insertion
                .min(previous[j + 1] + 1); // deletion
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[a.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(address: &str, is_hr: bool) -> EmailFinding {
        EmailFinding {
            address: address.to_string(),
            source_url: "https://acme.com/team".to_string(),
            context: "context".to_string(),
            is_hr_related: is_hr,
            confidence: if is_hr { 0.5 } else { 0.0 },
        }
    }

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein_distance("careers", "careers"), 0);
        assert_eq!(levenshtein_distance("careers", "carers"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
    }

    #[test]
    fn test_near_miss_local_part_upgraded() {
        let mut knowledge = ClassificationKnowledge::new(2);
        knowledge.learn(&finding("careers@acme.com", true));

        // "carers" is distance 1 from "careers"
        let upgraded = knowledge.reclassify(finding("carers@other.org", false));
        assert!(upgraded.is_hr_related);
        assert!(upgraded.context.contains("Reclassified as HR"));
    }

    #[test]
    fn test_distant_local_part_not_upgraded() {
        let mut knowledge = ClassificationKnowledge::new(2);
        knowledge.learn(&finding("careers@acme.com", true));

        // "marketing" is distance >= 3 from "careers"
        let result = knowledge.reclassify(finding("marketing@other.org", false));
        assert!(!result.is_hr_related);
        assert!(!result.context.contains("Reclassified"));
    }

    #[test]
    fn test_known_domain_upgraded() {
        let mut knowledge = ClassificationKnowledge::new(2);
        knowledge.learn(&finding("hr@acme.com", true));

        let upgraded = knowledge.reclassify(finding("frontdesk@acme.com", false));
        assert!(upgraded.is_hr_related);
    }

    #[test]
    fn test_non_hr_findings_are_not_learned() {
        let mut knowledge = ClassificationKnowledge::new(2);
        knowledge.learn(&finding("info@acme.com", false));

        let result = knowledge.reclassify(finding("sales@acme.com", false));
        assert!(!result.is_hr_related);
    }

    #[test]
    fn test_hr_findings_never_downgraded() {
        let knowledge = ClassificationKnowledge::new(2);
        // Already-HR findings pass through untouched even with empty knowledge
        let result = knowledge.reclassify(finding("jobs@acme.com", true));
        assert!(result.is_hr_related);
        assert_eq!(result.confidence, 0.5);
    }
}
