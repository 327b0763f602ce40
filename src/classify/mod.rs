// src/classify/mod.rs
// =============================================================================
// This module decides whether an email address is HR-related.
//
// Submodules:
// - rules: The static heuristics - keyword dictionaries, whole-address
//   patterns, context scanning, and the careers/contact page overrides
// - learning: The adaptive layer that remembers domains and local-parts of
//   confirmed HR emails within a crawl run and upgrades near-misses
//
// Classification is one-directional: once an address is HR-related it can
// never be downgraded by a later stage.
// =============================================================================

mod learning;
pub mod rules;

pub use learning::ClassificationKnowledge;
