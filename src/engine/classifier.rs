//! Label extraction from free-text research responses.
//!
//! The response is upper-cased once and scanned against fixed, ordered
//! pattern tables. The first pattern present anywhere in the text wins,
//! regardless of where it appears, so table order is the precedence:
//! "BUY YES" before "BUY NO", "HIGH" before "MEDIUM" before "LOW".

use crate::types::{Confidence, Recommendation};

pub const RECOMMENDATION_PATTERNS: &[(&str, Recommendation)] = &[
    ("BUY YES", Recommendation::BuyYes),
    ("BUY NO", Recommendation::BuyNo),
];

pub const CONFIDENCE_PATTERNS: &[(&str, Confidence)] = &[
    ("HIGH", Confidence::High),
    ("MEDIUM", Confidence::Medium),
    ("LOW", Confidence::Low),
];

/// Label of the first table entry whose pattern occurs in `text_upper`.
pub fn first_match<T: Copy>(text_upper: &str, table: &[(&str, T)], fallback: T) -> T {
    table
        .iter()
        .find(|(pattern, _)| text_upper.contains(pattern))
        .map(|&(_, label)| label)
        .unwrap_or(fallback)
}

/// Classify a response into a recommendation and a confidence.
/// Missing labels fall back to PASS and UNKNOWN.
pub fn classify(response: &str) -> (Recommendation, Confidence) {
    let upper = response.to_uppercase();
    (
        first_match(&upper, RECOMMENDATION_PATTERNS, Recommendation::Pass),
        first_match(&upper, CONFIDENCE_PATTERNS, Confidence::Unknown),
    )
}
