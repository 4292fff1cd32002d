//! Quality and safety heuristics for generated responses

use crate::model::QualityReport;

/// Responses longer than this many characters are truncated
pub const MAX_RESPONSE_CHARS: usize = 500;

/// Responses must be longer than this (after trimming) to count as helpful
pub const MIN_HELPFUL_CHARS: usize = 10;

const UNSAFE_WORDS: [&str; 3] = ["illegal", "harmful", "violence"];

/// Evaluate a candidate response. Every check runs; none short-circuits another.
pub fn check_response_quality(response: &str) -> QualityReport {
    let lower = response.to_lowercase();

    QualityReport {
        length_appropriate: response.chars().count() <= MAX_RESPONSE_CHARS,
        has_citations: response.contains("Source:")
            || lower.contains("according to")
            || response.contains("http")
            || response.contains("www."),
        is_helpful: response.trim().chars().count() > MIN_HELPFUL_CHARS,
        is_safe: !UNSAFE_WORDS.iter().any(|word| lower.contains(word)),
    }
}
