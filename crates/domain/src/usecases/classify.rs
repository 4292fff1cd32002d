//! Input classification - keyword and length guardrails applied before generation

use crate::model::{FilterConfiguration, SafetyVerdict};

/// Inputs longer than this many characters are rejected
pub const MAX_INPUT_CHARS: usize = 1000;

/// Classify raw user input against the keyword configuration.
///
/// Checks run in a fixed order and the first match wins: empty input, length,
/// restricted topics, then toxicity. Keywords match as plain substrings of the
/// lower-cased input, so a keyword inside a longer word still triggers.
pub fn classify(input: &str, config: &FilterConfiguration) -> SafetyVerdict {
    if input.trim().is_empty() {
        return SafetyVerdict::EmptyInput;
    }

    if input.chars().count() > MAX_INPUT_CHARS {
        return SafetyVerdict::TooLong;
    }

    let lower_input = input.to_lowercase();

    if contains_any(&lower_input, config.topic_keywords()).is_some() {
        return SafetyVerdict::RestrictedTopic;
    }

    if contains_any(&lower_input, config.toxic_keywords()).is_some() {
        return SafetyVerdict::PotentiallyToxic;
    }

    SafetyVerdict::Safe
}

/// Keyword responsible for a keyword verdict, if any
pub fn matched_keyword<'a>(input: &str, config: &'a FilterConfiguration) -> Option<&'a str> {
    let lower_input = input.to_lowercase();
    contains_any(&lower_input, config.topic_keywords())
        .or_else(|| contains_any(&lower_input, config.toxic_keywords()))
}

fn contains_any<'a>(lower_input: &str, keywords: &'a [String]) -> Option<&'a str> {
    keywords
        .iter()
        .find(|keyword| lower_input.contains(keyword.as_str()))
        .map(String::as_str)
}
