//! Rendering use case - applies post-processing to a generated response

use crate::model::QualityReport;
use crate::policy::MAX_RESPONSE_CHARS;

/// Appended after a response cut to the length limit
pub const TRUNCATION_NOTICE: &str = "... (Response truncated for brevity)";

/// Appended to responses that cite nothing
pub const CITATION_NOTICE: &str =
    "\n\n(Note: Please provide sources or citations for external information.)";

/// Configuration for the renderer
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Maximum characters kept before the truncation notice
    pub max_chars: usize,
    /// Whether to ask for citations when none are present
    pub enforce_citations: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_chars: MAX_RESPONSE_CHARS,
            enforce_citations: true,
        }
    }
}

/// Renderer for transforming a raw response into user-facing text
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Apply truncation and citation enforcement according to the report.
    ///
    /// The citation notice goes after the truncation notice when both apply.
    pub fn render(&self, response: &str, report: &QualityReport) -> String {
        let mut text = if report.length_appropriate {
            response.to_string()
        } else {
            let mut truncated = truncate_chars(response, self.config.max_chars).to_string();
            truncated.push_str(TRUNCATION_NOTICE);
            truncated
        };

        if self.config.enforce_citations && !report.has_citations {
            text.push_str(CITATION_NOTICE);
        }

        if !report.is_safe {
            tracing::warn!("Response contains potentially unsafe wording");
        }

        if !report.is_helpful {
            tracing::warn!(
                length = response.trim().chars().count(),
                "Response is too short to be helpful"
            );
        }

        text
    }
}

/// Prefix of at most `max_chars` characters, cut on a char boundary
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::check_response_quality;

    fn render(response: &str) -> String {
        let renderer = Renderer::new(RenderConfig::default());
        renderer.render(response, &check_response_quality(response))
    }

    #[test]
    fn test_cited_short_response_unchanged() {
        let response = "Solar power is growing fast. Source: IEA";
        assert_eq!(render(response), response);
    }

    #[test]
    fn test_http_counts_as_citation() {
        let response = "More at http://example.com";
        assert_eq!(render(response), response);
        assert!(!render(response).contains(CITATION_NOTICE));
    }

    #[test]
    fn test_uncited_response_gets_notice() {
        let rendered = render("Python is a programming language.");
        assert_eq!(
            rendered,
            format!("Python is a programming language.{}", CITATION_NOTICE)
        );
    }

    #[test]
    fn test_long_cited_response_truncated_to_exact_length() {
        let response = format!("http {}", "x".repeat(700));
        let rendered = render(&response);

        assert_eq!(
            rendered.chars().count(),
            500 + TRUNCATION_NOTICE.chars().count()
        );
        assert!(rendered.ends_with(TRUNCATION_NOTICE));
    }

    #[test]
    fn test_long_uncited_response_gets_both_notices() {
        let response = "y".repeat(800);
        let rendered = render(&response);

        let expected = format!("{}{}{}", "y".repeat(500), TRUNCATION_NOTICE, CITATION_NOTICE);
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_citation_flag_uses_original_response() {
        // The URL sits past the cut, but the report was computed before truncation
        let response = format!("{} https://example.com", "z".repeat(600));
        let rendered = render(&response);

        assert!(rendered.ends_with(TRUNCATION_NOTICE));
        assert!(!rendered.contains("https://"));
    }

    #[test]
    fn test_truncation_respects_multibyte_chars() {
        let response = format!("www. {}", "ü".repeat(600));
        let rendered = render(&response);

        assert_eq!(
            rendered.chars().count(),
            500 + TRUNCATION_NOTICE.chars().count()
        );
    }

    #[test]
    fn test_citation_enforcement_can_be_disabled() {
        let renderer = Renderer::new(RenderConfig {
            enforce_citations: false,
            ..Default::default()
        });
        let response = "No sources at all here.";

        assert_eq!(
            renderer.render(response, &check_response_quality(response)),
            response
        );
    }
}
