//! Text processing utilities.

/// Minimum non-whitespace characters for meaningful content.
pub const MIN_CONTENT_LENGTH: usize = 50;

/// Maximum length of a citation snippet in characters.
pub const SNIPPET_LENGTH: usize = 180;

/// Check if content has meaningful text (not just whitespace/punctuation).
pub fn has_meaningful_content(content: &str) -> bool {
    content.chars().filter(|c| !c.is_whitespace()).count() >= MIN_CONTENT_LENGTH
}

/// Collapse runs of whitespace into single spaces, preserving paragraph
/// breaks as double newlines.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, paragraph) in text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .enumerate()
    {
        if i > 0 {
            out.push_str("\n\n");
        }
        let mut first = true;
        for word in paragraph.split_whitespace() {
            if !first {
                out.push(' ');
            }
            out.push_str(word);
            first = false;
        }
    }
    out
}

/// Truncate text to [`SNIPPET_LENGTH`] characters for use as a citation
/// snippet, appending an ellipsis when the text was cut.
pub fn truncate_snippet(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= SNIPPET_LENGTH {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(SNIPPET_LENGTH - 3).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_meaningful_content() {
        assert!(!has_meaningful_content(""));
        assert!(!has_meaningful_content("   \n\n   "));
        assert!(!has_meaningful_content("short"));
        assert!(!has_meaningful_content(&" ".repeat(1000)));
        assert!(has_meaningful_content(&"a".repeat(50)));
        assert!(has_meaningful_content(
            "This is a meaningful piece of content with enough characters."
        ));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a   b\t c"), "a b c");
        assert_eq!(collapse_whitespace("a\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_whitespace("  \n  "), "");
    }

    #[test]
    fn test_truncate_snippet_short_text_unchanged() {
        assert_eq!(truncate_snippet("  hello  "), "hello");
    }

    #[test]
    fn test_truncate_snippet_long_text() {
        let long = "x".repeat(500);
        let snippet = truncate_snippet(&long);
        assert_eq!(snippet.chars().count(), SNIPPET_LENGTH);
        assert!(snippet.ends_with("..."));
    }
}
