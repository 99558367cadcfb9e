//! Caption composition.
//!
//! Pure functions: given a title, a summary source, and the article URL,
//! produce the exact post text. No network, no state, byte-for-byte
//! deterministic — the orchestrator relies on that when a publish fails and
//! the same item is retried on a later run.

use crate::utils::{host_of, strip_markup};

/// Condense text (or HTML) to at most `max_len` characters, cutting at
/// sentence boundaries rather than mid-sentence.
pub fn summarize(text_or_html: &str, max_len: usize) -> String {
    let text = strip_markup(text_or_html);
    if text.chars().count() <= max_len {
        return text;
    }
    let mut out: Vec<&str> = Vec::new();
    let mut used = 0usize;
    for sentence in text.split(". ") {
        let sentence = sentence.trim();
        let cost = sentence.chars().count() + 2;
        if used + cost <= max_len {
            out.push(sentence);
            used += cost;
        } else {
            break;
        }
    }
    out.join(". ").trim().to_string()
}

/// Compose the final caption: title, optional summary block, source
/// attribution with hostname and full URL, fixed hashtag suffix.
pub fn build_caption(title: &str, summary: &str, source_url: &str) -> String {
    let host = host_of(source_url);
    let mut parts = vec![title.trim().to_string()];
    if !summary.trim().is_empty() {
        parts.push(format!("\n\nTóm tắt: {}", summary.trim()));
    }
    parts.push(format!("\nNguồn: {host}\n{source_url}"));
    parts.push("\n#AI #congnghe".to_string());
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_short_text_unchanged() {
        assert_eq!(summarize("A short line.", 700), "A short line.");
    }

    #[test]
    fn test_summarize_strips_markup() {
        assert_eq!(summarize("<p>Hello <b>there</b></p>", 700), "Hello there");
    }

    #[test]
    fn test_summarize_cuts_at_sentence_boundary() {
        let text = "One sentence here. Two sentences here. Three sentences here.";
        let summary = summarize(text, 40);
        assert_eq!(summary, "One sentence here. Two sentences here");
        assert!(summary.chars().count() <= 40);
    }

    #[test]
    fn test_summarize_overlong_first_sentence_yields_empty() {
        let text = format!("{} end. Short tail.", "word ".repeat(50));
        assert_eq!(summarize(&text, 20), "");
    }

    #[test]
    fn test_caption_contains_all_parts() {
        let caption = build_caption("Title", "Sum", "https://www.example.com/a");
        assert!(caption.contains("Title"));
        assert!(caption.contains("Tóm tắt: Sum"));
        assert!(caption.contains("Nguồn: example.com"));
        assert!(caption.contains("https://www.example.com/a"));
        assert!(caption.contains("#AI #congnghe"));
    }

    #[test]
    fn test_caption_is_deterministic() {
        let a = build_caption("Title", "Sum", "https://www.example.com/a");
        let b = build_caption("Title", "Sum", "https://www.example.com/a");
        assert_eq!(a, b);
    }

    #[test]
    fn test_caption_omits_empty_summary_block() {
        let caption = build_caption("Title", "", "https://example.com/a");
        assert!(!caption.contains("Tóm tắt"));
        assert!(caption.contains("Nguồn: example.com"));
    }
}
