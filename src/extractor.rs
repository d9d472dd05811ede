//! Narration text extraction.
//!
//! Articles are authored in markdown with occasional embedded HTML. The
//! speech engine wants plain prose, so the body is flattened here before a
//! session ever starts. The title/author prefix keeps spoken articles
//! self-identifying, matching the published audio-player behavior.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"#{1,6}\s").unwrap());
static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static RE_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());
static RE_INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static RE_BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r">\s").unwrap());
static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-*]\s").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Plain prose ready for narration, derived once per article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationText {
    text: String,
    word_count: usize,
    char_len: usize,
}

impl NarrationText {
    /// Builds `"<title>. By <author>. <cleaned body>"`. Deterministic in its
    /// inputs; callers rebuild whenever title, author, or content changes.
    pub fn compose(title: &str, author: &str, content: &str) -> Self {
        let body = clean_body(content);
        let text = format!("{title}. By {author}. {body}").trim_end().to_string();
        let word_count = text.split_whitespace().count();
        let char_len = text.chars().count();
        Self {
            text,
            word_count,
            char_len,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn char_len(&self) -> usize {
        self.char_len
    }

    /// Character offset and remaining text for a seek target percentage.
    /// The offset is `floor(percent/100 * char_len)`, clamped to the end.
    pub fn tail_from_percent(&self, percent: f32) -> (usize, &str) {
        let clamped = percent.clamp(0.0, 100.0);
        let offset = ((f64::from(clamped) / 100.0) * self.char_len as f64).floor() as usize;
        let offset = offset.min(self.char_len);
        let byte = self
            .text
            .char_indices()
            .nth(offset)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len());
        (offset, &self.text[byte..])
    }
}

/// Flattens markdown and embedded markup into single-spaced prose.
/// Substitutions run in a fixed order, each applied globally.
pub fn clean_body(raw: &str) -> String {
    let text = RE_MARKUP_TAG.replace_all(raw, " ");
    let text = RE_HEADING.replace_all(&text, "");
    let text = RE_BOLD.replace_all(&text, "$1");
    let text = RE_ITALIC.replace_all(&text, "$1");
    let text = RE_LINK.replace_all(&text, "$1");
    let text = RE_INLINE_CODE.replace_all(&text, "$1");
    let text = RE_BLOCKQUOTE.replace_all(&text, "");
    let text = RE_BULLET.replace_all(&text, "");
    let text = RE_WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_title_author_prefix_over_cleaned_body() {
        let narration = NarrationText::compose("T", "A", "## A\n\nHello **world**.");
        assert_eq!(narration.text(), "T. By A. A Hello world.");
    }

    #[test]
    fn replaces_markup_tags_with_a_space() {
        assert_eq!(clean_body("one<br>two"), "one two");
        assert_eq!(clean_body("a <iframe src=\"x\"></iframe> b"), "a b");
    }

    #[test]
    fn unwraps_emphasis_links_and_code() {
        let cleaned = clean_body("See [the docs](https://example.com) for `usage` and *notes*.");
        assert_eq!(cleaned, "See the docs for usage and notes.");
    }

    #[test]
    fn drops_blockquote_and_bullet_prefixes() {
        let cleaned = clean_body("> quoted line\n- first item\n* second item");
        assert_eq!(cleaned, "quoted line first item second item");
    }

    #[test]
    fn empty_content_yields_only_the_prefix() {
        let narration = NarrationText::compose("T", "A", "");
        assert_eq!(narration.text(), "T. By A.");
    }

    #[test]
    fn counts_words_across_prefix_and_body() {
        let narration = NarrationText::compose("Title", "Author", "one two three");
        // "Title." "By" "Author." plus three body words.
        assert_eq!(narration.word_count(), 6);
    }

    #[test]
    fn tail_from_percent_splits_on_character_offsets() {
        let narration = NarrationText::compose("T", "A", &"x".repeat(91));
        assert_eq!(narration.char_len(), 100);

        let (offset, tail) = narration.tail_from_percent(50.0);
        assert_eq!(offset, 50);
        assert_eq!(tail.chars().count(), 50);

        let (offset, tail) = narration.tail_from_percent(100.0);
        assert_eq!(offset, 100);
        assert!(tail.is_empty());

        let (offset, _) = narration.tail_from_percent(-5.0);
        assert_eq!(offset, 0);
    }
}
