use regex::Regex;
use std::sync::LazyLock;

use crate::extractor::ArticleRecord;

pub const PREVIEW_CHARS: usize = 200;

/// Only this much of the body is scanned for keywords.
const KEYWORD_WINDOW_CHARS: usize = 500;

static TECH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(python|javascript|rust|react|ai|machine learning|api|github|docker|kubernetes)\b")
        .unwrap()
});
static BUSINESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(startup|funding|business|strategy|market|finance|investment)\b").unwrap()
});
static NEWS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(news|update|release|announcement|breaking)\b").unwrap()
});

const NEWS_DOMAINS: [&str; 4] = ["cnn", "bbc", "reuters", "techcrunch"];

fn push_unique(tags: &mut Vec<String>, tag: &str) {
    if !tags.iter().any(|t| t == tag) {
        tags.push(tag.to_string());
    }
}

fn domain_tag(domain: &str) -> Option<&'static str> {
    if domain.contains("github") {
        Some("github")
    } else if domain.contains("medium") {
        Some("article")
    } else if domain.contains("youtube") || domain == "youtu.be" {
        Some("video")
    } else if domain.contains("twitter") || domain == "x.com" || domain.ends_with(".x.com") {
        Some("social")
    } else if NEWS_DOMAINS.iter().any(|d| domain.contains(d)) {
        Some("news")
    } else {
        None
    }
}

fn length_tag(word_count: usize) -> Option<&'static str> {
    match word_count {
        0 => None,
        1..=500 => Some("short"),
        501..=2000 => Some("article"),
        _ => Some("long-read"),
    }
}

/// Keyword, domain and length tags without any model call. Falls back to
/// `general` when nothing matches.
pub fn lightweight_tags(record: &ArticleRecord) -> Vec<String> {
    let window: String = record
        .content
        .as_deref()
        .unwrap_or_default()
        .chars()
        .take(KEYWORD_WINDOW_CHARS)
        .collect();
    let haystacks = [record.title.as_str(), window.as_str(), record.url.as_str()];

    let mut tags = Vec::new();
    for (regex, tag) in [(&*TECH, "tech"), (&*BUSINESS, "business"), (&*NEWS, "news")] {
        if haystacks.iter().any(|h| regex.is_match(h)) {
            push_unique(&mut tags, tag);
        }
    }
    if let Some(tag) = domain_tag(&record.domain) {
        push_unique(&mut tags, tag);
    }
    if let Some(tag) = length_tag(record.word_count) {
        push_unique(&mut tags, tag);
    }

    if tags.is_empty() {
        tags.push("general".to_string());
    }
    tags
}

/// First [`PREVIEW_CHARS`] characters of the content, with an ellipsis
/// when cut.
pub fn content_preview(content: &str) -> String {
    let content = content.trim();
    let mut chars = content.chars();
    let preview: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ArticleRecord;

    fn record(url: &str, title: &str, content: &str) -> ArticleRecord {
        ArticleRecord::success(url, title.to_string(), content.to_string(), None)
    }

    #[test]
    fn test_keyword_domain_and_length_tags() {
        let r = record(
            "https://github.com/org/repo",
            "New release of the Docker toolkit",
            "A short description.",
        );
        assert_eq!(lightweight_tags(&r), vec!["tech", "news", "github", "short"]);
    }

    #[test]
    fn test_keywords_match_whole_words() {
        let r = record("https://example.com/p", "She said it was fine", "Nothing to see.");
        assert_eq!(lightweight_tags(&r), vec!["short"]);
    }

    #[test]
    fn test_length_buckets() {
        let r = record("https://example.com/a", "Essay", &"word ".repeat(800));
        assert_eq!(lightweight_tags(&r), vec!["article"]);
        let r = record("https://example.com/a", "Essay", &"word ".repeat(2500));
        assert_eq!(lightweight_tags(&r), vec!["long-read"]);
    }

    #[test]
    fn test_medium_article_not_duplicated() {
        let r = record("https://medium.com/@a/post", "Essay", &"word ".repeat(800));
        assert_eq!(lightweight_tags(&r), vec!["article"]);
    }

    #[test]
    fn test_general_when_nothing_matches() {
        let r = ArticleRecord::error("https://example.com/x", None, "boom");
        assert_eq!(lightweight_tags(&r), vec!["general"]);
    }

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("  short  "), "short");
        let long = "é".repeat(250);
        let preview = content_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
        assert_eq!(content_preview(&"x".repeat(PREVIEW_CHARS)), "x".repeat(PREVIEW_CHARS));
    }
}
