use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Sentinel title used when no title source on the page is non-empty.
pub const NO_TITLE: &str = "No Title Found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    Success,
    JsRequired,
    Error,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::JsRequired => "js_required",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the extraction stage for one URL.
///
/// `Success` always carries non-empty `content` and a positive
/// `word_count`; the constructors are the only way the pipeline builds
/// records, so that holds by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub url: String,
    pub title: String,
    pub content: Option<String>,
    pub word_count: usize,
    pub status: ArticleStatus,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ArticleRecord {
    /// Falls back to an error record if `content` has no words.
    pub fn success(url: &str, title: String, content: String, language: Option<String>) -> Self {
        let word_count = word_count(&content);
        if word_count == 0 {
            return Self::error(url, Some(title), "extracted content is empty");
        }
        Self {
            url: url.to_string(),
            title,
            content: Some(content),
            word_count,
            status: ArticleStatus::Success,
            domain: domain_of(url),
            language,
            error: None,
        }
    }

    pub fn js_required(url: &str, title: String) -> Self {
        Self {
            url: url.to_string(),
            title,
            content: Some(format!(
                "This page from {} requires JavaScript to display its content, which cannot be rendered here.",
                domain_of(url)
            )),
            word_count: 0,
            status: ArticleStatus::JsRequired,
            domain: domain_of(url),
            language: None,
            error: None,
        }
    }

    pub fn error(url: &str, title: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            title: title.unwrap_or_else(|| NO_TITLE.to_string()),
            content: None,
            word_count: 0,
            status: ArticleStatus::Error,
            domain: domain_of(url),
            language: None,
            error: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ArticleStatus::Success
    }
}

/// Lower-cased host of `url`, or `"unknown"` when it has none.
pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// Zero-width and bidi marks, BOM, box drawing, block elements, geometric
// shapes and dingbats.
static ARTIFACTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{200B}-\x{200F}\x{2060}\x{FEFF}\x{2500}-\x{25FF}\x{2700}-\x{27BF}]").unwrap()
});
static HORIZONTAL_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]+").unwrap());
static SPACE_AROUND_NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" ?\n ?").unwrap());
static SENTENCE_THEN_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?])\n(\p{Lu})").unwrap());
static GLUED_SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\p{Ll}\d][.!?])(\p{Lu}\p{Ll})").unwrap());
static EXTRA_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Clean extracted text without shortening it beyond whitespace and
/// artifact characters.
///
/// Runs of horizontal whitespace become one space, so sentence-ending
/// punctuation is followed by exactly one. A sentence end followed by a
/// line break, or glued directly to the next capitalized word, becomes a
/// paragraph break. At most one blank line separates paragraphs.
pub fn normalize_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = ARTIFACTS.replace_all(&text, "");
    let text = HORIZONTAL_WS.replace_all(&text, " ");
    let text = SPACE_AROUND_NEWLINE.replace_all(&text, "\n");
    let text = SENTENCE_THEN_LINE.replace_all(&text, "$1\n\n$2");
    let text = GLUED_SENTENCE.replace_all(&text, "$1\n\n$2");
    let text = EXTRA_NEWLINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}
