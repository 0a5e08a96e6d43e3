use scraper::Html;
use std::fs;

use crate::extractor::{ArticleStatus, NO_TITLE, cleaner, extract, reader};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/extractor/tests/fixtures/{name}"))
        .expect("Failed to read test fixture")
}

#[test]
fn test_extract_article() {
    let html = fixture("article.html");
    let record = extract(&html, "https://systems.example.com/rust-fast");

    assert_eq!(record.status, ArticleStatus::Success);
    assert_eq!(record.title, "Why Rust Services Stay Fast");
    assert_eq!(record.domain, "systems.example.com");
    assert_eq!(record.language.as_deref(), Some("eng"));

    let content = record.content.expect("success carries content");
    assert!(content.contains("Latency budgets for network services"));
    assert!(content.contains("• Bounded channels apply backpressure."));
    assert!(content.contains("> Measure first, then decide what to remove."));
    assert!(content.contains("the second service goes much faster than the first."));
    assert!(!content.contains("Sponsored"));
    assert!(!content.contains("Archive"));
    assert!(!content.contains("Ten tips"));
    assert!(!content.contains("Copyright"));
    assert!(!content.contains("dataLayer"));
    assert_eq!(record.word_count, content.split_whitespace().count());
}

#[test]
fn test_extract_keeps_full_length() {
    let html = fixture("article.html");
    let mut document = Html::parse_document(&html);
    cleaner::strip_non_content(&mut document);
    let raw = reader::extract_body(&document).unwrap().text;

    let record = extract(&html, "https://systems.example.com/rust-fast");
    let content = record.content.unwrap();
    assert!(content.chars().count() * 100 >= raw.chars().count() * 95);
}

#[test]
fn test_long_article_is_not_truncated() {
    let paragraph = "Each paragraph in this long report adds another observation about the system. ";
    let body: String = (0..400)
        .map(|i| format!("<p>{i}: {}</p>", paragraph.repeat(3)))
        .collect();
    let html = format!("<html><head><title>Long</title></head><body><article>{body}</article></body></html>");

    let record = extract(&html, "https://example.com/long");
    assert_eq!(record.status, ArticleStatus::Success);
    let content = record.content.unwrap();
    assert!(content.starts_with("0: Each paragraph"));
    assert!(content.contains("399: Each paragraph"));
    assert!(record.word_count > 400 * 30);
}

#[test]
fn test_js_shell_is_js_required() {
    let html = fixture("js_shell.html");
    let record = extract(&html, "https://x.com/someone/status/1");

    assert_eq!(record.status, ArticleStatus::JsRequired);
    assert_eq!(record.word_count, 0);
    assert!(record.content.is_some());
    assert!(record.error.is_none());
}

#[test]
fn test_enable_javascript_phrase_anywhere() {
    let filler = "Plenty of normal words on a normal domain. ".repeat(20);
    let html = format!(
        "<html><body><article><p>{filler}</p><p>Please enable JavaScript to view the comments.</p></article></body></html>"
    );
    let record = extract(&html, "https://blog.example.com/post");
    assert_eq!(record.status, ArticleStatus::JsRequired);
    assert_eq!(record.word_count, 0);
}

#[test]
fn test_short_page_on_js_platform() {
    let html = "<html><head><title>Instagram</title></head><body><div id=\"root\"><p>Log in to see photos.</p></div></body></html>";
    let record = extract(html, "https://www.instagram.com/p/abc/");
    assert_eq!(record.status, ArticleStatus::JsRequired);
}

#[test]
fn test_reject_empty_page() {
    let html = fixture("empty.html");
    let record = extract(&html, "https://example.com/empty");

    assert_eq!(record.status, ArticleStatus::Error);
    assert_eq!(record.title, "Loading");
    assert!(record.content.is_none());
    assert_eq!(record.word_count, 0);
    assert!(record.error.is_some());
}

#[test]
fn test_best_candidate_over_teaser() {
    let teaser = "A short teaser for the story. ".repeat(5);
    let story = "The real story continues with plenty of detail. ".repeat(18);
    let html = format!(
        "<html><body><article><p>{teaser}</p></article><div class=\"post-content\"><p>{story}</p></div></body></html>"
    );
    assert!(teaser.trim().len() >= 140 && teaser.trim().len() <= 160);
    assert!(story.trim().len() >= 850);

    let record = extract(&html, "https://example.com/story");
    assert_eq!(record.status, ArticleStatus::Success);
    let content = record.content.unwrap();
    assert!(content.starts_with("The real story continues"));
    assert!(!content.contains("teaser"));
}

#[test]
fn test_longest_qualifying_container_wins() {
    let first = "First container text that qualifies on its own. ".repeat(6);
    let second = "Second container text is the true body of the page. ".repeat(20);
    let html = format!(
        "<html><body><main><p>{first}</p></main><div class=\"article-body\"><p>{second}</p></div></body></html>"
    );
    let record = extract(&html, "https://example.com/two");
    assert!(record.content.unwrap().starts_with("Second container"));
}

#[test]
fn test_missing_title_uses_sentinel() {
    let text = "Body text with no title anywhere on the page at all. ".repeat(5);
    let html = format!("<html><body><div><p>{text}</p></div></body></html>");
    let record = extract(&html, "https://example.com/untitled");
    assert_eq!(record.status, ArticleStatus::Success);
    assert_eq!(record.title, NO_TITLE);
}

#[test]
fn test_malformed_html() {
    let html = format!(
        "<html><head><title>Broken</title><body><p>Unclosed tags {}<div>More content",
        "and a lot of words to read ".repeat(10)
    );
    let record = extract(&html, "https://example.com/broken");

    assert_eq!(record.title, "Broken");
    assert_eq!(record.status, ArticleStatus::Success);
    let content = record.content.unwrap();
    assert!(content.starts_with("Unclosed tags"));
}

#[test]
fn test_sidebar_layout_page_keeps_article() {
    let story = "A long form piece about queueing theory in practice. ".repeat(20);
    let html = format!(
        r#"<html><head><title>Queues</title></head><body>
        <div id="page" class="site-wrapper has-sidebar"><main><article><p>{story}</p></article></main>
        <aside><p>Popular this week</p></aside></div>
        <footer><div class="content"><p>{}</p></div></footer></body></html>"#,
        "Footer promo copy that is longer than the story itself. ".repeat(30)
    );
    let record = extract(&html, "https://x.com/queues");

    assert_eq!(record.status, ArticleStatus::Success);
    let content = record.content.unwrap();
    assert!(content.starts_with("A long form piece"));
    assert!(!content.contains("Popular"));
    assert!(!content.contains("Footer promo"));
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_extract_never_panics(
            html in ".*",
            url in "https://[a-z]+\\.com/.*"
        ) {
            let _ = extract(&html, &url);
        }

        #[test]
        fn test_success_always_has_words(html in ".*") {
            let record = extract(&html, "https://example.com");
            if record.status == ArticleStatus::Success {
                prop_assert!(record.word_count > 0);
                prop_assert!(record.content.is_some_and(|c| !c.trim().is_empty()));
            }
        }
    }
}
