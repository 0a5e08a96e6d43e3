use regex::Regex;
use std::sync::LazyLock;
use url::Url;

// Auto-linked `<url>` / `<url|label>` first, bare tokens second.
static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<((?i:https?)://[^\s<>|]+)(?:\|[^>]*)?>|(?i:https?)://[^\s<>"{}|\\^`\[\]]+"#)
        .unwrap()
});

const TRAILING_PUNCTUATION: &[char] = &[
    '.', ',', ':', ';', '!', '?', '>', '|', '"', '\'', '\u{201d}', '\u{2019}', '\u{bb}',
];

/// Find every syntactically valid http(s) URL in `text`, in order of
/// appearance. Duplicates are kept; invalid matches are dropped.
pub fn scan_urls(text: &str) -> Vec<String> {
    URL_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
        .map(|m| trim_trailing(m.as_str()))
        .filter(|candidate| is_valid(candidate))
        .map(str::to_string)
        .collect()
}

/// Strip prose punctuation glued to the end of a URL. Closing brackets
/// are only removed when they have no opening partner inside the URL.
pub fn trim_trailing(mut url: &str) -> &str {
    loop {
        let Some(last) = url.chars().last() else {
            return url;
        };
        let strip = match last {
            ')' => url.matches(')').count() > url.matches('(').count(),
            ']' => url.matches(']').count() > url.matches('[').count(),
            c => TRAILING_PUNCTUATION.contains(&c),
        };
        if !strip {
            return url;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
}

fn is_valid(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|h| {
                    h.chars().any(|c| c.is_alphanumeric()) && (h.contains('.') || h == "localhost")
                })
        }
        Err(_) => false,
    }
}


#[cfg(all(test, feature = "fuzz"))]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_scan_never_panics(text in ".*") {
            for url in scan_urls(&text) {
                prop_assert!(is_valid(&url));
            }
        }

        #[test]
        fn test_trailing_period_always_trimmed(path in "[a-z0-9/]{0,20}") {
            let text = format!("See https://example.com/{path}.");
            let urls = scan_urls(&text);
            prop_assert_eq!(urls.len(), 1);
            prop_assert!(!urls[0].ends_with('.'));
        }
    }
}
