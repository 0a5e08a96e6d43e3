use encoding_rs::Encoding;
use regex::Regex;
use std::sync::LazyLock;

static HEADER_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

// Matches both `<meta charset=..>` and the http-equiv `content="..; charset=.."` form.
static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s[^>]*?charset\s*=\s*["']?([^"'\s;/>]+)"#).unwrap());

const SNIFF_WINDOW: usize = 4096;

/// Pick the encoding of an HTML body: Content-Type header, then a
/// `<meta>` declaration in the first 4KB, then statistical detection.
pub fn detect_encoding(content_type: &str, body: &[u8]) -> &'static Encoding {
    let label_encoding = |re: &Regex, haystack: &str| {
        re.captures(haystack)
            .and_then(|caps| caps.get(1))
            .and_then(|m| Encoding::for_label(m.as_str().trim().as_bytes()))
    };

    if let Some(encoding) = label_encoding(&HEADER_CHARSET_REGEX, content_type) {
        return encoding;
    }

    let head = &body[..body.len().min(SNIFF_WINDOW)];
    if let Some(encoding) = label_encoding(&META_CHARSET_REGEX, &String::from_utf8_lossy(head)) {
        return encoding;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(head, head.len() == body.len());
    detector.guess(None, true)
}

/// Decode to UTF-8. A byte-order mark wins over the detected encoding and
/// malformed sequences become U+FFFD rather than failing the page.
pub fn decode_body(content_type: &str, body: &[u8]) -> (String, &'static Encoding) {
    let encoding = detect_encoding(content_type, body);
    let (decoded, used, had_errors) = encoding.decode(body);
    if had_errors {
        tracing::debug!(encoding = used.name(), "body contained malformed sequences");
    }
    (decoded.into_owned(), used)
}
