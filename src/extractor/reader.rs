use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

/// Content containers tried for the article body, in priority order.
pub const CONTENT_SELECTORS: [&str; 11] = [
    "article",
    "main",
    "[role='main']",
    ".content",
    ".main-content",
    ".post-content",
    ".entry-content",
    ".article-body",
    ".article-content",
    ".story-body",
    "#content",
];

pub const MIN_CONTAINER_CHARS: usize = 200;
pub const MIN_FALLBACK_CHARS: usize = 100;

static CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CONTENT_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});
static STRUCTURAL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6, p, li, blockquote, pre").unwrap()
});
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

static TITLE_SOURCES: LazyLock<Vec<(Selector, Option<&'static str>)>> = LazyLock::new(|| {
    vec![
        (Selector::parse("meta[property='og:title']").unwrap(), Some("content")),
        (
            Selector::parse("meta[name='twitter:title'], meta[property='twitter:title']").unwrap(),
            Some("content"),
        ),
        (Selector::parse("title").unwrap(), None),
        (Selector::parse("h1").unwrap(), None),
    ]
});

const BLOCK_TAGS: [&str; 27] = [
    "address", "article", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure", "h1",
    "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre", "section", "table",
    "td", "th", "tr", "ul",
];
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "template", "head"];

/// First non-empty of: Open Graph title, Twitter card title, `<title>`,
/// first `<h1>`.
pub fn extract_title(document: &Html) -> Option<String> {
    TITLE_SOURCES.iter().find_map(|(selector, attr)| {
        document.select(selector).find_map(|element| {
            let raw = match attr {
                Some(attr) => element.value().attr(attr).map(str::to_string),
                None => Some(element.text().collect::<String>()),
            }?;
            let title = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            (!title.is_empty()).then_some(title)
        })
    })
}

fn push_inline(out: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    let needs_gap = !out.is_empty() && !out.ends_with(char::is_whitespace);
    let words = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if words.is_empty() {
        if needs_gap {
            out.push(' ');
        }
        return;
    }
    if needs_gap && text.starts_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(&words);
    if text.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

fn paragraph_break(out: &mut String) {
    let trimmed = out.trim_end_matches([' ', '\t']).len();
    out.truncate(trimmed);
    if out.is_empty() || out.ends_with("\n\n") {
        return;
    }
    if out.ends_with('\n') {
        out.push('\n');
    } else {
        out.push_str("\n\n");
    }
}

fn walk(element: ElementRef<'_>, out: &mut String, preformatted: bool) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                if preformatted {
                    out.push_str(text);
                } else {
                    push_inline(out, text);
                }
            }
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = child.value().name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let block = BLOCK_TAGS.contains(&name);
                if block {
                    paragraph_break(out);
                }
                match name {
                    "li" => out.push_str("• "),
                    "blockquote" => out.push_str("> "),
                    _ => {}
                }
                walk(child, out, preformatted || name == "pre");
                if block {
                    paragraph_break(out);
                }
            }
            _ => {}
        }
    }
}

/// Text of `element` with block elements separated by blank lines. Inline
/// whitespace is collapsed except inside `<pre>`.
pub fn block_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    walk(element, &mut out, element.value().name() == "pre");
    out.trim().to_string()
}

/// Elements matching `selector` that are still reachable from the root.
/// `Html::select` scans the whole node arena, so subtrees detached by the
/// cleaner would otherwise come back.
pub fn select_attached<'a>(
    document: &'a Html,
    selector: &'a Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(move |element| selector.matches(element))
}

/// Visible text of the whole page: the body, or the root element when the
/// document has none.
pub fn visible_text(document: &Html) -> String {
    let root = select_attached(document, &BODY)
        .next()
        .unwrap_or_else(|| document.root_element());
    block_text(root)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySource {
    Container,
    Structural,
    FullBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyText {
    pub source: BodySource,
    pub text: String,
}

struct Stage {
    source: BodySource,
    min_chars: usize,
    candidates: fn(&Html) -> Vec<String>,
}

const STAGES: [Stage; 3] = [
    Stage {
        source: BodySource::Container,
        min_chars: MIN_CONTAINER_CHARS,
        candidates: container_candidates,
    },
    Stage {
        source: BodySource::Structural,
        min_chars: MIN_FALLBACK_CHARS,
        candidates: structural_candidate,
    },
    Stage {
        source: BodySource::FullBody,
        min_chars: MIN_FALLBACK_CHARS,
        candidates: body_candidate,
    },
];

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn container_candidates(document: &Html) -> Vec<String> {
    CONTAINERS
        .iter()
        .flat_map(|selector| select_attached(document, selector).map(block_text))
        .collect()
}

fn structural_candidate(document: &Html) -> Vec<String> {
    let mut parts: Vec<(bool, String)> = Vec::new();
    for element in select_attached(document, &STRUCTURAL) {
        // Picked up through the enclosing structural element already.
        let nested = element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| STRUCTURAL.matches(&ancestor));
        if nested {
            continue;
        }
        let text = block_text(element);
        if text.is_empty() {
            continue;
        }
        let (is_item, text) = match element.value().name() {
            "li" => (true, format!("• {text}")),
            "blockquote" => (false, format!("> {text}")),
            _ => (false, text),
        };
        parts.push((is_item, text));
    }

    let mut out = String::new();
    let mut previous_item = false;
    for (is_item, text) in parts {
        if !out.is_empty() {
            out.push_str(if is_item && previous_item { "\n" } else { "\n\n" });
        }
        out.push_str(&text);
        previous_item = is_item;
    }
    vec![out]
}

fn body_candidate(document: &Html) -> Vec<String> {
    select_attached(document, &BODY).map(block_text).collect()
}

/// Run the body cascade. Each stage scores its candidates by length and
/// keeps the longest one meeting the stage minimum; the first stage with
/// any qualifying candidate wins. Ties go to the earlier candidate.
pub fn extract_body(document: &Html) -> Option<BodyText> {
    STAGES.iter().find_map(|stage| {
        (stage.candidates)(document)
            .into_iter()
            .filter(|text| char_len(text) >= stage.min_chars)
            .fold(None, |best: Option<String>, text| match best {
                Some(best) if char_len(&best) >= char_len(&text) => Some(best),
                _ => Some(text),
            })
            .map(|text| BodyText {
                source: stage.source,
                text,
            })
    })
}
