use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

const STRIPPED_TAGS: &str =
    "script, style, nav, header, footer, aside, iframe, svg, template, [role='navigation'], [role='complementary']";

static STRIPPED: LazyLock<Selector> = LazyLock::new(|| Selector::parse(STRIPPED_TAGS).unwrap());
static WITH_CLASS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[class]").unwrap());
static CONTENT_ROOTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("main, article, [role='main']").unwrap());

// Never removed on class grounds alone: a `<body class="has-sidebar">` is
// still the page.
const PROTECTED: [&str; 4] = ["html", "body", "main", "article"];

const BOILERPLATE_WORDS: [&str; 7] = ["ad", "ads", "nav", "navbar", "navigation", "menu", "sidebar"];

// `has-sidebar`, `no-ads`, `with-menu` describe the page layout, not the element.
const LAYOUT_MODIFIERS: [&str; 3] = ["has", "no", "with"];

/// True for class tokens that mark ads, sidebars, menus and navigation.
/// Tokens are compared word by word on `-` and `_` boundaries.
fn is_boilerplate_class(token: &str) -> bool {
    let token = token.to_ascii_lowercase();
    let mut words = token.split(['-', '_']).filter(|word| !word.is_empty());
    let Some(first) = words.next() else {
        return false;
    };
    if LAYOUT_MODIFIERS.contains(&first) {
        return false;
    }
    std::iter::once(first)
        .chain(words)
        .any(|word| BOILERPLATE_WORDS.contains(&word) || word.starts_with("advert"))
}

fn is_boilerplate_element(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    !PROTECTED.contains(&value.name())
        && value.classes().any(is_boilerplate_class)
        && element.select(&CONTENT_ROOTS).next().is_none()
}

/// Detach non-content subtrees from `document` in place. Returns how
/// many subtrees were removed.
pub fn strip_non_content(document: &mut Html) -> usize {
    let doomed: Vec<_> = document
        .select(&STRIPPED)
        .chain(
            document
                .select(&WITH_CLASS)
                .filter(is_boilerplate_element),
        )
        .map(|element| element.id())
        .collect();

    let mut removed = 0;
    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
            removed += 1;
        }
    }
    removed
}
