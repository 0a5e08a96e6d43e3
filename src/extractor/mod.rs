pub mod cleaner;
pub mod js;
pub mod language;
pub mod model;
pub mod reader;

#[cfg(test)]
mod tests;

pub use model::{ArticleRecord, ArticleStatus, NO_TITLE};

use scraper::Html;
use tracing::debug;
use url::Url;

/// Turn one fetched HTML document into an [`ArticleRecord`].
///
/// Never fails: a page without enough text becomes an `Error` record and
/// a script-only page a `JsRequired` one.
pub fn extract(raw_html: &str, url: &str) -> ArticleRecord {
    let mut document = Html::parse_document(raw_html);

    // 1. Title, before stripping, so a heading inside <header> still counts
    let title = reader::extract_title(&document).unwrap_or_else(|| NO_TITLE.to_string());

    // 2. Drop scripts, chrome and ad/sidebar/menu containers
    let removed = cleaner::strip_non_content(&mut document);

    // 3. JS-dependency check
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));
    let visible = reader::visible_text(&document);
    if js::requires_javascript(&visible, host.as_deref()) {
        debug!(url, visible_chars = visible.chars().count(), "page requires javascript");
        return ArticleRecord::js_required(url, title);
    }

    // 4. Body cascade
    let Some(body) = reader::extract_body(&document) else {
        debug!(url, removed, "no content candidate long enough");
        return ArticleRecord::error(url, Some(title), "no extractable article content");
    };
    debug!(url, source = ?body.source, chars = body.text.len(), "selected body");

    // 5. Normalize and annotate
    let content = model::normalize_text(&body.text);
    let language = language::detect_language(&content);
    ArticleRecord::success(url, title, content, language)
}
