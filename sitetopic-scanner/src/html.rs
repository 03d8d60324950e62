//! HTML helpers shared by the fetch strategies.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));
static DIV_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div").expect("static selector"));

/// Number of `a[href]` elements in the document.
///
/// Every anchor counts, including ones whose href would later be skipped by
/// [`extract_links`]. This is what the strategy heuristic looks at.
pub fn count_anchors(html: &str) -> usize {
    Html::parse_document(html).select(&LINK_SELECTOR).count()
}

/// Extract every hyperlink in `html`, resolved to an absolute URL against `base`.
///
/// Links keep document order and may contain duplicates; deduplication is the
/// crawler's job.
pub fn extract_links(html: &str, base: &str) -> Vec<String> {
    let Ok(base_url) = Url::parse(base) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    document
        .select(&LINK_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_url(&base_url, href))
        .collect()
}

/// Resolve `href` against `base`, dropping the fragment.
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    // Skip empty, javascript:, mailto:, tel:, in-page anchors
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    url.set_fragment(None);
    Some(url.to_string())
}

/// Visible text of a rendered page.
///
/// Collects the trimmed text of every leaf `<div>` (a div with no nested div),
/// one block per line. Empty blocks are skipped.
pub fn extract_visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut content = String::new();

    for div in document.select(&DIV_SELECTOR) {
        if div.select(&DIV_SELECTOR).next().is_some() {
            continue;
        }
        let text = stripped_text(div);
        if !text.is_empty() {
            content.push_str(&text);
            content.push('\n');
        }
    }

    content
}

fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .concat()
}
