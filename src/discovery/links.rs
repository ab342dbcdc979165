use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

static ANCHOR_SEL: Lazy<Option<Selector>> = Lazy::new(|| Selector::parse("a[href]").ok());

static NEXT_PAGE_SEL: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "link[rel=\"next\"]",
        "a[rel=\"next\"]",
        "a.next",
        ".next a",
        "a.pagination-next",
        ".pagination-next a",
        "a[aria-label*=\"next\"]",
        "a[aria-label*=\"Next\"]",
    ]
    .iter()
    .filter_map(|s| Selector::parse(s).ok())
    .collect()
});

/// Resolve `href` against `base`, keeping only http(s) links on the same host.
fn resolve(base: &Url, href: &str) -> Option<Url> {
    let mut url = base.join(href.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str() != base.host_str() {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Links on a search page whose path contains one of `markers`, resolved
/// against `base`, in document order without duplicates.
pub fn extract_listing_links(html: &str, base: &Url, markers: &[&str]) -> Vec<String> {
    let Some(anchor) = ANCHOR_SEL.as_ref() else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    document
        .select(anchor)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve(base, href))
        .filter(|url| markers.iter().any(|m| url.path().contains(m)))
        .map(String::from)
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// The pagination link to the next result page, if the page has one.
pub fn next_page_url(html: &str, base: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    NEXT_PAGE_SEL.iter().find_map(|selector| {
        document
            .select(selector)
            .filter_map(|el| el.value().attr("href"))
            .filter_map(|href| resolve(base, href))
            .find(|url| url != base)
            .map(String::from)
    })
}
