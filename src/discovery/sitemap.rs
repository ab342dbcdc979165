//! Property sitemaps.
//!
//! xe.gr publishes one sitemap per listing category. Entries are either
//! detail pages (`/property/d/...`, always carrying a numeric listing ID) or
//! regional result pages (`/property/r/...`) that link to detail pages.

use crate::extract::classify::{detect_neighborhood, fold, same_neighborhood};
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use tracing::warn;

const PROPERTY_MARKERS: [&str; 4] = ["/property/d/", "/enoikiaseis/", "/poliseis/", "/property/r/"];
const REGIONAL_MARKER: &str = "/property/r/";

// `statics_compile` guards against a pattern silently becoming `None`.
static LOC_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?s)<loc>\s*(.*?)\s*</loc>").ok());
static LISTING_ID_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"[0-9]{6,}").ok());

/// `<loc>` entries of a sitemap, split by what they point at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitemapUrls {
    /// `<url><loc>` entries
    pub pages: Vec<String>,
    /// `<sitemap><loc>` entries of a sitemap index
    pub sitemaps: Vec<String>,
}

/// Parse a urlset or sitemap index. Malformed XML falls back to a plain
/// `<loc>` scan so a truncated download still yields what it contains.
pub fn parse_sitemap(xml: &str) -> SitemapUrls {
    match parse_xml(xml) {
        Ok(urls) => urls,
        Err(e) => {
            warn!("⚠️  Sitemap is not well-formed ({}), scanning <loc> tags instead", e);
            scan_locs(xml)
        }
    }
}

fn parse_xml(xml: &str) -> Result<SitemapUrls, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut urls = SitemapUrls::default();
    let mut in_sitemap = false;
    let mut in_loc = false;
    let mut loc = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sitemap" => in_sitemap = true,
                b"loc" => {
                    in_loc = true;
                    loc.clear();
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"sitemap" => in_sitemap = false,
                b"loc" => {
                    in_loc = false;
                    let entry = loc.trim().to_string();
                    if !entry.is_empty() {
                        if in_sitemap {
                            urls.sitemaps.push(entry);
                        } else {
                            urls.pages.push(entry);
                        }
                    }
                }
                _ => {}
            },
            Event::Text(e) if in_loc => loc.push_str(&e.unescape()?),
            Event::CData(e) if in_loc => loc.push_str(&String::from_utf8_lossy(&e.into_inner())),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(urls)
}

fn scan_locs(xml: &str) -> SitemapUrls {
    let mut urls = SitemapUrls::default();
    let Some(re) = LOC_RE.as_ref() else {
        return urls;
    };
    for caps in re.captures_iter(xml) {
        let Some(loc) = caps.get(1).map(|m| m.as_str().trim()) else {
            continue;
        };
        if loc.is_empty() {
            continue;
        }
        let loc = loc.replace("&amp;", "&");
        if loc.ends_with(".xml") || loc.ends_with(".xml.gz") {
            urls.sitemaps.push(loc);
        } else {
            urls.pages.push(loc);
        }
    }
    urls
}

fn has_listing_id(url: &str) -> bool {
    LISTING_ID_RE.as_ref().is_some_and(|re| re.is_match(url))
}

pub fn is_regional_url(url: &str) -> bool {
    url.contains(REGIONAL_MARKER)
}

/// A listing URL: a regional result page, or a detail page with a numeric ID.
pub fn is_property_url(url: &str) -> bool {
    if !PROPERTY_MARKERS.iter().any(|m| url.contains(m)) {
        return false;
    }
    is_regional_url(url) || has_listing_id(url)
}

/// A single listing's page (not a regional result page).
pub fn is_detail_url(url: &str) -> bool {
    !is_regional_url(url) && is_property_url(url)
}

/// Whether the URL names one of `neighborhoods`. An empty filter accepts everything.
pub fn mentions_neighborhood(url: &str, neighborhoods: &[String]) -> bool {
    if neighborhoods.is_empty() {
        return true;
    }
    let detected = detect_neighborhood(&[url]);
    let folded_url = fold(url);
    neighborhoods.iter().any(|wanted| {
        detected.is_some_and(|found| same_neighborhood(wanted, found))
            || folded_url.contains(&fold(wanted.trim()).replace(' ', "-"))
    })
}
