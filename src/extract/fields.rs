//! Field extractors.
//!
//! Every extractor walks an ordered list of CSS selectors, then an ordered
//! list of regular expressions over the page text, and returns the first
//! candidate that parses and passes the plausibility bounds. Later
//! candidates are never consulted once one is accepted. Price patterns over
//! free text are the exception: their matches are merged and tried in text
//! order, since `285.000 € 3.000 €/τ.μ.` would otherwise hand the prefix
//! pattern the unit price.

use crate::extract::numbers::{first_integer, parse_localized_number};
use crate::models::EnergyClass;
use crate::validation::Bounds;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

const TITLE_MAX_CHARS: usize = 200;
const ADDRESS_MAX_CHARS: usize = 300;
const DESCRIPTION_MAX_CHARS: usize = 1000;

const TITLE_SELECTORS: &[&str] = &[
    "h1",
    ".property-title",
    ".listing-title",
    "[data-testid*=\"title\"]",
    "title",
];

const PRICE_SELECTORS: &[&str] = &[
    ".price",
    ".property-price",
    "[data-testid*=\"price\"]",
    ".listing-price",
    ".price-value",
    "[class*=\"price\"]",
];

const SQM_SELECTORS: &[&str] = &[
    ".sqm",
    ".area",
    ".square-meters",
    "[data-testid*=\"area\"]",
    "[class*=\"sqm\"]",
];

const ROOMS_SELECTORS: &[&str] = &[
    ".rooms",
    ".bedrooms",
    "[data-testid*=\"rooms\"]",
    "[data-testid*=\"bedrooms\"]",
];

const FLOOR_SELECTORS: &[&str] = &[".floor", "[data-testid*=\"floor\"]"];

const ENERGY_SELECTORS: &[&str] = &[
    ".energy-class",
    "[data-testid*=\"energy\"]",
    ".energy-rating",
    ".energy-efficiency",
    ".energy-certificate",
    ".property-energy",
    "[class*=\"energy\"]",
];

const ENERGY_IMAGE_SELECTORS: &[&str] = &[
    "img[src*=\"energy\"]",
    "img[alt*=\"energy\"]",
    "img[alt*=\"Energy\"]",
    "img[title*=\"energy\"]",
];

const ADDRESS_SELECTORS: &[&str] = &[
    ".address",
    ".property-address",
    "[data-testid*=\"address\"]",
    ".location",
    ".property-location",
    "[data-testid*=\"location\"]",
    ".geo-info",
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    ".description",
    ".property-description",
    "[data-testid*=\"description\"]",
    ".listing-description",
    ".property-details",
];

const PRICE_PATTERNS: &[&str] = &[
    r"€\s*([0-9](?:[0-9.,]*[0-9])?)",
    r"([0-9](?:[0-9.,]*[0-9])?)\s*€",
    r"(?i)([0-9](?:[0-9.,]*[0-9])?)\s*(?:ευρώ|ευρω|eur\b)",
    r"(?i)(?:τιμ[ήη]|price)\s*:?\s*([0-9](?:[0-9.,]*[0-9])?)",
];

const SQM_PATTERNS: &[&str] = &[
    r"(?i)([0-9](?:[0-9.,]*[0-9])?)\s*(?:τ\.\s?μ\.?|τμ\b|m²|m2\b|sq\.?\s?m\b|sqm\b|τετραγωνικ)",
    r"(?i)(?:εμβαδ[όο]ν?|surface|size)\s*:?\s*([0-9](?:[0-9.,]*[0-9])?)",
];

const ROOMS_PATTERNS: &[&str] = &[
    r"(?i)\b([0-9]{1,2})\s*(?:υπνοδωμ[άα]τι[οα]|δωμ[άα]τι[οα]|bedrooms?|rooms?)",
    r"(?i)(?:υπνοδωμ[άα]τια|δωμ[άα]τια|bedrooms|rooms)\s*:?\s*([0-9]{1,2})\b",
];

const FLOOR_PATTERNS: &[&str] = &[
    r"(?i)\b([0-9]{1,2})\s*(?:ος|ο|st|nd|rd|th)?\s*(?:[όο]ροφος|floor)",
    r"(?i)(ισ[όο]γειο|ημι[ώω]ροφος|υπ[όο]γειο|ground floor|basement|mezzanine)",
    r"(?i)(?:[όο]ροφος|floor)\s*:?\s*([0-9]{1,2})(?:ος|ο|st|nd|rd|th)?\b",
];

/// Energy labels in Greek or English followed by the class letter. Greek
/// certificates print the class in Greek capitals (Α, Β, Γ, ...).
const ENERGY_LABEL_PATTERNS: &[&str] = &[
    r"(?i:ενεργειακ[ήη]\s+κλ[άα]ση|κλ[άα]ση\s+εν[έε]ργειας|κατηγορ[ίι]α\s+εν[έε]ργειας|ενεργειακ[όο]\s+πιστοποιητικ[όο]|energy\s+class|energy\s+rating|energy\s+certificate|energy\s+efficiency)\s*[:\-]?\s*([A-GΑΒΓΔΕΖΗ]\+?)(?:[^\p{L}\p{N}+]|$)",
];

const ENERGY_ATTRIBUTE_PATTERNS: &[&str] = &[
    r#"(?i:data-energy(?:-class)?)\s*=\s*["']?([A-Ga-g]\+?)["'\s>]"#,
];

static TITLE_SEL: Lazy<Vec<Selector>> = Lazy::new(|| selectors(TITLE_SELECTORS));
static PRICE_SEL: Lazy<Vec<Selector>> = Lazy::new(|| selectors(PRICE_SELECTORS));
static SQM_SEL: Lazy<Vec<Selector>> = Lazy::new(|| selectors(SQM_SELECTORS));
static ROOMS_SEL: Lazy<Vec<Selector>> = Lazy::new(|| selectors(ROOMS_SELECTORS));
static FLOOR_SEL: Lazy<Vec<Selector>> = Lazy::new(|| selectors(FLOOR_SELECTORS));
static ENERGY_SEL: Lazy<Vec<Selector>> = Lazy::new(|| selectors(ENERGY_SELECTORS));
static ENERGY_IMG_SEL: Lazy<Vec<Selector>> = Lazy::new(|| selectors(ENERGY_IMAGE_SELECTORS));
static ADDRESS_SEL: Lazy<Vec<Selector>> = Lazy::new(|| selectors(ADDRESS_SELECTORS));
static DESCRIPTION_SEL: Lazy<Vec<Selector>> = Lazy::new(|| selectors(DESCRIPTION_SELECTORS));

static PRICE_RE: Lazy<Vec<Regex>> = Lazy::new(|| patterns(PRICE_PATTERNS));
static SQM_RE: Lazy<Vec<Regex>> = Lazy::new(|| patterns(SQM_PATTERNS));
static ROOMS_RE: Lazy<Vec<Regex>> = Lazy::new(|| patterns(ROOMS_PATTERNS));
static FLOOR_RE: Lazy<Vec<Regex>> = Lazy::new(|| patterns(FLOOR_PATTERNS));
static ENERGY_LABEL_RE: Lazy<Vec<Regex>> = Lazy::new(|| patterns(ENERGY_LABEL_PATTERNS));
static ENERGY_ATTR_RE: Lazy<Vec<Regex>> = Lazy::new(|| patterns(ENERGY_ATTRIBUTE_PATTERNS));

// The `Option` statics below are checked by `all_static_patterns_compile`.

/// A standalone class letter, e.g. the text of an `.energy-class` badge.
static ENERGY_TOKEN_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\p{L}\p{N}])([A-GΑΒΓΔΕΖΗ]\+?)(?:[^\p{L}\p{N}+]|$)").ok()
});

/// Class encoded in an image name or alt text: `energy-class-b.png`, `energy_a_plus.svg`.
static ENERGY_IMAGE_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)(?:energy|class)[-_ ]?(?:class[-_ ]?)?([a-g])(?:[-_ ]?(plus|\+))?(?:[^a-z0-9]|$)")
        .ok()
});

static STREET_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)((?:οδ[όο]ς|οδ\.|λεωφ[όο]ρος|λεωφ\.|πλατε[ίι]α)\s+\p{L}[\p{L}\-]*(?:\s+\p{L}[\p{L}\-]*)?(?:\s+[0-9]{1,3})?)",
    )
    .ok()
});

// Entries that fail to parse are dropped; `all_static_selectors_parse` and
// `all_static_patterns_compile` catch that.
fn selectors(list: &[&str]) -> Vec<Selector> {
    list.iter().filter_map(|s| Selector::parse(s).ok()).collect()
}

fn patterns(list: &[&str]) -> Vec<Regex> {
    list.iter().filter_map(|p| Regex::new(p).ok()).collect()
}

/// A parsed page plus its visible text.
pub struct Page {
    document: Html,
    text: String,
    raw: String,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let text = visible_text(&document);
        Self {
            document,
            text,
            raw: html.to_string(),
        }
    }

    /// Whitespace-collapsed text of every node outside `<script>`/`<style>`.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

fn visible_text(document: &Html) -> String {
    let mut parts = Vec::new();
    for node in document.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name()))
            .is_some_and(|name| matches!(name, "script" | "style" | "noscript" | "template"));
        if !hidden {
            parts.push(&**text);
        }
    }
    collapse_whitespace(&parts.join(" "))
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// First element, in selector order then document order, accepted by `pick`.
fn from_selectors<T>(
    page: &Page,
    selectors: &[Selector],
    mut pick: impl FnMut(&str) -> Option<T>,
) -> Option<T> {
    selectors.iter().find_map(|selector| {
        page.document
            .select(selector)
            .find_map(|element| pick(&element_text(element)))
    })
}

/// First capture group, in pattern order then match order, accepted by `pick`.
fn from_patterns<T>(
    text: &str,
    patterns: &[Regex],
    mut pick: impl FnMut(&str) -> Option<T>,
) -> Option<T> {
    patterns.iter().find_map(|re| {
        re.captures_iter(text)
            .find_map(|caps| caps.get(1).and_then(|m| pick(m.as_str())))
    })
}

pub fn extract_title(page: &Page) -> Option<String> {
    from_selectors(page, &TITLE_SEL, |text| {
        (text.chars().count() > 5).then(|| truncate_chars(text, TITLE_MAX_CHARS))
    })
}

pub fn extract_price(page: &Page, bounds: &Bounds) -> Option<f64> {
    from_selectors(page, &PRICE_SEL, |text| price_in(text, bounds))
        .or_else(|| price_in(page.text(), bounds))
}

/// Matches of every price pattern, taken in text order. A figure followed
/// by an area unit is a size or a unit price and is skipped.
fn price_in(text: &str, bounds: &Bounds) -> Option<f64> {
    let mut candidates = Vec::new();
    for re in PRICE_RE.iter() {
        for caps in re.captures_iter(text) {
            let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if !has_unit_suffix(&text[whole.end()..]) {
                candidates.push((value.start(), value.as_str()));
            }
        }
    }
    // stable: ties keep pattern order
    candidates.sort_by_key(|&(start, _)| start);
    candidates
        .into_iter()
        .find_map(|(_, raw)| parse_localized_number(raw).filter(|p| bounds.price_ok(*p)))
}

/// `2.500 €/τ.μ.` is a unit price and `120 τ.μ.` a size, not the listing price.
fn has_unit_suffix(rest: &str) -> bool {
    let head: String = rest
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(8)
        .collect::<String>()
        .to_lowercase();
    let head = head
        .strip_prefix('€')
        .or_else(|| head.strip_prefix("eur"))
        .unwrap_or(&head);
    ["/τ.μ", "/τμ", "/m²", "/m2", "/sqm", "/sq", "ανάτ", "perm", "τ.μ", "τμ", "m²", "m2", "sqm", "sq.m", "τετρ"]
        .iter()
        .any(|marker| head.starts_with(marker))
}

pub fn extract_sqm(page: &Page, bounds: &Bounds) -> Option<f64> {
    let accept = |raw: &str| parse_localized_number(raw).filter(|s| bounds.sqm_ok(*s));
    from_selectors(page, &SQM_SEL, |text| from_patterns(text, &SQM_RE, accept))
        .or_else(|| from_patterns(page.text(), &SQM_RE, accept))
}

pub fn extract_rooms(page: &Page, bounds: &Bounds) -> Option<u32> {
    from_selectors(page, &ROOMS_SEL, |text| {
        first_integer(text).filter(|r| bounds.rooms_ok(*r))
    })
    .or_else(|| {
        from_patterns(page.text(), &ROOMS_RE, |raw| {
            raw.parse::<u32>().ok().filter(|r| bounds.rooms_ok(*r))
        })
    })
}

pub fn extract_floor(page: &Page) -> Option<String> {
    from_selectors(page, &FLOOR_SEL, |text| {
        floor_in(text).or_else(|| first_integer(text).map(|n| n.to_string()))
    })
    .or_else(|| floor_in(page.text()))
}

fn floor_in(text: &str) -> Option<String> {
    from_patterns(text, &FLOOR_RE, |raw| Some(normalize_floor(raw)))
}

fn normalize_floor(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    if lower.starts_with("ισ") || lower == "ground floor" {
        "ground".to_string()
    } else if lower.starts_with("υπ") || lower == "basement" {
        "basement".to_string()
    } else if lower.starts_with("ημι") || lower == "mezzanine" {
        "mezzanine".to_string()
    } else {
        lower
    }
}

pub fn extract_energy_class(page: &Page) -> Option<EnergyClass> {
    let token_re = ENERGY_TOKEN_RE.as_ref()?;

    // 1. dedicated elements
    from_selectors(page, &ENERGY_SEL, |text| {
        token_re
            .captures_iter(text)
            .find_map(|caps| caps.get(1).and_then(|m| energy_from_token(m.as_str())))
    })
    // 2. labels in the page text
    .or_else(|| from_patterns(page.text(), &ENERGY_LABEL_RE, energy_from_token))
    // 3. data attributes in the markup
    .or_else(|| {
        from_patterns(page.raw(), &ENERGY_ATTR_RE, |raw| {
            energy_from_token(&raw.to_uppercase())
        })
    })
    // 4. certificate images
    .or_else(|| energy_from_images(page))
}

fn energy_from_images(page: &Page) -> Option<EnergyClass> {
    let image_re = ENERGY_IMAGE_RE.as_ref()?;
    ENERGY_IMG_SEL.iter().find_map(|selector| {
        page.document.select(selector).find_map(|img| {
            ["src", "alt", "title"]
                .iter()
                .filter_map(|attr| img.value().attr(attr))
                .find_map(|value| {
                    let caps = image_re.captures(value)?;
                    let letter = caps.get(1)?.as_str().to_uppercase();
                    let plus = if caps.get(2).is_some() { "+" } else { "" };
                    energy_from_token(&format!("{letter}{plus}"))
                })
        })
    })
}

/// Map a captured class token (Latin or Greek letter, optional `+`) to an
/// [`EnergyClass`]. Letters outside the fixed alphabet are rejected.
fn energy_from_token(token: &str) -> Option<EnergyClass> {
    let latin: String = token
        .trim()
        .chars()
        .map(|c| match c {
            'Α' => 'A',
            'Β' => 'B',
            'Γ' => 'C',
            'Δ' => 'D',
            'Ε' => 'E',
            'Ζ' => 'F',
            'Η' => 'G',
            other => other,
        })
        .collect();
    latin.parse().ok()
}

pub fn extract_address(page: &Page) -> Option<String> {
    from_selectors(page, &ADDRESS_SEL, |text| {
        (text.chars().count() >= 3).then(|| truncate_chars(text, ADDRESS_MAX_CHARS))
    })
    .or_else(|| {
        let street = STREET_RE.as_ref()?;
        street
            .captures(page.text())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    })
}

pub fn extract_description(page: &Page) -> Option<String> {
    from_selectors(page, &DESCRIPTION_SEL, |text| {
        (text.chars().count() > 20).then(|| truncate_chars(text, DESCRIPTION_MAX_CHARS))
    })
}
