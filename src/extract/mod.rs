//! Turning a fetched listing page into a [`PropertyRecord`].

pub mod classify;
pub mod fields;
pub mod numbers;

use crate::models::{PropertyRecord, Source};
use crate::validation::{confidence_score, Bounds, RequiredField};
use fields::Page;
use sha2::{Digest, Sha256};
use url::Url;

pub use classify::{
    classify_listing_type, classify_property_type, detect_neighborhood, fold, same_neighborhood,
};
pub use fields::{
    extract_address, extract_description, extract_energy_class, extract_floor, extract_price,
    extract_rooms, extract_sqm, extract_title,
};
pub use numbers::parse_localized_number;

/// Words that appear on every listing page and almost nowhere else.
const PROPERTY_INDICATORS: [&str; 9] = [
    "τιμη",
    "price",
    "τ.μ",
    "m²",
    "sqm",
    "ενοικιαση",
    "πωληση",
    "διαμερισμα",
    "€",
];

/// Minimum run of digits treated as a listing ID in a URL.
const MIN_ID_DIGITS: usize = 6;

#[derive(Debug, Clone)]
pub struct PropertyExtractor {
    bounds: Bounds,
    required: Vec<RequiredField>,
}

impl Default for PropertyExtractor {
    fn default() -> Self {
        Self::new(Bounds::default(), RequiredField::ALL.to_vec())
    }
}

impl PropertyExtractor {
    pub fn new(bounds: Bounds, required: Vec<RequiredField>) -> Self {
        Self { bounds, required }
    }

    /// Extract every field the page exposes. Fields that cannot be read stay
    /// `None`; nothing is estimated or filled in from elsewhere.
    pub fn extract(&self, html: &str, url: &str, source: Source) -> PropertyRecord {
        let page = Page::parse(html);
        let mut record = PropertyRecord::new(property_id(source, url), source, url);

        record.title = extract_title(&page);
        record.price = extract_price(&page, &self.bounds);
        record.sqm = extract_sqm(&page, &self.bounds);
        record.rooms = extract_rooms(&page, &self.bounds);
        record.floor = extract_floor(&page);
        record.energy_class = extract_energy_class(&page);
        record.address = extract_address(&page);
        record.description = extract_description(&page);

        let title = record.title.as_deref().unwrap_or_default();
        let address = record.address.as_deref().unwrap_or_default();
        record.neighborhood = detect_neighborhood(&[title, address, url]).map(str::to_string);
        record.property_type = classify_property_type(title, url);
        record.listing_type = classify_listing_type(title, url);

        record.price_per_sqm = match (record.price, record.sqm) {
            (Some(price), Some(sqm)) if sqm > 0.0 => Some(round2(price / sqm)),
            _ => None,
        };
        record.html_source_hash = Some(html_hash(html));
        record.confidence_score = confidence_score(&record, &self.required);
        record
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Stable record ID: the listing number from the URL when there is one,
/// otherwise a prefix of the URL's SHA-256.
pub fn property_id(source: Source, url: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());

    match numeric_id(&path) {
        Some(digits) => format!("{source}_{digits}"),
        None => {
            let digest = hex::encode(Sha256::digest(url.as_bytes()));
            format!("{source}_{}", &digest[..12])
        }
    }
}

fn numeric_id(path: &str) -> Option<&str> {
    path.split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() >= MIN_ID_DIGITS)
}

/// First 16 hex characters of the SHA-256 of the page body.
pub fn html_hash(html: &str) -> String {
    let digest = hex::encode(Sha256::digest(html.as_bytes()));
    digest[..16].to_string()
}

/// Cheap pre-check before running the extractors: the body is big enough to
/// be a real page and mentions a price, an area or a sale/rent keyword.
pub fn looks_like_property_page(html: &str, min_bytes: usize) -> bool {
    if html.len() < min_bytes {
        return false;
    }
    let folded = fold(html);
    PROPERTY_INDICATORS.iter().any(|marker| folded.contains(marker))
}
