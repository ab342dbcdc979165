use crate::config::Config;
use crate::error::{FailureKind, ScrapeError};
use crate::models::{ListingType, PropertyRecord, Source};
use crate::scrapers::detail::Visit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Search parameters for property scraping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Area slug used in search-page URLs
    pub area_slug: String,
    /// Only keep listings in these neighborhoods (any spelling). Empty keeps all.
    pub neighborhoods: Vec<String>,
    pub listing_types: Vec<ListingType>,
    /// Stop once this many records have been kept
    pub max_properties: usize,
    /// Search-result pages followed per listing type
    pub max_pages: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            area_slug: "athens-center".to_string(),
            neighborhoods: Vec::new(),
            listing_types: vec![ListingType::Sale, ListingType::Rent],
            max_properties: 20,
            max_pages: 3,
        }
    }
}

impl SearchParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            area_slug: config.area_slug.clone(),
            max_properties: config.max_properties,
            max_pages: config.max_pages,
            ..Self::default()
        }
    }

    pub fn wants(&self, listing: ListingType) -> bool {
        self.listing_types.is_empty() || self.listing_types.contains(&listing)
    }
}

/// A URL that produced no record, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedUrl {
    pub url: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Everything one scraper run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    pub source: Source,
    pub records: Vec<PropertyRecord>,
    pub failures: Vec<FailedUrl>,
    /// Listing URLs found before any detail page was fetched
    pub discovered: usize,
    /// Listings dropped by the neighborhood filter
    pub skipped_out_of_area: usize,
    /// Detail pages fetched; search pages and sitemaps are not counted
    pub visited: usize,
}

impl ScrapeOutcome {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            records: Vec::new(),
            failures: Vec::new(),
            discovered: 0,
            skipped_out_of_area: 0,
            visited: 0,
        }
    }

    /// Account for one detail page. Returns whether it was a listing at all.
    pub fn record_visit(&mut self, url: &str, visit: Visit) -> bool {
        self.visited += 1;
        let is_listing = visit.is_listing();
        match visit {
            Visit::Kept(record) => self.records.push(record),
            Visit::OutOfArea(_) => self.skipped_out_of_area += 1,
            Visit::Failed(e) => self.record_failure(url, &e),
        }
        is_listing
    }

    pub fn record_failure(&mut self, url: &str, error: &ScrapeError) {
        self.failures.push(FailedUrl {
            url: url.to_string(),
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    pub fn failures_by_kind(&self) -> BTreeMap<FailureKind, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Detail pages fetched, kept or not.
    pub fn attempted(&self) -> usize {
        self.visited
    }
}
