use crate::config::Config;
use crate::error::ScrapeError;
use crate::extract::{looks_like_property_page, same_neighborhood, PropertyExtractor};
use crate::models::{PropertyRecord, Source};
use crate::scrapers::fetcher::Fetcher;
use crate::validation::Validator;
use tracing::{debug, info, warn};

/// What happened to one detail page.
#[derive(Debug)]
pub enum Visit {
    Kept(PropertyRecord),
    /// A real listing, but outside the requested neighborhoods
    OutOfArea(PropertyRecord),
    Failed(ScrapeError),
}

impl Visit {
    /// Whether the URL turned out to be a listing page at all.
    pub fn is_listing(&self) -> bool {
        match self {
            Visit::Kept(_) | Visit::OutOfArea(_) => true,
            Visit::Failed(e) => matches!(e, ScrapeError::Rejected { .. }),
        }
    }

    /// The extracted record, kept or filtered out.
    pub fn record_mut(&mut self) -> Option<&mut PropertyRecord> {
        match self {
            Visit::Kept(record) | Visit::OutOfArea(record) => Some(record),
            Visit::Failed(_) => None,
        }
    }
}

/// Fetch, check, extract and validate a single listing page.
#[derive(Debug, Clone)]
pub struct DetailPipeline {
    extractor: PropertyExtractor,
    validator: Validator,
    min_page_bytes: usize,
    keep_unverified: bool,
}

impl DetailPipeline {
    pub fn new(
        extractor: PropertyExtractor,
        validator: Validator,
        min_page_bytes: usize,
        keep_unverified: bool,
    ) -> Self {
        Self {
            extractor,
            validator,
            min_page_bytes,
            keep_unverified,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            PropertyExtractor::new(config.bounds.clone(), config.required_fields.clone()),
            Validator::new(config.bounds.clone(), config.denylist.clone()),
            config.min_page_bytes,
            config.keep_unverified,
        )
    }

    /// Turn a downloaded page into a validated record.
    pub fn process(&self, html: &str, url: &str, source: Source) -> Result<PropertyRecord, ScrapeError> {
        if !looks_like_property_page(html, self.min_page_bytes) {
            return Err(ScrapeError::NotAPropertyPage {
                url: url.to_string(),
            });
        }

        let mut record = self.extractor.extract(html, url, source);
        if !self.validator.apply(&mut record) && !self.keep_unverified {
            let flags = record
                .validation_flags
                .iter()
                .copied()
                .filter(|f| f.is_rejection())
                .collect();
            return Err(ScrapeError::Rejected {
                url: url.to_string(),
                flags,
            });
        }
        Ok(record)
    }

    pub async fn visit(
        &self,
        fetcher: &Fetcher,
        url: &str,
        source: Source,
        neighborhoods: &[String],
    ) -> Visit {
        debug!("Fetching detail page: {}", url);
        let html = match fetcher.fetch_html(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("⚠️  {}", e);
                return Visit::Failed(e);
            }
        };

        match self.process(&html, url, source) {
            Ok(record) if !in_area(&record, neighborhoods) => {
                debug!("Skipping {}: neighborhood {:?} not requested", url, record.neighborhood);
                Visit::OutOfArea(record)
            }
            Ok(record) => {
                info!(
                    "✅ {} | {} | confidence {:.2}",
                    record.id,
                    record.title.as_deref().unwrap_or("(no title)"),
                    record.confidence_score
                );
                Visit::Kept(record)
            }
            Err(e) => {
                warn!("⚠️  {}", e);
                Visit::Failed(e)
            }
        }
    }
}

/// A record passes the neighborhood filter when the filter is empty or the
/// detected neighborhood matches one of the requested names.
pub fn in_area(record: &PropertyRecord, neighborhoods: &[String]) -> bool {
    if neighborhoods.is_empty() {
        return true;
    }
    record
        .neighborhood
        .as_deref()
        .is_some_and(|found| neighborhoods.iter().any(|wanted| same_neighborhood(wanted, found)))
}
