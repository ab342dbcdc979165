use crate::scrapers::types::ScrapeOutcome;
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for all property scrapers
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Discover listings and scrape each detail page.
    ///
    /// Per-URL failures are collected in the outcome; an `Err` means the
    /// run could not start at all.
    async fn scrape(&self) -> Result<ScrapeOutcome>;

    /// Get the name of the scraper source
    fn source_name(&self) -> &'static str;
}
