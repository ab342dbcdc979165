pub mod detail;
pub mod fetcher;
pub mod spitogatos;
pub mod traits;
pub mod types;
pub mod xe;

pub use detail::{DetailPipeline, Visit};
pub use fetcher::Fetcher;
pub use spitogatos::SpitogatosScraper;
pub use traits::ScraperTrait;
pub use types::{FailedUrl, ScrapeOutcome, SearchParams};
pub use xe::XeScraper;

use crate::config::Config;
use crate::models::Source;
use anyhow::Result;

/// One scraper per requested source, in the order given.
pub fn build_scrapers(
    sources: &[Source],
    config: &Config,
    params: &SearchParams,
) -> Result<Vec<Box<dyn ScraperTrait>>> {
    sources
        .iter()
        .map(|source| -> Result<Box<dyn ScraperTrait>> {
            Ok(match source {
                Source::Spitogatos => Box::new(SpitogatosScraper::new(config, params.clone())?),
                Source::Xe => Box::new(XeScraper::new(config, params.clone())?),
            })
        })
        .collect()
}
