use crate::config::Config;
use crate::discovery::{extract_listing_links, next_page_url, IdEnumerator};
use crate::models::{ListingType, Source};
use crate::scrapers::detail::DetailPipeline;
use crate::scrapers::fetcher::Fetcher;
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::{ScrapeOutcome, SearchParams};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{info, warn};
use url::Url;

const LISTING_MARKERS: [&str; 1] = ["/property/"];

/// Probing a numeric ID range when search pages turn up too few listings
#[derive(Debug, Clone)]
pub struct Enumeration {
    pub range: (u64, u64),
    pub step: u64,
    pub max_misses: u32,
}

/// spitogatos.gr: search-result pages, then each listing.
pub struct SpitogatosScraper {
    fetcher: Fetcher,
    pipeline: DetailPipeline,
    params: SearchParams,
    base_url: Url,
    enumeration: Option<Enumeration>,
}

impl SpitogatosScraper {
    pub fn new(config: &Config, params: SearchParams) -> Result<Self> {
        let base_url = Url::parse(&config.spitogatos_base_url)
            .with_context(|| format!("Invalid spitogatos URL: {}", config.spitogatos_base_url))?;
        let enumeration = config.enumeration_range.map(|range| Enumeration {
            range,
            step: config.enumeration_step,
            max_misses: config.enumeration_max_misses,
        });

        Ok(Self {
            fetcher: Fetcher::from_config(config)?,
            pipeline: DetailPipeline::from_config(config),
            params,
            base_url,
            enumeration,
        })
    }

    pub fn search_url(&self, listing: ListingType) -> Result<Url> {
        let section = match listing {
            ListingType::Sale => "for_sale-homes",
            ListingType::Rent => "for_rent-homes",
        };
        self.base_url
            .join(&format!("/en/{}/{}", section, self.params.area_slug))
            .context("Failed to build search URL")
    }

    fn enough(&self, outcome: &ScrapeOutcome) -> bool {
        outcome.records.len() >= self.params.max_properties
    }

    /// Walk the search pages for one listing type, collecting listing URLs
    /// tagged with the search they came from.
    async fn discover(
        &self,
        listing: ListingType,
        start: Url,
        urls: &mut Vec<(String, ListingType)>,
        seen: &mut HashSet<String>,
        outcome: &mut ScrapeOutcome,
    ) {
        let mut page = Some(start);
        let mut pages = 0;

        while let Some(current) = page.take() {
            if pages >= self.params.max_pages {
                break;
            }
            pages += 1;
            info!("🔍 Search page {}: {}", pages, current);

            let html = match self.fetcher.fetch_html(current.as_str()).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("⚠️  {}", e);
                    outcome.record_failure(current.as_str(), &e);
                    break;
                }
            };

            let links = extract_listing_links(&html, &current, &LISTING_MARKERS);
            let found = links.len();
            for link in links {
                if seen.insert(link.clone()) {
                    urls.push((link, listing));
                }
            }
            info!("📋 Found {} listing links", found);

            page = next_page_url(&html, &current).and_then(|next| Url::parse(&next).ok());
        }
    }

    /// `listing` is the search section the URL was found under; English
    /// detail pages carry no rent wording of their own.
    async fn visit(
        &self,
        url: &str,
        listing: Option<ListingType>,
        outcome: &mut ScrapeOutcome,
    ) -> bool {
        let mut visit = self
            .pipeline
            .visit(&self.fetcher, url, Source::Spitogatos, &self.params.neighborhoods)
            .await;
        if let (Some(listing), Some(record)) = (listing, visit.record_mut()) {
            record.listing_type = listing;
        }
        outcome.record_visit(url, visit)
    }

    async fn enumerate(
        &self,
        settings: &Enumeration,
        seen: &HashSet<String>,
        outcome: &mut ScrapeOutcome,
    ) -> Result<()> {
        let template = self
            .base_url
            .join("/en/property/")
            .context("Failed to build enumeration template")?;
        let mut ids = IdEnumerator::new(
            format!("{template}{{id}}"),
            settings.range,
            settings.step,
            settings.max_misses,
        );
        for url in seen {
            ids.mark_seen(url);
        }

        info!(
            "🔢 Probing listing IDs {}..={} (step {})",
            settings.range.0, settings.range.1, settings.step
        );
        while !self.enough(outcome) {
            let Some(url) = ids.next_candidate() else {
                break;
            };
            let hit = self.visit(&url, None, outcome).await;
            ids.record(hit);
        }
        if ids.tripped() {
            info!(
                "🛑 Stopped probing after {} consecutive misses",
                settings.max_misses
            );
        }
        Ok(())
    }
}

#[async_trait]
impl ScraperTrait for SpitogatosScraper {
    async fn scrape(&self) -> Result<ScrapeOutcome> {
        info!("Starting spitogatos scrape for {}", self.params.area_slug);
        let mut outcome = ScrapeOutcome::new(Source::Spitogatos);
        let mut urls = Vec::new();
        let mut seen = HashSet::new();

        for listing in &self.params.listing_types {
            let start = self.search_url(*listing)?;
            self.discover(*listing, start, &mut urls, &mut seen, &mut outcome).await;
        }
        outcome.discovered = urls.len();
        info!("🏠 Discovered {} listing URLs", urls.len());

        for (url, listing) in &urls {
            if self.enough(&outcome) {
                break;
            }
            self.visit(url, Some(*listing), &mut outcome).await;
        }

        if !self.enough(&outcome) {
            if let Some(settings) = &self.enumeration {
                self.enumerate(settings, &seen, &mut outcome).await?;
            }
        }

        if outcome.records.is_empty() && !outcome.failures.is_empty() {
            warn!(
                "No spitogatos listings kept ({} failures)",
                outcome.failures.len()
            );
        } else {
            info!("✅ Kept {} spitogatos listings", outcome.records.len());
        }
        Ok(outcome)
    }

    fn source_name(&self) -> &'static str {
        "spitogatos.gr"
    }
}
