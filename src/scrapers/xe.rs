use crate::config::Config;
use crate::discovery::{
    extract_listing_links, is_detail_url, is_property_url, is_regional_url, mentions_neighborhood,
    parse_sitemap,
};
use crate::error::ScrapeError;
use crate::extract::classify_listing_type;
use crate::models::Source;
use crate::scrapers::detail::DetailPipeline;
use crate::scrapers::fetcher::Fetcher;
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::{ScrapeOutcome, SearchParams};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};
use url::Url;

const DETAIL_MARKERS: [&str; 1] = ["/property/d/"];

/// Detail links taken from one regional result page.
const MAX_LINKS_PER_REGION: usize = 20;

/// Sitemap indexes are followed this many levels deep.
const MAX_SITEMAP_DEPTH: u32 = 1;

/// xe.gr: property sitemaps, then each listing.
pub struct XeScraper {
    fetcher: Fetcher,
    pipeline: DetailPipeline,
    params: SearchParams,
    base_url: Url,
    sitemaps: Vec<String>,
}

impl XeScraper {
    pub fn new(config: &Config, params: SearchParams) -> Result<Self> {
        let base_url = Url::parse(&config.xe_base_url)
            .with_context(|| format!("Invalid xe URL: {}", config.xe_base_url))?;

        Ok(Self {
            fetcher: Fetcher::from_config(config)?,
            pipeline: DetailPipeline::from_config(config),
            params,
            base_url,
            sitemaps: config.xe_sitemaps.clone(),
        })
    }

    fn enough(&self, outcome: &ScrapeOutcome) -> bool {
        outcome.records.len() >= self.params.max_properties
    }

    fn same_site(&self, url: &str) -> bool {
        Url::parse(url).is_ok_and(|u| u.host_str() == self.base_url.host_str())
    }

    /// Listing URLs from every configured sitemap that pass the URL-level
    /// filters: same site, property URL, wanted listing type and neighborhood.
    async fn discover(&self, outcome: &mut ScrapeOutcome) -> Vec<String> {
        let mut queue: VecDeque<(String, u32)> = self
            .sitemaps
            .iter()
            .filter_map(|path| self.base_url.join(path).ok())
            .map(|url| (url.to_string(), 0))
            .collect();
        let mut candidates = Vec::new();
        let mut seen = HashSet::new();

        while let Some((sitemap_url, depth)) = queue.pop_front() {
            info!("🗺️  Sitemap: {}", sitemap_url);
            let xml = match self.fetcher.fetch_html(&sitemap_url).await {
                Ok(xml) => xml,
                Err(e) => {
                    warn!("⚠️  {}", e);
                    outcome.record_failure(&sitemap_url, &e);
                    continue;
                }
            };

            let urls = parse_sitemap(&xml);
            if depth < MAX_SITEMAP_DEPTH {
                queue.extend(urls.sitemaps.into_iter().map(|nested| (nested, depth + 1)));
            }

            let before = candidates.len();
            for url in urls.pages {
                if !self.same_site(&url) || !is_property_url(&url) {
                    continue;
                }
                if !self.params.wants(classify_listing_type("", &url)) {
                    continue;
                }
                if !mentions_neighborhood(&url, &self.params.neighborhoods) {
                    outcome.skipped_out_of_area += 1;
                    continue;
                }
                if seen.insert(url.clone()) {
                    candidates.push(url);
                }
            }
            info!("📋 {} matching listing URLs", candidates.len() - before);
        }

        candidates
    }

    /// Detail-page links on a regional result page.
    async fn expand_region(&self, url: &str, outcome: &mut ScrapeOutcome) -> Vec<String> {
        let html = match self.fetcher.fetch_html(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("⚠️  {}", e);
                outcome.record_failure(url, &e);
                return Vec::new();
            }
        };
        let page_url = match Url::parse(url) {
            Ok(page_url) => page_url,
            Err(e) => {
                let error = ScrapeError::Parse {
                    what: "regional page URL".to_string(),
                    message: e.to_string(),
                };
                outcome.record_failure(url, &error);
                return Vec::new();
            }
        };
        let links: Vec<String> = extract_listing_links(&html, &page_url, &DETAIL_MARKERS)
            .into_iter()
            .filter(|link| is_detail_url(link))
            .take(MAX_LINKS_PER_REGION)
            .collect();
        info!("📦 {} listings on regional page {}", links.len(), url);
        links
    }

    async fn visit(&self, url: &str, outcome: &mut ScrapeOutcome) {
        // Regional pages were already matched by neighborhood on their own URL.
        let visit = self.pipeline.visit(&self.fetcher, url, Source::Xe, &[]).await;
        outcome.record_visit(url, visit);
    }
}

#[async_trait]
impl ScraperTrait for XeScraper {
    async fn scrape(&self) -> Result<ScrapeOutcome> {
        info!("Starting xe.gr sitemap scrape");
        let mut outcome = ScrapeOutcome::new(Source::Xe);

        let candidates = self.discover(&mut outcome).await;
        outcome.discovered = candidates.len();
        info!("🏠 Discovered {} listing URLs", candidates.len());

        let mut visited = HashSet::new();
        for url in &candidates {
            if self.enough(&outcome) {
                break;
            }
            if !is_regional_url(url) {
                if visited.insert(url.clone()) {
                    self.visit(url, &mut outcome).await;
                }
                continue;
            }

            for detail in self.expand_region(url, &mut outcome).await {
                if self.enough(&outcome) {
                    break;
                }
                if visited.insert(detail.clone()) {
                    self.visit(&detail, &mut outcome).await;
                } else {
                    debug!("Already visited {}", detail);
                }
            }
        }

        info!("✅ Kept {} xe.gr listings", outcome.records.len());
        Ok(outcome)
    }

    fn source_name(&self) -> &'static str {
        "xe.gr"
    }
}
