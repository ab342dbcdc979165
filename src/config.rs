use crate::validation::{Bounds, RequiredField, SyntheticDenylist};
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Property sitemaps published by xe.gr, relative to the site root.
pub const XE_SITEMAPS: [&str; 4] = [
    "/sitemap_property_enoikiaseis-diamerismaton.xml",
    "/sitemap_property_poliseis-diamerismaton.xml",
    "/sitemap_property_enoikiaseis-katoikion.xml",
    "/sitemap_property_poliseis-katoikion.xml",
];

/// Retry and pacing settings for outbound requests
#[derive(Debug, Clone)]
pub struct RateLimit {
    /// Fixed pause between consecutive requests
    pub base_delay: Duration,
    /// Upper bound of the random extra pause added to `base_delay`
    pub jitter: Duration,
    pub max_retries: u32,
    /// First backoff delay; doubles (by `backoff_multiplier`) on every retry
    pub backoff_base: Duration,
    pub backoff_multiplier: f64,
    pub max_backoff: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(2000),
            jitter: Duration::from_millis(3000),
            max_retries: 3,
            backoff_base: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RateLimit {
    /// No pauses at all; used by tests that talk to a local mock server.
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            jitter: Duration::ZERO,
            max_retries: 1,
            backoff_base: Duration::ZERO,
            backoff_multiplier: 1.0,
            max_backoff: Duration::ZERO,
        }
    }
}

/// Runtime configuration, read from the environment (and `.env`) with
/// defaults for everything.
#[derive(Debug, Clone)]
pub struct Config {
    pub spitogatos_base_url: String,
    pub xe_base_url: String,
    pub xe_sitemaps: Vec<String>,
    pub area_slug: String,
    pub output_dir: PathBuf,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub rate_limit: RateLimit,
    pub bounds: Bounds,
    pub denylist: SyntheticDenylist,
    pub required_fields: Vec<RequiredField>,
    pub min_page_bytes: usize,
    pub max_pages: u32,
    pub max_properties: usize,
    pub keep_unverified: bool,
    /// Inclusive numeric ID range probed when spitogatos search pages yield
    /// fewer listings than wanted
    pub enumeration_range: Option<(u64, u64)>,
    pub enumeration_step: u64,
    pub enumeration_max_misses: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spitogatos_base_url: "https://www.spitogatos.gr".to_string(),
            xe_base_url: "https://www.xe.gr".to_string(),
            xe_sitemaps: XE_SITEMAPS.iter().map(|s| s.to_string()).collect(),
            area_slug: "athens-center".to_string(),
            output_dir: PathBuf::from("outputs"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
            rate_limit: RateLimit::default(),
            bounds: Bounds::default(),
            denylist: SyntheticDenylist::default(),
            required_fields: RequiredField::ALL.to_vec(),
            min_page_bytes: 3000,
            max_pages: 3,
            max_properties: 20,
            keep_unverified: false,
            enumeration_range: None,
            enumeration_step: 1,
            enumeration_max_misses: 25,
        }
    }
}

impl Config {
    /// Build the configuration from `SCOUT_*` environment variables.
    ///
    /// Unset variables fall back to [`Config::default`]; set but malformed
    /// ones are an error.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let rate_limit = RateLimit {
            base_delay: env_millis("SCOUT_DELAY_MS", defaults.rate_limit.base_delay)?,
            jitter: env_millis("SCOUT_JITTER_MS", defaults.rate_limit.jitter)?,
            max_retries: env_or("SCOUT_MAX_RETRIES", defaults.rate_limit.max_retries)?,
            backoff_base: env_millis("SCOUT_BACKOFF_MS", defaults.rate_limit.backoff_base)?,
            backoff_multiplier: env_or(
                "SCOUT_BACKOFF_MULTIPLIER",
                defaults.rate_limit.backoff_multiplier,
            )?,
            max_backoff: env_millis("SCOUT_MAX_BACKOFF_MS", defaults.rate_limit.max_backoff)?,
        };

        let bounds = Bounds {
            price_min: env_or("SCOUT_PRICE_MIN", defaults.bounds.price_min)?,
            price_max: env_or("SCOUT_PRICE_MAX", defaults.bounds.price_max)?,
            sqm_min: env_or("SCOUT_SQM_MIN", defaults.bounds.sqm_min)?,
            sqm_max: env_or("SCOUT_SQM_MAX", defaults.bounds.sqm_max)?,
            rooms_min: env_or("SCOUT_ROOMS_MIN", defaults.bounds.rooms_min)?,
            rooms_max: env_or("SCOUT_ROOMS_MAX", defaults.bounds.rooms_max)?,
        };
        bounds.check()?;

        let required_fields = env_list("SCOUT_REQUIRED_FIELDS", defaults.required_fields)?;

        let denylist = SyntheticDenylist {
            prices: env_list("SCOUT_DENY_PRICES", defaults.denylist.prices)?,
            sqms: env_list("SCOUT_DENY_SQMS", defaults.denylist.sqms)?,
        };

        let xe_sitemaps = match env::var("SCOUT_XE_SITEMAPS") {
            Ok(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => defaults.xe_sitemaps,
        };

        let enumeration_range = match env::var("SCOUT_ENUMERATE_IDS") {
            Ok(range) => Some(parse_id_range(&range)?),
            Err(_) => None,
        };

        Ok(Self {
            spitogatos_base_url: env_or("SCOUT_SPITOGATOS_URL", defaults.spitogatos_base_url)?,
            xe_base_url: env_or("SCOUT_XE_URL", defaults.xe_base_url)?,
            xe_sitemaps,
            area_slug: env_or("SCOUT_AREA", defaults.area_slug)?,
            output_dir: env_or("SCOUT_OUTPUT_DIR", defaults.output_dir)?,
            user_agent: env_or("SCOUT_USER_AGENT", defaults.user_agent)?,
            request_timeout: Duration::from_secs(env_or(
                "SCOUT_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            rate_limit,
            bounds,
            denylist,
            required_fields,
            min_page_bytes: env_or("SCOUT_MIN_PAGE_BYTES", defaults.min_page_bytes)?,
            max_pages: env_or("SCOUT_MAX_PAGES", defaults.max_pages)?,
            max_properties: env_or("SCOUT_MAX_PROPERTIES", defaults.max_properties)?,
            keep_unverified: env_or("SCOUT_KEEP_UNVERIFIED", defaults.keep_unverified)?,
            enumeration_range,
            enumeration_step: env_or("SCOUT_ENUMERATE_STEP", defaults.enumeration_step)?,
            enumeration_max_misses: env_or(
                "SCOUT_ENUMERATE_MAX_MISSES",
                defaults.enumeration_max_misses,
            )?,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {key} ({raw:?}): {e}")),
        Err(_) => Ok(default),
    }
}

fn env_millis(key: &str, default: Duration) -> Result<Duration> {
    let ms = env_or(key, default.as_millis() as u64)?;
    Ok(Duration::from_millis(ms))
}

fn env_list<T>(key: &str, default: Vec<T>) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_list(&raw).with_context(|| format!("Invalid {key}")),
        Err(_) => Ok(default),
    }
}

fn parse_list<T>(raw: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(|e| anyhow::anyhow!("{e}")))
        .collect()
}

/// `"1000-2000"` -> `(1000, 2000)`
fn parse_id_range(raw: &str) -> Result<(u64, u64)> {
    let (start, end) = raw
        .split_once('-')
        .with_context(|| format!("Expected START-END, got {raw:?}"))?;
    let start: u64 = start.trim().parse().context("Invalid range start")?;
    let end: u64 = end.trim().parse().context("Invalid range end")?;
    anyhow::ensure!(start <= end, "Range start {start} is after end {end}");
    Ok((start, end))
}
