use crate::config::{Config, RateLimit};
use crate::error::ScrapeError;
use anyhow::{Context, Result};
use rand::Rng;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Shared HTTP session: one client, paced and retried requests.
pub struct Fetcher {
    client: Client,
    rate_limit: RateLimit,
    last_request: Mutex<Option<Instant>>,
}

impl Fetcher {
    pub fn new(user_agent: &str, timeout: Duration, rate_limit: RateLimit) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            rate_limit,
            last_request: Mutex::new(None),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.user_agent,
            config.request_timeout,
            config.rate_limit.clone(),
        )
    }

    /// GET `url` and return the body. Network errors, 429 and 5xx are
    /// retried with exponential backoff; 404/410 and other statuses are not.
    pub async fn fetch_html(&self, url: &str) -> Result<String, ScrapeError> {
        let attempts = self.rate_limit.max_retries.saturating_add(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.pace().await;
            match self.get_once(url).await {
                Ok(body) => {
                    debug!("Downloaded {} bytes from {}", body.len(), url);
                    return Ok(body);
                }
                Err(e) if e.is_retryable() && attempt < attempts => {
                    let delay = backoff_delay(&self.rate_limit, attempt);
                    warn!(
                        "⚠️  {} (attempt {}/{}), retrying in {:?}",
                        e, attempt, attempts, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ScrapeError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(ScrapeError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| ScrapeError::Network {
            url: url.to_string(),
            source,
        })
    }

    /// Keep at least `base_delay + jitter` between consecutive requests.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let gap = pacing_delay(&self.rate_limit);
            let elapsed = previous.elapsed();
            if gap > elapsed {
                tokio::time::sleep(gap - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

fn pacing_delay(limit: &RateLimit) -> Duration {
    let jitter_ms = limit.jitter.as_millis() as u64;
    let extra = if jitter_ms == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=jitter_ms)
    };
    limit.base_delay + Duration::from_millis(extra)
}

/// Delay before retry number `attempt` (1-based): base, base*m, base*m², ...
/// capped at `max_backoff`.
fn backoff_delay(limit: &RateLimit, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16) as i32;
    let factor = limit.backoff_multiplier.max(1.0).powi(exponent);
    let secs = limit.backoff_base.as_secs_f64() * factor;
    if secs.is_finite() && secs < limit.max_backoff.as_secs_f64() {
        Duration::from_secs_f64(secs)
    } else {
        limit.max_backoff
    }
}
