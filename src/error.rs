use crate::models::ValidationFlag;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Per-URL failure while scraping a listing site.
///
/// Top-level orchestration works with `anyhow::Result`; this type exists so
/// a run can report *why* each URL was dropped instead of only logging it.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} not found")]
    NotFound { url: String },

    #[error("{url} does not look like a property page")]
    NotAPropertyPage { url: String },

    #[error("{url} rejected by validation: {flags:?}")]
    Rejected {
        url: String,
        flags: Vec<ValidationFlag>,
    },

    #[error("failed to parse {what}: {message}")]
    Parse { what: String, message: String },
}

impl ScrapeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ScrapeError::Network { .. } => FailureKind::Network,
            ScrapeError::Status { .. } => FailureKind::Status,
            ScrapeError::NotFound { .. } => FailureKind::NotFound,
            ScrapeError::NotAPropertyPage { .. } => FailureKind::NotAPropertyPage,
            ScrapeError::Rejected { .. } => FailureKind::Rejected,
            ScrapeError::Parse { .. } => FailureKind::Parse,
        }
    }

    /// Timeouts, connection errors, 429 and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScrapeError::Network { .. } => true,
            ScrapeError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    Status,
    NotFound,
    NotAPropertyPage,
    Rejected,
    Parse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Network => "network",
            FailureKind::Status => "status",
            FailureKind::NotFound => "not_found",
            FailureKind::NotAPropertyPage => "not_a_property_page",
            FailureKind::Rejected => "rejected",
            FailureKind::Parse => "parse",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_statuses_are_retryable() {
        let status = |status| ScrapeError::Status {
            url: "https://www.xe.gr/x".into(),
            status,
        };
        assert!(status(429).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(403).is_retryable());
        assert!(!ScrapeError::NotFound { url: "u".into() }.is_retryable());
    }

    #[test]
    fn kind_matches_variant() {
        let err = ScrapeError::Rejected {
            url: "u".into(),
            flags: vec![ValidationFlag::SyntheticPricePattern],
        };
        assert_eq!(err.kind(), FailureKind::Rejected);
        assert_eq!(err.kind().to_string(), "rejected");
    }
}
