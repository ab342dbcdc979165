//! Scraper for Athens residential listings on spitogatos.gr and xe.gr.
//!
//! Records are only ever built from fetched pages: a field that cannot be
//! read stays empty, and each record carries a hash of the page it came from.

pub mod config;
pub mod discovery;
pub mod error;
pub mod export;
pub mod extract;
pub mod models;
pub mod report;
pub mod scrapers;
pub mod validation;

pub use config::Config;
pub use error::{FailureKind, ScrapeError};
pub use models::{EnergyClass, ListingType, PropertyRecord, PropertyType, Source, ValidationFlag};
