//! Plausibility bounds, confidence scoring and the synthetic-data checks
//! applied to scraped records.

pub mod audit;
pub mod authenticity;
pub mod bounds;
pub mod confidence;

pub use audit::{audit, AuditReport, AuditVerdict, Severity};
pub use authenticity::{SyntheticDenylist, Validator, Verdict};
pub use bounds::Bounds;
pub use confidence::{confidence_score, RequiredField};
