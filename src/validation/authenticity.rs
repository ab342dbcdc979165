use crate::models::{PropertyRecord, ValidationFlag};
use crate::validation::Bounds;
use serde::{Deserialize, Serialize};

/// Titles that on their own are page templates rather than listings.
const GENERIC_TITLES: [&str; 5] = ["Property", "Listing", "Advertisement", "For Sale", "For Rent"];

/// Shorter titles containing a generic word are treated as templates.
const GENERIC_TITLE_MAX_CHARS: usize = 20;

/// Values known to come from fabricated datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticDenylist {
    pub prices: Vec<f64>,
    pub sqms: Vec<f64>,
}

impl Default for SyntheticDenylist {
    fn default() -> Self {
        Self {
            prices: vec![740.0, 3000.0],
            sqms: vec![63.0, 270.0],
        }
    }
}

impl SyntheticDenylist {
    pub fn price_hit(&self, price: f64) -> bool {
        self.prices.iter().any(|p| (p - price).abs() < f64::EPSILON)
    }

    pub fn sqm_hit(&self, sqm: f64) -> bool {
        self.sqms.iter().any(|s| (s - sqm).abs() < f64::EPSILON)
    }
}

/// Result of validating one record
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub authentic: bool,
    pub flags: Vec<ValidationFlag>,
}

/// Decides whether a record looks like observed listing data.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    bounds: Bounds,
    denylist: SyntheticDenylist,
}

impl Validator {
    pub fn new(bounds: Bounds, denylist: SyntheticDenylist) -> Self {
        Self { bounds, denylist }
    }

    /// Run every check; all failing checks are reported, not just the first.
    pub fn validate(&self, record: &PropertyRecord) -> Verdict {
        let mut flags = Vec::new();

        let has_title = record.title.as_deref().is_some_and(|t| !t.trim().is_empty());
        if record.price.is_none() || !has_title {
            flags.push(ValidationFlag::MissingEssentialData);
        }

        if let Some(price) = record.price {
            if self.denylist.price_hit(price) {
                flags.push(ValidationFlag::SyntheticPricePattern);
            }
            if !self.bounds.price_ok(price) {
                flags.push(ValidationFlag::PriceOutOfRange);
            }
        }

        if let Some(sqm) = record.sqm {
            if self.denylist.sqm_hit(sqm) {
                flags.push(ValidationFlag::SyntheticSqmPattern);
            }
            if !self.bounds.sqm_ok(sqm) {
                flags.push(ValidationFlag::SqmOutOfRange);
            }
        }

        if let Some(title) = record.title.as_deref() {
            if is_generic_title(title) {
                flags.push(ValidationFlag::GenericTitle);
            }
        }

        let authentic = flags.is_empty();
        if authentic {
            flags.push(ValidationFlag::AuthenticVerified);
        }
        Verdict { authentic, flags }
    }

    /// Validate and store the flags on the record. Returns whether it passed.
    pub fn apply(&self, record: &mut PropertyRecord) -> bool {
        let verdict = self.validate(record);
        record.validation_flags = verdict.flags;
        verdict.authentic
    }
}

fn is_generic_title(title: &str) -> bool {
    let title = title.trim();
    title.chars().count() < GENERIC_TITLE_MAX_CHARS
        && GENERIC_TITLES.iter().any(|generic| title.contains(generic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn listing(price: Option<f64>, sqm: Option<f64>, title: &str) -> PropertyRecord {
        let mut r = PropertyRecord::new("spitogatos_1", Source::Spitogatos, "https://x/1");
        r.price = price;
        r.sqm = sqm;
        r.title = Some(title.to_string());
        r
    }

    #[test]
    fn plausible_listing_is_verified() {
        let validator = Validator::default();
        let mut r = listing(Some(285_000.0), Some(92.0), "Διαμέρισμα 92 τ.μ. Κολωνάκι");
        assert!(validator.apply(&mut r));
        assert_eq!(r.validation_flags, vec![ValidationFlag::AuthenticVerified]);
        assert!(r.is_verified());
    }

    #[test]
    fn denylisted_values_are_flagged() {
        let validator = Validator::default();
        let verdict = validator.validate(&listing(Some(740.0), Some(63.0), "Apartment in Pangrati, 2nd floor"));
        assert!(!verdict.authentic);
        assert!(verdict.flags.contains(&ValidationFlag::SyntheticPricePattern));
        assert!(verdict.flags.contains(&ValidationFlag::SyntheticSqmPattern));
        assert!(!verdict.flags.contains(&ValidationFlag::AuthenticVerified));
    }

    #[test]
    fn out_of_range_and_missing_data() {
        let validator = Validator::default();
        let verdict = validator.validate(&listing(Some(20.0), Some(5000.0), "Μονοκατοικία στην Κηφισιά"));
        assert_eq!(
            verdict.flags,
            vec![ValidationFlag::PriceOutOfRange, ValidationFlag::SqmOutOfRange]
        );

        let verdict = validator.validate(&listing(None, Some(80.0), "Διαμέρισμα στο Παγκράτι"));
        assert_eq!(verdict.flags, vec![ValidationFlag::MissingEssentialData]);
    }

    #[test]
    fn short_template_titles_are_generic() {
        assert!(is_generic_title("Property"));
        assert!(is_generic_title("  For Sale  "));
        assert!(!is_generic_title("Property for sale in Kolonaki, 3 bedrooms"));
        assert!(!is_generic_title("Διαμέρισμα 85 τ.μ."));
    }
}
