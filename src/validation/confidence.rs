use crate::models::PropertyRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A field that counts towards a record's confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Address,
    Price,
    Sqm,
    Rooms,
    Floor,
    EnergyClass,
}

impl RequiredField {
    pub const ALL: [RequiredField; 6] = [
        RequiredField::Address,
        RequiredField::Price,
        RequiredField::Sqm,
        RequiredField::Rooms,
        RequiredField::Floor,
        RequiredField::EnergyClass,
    ];

    pub fn is_filled(&self, record: &PropertyRecord) -> bool {
        match self {
            RequiredField::Address => record
                .address
                .as_deref()
                .is_some_and(|a| !a.trim().is_empty()),
            RequiredField::Price => record.price.is_some(),
            RequiredField::Sqm => record.sqm.is_some(),
            RequiredField::Rooms => record.rooms.is_some(),
            RequiredField::Floor => record
                .floor
                .as_deref()
                .is_some_and(|f| !f.trim().is_empty()),
            RequiredField::EnergyClass => record.energy_class.is_some(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredField::Address => "address",
            RequiredField::Price => "price",
            RequiredField::Sqm => "sqm",
            RequiredField::Rooms => "rooms",
            RequiredField::Floor => "floor",
            RequiredField::EnergyClass => "energy_class",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequiredField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        RequiredField::ALL
            .iter()
            .find(|field| field.as_str() == wanted)
            .copied()
            .ok_or_else(|| format!("unknown field: {s}"))
    }
}

/// Populated required fields divided by the number of required fields.
///
/// Duplicates in `required` count once each time they appear. An empty
/// required set scores `0.0`.
pub fn confidence_score(record: &PropertyRecord, required: &[RequiredField]) -> f64 {
    if required.is_empty() {
        return 0.0;
    }
    let filled = required.iter().filter(|f| f.is_filled(record)).count();
    filled as f64 / required.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EnergyClass, Source};

    fn record() -> PropertyRecord {
        PropertyRecord::new("xe_1", Source::Xe, "https://www.xe.gr/property/d/1")
    }

    #[test]
    fn empty_record_scores_zero() {
        assert_eq!(confidence_score(&record(), &RequiredField::ALL), 0.0);
        assert_eq!(confidence_score(&record(), &[]), 0.0);
    }

    #[test]
    fn score_is_filled_over_required() {
        let mut r = record();
        r.price = Some(250_000.0);
        r.sqm = Some(85.0);
        r.energy_class = Some(EnergyClass::C);
        assert_eq!(confidence_score(&r, &RequiredField::ALL), 0.5);
        assert_eq!(
            confidence_score(&r, &[RequiredField::Price, RequiredField::Sqm]),
            1.0
        );
        assert_eq!(
            confidence_score(&r, &[RequiredField::Price, RequiredField::Rooms]),
            0.5
        );
    }

    #[test]
    fn blank_strings_do_not_count() {
        let mut r = record();
        r.address = Some("   ".into());
        r.floor = Some(String::new());
        assert_eq!(
            confidence_score(&r, &[RequiredField::Address, RequiredField::Floor]),
            0.0
        );
    }

    #[test]
    fn score_matches_ratio_for_every_field_subset() {
        // Every combination of populated fields against the full required set.
        for mask in 0u32..64 {
            let mut r = record();
            if mask & 1 != 0 {
                r.address = Some("Skoufa 10".into());
            }
            if mask & 2 != 0 {
                r.price = Some(100_000.0);
            }
            if mask & 4 != 0 {
                r.sqm = Some(50.0);
            }
            if mask & 8 != 0 {
                r.rooms = Some(2);
            }
            if mask & 16 != 0 {
                r.floor = Some("3".into());
            }
            if mask & 32 != 0 {
                r.energy_class = Some(EnergyClass::B);
            }
            let expected = mask.count_ones() as f64 / 6.0;
            let score = confidence_score(&r, &RequiredField::ALL);
            assert!((score - expected).abs() < 1e-12, "mask {mask:#b}");
            assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn parses_field_names() {
        assert_eq!("energy-class".parse(), Ok(RequiredField::EnergyClass));
        assert_eq!("SQM".parse(), Ok(RequiredField::Sqm));
        assert!("garden".parse::<RequiredField>().is_err());
    }
}
