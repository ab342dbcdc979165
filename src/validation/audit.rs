//! Dataset-level audit that estimates whether a set of records was observed
//! on live pages or fabricated.

use crate::extract::fold;
use crate::models::{EnergyClass, ListingType, PropertyRecord};
use crate::validation::{RequiredField, SyntheticDenylist};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Share of energy-labelled Athens listings per class, in percent.
const EXPECTED_ATHENS_ENERGY: [(EnergyClass, f64); 7] = [
    (EnergyClass::APlus, 3.0),
    (EnergyClass::A, 7.0),
    (EnergyClass::B, 12.0),
    (EnergyClass::C, 35.0),
    (EnergyClass::D, 30.0),
    (EnergyClass::E, 10.0),
    (EnergyClass::F, 3.0),
];

const LARGE_DEVIATION_POINTS: f64 = 10.0;
const MIN_SAMPLE: usize = 5;
const MIN_ENERGY_SAMPLE: usize = 10;
const REPEATED_VALUE_SHARE: f64 = 0.2;
const PERFECT_CONFIDENCE_SHARE: f64 = 0.8;

/// Plausible sale price per m² in Athens, in euros.
const PRICE_PER_SQM_RANGE: (f64, f64) = (100.0, 10_000.0);
/// Below this share of distinct price/sqm ratios the prices look derived from the areas.
const MIN_UNIQUE_RATIO_SHARE: f64 = 0.8;
const DESCRIPTION_PREFIX_CHARS: usize = 50;
/// Accent-folded words any energy certificate mention contains.
const ENERGY_WORDS: [&str; 5] = ["energy", "ενεργ", "κλαση", "class", "πιστοποιητικ"];

// `statics_compile` guards against the pattern silently becoming `None`.
static GENERIC_STREET: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\b(?:Street|Avenue|Square|St\.|Ave\.)").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditVerdict {
    LikelyObserved,
    Suspicious,
    LikelySynthetic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditIssue {
    pub severity: Severity,
    pub issue: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyDeviation {
    pub energy_class: EnergyClass,
    pub actual_percent: f64,
    pub expected_percent: f64,
    pub deviation: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepeatedValue {
    pub field: String,
    pub value: f64,
    pub count: usize,
    pub share: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePerSqmStats {
    pub records: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub unique_ratios: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepeatedDescription {
    pub prefix: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    pub total_records: usize,
    pub verified_records: usize,
    /// Records with no page hash, i.e. no evidence they were ever fetched
    pub unobserved_records: usize,
    pub denylist_hits: usize,
    pub field_coverage: BTreeMap<String, f64>,
    pub energy_distribution: BTreeMap<String, f64>,
    pub energy_deviations: Vec<EnergyDeviation>,
    pub repeated_values: Vec<RepeatedValue>,
    /// Sale listings only; `None` below the minimum sample
    pub price_per_sqm: Option<PricePerSqmStats>,
    pub repeated_descriptions: Vec<RepeatedDescription>,
    /// Energy-labelled records whose description never mentions energy
    pub energy_without_wording: usize,
    pub issues: Vec<AuditIssue>,
    pub verdict: AuditVerdict,
}

/// Audit a dataset of property records for signs of synthetic data.
pub fn audit(records: &[PropertyRecord], denylist: &SyntheticDenylist) -> AuditReport {
    let total = records.len();
    let mut issues = Vec::new();

    if total == 0 {
        issues.push(AuditIssue {
            severity: Severity::Critical,
            issue: "No property records".into(),
            detail: "The dataset is empty; nothing was observed".into(),
        });
    }

    let verified_records = records.iter().filter(|r| r.is_verified()).count();

    let unobserved_records = records
        .iter()
        .filter(|r| r.html_source_hash.as_deref().map_or(true, str::is_empty))
        .count();
    if total > 0 && unobserved_records > 0 {
        let severity = if unobserved_records == total {
            Severity::Critical
        } else {
            Severity::High
        };
        issues.push(AuditIssue {
            severity,
            issue: "Records without page evidence".into(),
            detail: format!(
                "{unobserved_records} of {total} records carry no html_source_hash"
            ),
        });
    }

    let denylist_hits = records
        .iter()
        .filter(|r| {
            r.price.is_some_and(|p| denylist.price_hit(p)) || r.sqm.is_some_and(|s| denylist.sqm_hit(s))
        })
        .count();
    if denylist_hits > 0 {
        let severity = if denylist_hits * 2 >= total {
            Severity::Critical
        } else {
            Severity::High
        };
        issues.push(AuditIssue {
            severity,
            issue: "Known synthetic values".into(),
            detail: format!(
                "{denylist_hits} records use a price or sqm from known fabricated data"
            ),
        });
    }

    let repeated_values = repeated_values(records);
    for repeated in &repeated_values {
        let severity = if repeated.share >= 0.5 {
            Severity::High
        } else {
            Severity::Medium
        };
        issues.push(AuditIssue {
            severity,
            issue: format!("Repeated {} value", repeated.field),
            detail: format!(
                "{} = {} appears in {} records ({:.0}%)",
                repeated.field,
                repeated.value,
                repeated.count,
                repeated.share * 100.0
            ),
        });
    }

    let price_per_sqm = price_per_sqm_stats(records);
    if let Some(stats) = &price_per_sqm {
        let (low, high) = PRICE_PER_SQM_RANGE;
        if stats.max > high {
            issues.push(AuditIssue {
                severity: Severity::Medium,
                issue: "Very high price per sqm".into(),
                detail: format!("maximum €{:.0}/m² exceeds €{high:.0}/m²", stats.max),
            });
        }
        if stats.min < low {
            issues.push(AuditIssue {
                severity: Severity::Medium,
                issue: "Very low price per sqm".into(),
                detail: format!("minimum €{:.0}/m² is under €{low:.0}/m²", stats.min),
            });
        }
        if (stats.unique_ratios as f64) < stats.records as f64 * MIN_UNIQUE_RATIO_SHARE {
            issues.push(AuditIssue {
                severity: Severity::High,
                issue: "Duplicate price/sqm ratios".into(),
                detail: format!(
                    "only {} of {} price/sqm ratios are distinct",
                    stats.unique_ratios, stats.records
                ),
            });
        }
    }

    let described = records.iter().filter(|r| r.description.is_some()).count();
    let repeated_descriptions = repeated_descriptions(records);
    for repeated in &repeated_descriptions {
        let severity = if described >= MIN_SAMPLE && repeated.count * 2 >= described {
            Severity::High
        } else {
            Severity::Medium
        };
        issues.push(AuditIssue {
            severity,
            issue: "Repeated description".into(),
            detail: format!(
                "{} records start with \"{}\"",
                repeated.count, repeated.prefix
            ),
        });
    }

    let (energy_checked, energy_without_wording) = energy_wording(records);
    if energy_checked >= MIN_SAMPLE && energy_without_wording * 2 > energy_checked {
        issues.push(AuditIssue {
            severity: if energy_without_wording == energy_checked {
                Severity::High
            } else {
                Severity::Medium
            },
            issue: "Energy classes without energy wording".into(),
            detail: format!(
                "{energy_without_wording} of {energy_checked} energy-labelled descriptions never mention energy"
            ),
        });
    }

    if total >= MIN_SAMPLE {
        let perfect = records
            .iter()
            .filter(|r| r.confidence_score >= 1.0)
            .count();
        if perfect as f64 > total as f64 * PERFECT_CONFIDENCE_SHARE {
            issues.push(AuditIssue {
                severity: Severity::High,
                issue: "Unrealistic confidence scores".into(),
                detail: format!("{perfect} of {total} records have a perfect confidence score"),
            });
        }
    }

    let (energy_distribution, energy_deviations, labelled) = energy_analysis(records);
    if labelled >= MIN_ENERGY_SAMPLE {
        let large = energy_deviations
            .iter()
            .filter(|d| d.deviation.abs() > LARGE_DEVIATION_POINTS)
            .count();
        if large >= 2 {
            issues.push(AuditIssue {
                severity: if large >= 4 {
                    Severity::High
                } else {
                    Severity::Medium
                },
                issue: "Energy class distribution deviates from Athens".into(),
                detail: format!(
                    "{large} classes differ by more than {LARGE_DEVIATION_POINTS} points"
                ),
            });
        }
        if energy_distribution.len() <= 2 {
            issues.push(AuditIssue {
                severity: Severity::Medium,
                issue: "Too few energy classes".into(),
                detail: format!(
                    "{labelled} labelled records span only {} classes",
                    energy_distribution.len()
                ),
            });
        }
    }

    if let Some(generic) = GENERIC_STREET.as_ref() {
        let generic_addresses = records
            .iter()
            .filter_map(|r| r.address.as_deref())
            .filter(|a| generic.is_match(a))
            .count();
        if generic_addresses > 0 {
            issues.push(AuditIssue {
                severity: Severity::High,
                issue: "Generic street names".into(),
                detail: format!(
                    "{generic_addresses} addresses use English street words in a Greek city"
                ),
            });
        }
    }

    let field_coverage = RequiredField::ALL
        .iter()
        .map(|field| {
            let filled = records.iter().filter(|r| field.is_filled(r)).count();
            let share = if total == 0 {
                0.0
            } else {
                filled as f64 / total as f64
            };
            (field.to_string(), share)
        })
        .collect();

    let verdict = verdict_for(&issues);

    AuditReport {
        generated_at: Utc::now(),
        total_records: total,
        verified_records,
        unobserved_records,
        denylist_hits,
        field_coverage,
        energy_distribution,
        energy_deviations,
        repeated_values,
        price_per_sqm,
        repeated_descriptions,
        energy_without_wording,
        issues,
        verdict,
    }
}

fn verdict_for(issues: &[AuditIssue]) -> AuditVerdict {
    let count = |severity| issues.iter().filter(|i| i.severity == severity).count();
    let (critical, high, medium) = (
        count(Severity::Critical),
        count(Severity::High),
        count(Severity::Medium),
    );
    if critical > 0 || high >= 2 {
        AuditVerdict::LikelySynthetic
    } else if high == 1 || medium >= 2 {
        AuditVerdict::Suspicious
    } else {
        AuditVerdict::LikelyObserved
    }
}

/// Single values shared by a large fraction of the dataset.
fn repeated_values(records: &[PropertyRecord]) -> Vec<RepeatedValue> {
    if records.len() < MIN_SAMPLE {
        return Vec::new();
    }

    let mut found = Vec::new();
    let fields: [(&str, fn(&PropertyRecord) -> Option<f64>); 2] =
        [("price", |r| r.price), ("sqm", |r| r.sqm)];

    for (name, get) in fields {
        // Keyed by cents so float values can be counted in an ordered map.
        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for value in records.iter().filter_map(get) {
            *counts.entry((value * 100.0).round() as i64).or_default() += 1;
        }
        for (key, count) in counts {
            let share = count as f64 / records.len() as f64;
            if count > 1 && share >= REPEATED_VALUE_SHARE {
                found.push(RepeatedValue {
                    field: name.to_string(),
                    value: key as f64 / 100.0,
                    count,
                    share,
                });
            }
        }
    }
    found
}

/// Price per m² over sale listings carrying both figures. Rents are quoted
/// per month and would all read as implausibly cheap.
fn price_per_sqm_stats(records: &[PropertyRecord]) -> Option<PricePerSqmStats> {
    let ratios: Vec<f64> = records
        .iter()
        .filter(|r| r.listing_type == ListingType::Sale)
        .filter_map(|r| match (r.price, r.sqm) {
            (Some(price), Some(sqm)) if price > 0.0 && sqm > 0.0 => Some(price / sqm),
            _ => None,
        })
        .collect();
    if ratios.len() < MIN_SAMPLE {
        return None;
    }

    let unique_ratios = ratios
        .iter()
        .map(|ratio| (ratio * 100.0).round() as i64)
        .collect::<BTreeSet<_>>()
        .len();
    Some(PricePerSqmStats {
        records: ratios.len(),
        min: ratios.iter().copied().fold(f64::INFINITY, f64::min),
        max: ratios.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean: ratios.iter().sum::<f64>() / ratios.len() as f64,
        unique_ratios,
    })
}

/// Description openings shared by more than one record.
fn repeated_descriptions(records: &[PropertyRecord]) -> Vec<RepeatedDescription> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for description in records.iter().filter_map(|r| r.description.as_deref()) {
        let prefix: String = description.trim().chars().take(DESCRIPTION_PREFIX_CHARS).collect();
        if !prefix.is_empty() {
            *counts.entry(prefix).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(prefix, count)| RepeatedDescription { prefix, count })
        .collect()
}

/// `(checked, unsupported)`: energy-labelled records with a description, and
/// those whose description has no energy wording at all.
fn energy_wording(records: &[PropertyRecord]) -> (usize, usize) {
    let descriptions: Vec<String> = records
        .iter()
        .filter(|r| r.energy_class.is_some())
        .filter_map(|r| r.description.as_deref().map(fold))
        .collect();
    let unsupported = descriptions
        .iter()
        .filter(|d| !ENERGY_WORDS.iter().any(|word| d.contains(word)))
        .count();
    (descriptions.len(), unsupported)
}

fn energy_analysis(
    records: &[PropertyRecord],
) -> (BTreeMap<String, f64>, Vec<EnergyDeviation>, usize) {
    let mut counts: BTreeMap<EnergyClass, usize> = BTreeMap::new();
    for class in records.iter().filter_map(|r| r.energy_class) {
        *counts.entry(class).or_default() += 1;
    }
    let labelled: usize = counts.values().sum();
    if labelled == 0 {
        return (BTreeMap::new(), Vec::new(), 0);
    }

    let percent = |class: EnergyClass| {
        counts.get(&class).copied().unwrap_or(0) as f64 / labelled as f64 * 100.0
    };

    let distribution = counts
        .keys()
        .map(|class| (class.to_string(), percent(*class)))
        .collect();

    let deviations = EXPECTED_ATHENS_ENERGY
        .iter()
        .map(|(class, expected)| {
            let actual = percent(*class);
            EnergyDeviation {
                energy_class: *class,
                actual_percent: actual,
                expected_percent: *expected,
                deviation: actual - expected,
            }
        })
        .collect();

    (distribution, deviations, labelled)
}
