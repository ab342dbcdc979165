//! Run summaries printed after a scrape or audit.

use crate::error::FailureKind;
use crate::models::PropertyRecord;
use crate::scrapers::ScrapeOutcome;
use crate::validation::{AuditReport, RequiredField};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-run totals. No market statistics, only how the run went.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub sources: Vec<String>,
    pub discovered: usize,
    pub attempted: usize,
    pub kept: usize,
    pub verified: usize,
    pub skipped_out_of_area: usize,
    pub failures_by_kind: BTreeMap<FailureKind, usize>,
    /// Share of kept records with each field populated
    pub field_coverage: BTreeMap<String, f64>,
    pub mean_confidence: f64,
    /// Kept records over detail pages attempted
    pub success_rate: f64,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[ScrapeOutcome]) -> Self {
        let records: Vec<&PropertyRecord> = outcomes.iter().flat_map(|o| &o.records).collect();
        let mut failures_by_kind = BTreeMap::new();
        for outcome in outcomes {
            for (kind, count) in outcome.failures_by_kind() {
                *failures_by_kind.entry(kind).or_insert(0) += count;
            }
        }

        let kept = records.len();
        let attempted: usize = outcomes.iter().map(ScrapeOutcome::attempted).sum();

        Self {
            sources: outcomes.iter().map(|o| o.source.to_string()).collect(),
            discovered: outcomes.iter().map(|o| o.discovered).sum(),
            attempted,
            kept,
            verified: records.iter().filter(|r| r.is_verified()).count(),
            skipped_out_of_area: outcomes.iter().map(|o| o.skipped_out_of_area).sum(),
            failures_by_kind,
            field_coverage: field_coverage(&records),
            mean_confidence: mean(records.iter().map(|r| r.confidence_score)),
            success_rate: ratio(kept, attempted),
        }
    }
}

fn field_coverage(records: &[&PropertyRecord]) -> BTreeMap<String, f64> {
    let mut coverage: BTreeMap<String, f64> = RequiredField::ALL
        .iter()
        .map(|field| {
            let filled = records.iter().filter(|r| field.is_filled(r)).count();
            (field.as_str().to_string(), ratio(filled, records.len()))
        })
        .collect();
    let titled = records.iter().filter(|r| r.title.is_some()).count();
    coverage.insert("title".to_string(), ratio(titled, records.len()));
    let located = records.iter().filter(|r| r.neighborhood.is_some()).count();
    coverage.insert("neighborhood".to_string(), ratio(located, records.len()));
    coverage
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

pub fn print_records(records: &[PropertyRecord]) {
    for (i, r) in records.iter().enumerate() {
        let price = r.price.map_or("-".to_string(), |p| format!("{p:.0} €"));
        let sqm = r.sqm.map_or("-".to_string(), |s| format!("{s} m²"));
        println!("{}. {} ({})", i + 1, r.title.as_deref().unwrap_or("(no title)"), price);
        println!(
            "   {} | {} rooms | energy {}",
            sqm,
            r.rooms.map_or("-".to_string(), |n| n.to_string()),
            r.energy_class.map_or("-", |e| e.as_str())
        );
        if let Some(neighborhood) = &r.neighborhood {
            println!("   Neighborhood: {}", neighborhood);
        }
        println!("   ID: {} | confidence {:.2}", r.id, r.confidence_score);
        println!("   URL: {}", r.url);
        println!();
    }
}

pub fn print_summary(summary: &RunSummary) {
    println!("📊 Run summary ({})", summary.sources.join(", "));
    println!("   Discovered URLs:   {}", summary.discovered);
    println!("   Pages attempted:   {}", summary.attempted);
    println!("   Records kept:      {} ({} verified)", summary.kept, summary.verified);
    println!("   Outside area:      {}", summary.skipped_out_of_area);
    println!("   Success rate:      {:.1}%", summary.success_rate * 100.0);
    println!("   Mean confidence:   {:.2}", summary.mean_confidence);
    if !summary.failures_by_kind.is_empty() {
        println!("   Failures:");
        for (kind, count) in &summary.failures_by_kind {
            println!("     {:<22} {}", kind.to_string(), count);
        }
    }
    println!("   Field coverage:");
    for (field, share) in &summary.field_coverage {
        println!("     {:<22} {:.0}%", field, share * 100.0);
    }
}

pub fn print_audit(report: &AuditReport) {
    println!("🔎 Synthetic-data audit: {} records", report.total_records);
    println!("   Verified:             {}", report.verified_records);
    println!("   Without page hash:    {}", report.unobserved_records);
    println!("   Denylisted values:    {}", report.denylist_hits);
    if let Some(stats) = &report.price_per_sqm {
        println!(
            "   Price per m²:         €{:.0} - €{:.0} (mean €{:.0})",
            stats.min, stats.max, stats.mean
        );
    }
    for issue in &report.issues {
        println!("   [{:?}] {}: {}", issue.severity, issue.issue, issue.detail);
    }
    println!("   Verdict: {:?}", report.verdict);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::models::{Source, ValidationFlag};
    use crate::scrapers::Visit;

    fn kept(id: &str, price: Option<f64>) -> PropertyRecord {
        let mut r = PropertyRecord::new(id, Source::Spitogatos, format!("https://x/{id}"));
        r.price = price;
        r.title = Some("Διαμέρισμα".into());
        r.confidence_score = if price.is_some() { 0.5 } else { 0.0 };
        r.validation_flags = vec![ValidationFlag::AuthenticVerified];
        r
    }

    #[test]
    fn summary_counts_across_sources() {
        let not_found = |url: &str| ScrapeError::NotFound { url: url.into() };

        let mut spitogatos = ScrapeOutcome::new(Source::Spitogatos);
        spitogatos.discovered = 5;
        spitogatos.record_visit("https://x/a", Visit::Kept(kept("a", Some(100_000.0))));
        spitogatos.record_visit("https://x/b", Visit::Kept(kept("b", None)));
        spitogatos.record_visit("https://x/c", Visit::Failed(not_found("https://x/c")));

        let mut xe = ScrapeOutcome::new(Source::Xe);
        xe.discovered = 3;
        xe.skipped_out_of_area = 1;
        xe.record_visit("https://x/d", Visit::Failed(not_found("https://x/d")));
        xe.record_visit("https://x/e", Visit::OutOfArea(kept("e", Some(90_000.0))));
        // a sitemap failure is not a detail page attempt
        xe.record_failure("https://x/sitemap.xml", &not_found("https://x/sitemap.xml"));

        let summary = RunSummary::from_outcomes(&[spitogatos, xe]);
        assert_eq!(summary.sources, vec!["spitogatos", "xe"]);
        assert_eq!(summary.discovered, 8);
        assert_eq!(summary.attempted, 5);
        assert_eq!(summary.kept, 2);
        assert_eq!(summary.verified, 2);
        assert_eq!(summary.skipped_out_of_area, 2);
        assert_eq!(summary.failures_by_kind.get(&FailureKind::NotFound), Some(&3));
        assert_eq!(summary.field_coverage["price"], 0.5);
        assert_eq!(summary.field_coverage["title"], 1.0);
        assert_eq!(summary.mean_confidence, 0.25);
        assert_eq!(summary.success_rate, 0.4);
    }

    #[test]
    fn empty_run_has_zero_rates() {
        let summary = RunSummary::from_outcomes(&[]);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.mean_confidence, 0.0);
        assert_eq!(summary.field_coverage["sqm"], 0.0);
    }
}
