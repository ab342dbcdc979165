//! JSON and CSV output.

use crate::models::PropertyRecord;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Flat CSV view of a record; list fields are joined with `|`.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    source: &'static str,
    url: &'a str,
    title: Option<&'a str>,
    address: Option<&'a str>,
    neighborhood: Option<&'a str>,
    price: Option<f64>,
    sqm: Option<f64>,
    price_per_sqm: Option<f64>,
    rooms: Option<u32>,
    floor: Option<&'a str>,
    energy_class: Option<&'static str>,
    property_type: &'static str,
    listing_type: &'static str,
    html_source_hash: Option<&'a str>,
    scraped_at: String,
    confidence_score: f64,
    validation_flags: String,
}

impl<'a> From<&'a PropertyRecord> for CsvRow<'a> {
    fn from(r: &'a PropertyRecord) -> Self {
        let flags = r
            .validation_flags
            .iter()
            .map(|f| serde_json::to_value(f).ok().and_then(|v| v.as_str().map(String::from)))
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default()
            .join("|");

        Self {
            id: &r.id,
            source: r.source.as_str(),
            url: &r.url,
            title: r.title.as_deref(),
            address: r.address.as_deref(),
            neighborhood: r.neighborhood.as_deref(),
            price: r.price,
            sqm: r.sqm,
            price_per_sqm: r.price_per_sqm,
            rooms: r.rooms,
            floor: r.floor.as_deref(),
            energy_class: r.energy_class.map(|e| e.as_str()),
            property_type: r.property_type.as_str(),
            listing_type: r.listing_type.as_str(),
            html_source_hash: r.html_source_hash.as_deref(),
            scraped_at: r.scraped_at.to_rfc3339(),
            confidence_score: r.confidence_score,
            validation_flags: flags,
        }
    }
}

pub fn to_csv(records: &[PropertyRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer
            .serialize(CsvRow::from(record))
            .with_context(|| format!("Failed to write CSV row for {}", record.id))?;
    }
    writer.into_inner().context("Failed to finish CSV output")
}

/// Files written by one export.
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub raw_dir: PathBuf,
}

pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write `{label}_properties_{timestamp}.json` and `.csv`, plus one
    /// `raw/{id}.json` per record.
    pub async fn export(&self, records: &[PropertyRecord], label: &str) -> Result<ExportPaths> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let json_path = self.output_dir.join(format!("{label}_properties_{stamp}.json"));
        let csv_path = self.output_dir.join(format!("{label}_properties_{stamp}.csv"));

        let json = serde_json::to_string_pretty(records)?;
        tokio::fs::write(&json_path, json)
            .await
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
        info!("💾 Saved {} properties to {}", records.len(), json_path.display());

        tokio::fs::write(&csv_path, to_csv(records)?)
            .await
            .with_context(|| format!("Failed to write {}", csv_path.display()))?;
        info!("💾 Saved CSV to {}", csv_path.display());

        let raw_dir = self.output_dir.join("raw");
        tokio::fs::create_dir_all(&raw_dir).await?;
        for record in records {
            let path = raw_dir.join(format!("{}.json", record.id));
            tokio::fs::write(&path, serde_json::to_string_pretty(record)?).await?;
        }
        info!(
            "💾 Saved {} individual property files to {}",
            records.len(),
            raw_dir.display()
        );

        Ok(ExportPaths {
            json: json_path,
            csv: csv_path,
            raw_dir,
        })
    }
}

/// Pretty-print any report as JSON.
pub async fn write_report<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordsFile {
    List(Vec<PropertyRecord>),
    Wrapped { properties: Vec<PropertyRecord> },
}

/// Read records back from an exported JSON file: either a bare array or an
/// object with a `properties` array.
pub async fn load_records(path: &Path) -> Result<Vec<PropertyRecord>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: RecordsFile = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a list of property records", path.display()))?;
    Ok(match file {
        RecordsFile::List(records) => records,
        RecordsFile::Wrapped { properties } => properties,
    })
}
