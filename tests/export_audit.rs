use athens_scout::export::{load_records, write_report, Exporter};
use athens_scout::extract::PropertyExtractor;
use athens_scout::validation::{audit, AuditVerdict, SyntheticDenylist, Validator};
use athens_scout::{EnergyClass, PropertyRecord, Source};
use pretty_assertions::assert_eq;

const FIXTURE: &str = include_str!("fixtures/spitogatos_listing.html");

fn observed() -> PropertyRecord {
    let mut record = PropertyExtractor::default().extract(
        FIXTURE,
        "https://www.spitogatos.gr/en/property/1117281234",
        Source::Spitogatos,
    );
    Validator::default().apply(&mut record);
    record
}

/// The kind of record the old generators produced: round denylisted values,
/// no page behind it.
fn fabricated(i: usize) -> PropertyRecord {
    let mut record = PropertyRecord::new(
        format!("generated_{i}"),
        Source::Xe,
        format!("https://www.xe.gr/property/{i}"),
    );
    record.title = Some(format!("Apartment {i}"));
    record.address = Some("Main Street 1".to_string());
    record.price = Some(740.0);
    record.sqm = Some(63.0);
    record.rooms = Some(2);
    record.floor = Some("1".to_string());
    record.energy_class = Some(EnergyClass::C);
    record.confidence_score = 1.0;
    record
}

#[tokio::test]
async fn export_writes_json_csv_and_raw_files() {
    let dir = tempfile::tempdir().unwrap();
    let records = vec![observed()];

    let paths = Exporter::new(dir.path()).export(&records, "spitogatos").await.unwrap();

    assert!(paths.json.exists());
    assert!(paths.csv.exists());
    assert!(paths.raw_dir.join("spitogatos_1117281234.json").exists());
    let name = paths.json.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("spitogatos_properties_"));

    let csv = std::fs::read_to_string(&paths.csv).unwrap();
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.contains("AUTHENTIC_VERIFIED"));

    let loaded = load_records(&paths.json).await.unwrap();
    assert_eq!(loaded, records);
}

#[tokio::test]
async fn load_accepts_wrapped_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wrapped.json");
    let wrapped = serde_json::json!({ "properties": [observed()] });
    std::fs::write(&path, wrapped.to_string()).unwrap();

    let loaded = load_records(&path).await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, "spitogatos_1117281234");

    std::fs::write(&path, "{\"rows\": 3}").unwrap();
    assert!(load_records(&path).await.is_err());
}

#[tokio::test]
async fn audit_separates_observed_from_fabricated_data() {
    let denylist = SyntheticDenylist::default();

    let fabricated: Vec<_> = (0..12).map(fabricated).collect();
    let report = audit(&fabricated, &denylist);
    assert_eq!(report.verdict, AuditVerdict::LikelySynthetic);
    assert_eq!(report.unobserved_records, 12);
    assert_eq!(report.denylist_hits, 12);

    let report = audit(&[observed()], &denylist);
    assert_eq!(report.verdict, AuditVerdict::LikelyObserved);
    assert_eq!(report.unobserved_records, 0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports").join("audit.json");
    write_report(&path, &report).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["verdict"], "likely_observed");
}
