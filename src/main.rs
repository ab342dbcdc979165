use anyhow::{Context, Result};
use athens_scout::export::{load_records, write_report, Exporter};
use athens_scout::extract::PropertyExtractor;
use athens_scout::report::{print_audit, print_records, print_summary, RunSummary};
use athens_scout::scrapers::{build_scrapers, SearchParams};
use athens_scout::validation::{audit, Validator};
use athens_scout::{Config, ListingType, Source};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "athens-scout",
    about = "Scrape and audit Athens property listings from spitogatos.gr and xe.gr",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Discover and scrape listings
    Scrape {
        #[arg(long, value_enum, default_value_t = SourceArg::All)]
        source: SourceArg,
        /// Only keep listings in this neighborhood (repeatable)
        #[arg(long = "neighborhood")]
        neighborhoods: Vec<String>,
        /// Only sale or only rent listings (default: both)
        #[arg(long)]
        listing: Option<ListingType>,
        /// Maximum records kept per source
        #[arg(long)]
        max: Option<usize>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Keep records that fail validation (they stay flagged)
        #[arg(long)]
        keep_unverified: bool,
    },
    /// Extract a record from a saved HTML page and print it as JSON
    Extract {
        html_file: PathBuf,
        /// URL the page was downloaded from
        #[arg(long)]
        url: String,
        #[arg(long, default_value = "spitogatos")]
        source: Source,
    },
    /// Check an exported dataset for signs of synthetic data
    Audit {
        records: PathBuf,
        /// Also write the report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Spitogatos,
    Xe,
    All,
}

impl SourceArg {
    fn sources(self) -> Vec<Source> {
        match self {
            SourceArg::Spitogatos => vec![Source::Spitogatos],
            SourceArg::Xe => vec![Source::Xe],
            SourceArg::All => vec![Source::Spitogatos, Source::Xe],
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("Invalid configuration")?;

    match cli.command {
        Command::Scrape {
            source,
            neighborhoods,
            listing,
            max,
            output,
            keep_unverified,
        } => {
            if let Some(max) = max {
                config.max_properties = max;
            }
            if let Some(output) = output {
                config.output_dir = output;
            }
            config.keep_unverified |= keep_unverified;

            let mut params = SearchParams::from_config(&config);
            params.neighborhoods = neighborhoods;
            if let Some(listing) = listing {
                params.listing_types = vec![listing];
            }
            scrape(&config, &params, &source.sources()).await
        }
        Command::Extract {
            html_file,
            url,
            source,
        } => extract(&config, &html_file, &url, source).await,
        Command::Audit { records, report } => run_audit(&config, &records, report).await,
    }
}

async fn scrape(config: &Config, params: &SearchParams, sources: &[Source]) -> Result<()> {
    info!("🏠 Athens Scout");
    info!("==========================================");

    let scrapers = build_scrapers(sources, config, params)?;
    let mut outcomes = Vec::new();
    for scraper in &scrapers {
        info!("Starting {} ...", scraper.source_name());
        match scraper.scrape().await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => error!("❌ {} failed: {:#}", scraper.source_name(), e),
        }
    }

    let records: Vec<_> = outcomes.iter().flat_map(|o| o.records.clone()).collect();
    info!("\n✅ Scraped {} properties\n", records.len());
    print_records(&records);

    let summary = RunSummary::from_outcomes(&outcomes);
    print_summary(&summary);

    if records.is_empty() {
        info!("Nothing to export");
        return Ok(());
    }

    let label = match sources {
        [single] => single.as_str(),
        _ => "athens",
    };
    let paths = Exporter::new(&config.output_dir)
        .export(&records, label)
        .await?;
    let summary_path = paths.json.with_extension("summary.json");
    write_report(&summary_path, &summary).await?;
    info!("💾 Saved run summary to {}", summary_path.display());
    Ok(())
}

async fn extract(config: &Config, html_file: &Path, url: &str, source: Source) -> Result<()> {
    let html = tokio::fs::read_to_string(html_file)
        .await
        .with_context(|| format!("Failed to read {}", html_file.display()))?;

    let extractor = PropertyExtractor::new(config.bounds.clone(), config.required_fields.clone());
    let mut record = extractor.extract(&html, url, source);
    Validator::new(config.bounds.clone(), config.denylist.clone()).apply(&mut record);

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn run_audit(config: &Config, path: &Path, report_path: Option<PathBuf>) -> Result<()> {
    let records = load_records(path).await?;
    info!("🔎 Auditing {} records from {}", records.len(), path.display());

    let report = audit(&records, &config.denylist);
    print_audit(&report);

    if let Some(report_path) = report_path {
        write_report(&report_path, &report).await?;
        info!("💾 Saved audit report to {}", report_path.display());
    }
    Ok(())
}
