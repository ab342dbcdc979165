use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source of the property listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Spitogatos,
    Xe,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Spitogatos => "spitogatos",
            Source::Xe => "xe",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spitogatos" | "spitogatos.gr" => Ok(Source::Spitogatos),
            "xe" | "xe.gr" => Ok(Source::Xe),
            other => Err(format!("unknown source: {other}")),
        }
    }
}

/// EU building energy-efficiency rating, best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnergyClass {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    D,
    E,
    F,
    G,
}

impl EnergyClass {
    pub const ALL: [EnergyClass; 10] = [
        EnergyClass::APlus,
        EnergyClass::A,
        EnergyClass::BPlus,
        EnergyClass::B,
        EnergyClass::CPlus,
        EnergyClass::C,
        EnergyClass::D,
        EnergyClass::E,
        EnergyClass::F,
        EnergyClass::G,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyClass::APlus => "A+",
            EnergyClass::A => "A",
            EnergyClass::BPlus => "B+",
            EnergyClass::B => "B",
            EnergyClass::CPlus => "C+",
            EnergyClass::C => "C",
            EnergyClass::D => "D",
            EnergyClass::E => "E",
            EnergyClass::F => "F",
            EnergyClass::G => "G",
        }
    }
}

impl fmt::Display for EnergyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnergyClass {
    type Err = String;

    /// Accepts `"A+"`, `"a+"`, `"Aplus"` and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace("PLUS", "+");
        EnergyClass::ALL
            .iter()
            .find(|class| class.as_str() == normalized)
            .copied()
            .ok_or_else(|| format!("not an energy class: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    Apartment,
    House,
    Maisonette,
    Studio,
    Penthouse,
    Loft,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Maisonette => "maisonette",
            PropertyType::Studio => "studio",
            PropertyType::Penthouse => "penthouse",
            PropertyType::Loft => "loft",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    #[default]
    Sale,
    Rent,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Sale => "sale",
            ListingType::Rent => "rent",
        }
    }
}

impl FromStr for ListingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sale" | "buy" => Ok(ListingType::Sale),
            "rent" => Ok(ListingType::Rent),
            other => Err(format!("unknown listing type: {other}")),
        }
    }
}

/// Outcome of a single validation check on a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationFlag {
    MissingEssentialData,
    SyntheticPricePattern,
    SyntheticSqmPattern,
    PriceOutOfRange,
    SqmOutOfRange,
    GenericTitle,
    AuthenticVerified,
}

impl ValidationFlag {
    /// Whether this flag disqualifies a record from being treated as observed data.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, ValidationFlag::AuthenticVerified)
    }
}

/// Core property data model.
///
/// Every populated field was read from the page identified by `url` and
/// `html_source_hash`; nothing is filled in when extraction fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyRecord {
    pub id: String,
    pub source: Source,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub sqm: Option<f64>,
    #[serde(default)]
    pub price_per_sqm: Option<f64>,
    #[serde(default)]
    pub rooms: Option<u32>,
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub energy_class: Option<EnergyClass>,
    #[serde(default)]
    pub property_type: PropertyType,
    #[serde(default)]
    pub listing_type: ListingType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_source_hash: Option<String>,
    pub scraped_at: DateTime<Utc>,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub validation_flags: Vec<ValidationFlag>,
}

impl PropertyRecord {
    /// An empty record for `url`; extractors fill in what they find.
    pub fn new(id: impl Into<String>, source: Source, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source,
            url: url.into(),
            title: None,
            address: None,
            neighborhood: None,
            price: None,
            sqm: None,
            price_per_sqm: None,
            rooms: None,
            floor: None,
            energy_class: None,
            property_type: PropertyType::default(),
            listing_type: ListingType::default(),
            description: None,
            html_source_hash: None,
            scraped_at: Utc::now(),
            confidence_score: 0.0,
            validation_flags: Vec::new(),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.validation_flags.contains(&ValidationFlag::AuthenticVerified)
    }
}
