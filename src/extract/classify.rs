//! Keyword classification: neighborhood, property type, listing type.
//!
//! Matching runs on [`fold`]ed text so that `ΚΟΛΩΝΑΚΙ`, `Κολωνάκι` and
//! `κολωνακι` all compare equal.

use crate::models::{ListingType, PropertyType};
use once_cell::sync::Lazy;
use regex::Regex;

/// Athens neighborhoods and the spellings seen in titles, addresses and URL slugs.
const NEIGHBORHOODS: &[(&str, &[&str])] = &[
    ("Kolonaki", &["κολωνάκι", "kolonaki"]),
    ("Pangrati", &["παγκράτι", "pangrati", "pagkrati"]),
    ("Exarchia", &["εξάρχεια", "exarchia", "exarcheia"]),
    ("Psyrri", &["ψυρρή", "ψυρή", "psyrri", "psiri", "psirri"]),
    ("Koukaki", &["κουκάκι", "koukaki"]),
    ("Plaka", &["πλάκα", "plaka"]),
    ("Monastiraki", &["μοναστηράκι", "monastiraki"]),
    ("Mets", &["μετς", "mets"]),
    ("Neos Kosmos", &["νέος κόσμος", "neos kosmos", "neos-kosmos"]),
    ("Kypseli", &["κυψέλη", "kypseli", "kipseli"]),
    ("Ampelokipoi", &["αμπελόκηποι", "ampelokipoi", "ambelokipi"]),
    ("Petralona", &["πετράλωνα", "petralona"]),
    ("Thiseio", &["θησείο", "thiseio", "thissio"]),
    ("Gazi", &["γκάζι", "gazi"]),
    ("Metaxourgeio", &["μεταξουργείο", "metaxourgeio"]),
    ("Kerameikos", &["κεραμεικός", "kerameikos"]),
    ("Zografou", &["ζωγράφου", "zografou"]),
    ("Athens Center", &["κέντρο αθήνας", "athens center", "athens-center"]),
];

/// Checked in order; the first hit wins, `apartment` otherwise.
const PROPERTY_TYPES: &[(PropertyType, &[&str])] = &[
    (PropertyType::Studio, &["γκαρσονιέρα", "studio"]),
    (PropertyType::Penthouse, &["ρετιρέ", "οροφοδιαμέρισμα", "penthouse"]),
    (PropertyType::Maisonette, &["μεζονέτα", "maisonette"]),
    (PropertyType::Loft, &["loft"]),
    (PropertyType::House, &["μονοκατοικία", "βίλα", "detached", "house", "villa"]),
];

const RENT_MARKERS: &[&str] = &[
    "ενοικίαση",
    "ενοικιάζεται",
    "ενοικιάσεις",
    "enoikiaseis",
    "for rent",
    "for_rent",
    "to rent",
    "rent",
    "rental",
    "το μήνα",
    "/μήνα",
];

static NEIGHBORHOOD_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    NEIGHBORHOODS
        .iter()
        .flat_map(|(name, variants)| variants.iter().map(move |v| (*name, v)))
        .filter_map(|(name, variant)| word_pattern(variant, true).map(|re| (name, re)))
        .collect()
});

static PROPERTY_TYPE_PATTERNS: Lazy<Vec<(PropertyType, Regex)>> = Lazy::new(|| {
    PROPERTY_TYPES
        .iter()
        .flat_map(|(kind, words)| words.iter().map(move |w| (*kind, w)))
        // Greek nouns inflect, so only the start of the word is anchored.
        .filter_map(|(kind, word)| word_pattern(word, false).map(|re| (kind, re)))
        .collect()
});

static RENT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    RENT_MARKERS
        .iter()
        .filter_map(|marker| {
            let anchored_end = marker.chars().all(|c| c.is_ascii_alphabetic() || c == ' ');
            word_pattern(marker, anchored_end)
        })
        .collect()
});

/// Lowercase, drop Greek tonos/dialytika and normalize final sigma.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'ά' => 'α',
            'έ' => 'ε',
            'ή' => 'η',
            'ί' | 'ϊ' | 'ΐ' => 'ι',
            'ό' => 'ο',
            'ύ' | 'ϋ' | 'ΰ' => 'υ',
            'ώ' => 'ω',
            'ς' => 'σ',
            other => other,
        })
        .collect()
}

fn word_pattern(word: &str, anchor_end: bool) -> Option<Regex> {
    let folded = fold(word);
    let escaped = regex::escape(&folded);
    // `\b` only applies next to word characters; markers like "/μήνα" start with punctuation.
    let start = if folded.starts_with(|c: char| c.is_alphanumeric()) {
        r"\b"
    } else {
        ""
    };
    let end = if anchor_end { r"\b" } else { "" };
    Regex::new(&format!("{start}{escaped}{end}")).ok()
}

/// Canonical neighborhood name mentioned in the first haystack that names one.
pub fn detect_neighborhood(haystacks: &[&str]) -> Option<&'static str> {
    haystacks.iter().find_map(|text| {
        let folded = fold(text);
        NEIGHBORHOOD_PATTERNS
            .iter()
            .find(|(_, re)| re.is_match(&folded))
            .map(|(name, _)| *name)
    })
}

/// Whether `name` refers to the same neighborhood as `candidate`, in any spelling.
pub fn same_neighborhood(name: &str, candidate: &str) -> bool {
    if fold(name).trim() == fold(candidate).trim() {
        return true;
    }
    match (detect_neighborhood(&[name]), detect_neighborhood(&[candidate])) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

pub fn classify_property_type(title: &str, url: &str) -> PropertyType {
    let folded = fold(&format!("{title} {url}"));
    PROPERTY_TYPE_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(&folded))
        .map(|(kind, _)| *kind)
        .unwrap_or_default()
}

pub fn classify_listing_type(title: &str, url: &str) -> ListingType {
    let folded = fold(&format!("{title} {url}"));
    if RENT_PATTERNS.iter().any(|re| re.is_match(&folded)) {
        ListingType::Rent
    } else {
        ListingType::Sale
    }
}
