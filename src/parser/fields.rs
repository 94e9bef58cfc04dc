//! Field-level parsers shared by the normalizer and the dashboard aggregator.
//!
//! Each parser accepts either raw listing text ("1 500 000 FCFA",
//! "Villa 5 pièces, 400 m²") or a cell that was already normalized ("1500000",
//! "400"), and returns the same value for both. That is what keeps
//! reprocessing a saved dataset idempotent.

use std::sync::LazyLock;

use regex::Regex;

static SURFACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d{1,3}(?:[ \u{a0}\u{202f}.]\d{3})+|\d+)(?:[.,](\d+))?\s*(m²|m2\b|mètres?\s*carrés?|metres?\s*carres?|hectares?\b|ha\b)",
    )
    .unwrap()
});
static ROOMS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:pi[eè]ces?|pcs)\b").unwrap());
static BATHS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:salles?\s*(?:de\s*)?bains?|sdb)\b").unwrap()
});
// Counts that never describe a surface: bedrooms, living rooms, toilets, floors.
static OTHER_COUNTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:chambres?|ch\b|salons?|toilettes?|wc\b|niveaux?|[ée]tages?)").unwrap()
});
static STANDALONE_NUM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s(:])(\d+(?:[.,]\d+)?)(?:$|[\s,;)])").unwrap()
});
static PANDAS_INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)\.0$").unwrap());

const SQM_PER_HECTARE: f64 = 10_000.0;

/// Price in whole currency units: every non-digit is a separator or marker.
///
/// Returns `None` when nothing numeric is left, the value is zero, or it
/// does not fit a `u64`.
pub fn parse_price(text: &str) -> Option<u64> {
    let text = text.trim();
    // "1500000.0" is how a float column comes back from a spreadsheet export
    if let Some(caps) = PANDAS_INT_RE.captures(text) {
        return caps[1].parse().ok().filter(|v| *v > 0);
    }
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u64>().ok().filter(|v| *v > 0)
}

/// Surface in square meters found in free text.
///
/// Prefers a number carrying a unit; otherwise falls back to the first
/// standalone number that is not a room or bathroom count.
pub fn extract_surface(text: &str) -> Option<f64> {
    if let Some(caps) = SURFACE_RE.captures(text) {
        let int_part: String = caps[1].chars().filter(char::is_ascii_digit).collect();
        let value = match caps.get(2) {
            Some(frac) => format!("{}.{}", int_part, frac.as_str()).parse::<f64>().ok()?,
            None => int_part.parse::<f64>().ok()?,
        };
        let unit = caps[3].to_lowercase();
        let value = if unit.starts_with('h') { value * SQM_PER_HECTARE } else { value };
        return Some(value).filter(|v| *v > 0.0);
    }

    let without_counts = BATHS_RE.replace_all(text, " ");
    let without_counts = ROOMS_RE.replace_all(&without_counts, " ");
    let without_counts = OTHER_COUNTS_RE.replace_all(&without_counts, " ");
    STANDALONE_NUM_RE
        .captures(&without_counts)
        .and_then(|caps| caps[1].replace(',', ".").parse::<f64>().ok())
        .filter(|v| *v > 0.0)
}

pub fn extract_rooms(text: &str) -> Option<u32> {
    ROOMS_RE.captures(text).and_then(|c| c[1].parse().ok())
}

pub fn extract_bathrooms(text: &str) -> Option<u32> {
    BATHS_RE.captures(text).and_then(|c| c[1].parse().ok())
}

/// A dedicated surface column: plain number, or text with a unit.
pub fn parse_surface_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    match cell.replace(',', ".").parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Some(v),
        Ok(_) => None,
        Err(_) => extract_surface(cell),
    }
}

/// A dedicated count column: plain integer, "3.0", or text with a marker.
pub fn parse_count_cell(cell: &str, extract: fn(&str) -> Option<u32>) -> Option<u32> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(v) = cell.parse::<u32>() {
        return Some(v);
    }
    if let Some(caps) = PANDAS_INT_RE.captures(cell) {
        return caps[1].parse().ok();
    }
    extract(cell)
}

/// Trim, collapse whitespace, tidy comma spacing and fix shouting or
/// all-lowercase words. No geocoding.
pub fn clean_address(text: &str) -> Option<String> {
    let parts: Vec<String> = text
        .split(',')
        .map(|part| {
            part.split_whitespace()
                .map(fix_word_case)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn fix_word_case(word: &str) -> String {
    word.split('-')
        .map(|segment| {
            let letters = segment.chars().filter(|c| c.is_alphabetic()).count();
            let all_lower = !segment.chars().any(char::is_uppercase);
            let all_upper = !segment.chars().any(char::is_lowercase);
            // short all-caps segments are acronyms (VDN, HLM)
            if all_lower || (all_upper && letters > 3) {
                capitalize(segment)
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_keeps_digits_only() {
        assert_eq!(parse_price("1 500 000 FCFA"), Some(1_500_000));
        assert_eq!(parse_price("250.000.000 CFA"), Some(250_000_000));
        assert_eq!(parse_price("75\u{a0}000\u{a0}000 F CFA"), Some(75_000_000));
        assert_eq!(parse_price("1500000"), Some(1_500_000));
        assert_eq!(parse_price("1500000.0"), Some(1_500_000));
    }

    #[test]
    fn price_rejects_non_numeric() {
        assert_eq!(parse_price("Prix sur demande"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("0 CFA"), None);
        assert_eq!(parse_price("999999999999999999999999 CFA"), None);
    }

    #[test]
    fn surface_with_unit() {
        assert_eq!(extract_surface("Villa 5 pièces, 3 salles de bain, 400 m²"), Some(400.0));
        assert_eq!(extract_surface("Terrain de 1 200 m2 à Diamniadio"), Some(1200.0));
        assert_eq!(extract_surface("parcelle 250,5 M2"), Some(250.5));
        assert_eq!(extract_surface("Terrain 300 mètres carrés"), Some(300.0));
        assert_eq!(extract_surface("Champ de 2 ha à Thiès"), Some(20_000.0));
    }

    #[test]
    fn surface_fallback_skips_counts() {
        assert_eq!(extract_surface("Terrain 150 Keur Massar"), Some(150.0));
        assert_eq!(extract_surface("Villa 5 pièces Almadies"), None);
        assert_eq!(extract_surface("Villa R+1 Ngor"), None);
        assert_eq!(extract_surface("Appartement F4"), None);
        assert_eq!(extract_surface("Villa 4 chambres à Ngor"), None);
        assert_eq!(extract_surface("Villa 3 chambres salon Mermoz"), None);
        assert_eq!(extract_surface("Appartement 2ch 1 salon Sacré-Coeur"), None);
        assert_eq!(extract_surface("Villa 4 chambres 350 Mermoz"), Some(350.0));
    }

    #[test]
    fn surface_grouping_reads_space_thousands() {
        assert_eq!(extract_surface("Terrain de 1 500 m² à Bambilor"), Some(1500.0));
        // a lot number glued to a three-digit surface reads as one grouped number
        assert_eq!(extract_surface("Lot 12 150 m²"), Some(12_150.0));
        assert_eq!(extract_surface("Lot 12, 150 m²"), Some(150.0));
    }

    #[test]
    fn room_and_bath_counts() {
        let text = "3 pièces, 2 salles de bain";
        assert_eq!(extract_rooms(text), Some(3));
        assert_eq!(extract_bathrooms(text), Some(2));
        assert_eq!(extract_rooms("Villa avec piscine, 2 sdb"), None);
        assert_eq!(extract_bathrooms("Villa avec piscine, 2 sdb"), Some(2));
        assert_eq!(extract_rooms("4 PIECES meublé"), Some(4));
        assert_eq!(extract_bathrooms("1 salle de bains"), Some(1));
    }

    #[test]
    fn count_cells() {
        assert_eq!(parse_count_cell("3", extract_rooms), Some(3));
        assert_eq!(parse_count_cell("3.0", extract_rooms), Some(3));
        assert_eq!(parse_count_cell("5 pièces", extract_rooms), Some(5));
        assert_eq!(parse_count_cell("", extract_rooms), None);
        assert_eq!(parse_count_cell("beaucoup", extract_rooms), None);
    }

    #[test]
    fn surface_cells() {
        assert_eq!(parse_surface_cell("300"), Some(300.0));
        assert_eq!(parse_surface_cell("250.5"), Some(250.5));
        assert_eq!(parse_surface_cell("400 m²"), Some(400.0));
        assert_eq!(parse_surface_cell(" "), None);
    }

    #[test]
    fn address_cleanup() {
        assert_eq!(
            clean_address("  almadies ,DAKAR,   Sénégal "),
            Some("Almadies, Dakar, Sénégal".to_string())
        );
        assert_eq!(clean_address("keur-massar, Dakar"), Some("Keur-Massar, Dakar".to_string()));
        assert_eq!(clean_address("Cité VDN,  Dakar"), Some("Cité VDN, Dakar".to_string()));
        assert_eq!(clean_address(" , "), None);
    }

    #[test]
    fn address_cleanup_is_stable() {
        let once = clean_address("SICAP liberté 6 ,  dakar").unwrap();
        assert_eq!(clean_address(&once), Some(once.clone()));
    }
}
