//! Road-pair extraction from composite location labels.
//!
//! A label can be a sheet name, a column header, or a stored intersection
//! name. Directional annotation lives inside parentheses and is discarded;
//! the remainder splits on `-` or `/` into road fragments, each normalized
//! via [`crate::normalize::normalize_road_name`].
//!
//! Stored intersection names additionally carry trailing annotation noise
//! appended by the data source (district, network code, install year); the
//! cleanup path strips those before splitting, and only names that decompose
//! into exactly two roads survive.

use regex::Regex;
use std::sync::LazyLock;

use crate::normalize::normalize_road_name;

/// Trailing annotation fragments appended to intersection names by the data
/// source. Everything from the first marker onward is noise, never a road.
static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Distrito:.*|Codigo de Red:.*|Red:.*|Año.*|Instalado:.*)")
        .expect("valid regex")
});

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-/]").expect("valid regex"));

/// Extracts canonical road names from one or more raw labels.
///
/// Per label: drop everything from the first `(`, split the rest on `-` or
/// `/`, normalize each fragment, and keep the non-empty results. Fragments
/// from all labels concatenate into one ordered sequence; duplicates are
/// kept and the caller decides how many it needs.
pub fn extract_road_names<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    let mut roads = Vec::new();
    for label in labels {
        let main = label.as_ref().split('(').next().unwrap_or("");
        for part in SEPARATOR_RE.split(main) {
            let road = normalize_road_name(part);
            if !road.is_empty() {
                roads.push(road);
            }
        }
    }
    roads
}

/// Result of running an intersection name through the cleanup pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The name decomposed into exactly two roads; the record keeps the
    /// rewritten `"{road1} - {road2}"` form.
    Cleaned(String),
    /// Zero, one, or three-plus road fragments remained; the record is
    /// dropped by the caller.
    Invalid,
}

/// Cleans a stored intersection name: strips trailing annotation noise,
/// then requires exactly two extractable road fragments.
pub fn clean_intersection_name(name: &str) -> CleanupOutcome {
    let stripped = NOISE_RE.replace(name, "");
    let trimmed = stripped.trim().trim_matches(|c| c == '-' || c == ' ');
    let roads = extract_road_names(&[trimmed]);
    match roads.as_slice() {
        [road1, road2] => CleanupOutcome::Cleaned(format!("{road1} - {road2}")),
        _ => CleanupOutcome::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_road_pair_from_intersection_name() {
        let roads = extract_road_names(&["AV. BOLIVAR - AV. GRAL. CORDOVA"]);
        assert_eq!(roads, vec!["BOLIVAR", "CORDOVA"]);
    }

    #[test]
    fn test_combines_sheet_and_column_labels() {
        let roads = extract_road_names(&["Córdova", "Av. Bolivar (OE)"]);
        assert_eq!(roads, vec!["CORDOVA", "BOLIVAR"]);
    }

    #[test]
    fn test_discards_parenthesized_annotation() {
        let roads = extract_road_names(&["Av. Sucre (NS) / Av. Brasil"]);
        // The '/' separator after the parenthesis is gone with the annotation
        assert_eq!(roads, vec!["SUCRE"]);
    }

    #[test]
    fn test_slash_separator() {
        let roads = extract_road_names(&["Av. Sucre / Av. Brasil"]);
        assert_eq!(roads, vec!["SUCRE", "BRASIL"]);
    }

    #[test]
    fn test_empty_fragments_are_dropped() {
        let roads = extract_road_names(&["- Av. Bolivar -"]);
        assert_eq!(roads, vec!["BOLIVAR"]);
    }

    #[test]
    fn test_cleanup_strips_district_annotation() {
        assert_eq!(
            clean_intersection_name("Av. X - Av. Y - Distrito: Lima"),
            CleanupOutcome::Cleaned("X - Y".to_string())
        );
    }

    #[test]
    fn test_cleanup_strips_network_and_year_annotations() {
        assert_eq!(
            clean_intersection_name("AV. BRASIL - AV. BOLIVAR Codigo de Red: 123"),
            CleanupOutcome::Cleaned("BRASIL - BOLIVAR".to_string())
        );
        assert_eq!(
            clean_intersection_name("AV. BRASIL - AV. BOLIVAR Año 2019"),
            CleanupOutcome::Cleaned("BRASIL - BOLIVAR".to_string())
        );
    }

    #[test]
    fn test_cleanup_rejects_wrong_road_count() {
        assert_eq!(clean_intersection_name("Av. Bolivar"), CleanupOutcome::Invalid);
        assert_eq!(
            clean_intersection_name("Av. A - Av. B - Av. C"),
            CleanupOutcome::Invalid
        );
        assert_eq!(clean_intersection_name(""), CleanupOutcome::Invalid);
    }
}
