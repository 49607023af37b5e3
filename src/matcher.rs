//! Fuzzy matching of road labels against the intersection registry.
//!
//! Matching runs against a [`RegistrySnapshot`] built once from the full
//! intersection list, with road pairs pre-extracted per entry. That keeps
//! the matcher a pure function of its inputs instead of reaching into the
//! store mid-batch.
//!
//! Three strategies, loosest last:
//! - [`RegistrySnapshot::match_road_pair`]: both roads must correspond
//!   (substring containment either way, pair order ignored). Used for
//!   spreadsheet sheet/column labels.
//! - [`RegistrySnapshot::match_location_loose`]: at least two fragments of
//!   a free-text location must appear inside the candidate's normalized
//!   name. Used for incident locations.
//! - [`RegistrySnapshot::match_location_similar`]: both roads must reach a
//!   Jaro-Winkler similarity of 0.8 against some road token of the
//!   candidate.
//!
//! Ties resolve to registry encounter order; there is no scoring among
//! multiple matches.

use strsim::jaro_winkler;

use crate::extract::extract_road_names;
use crate::models::Intersection;
use crate::normalize::normalize_road_name;

const SIMILARITY_THRESHOLD: f64 = 0.8;

/// One intersection with its pre-extracted road tokens.
#[derive(Debug, Clone)]
struct RegistryEntry {
    intersection: Intersection,
    /// Canonical road fragments extracted from the stored name. May be any
    /// length; pair matching only considers entries with exactly two.
    roads: Vec<String>,
    /// The whole stored name, normalized, for loose containment checks.
    normalized_name: String,
}

/// A pre-loaded, immutable view of the intersection registry.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    entries: Vec<RegistryEntry>,
}

/// True when either road name contains the other.
fn road_match(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

impl RegistrySnapshot {
    /// Builds the snapshot, extracting road tokens per intersection. Order
    /// is preserved: it is the tie-break for all matchers.
    pub fn from_intersections(intersections: Vec<Intersection>) -> Self {
        let entries = intersections
            .into_iter()
            .map(|intersection| {
                let roads = extract_road_names(&[intersection.name.as_str()]);
                let normalized_name = normalize_road_name(&intersection.name);
                RegistryEntry {
                    intersection,
                    roads,
                    normalized_name,
                }
            })
            .collect();
        RegistrySnapshot { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the first registered intersection whose road pair corresponds
    /// to `(road1, road2)`, tolerating substring containment in either
    /// order.
    pub fn match_road_pair(&self, road1: &str, road2: &str) -> Option<&Intersection> {
        self.entries
            .iter()
            .filter(|e| e.roads.len() == 2)
            .find(|e| {
                (road_match(road1, &e.roads[0]) && road_match(road2, &e.roads[1]))
                    || (road_match(road1, &e.roads[1]) && road_match(road2, &e.roads[0]))
            })
            .map(|e| &e.intersection)
    }

    /// Loose matcher for free-text locations: at least two of the label's
    /// road fragments must appear as substrings of a candidate's normalized
    /// name.
    pub fn match_location_loose(&self, location: &str) -> Option<&Intersection> {
        let fragments: Vec<String> = location
            .split('-')
            .map(normalize_road_name)
            .filter(|f| !f.is_empty())
            .collect();

        self.entries
            .iter()
            .find(|e| {
                let hits = fragments
                    .iter()
                    .filter(|f| e.normalized_name.contains(f.as_str()))
                    .count();
                hits >= 2
            })
            .map(|e| &e.intersection)
    }

    /// Similarity-ratio matcher: both roads must individually reach the
    /// 0.8 threshold against their closest road token of a candidate.
    pub fn match_location_similar(&self, road1: &str, road2: &str) -> Option<&Intersection> {
        self.entries
            .iter()
            .find(|e| closest_ratio(road1, &e.roads) >= SIMILARITY_THRESHOLD
                && closest_ratio(road2, &e.roads) >= SIMILARITY_THRESHOLD)
            .map(|e| &e.intersection)
    }
}

/// Highest similarity of `road` against any of `candidates`.
fn closest_ratio(road: &str, candidates: &[String]) -> f64 {
    candidates
        .iter()
        .map(|c| jaro_winkler(road, c))
        .fold(0.0, f64::max)
}
