//! Direction resolution from column headers.
//!
//! Volume columns follow the `"<Road Name> (<DirectionCode>)"` convention.
//! The code inside the parentheses may be a Spanish abbreviation (OE / EO
//! for west-east / east-west); a synonym table translates those to the
//! canonical four codes. Unknown codes pass through untranslated and fail
//! the [`Direction`] parse at the caller, which then skips the column.

use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::models::Direction;

/// A 2-3 letter code wrapped in parentheses anywhere in the header.
static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([A-Za-z]{2,3})\)").expect("valid regex"));

/// Translation table from source-language direction codes to canonical ones.
///
/// Deserializable so a config file can override or extend the defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectionSynonyms(HashMap<String, String>);

impl Default for DirectionSynonyms {
    fn default() -> Self {
        let mut map = HashMap::new();
        for (from, to) in [
            ("NS", "NS"),
            ("SN", "SN"),
            ("WE", "WE"),
            ("EW", "EW"),
            // Oeste-Este / Este-Oeste
            ("OE", "WE"),
            ("EO", "EW"),
        ] {
            map.insert(from.to_string(), to.to_string());
        }
        DirectionSynonyms(map)
    }
}

impl DirectionSynonyms {
    /// Translates an extracted code, passing unknown codes through unchanged.
    pub fn translate<'a>(&'a self, code: &'a str) -> &'a str {
        self.0.get(code).map(String::as_str).unwrap_or(code)
    }
}

/// Extracts the parenthesized direction code from a column header and
/// translates it through the synonym table. `None` if the header carries no
/// code at all.
pub fn resolve_code(header: &str, synonyms: &DirectionSynonyms) -> Option<String> {
    let code = CODE_RE.captures(header)?.get(1)?.as_str().to_uppercase();
    Some(synonyms.translate(&code).to_string())
}

/// Resolves a column header to a canonical [`Direction`].
///
/// `None` either when no code is present or when the translated code is not
/// one of the four canonical values; callers skip the column in both cases.
pub fn resolve_direction(header: &str, synonyms: &DirectionSynonyms) -> Option<Direction> {
    resolve_code(header, synonyms)?.parse().ok()
}
