//! Import configuration files.
//!
//! Both configs are plain JSON objects on disk. [`SheetMappings`] pins a
//! sheet name to a fixed intersection name for workbooks whose sheet names
//! carry no usable road pair; when a sheet has no entry the importer falls
//! back to road-pair matching against the registry.

use anyhow::Result;
use std::collections::HashMap;

use crate::direction::DirectionSynonyms;

/// Maps sheet names to canonical intersection names.
///
/// ```json
/// {
///   "Córdova": "AV. BOLIVAR - AV. GRAL. CORDOVA",
///   "Garzón": "AV. GRAL. GARZON - JR. HUSARES DE JUNIN"
/// }
/// ```
#[derive(Debug, Default)]
pub struct SheetMappings {
    entries: HashMap<String, String>,
}

impl SheetMappings {
    /// Loads the mapping from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: HashMap<String, String> = serde_json::from_str(&content)?;
        Ok(Self { entries })
    }

    /// Returns the mapped intersection name for `sheet`, if one is
    /// configured.
    pub fn get(&self, sheet: &str) -> Option<&str> {
        self.entries.get(sheet).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loads direction-synonym overrides from a JSON object of
/// `{"code": "canonical"}` pairs; absent path means the defaults.
pub fn load_synonyms(path: Option<&str>) -> Result<DirectionSynonyms> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        }
        None => Ok(DirectionSynonyms::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::resolve_code;
    use std::env;
    use std::fs;

    #[test]
    fn test_sheet_mappings_round_trip() {
        let path = env::temp_dir().join("traffic_reconciler_mappings.json");
        fs::write(&path, r#"{"Córdova": "AV. BOLIVAR - AV. GRAL. CORDOVA"}"#).unwrap();

        let mappings = SheetMappings::load(path.to_str().unwrap()).unwrap();
        assert_eq!(
            mappings.get("Córdova"),
            Some("AV. BOLIVAR - AV. GRAL. CORDOVA")
        );
        assert_eq!(mappings.get("Sucre"), None);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_synonym_overrides() {
        let path = env::temp_dir().join("traffic_reconciler_synonyms.json");
        fs::write(&path, r#"{"NO": "NS", "OE": "WE"}"#).unwrap();

        let synonyms = load_synonyms(path.to_str()).unwrap();
        assert_eq!(resolve_code("Road (NO)", &synonyms), Some("NS".to_string()));

        fs::remove_file(path).unwrap();
    }
}
