//! Placemark intake for the intersection registry.
//!
//! The KML scraping itself happens upstream; this module accepts the
//! resulting records as a JSON array of name/description/coordinate
//! triples. A `RED SEMAFORICA: <name>` line embedded in the free-text
//! description overrides the primary name, and names truncate to the
//! registry's 100-character limit.

use anyhow::Result;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::info;

use crate::error::ImportError;
use crate::store::IntersectionRegistry;

const NAME_MAX_CHARS: usize = 100;

static NETWORK_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"RED SEMAFORICA: (.+)").expect("valid regex"));

/// One placemark record produced by the upstream KML scrape.
#[derive(Debug, Clone, Deserialize)]
pub struct Placemark {
    pub name: Option<String>,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Placemark {
    /// The intersection name this placemark contributes: the description's
    /// `RED SEMAFORICA:` line when present, else the primary name, else
    /// `"Unnamed"`, truncated to 100 characters.
    pub fn intersection_name(&self) -> String {
        let mut name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("Unnamed")
            .to_string();

        if let Some(description) = &self.description {
            if let Some(captures) = NETWORK_NAME_RE.captures(description) {
                name = captures[1].trim().to_string();
            }
        }

        name.chars().take(NAME_MAX_CHARS).collect()
    }
}

/// Loads a JSON array of placemarks from `path`.
pub fn load_placemarks(path: &str) -> Result<Vec<Placemark>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Get-or-creates one intersection per placemark. Returns the number of
/// newly created intersections.
pub fn import_placemarks<R: IntersectionRegistry>(
    registry: &mut R,
    placemarks: &[Placemark],
) -> Result<usize, ImportError> {
    let mut created_count = 0;
    for placemark in placemarks {
        let name = placemark.intersection_name();
        let (_, created) =
            registry.get_or_create(&name, placemark.latitude, placemark.longitude)?;
        if created {
            created_count += 1;
        }
    }
    info!(
        placemarks = placemarks.len(),
        created = created_count,
        "Placemark import finished"
    );
    Ok(created_count)
}
