//! Volume import and registry maintenance.
//!
//! [`import_workbook`] drives one workbook through the whole front half of
//! the pipeline: layout detection, record extraction, intersection
//! resolution, and bulk insertion into the raw observation store. A sheet
//! resolves its target intersection either through a configured sheet
//! mapping (get-or-create by the mapped name) or, per volume column, by
//! road-pair matching of the sheet and column labels against a registry
//! snapshot. Nothing recoverable aborts the batch; failures land in the
//! [`RunSummary`].
//!
//! [`cleanup_intersections`] is the name-hygiene pass: it rewrites every
//! registry name to the canonical `"{road1} - {road2}"` form and deletes
//! records that do not decompose into exactly two roads.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::SheetMappings;
use crate::direction::DirectionSynonyms;
use crate::error::ImportError;
use crate::extract::{CleanupOutcome, clean_intersection_name, extract_road_names};
use crate::extractor::{detect_layout, extract_sheet};
use crate::matcher::RegistrySnapshot;
use crate::models::RawObservation;
use crate::report::RunSummary;
use crate::sheet::{Sheet, Workbook};
use crate::store::{IntersectionRegistry, ObservationStore};

/// Options for one workbook import run.
#[derive(Debug, Default)]
pub struct ImportOptions {
    /// Report what would be written without touching the store.
    pub dry_run: bool,
    /// Fixed sheet-to-intersection assignments; sheets without an entry
    /// fall back to road-pair matching.
    pub mappings: SheetMappings,
    pub synonyms: DirectionSynonyms,
}

/// Imports every sheet of a workbook into the raw observation store.
pub fn import_workbook<S>(
    store: &mut S,
    workbook: &Workbook,
    options: &ImportOptions,
) -> Result<RunSummary, ImportError>
where
    S: IntersectionRegistry + ObservationStore,
{
    let mut summary = RunSummary::new();
    // One snapshot for the whole run; mapped sheets may still create
    // intersections, which matcher-resolved sheets will only see on the
    // next run. Matches the batch semantics of the source importers.
    let snapshot = RegistrySnapshot::from_intersections(store.list()?);
    if snapshot.is_empty() && options.mappings.is_empty() {
        warn!("Intersection registry is empty; road-pair matching cannot succeed");
    }

    for sheet in &workbook.sheets {
        import_sheet(store, sheet, &snapshot, options, &mut summary)?;
    }

    summary.log();
    Ok(summary)
}

fn import_sheet<S>(
    store: &mut S,
    sheet: &Sheet,
    snapshot: &RegistrySnapshot,
    options: &ImportOptions,
    summary: &mut RunSummary,
) -> Result<(), ImportError>
where
    S: IntersectionRegistry + ObservationStore,
{
    info!(sheet = %sheet.name, "Processing sheet");

    let layout = match detect_layout(sheet, &options.synonyms, summary) {
        Ok(layout) => layout,
        Err(err @ ImportError::MissingMapping(_)) => {
            summary.record_skipped_sheet(&err);
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    // Resolve the target intersection for each volume column up front.
    let mut column_targets: HashMap<usize, u64> = HashMap::new();
    let mapped_name = options.mappings.get(&sheet.name);
    for &(col, _) in &layout.volume_cols {
        let header = &sheet.columns[col];
        let target = match mapped_name {
            Some(name) => {
                let (intersection, created) = store.get_or_create(name, 0.0, 0.0)?;
                if created {
                    info!(name, "Created intersection from sheet mapping");
                }
                Some(intersection.id)
            }
            None => {
                let roads = extract_road_names(&[sheet.name.as_str(), header.as_str()]);
                match roads.as_slice() {
                    [road1, road2] => match snapshot.match_road_pair(road1, road2) {
                        Some(intersection) => {
                            debug!(header, matched = %intersection.name, "Column matched");
                            Some(intersection.id)
                        }
                        None => {
                            summary.record_unmatched(&format!("{} / {}", sheet.name, header));
                            None
                        }
                    },
                    _ => {
                        summary.record_skipped_column(&sheet.name, header, "no road pair in label");
                        None
                    }
                }
            }
        };
        if let Some(id) = target {
            column_targets.insert(col, id);
        }
    }

    let observations = extract_sheet(sheet, &layout, summary);
    let records: Vec<RawObservation> = observations
        .into_iter()
        .filter_map(|obs| {
            column_targets.get(&obs.column).map(|&intersection_id| {
                RawObservation::new(intersection_id, obs.timestamp, obs.direction, obs.volume)
            })
        })
        .collect();

    if options.dry_run {
        info!(sheet = %sheet.name, records = records.len(), "Dry run, skipping insert");
    } else {
        store.insert_batch(&records)?;
    }

    summary.records_written += records.len();
    summary.sheets_processed += 1;
    info!(sheet = %sheet.name, records = records.len(), "Sheet finished");
    Ok(())
}

/// Result of one registry cleanup pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub cleaned: usize,
    pub deleted: usize,
}

/// Normalizes every intersection name to `"{road1} - {road2}"`, deleting
/// records whose name does not decompose into exactly two roads.
pub fn cleanup_intersections<R: IntersectionRegistry>(
    registry: &mut R,
) -> Result<CleanupReport, ImportError> {
    let mut report = CleanupReport::default();

    for intersection in registry.list()? {
        match clean_intersection_name(&intersection.name) {
            CleanupOutcome::Cleaned(name) => {
                if name != intersection.name {
                    registry.update_name(intersection.id, &name)?;
                }
                report.cleaned += 1;
            }
            CleanupOutcome::Invalid => {
                info!(id = intersection.id, name = %intersection.name, "Deleting invalid intersection");
                registry.delete(intersection.id)?;
                report.deleted += 1;
            }
        }
    }

    info!(cleaned = report.cleaned, deleted = report.deleted, "Cleanup finished");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Cell;
    use crate::store::CsvStore;
    use std::env;
    use std::fs;

    fn temp_store(name: &str) -> CsvStore {
        let root = env::temp_dir().join(format!("traffic_reconciler_ingest_{name}"));
        let _ = fs::remove_dir_all(&root);
        CsvStore::open(root).unwrap()
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn workbook(sheet_name: &str, volume_header: &str, rows: Vec<Vec<Cell>>) -> Workbook {
        Workbook {
            sheets: vec![Sheet {
                name: sheet_name.to_string(),
                columns: vec!["DAY".into(), "Time".into(), volume_header.to_string()],
                rows,
            }],
        }
    }

    fn sample_rows() -> Vec<Vec<Cell>> {
        vec![
            vec![text("2024-03-01"), text("08:15"), Cell::Number(42.0)],
            vec![text("2024-03-01"), text("08:30"), Cell::Number(17.0)],
        ]
    }

    #[test]
    fn test_import_resolves_intersection_by_road_pair() {
        let mut store = temp_store("road_pair");
        let (seeded, _) = store
            .get_or_create("AV. BOLIVAR - AV. GRAL. CORDOVA", -12.05, -77.04)
            .unwrap();

        let wb = workbook("Córdova", "Av. Bolivar (OE)", sample_rows());
        let summary = import_workbook(&mut store, &wb, &ImportOptions::default()).unwrap();

        assert_eq!(summary.records_written, 2);
        assert!(summary.unmatched_labels.is_empty());
        let stored = ObservationStore::load_for_intersection(&store, seeded.id).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].volume, 42);
    }

    #[test]
    fn test_unmatched_column_is_reported_not_fatal() {
        let mut store = temp_store("unmatched");
        store.get_or_create("AV. BRASIL - AV. BOLIVAR", 0.0, 0.0).unwrap();

        let wb = workbook("Garzón", "Jr. Husares de Junin (NS)", sample_rows());
        let summary = import_workbook(&mut store, &wb, &ImportOptions::default()).unwrap();

        assert_eq!(summary.records_written, 0);
        assert_eq!(summary.unmatched_labels.len(), 1);
        assert!(summary.unmatched_labels[0].contains("Garzón"));
    }

    #[test]
    fn test_mapping_takes_precedence_and_creates() {
        let mut store = temp_store("mapping");
        let path = env::temp_dir().join("traffic_reconciler_ingest_mapping.json");
        fs::write(&path, r#"{"Sucre": "AV. BOLIVAR - AV. ANTONIO JOSE DE SUCRE"}"#).unwrap();

        let options = ImportOptions {
            mappings: SheetMappings::load(path.to_str().unwrap()).unwrap(),
            ..Default::default()
        };
        let wb = workbook("Sucre", "Av. Sucre (NS)", sample_rows());
        let summary = import_workbook(&mut store, &wb, &options).unwrap();

        assert_eq!(summary.records_written, 2);
        let registry = store.list().unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry[0].name, "AV. BOLIVAR - AV. ANTONIO JOSE DE SUCRE");

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let mut store = temp_store("dry_run");
        let (seeded, _) = store
            .get_or_create("AV. BOLIVAR - AV. GRAL. CORDOVA", 0.0, 0.0)
            .unwrap();

        let wb = workbook("Córdova", "Av. Bolivar (OE)", sample_rows());
        let options = ImportOptions {
            dry_run: true,
            ..Default::default()
        };
        let summary = import_workbook(&mut store, &wb, &options).unwrap();

        assert_eq!(summary.records_written, 2);
        assert!(
            ObservationStore::load_for_intersection(&store, seeded.id)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_sheet_without_date_column_is_skipped() {
        let mut store = temp_store("no_date");
        let wb = Workbook {
            sheets: vec![Sheet {
                name: "Notas".into(),
                columns: vec!["Comentario".into()],
                rows: vec![],
            }],
        };
        let summary = import_workbook(&mut store, &wb, &ImportOptions::default()).unwrap();
        assert_eq!(summary.sheets_skipped, 1);
        assert_eq!(summary.sheets_processed, 0);
    }

    #[test]
    fn test_cleanup_rewrites_and_deletes() {
        let mut store = temp_store("cleanup");
        store
            .get_or_create("Av. X - Av. Y - Distrito: Lima", 0.0, 0.0)
            .unwrap();
        store.get_or_create("Plaza sin cruce", 0.0, 0.0).unwrap();

        let report = cleanup_intersections(&mut store).unwrap();

        assert_eq!(report, CleanupReport { cleaned: 1, deleted: 1 });
        let remaining = store.list().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "X - Y");
    }
}
