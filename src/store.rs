//! Persistence seams for the pipeline.
//!
//! The pipeline only needs a handful of operations from its backing store
//! (list / get-or-create intersections, bulk insert and scoped delete of
//! observations and aggregates), expressed here as traits so the core stays
//! independent of where the data actually lives.
//!
//! [`CsvStore`] is the file-backed implementation: one `intersections.csv`
//! registry file plus per-intersection partition files under
//! `observations/intersection_id=<id>.csv` and
//! `aggregates/intersection_id=<id>.csv`.

use csv::WriterBuilder;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ImportError;
use crate::models::{AggregatedWindow, Intersection, RawObservation};

/// Read/write access to the canonical intersection set.
pub trait IntersectionRegistry {
    fn list(&self) -> Result<Vec<Intersection>, ImportError>;

    /// Returns the intersection with this exact name, creating it with the
    /// given coordinates when absent. The boolean is true on creation.
    fn get_or_create(
        &mut self,
        name: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<(Intersection, bool), ImportError>;

    fn update_name(&mut self, id: u64, name: &str) -> Result<(), ImportError>;

    /// Deletes the intersection and cascades to its observations and
    /// aggregates.
    fn delete(&mut self, id: u64) -> Result<(), ImportError>;
}

/// Append-only store of raw observations, partitioned by intersection.
pub trait ObservationStore {
    fn insert_batch(&mut self, observations: &[RawObservation]) -> Result<(), ImportError>;

    /// All observations for one intersection, ordered by timestamp.
    fn load_for_intersection(&self, intersection_id: u64)
        -> Result<Vec<RawObservation>, ImportError>;

    /// Intersections that have at least one observation.
    fn intersection_ids_with_data(&self) -> Result<Vec<u64>, ImportError>;

    fn delete_for_intersection(&mut self, intersection_id: u64) -> Result<(), ImportError>;
}

/// Materialized 15-minute windows, partitioned by intersection.
pub trait AggregateStore {
    fn insert_batch(&mut self, windows: &[AggregatedWindow]) -> Result<(), ImportError>;

    /// All windows for one intersection, ordered by window start.
    fn load_for_intersection(&self, intersection_id: u64)
        -> Result<Vec<AggregatedWindow>, ImportError>;

    fn delete_for_intersection(&mut self, intersection_id: u64) -> Result<(), ImportError>;
}

/// File-backed store rooted at a data directory.
pub struct CsvStore {
    root: PathBuf,
}

impl CsvStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ImportError> {
        let root = root.into();
        std::fs::create_dir_all(root.join("observations"))?;
        std::fs::create_dir_all(root.join("aggregates"))?;
        Ok(CsvStore { root })
    }

    fn registry_path(&self) -> PathBuf {
        self.root.join("intersections.csv")
    }

    fn partition_path(&self, kind: &str, intersection_id: u64) -> PathBuf {
        self.root
            .join(kind)
            .join(format!("intersection_id={intersection_id}.csv"))
    }

    /// Appends serializable rows to a CSV file, writing the header only
    /// when the file is first created.
    fn append_rows<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<(), ImportError> {
        let file_exists = path.exists();
        debug!(path = %path.display(), file_exists, rows = rows.len(), "Appending CSV rows");

        let file = OpenOptions::new().append(true).create(true).open(path)?;
        let mut writer = WriterBuilder::new()
            .has_headers(!file_exists) // IMPORTANT when appending
            .from_writer(file);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Rewrites a CSV file from scratch with the given rows.
    fn write_rows<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<(), ImportError> {
        let file = File::create(path)?;
        let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn read_rows<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, ImportError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(path)?;
        let mut rdr = csv::Reader::from_reader(file);
        let mut rows = Vec::new();
        for result in rdr.deserialize() {
            rows.push(result?);
        }
        Ok(rows)
    }

    /// Partition ids present under `<root>/<kind>/intersection_id=*.csv`.
    fn partition_ids(&self, kind: &str) -> Result<Vec<u64>, ImportError> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(self.root.join(kind))? {
            let entry = entry?;
            if let Some(name) = entry.path().file_stem().and_then(|s| s.to_str()) {
                if let Some(id) = name.strip_prefix("intersection_id=") {
                    if let Ok(id) = id.parse() {
                        ids.push(id);
                    }
                }
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn remove_partition(&self, kind: &str, intersection_id: u64) -> Result<(), ImportError> {
        let path = self.partition_path(kind, intersection_id);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

impl IntersectionRegistry for CsvStore {
    fn list(&self) -> Result<Vec<Intersection>, ImportError> {
        Self::read_rows(&self.registry_path())
    }

    fn get_or_create(
        &mut self,
        name: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<(Intersection, bool), ImportError> {
        let existing = self.list()?;
        if let Some(found) = existing.iter().find(|i| i.name == name) {
            return Ok((found.clone(), false));
        }

        let next_id = existing.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        let intersection = Intersection::new(next_id, name, latitude, longitude);
        Self::append_rows(&self.registry_path(), std::slice::from_ref(&intersection))?;
        Ok((intersection, true))
    }

    fn update_name(&mut self, id: u64, name: &str) -> Result<(), ImportError> {
        let mut intersections = self.list()?;
        for intersection in &mut intersections {
            if intersection.id == id {
                intersection.name = name.to_string();
                intersection.updated_at = chrono::Utc::now();
            }
        }
        Self::write_rows(&self.registry_path(), &intersections)
    }

    fn delete(&mut self, id: u64) -> Result<(), ImportError> {
        let intersections: Vec<Intersection> =
            self.list()?.into_iter().filter(|i| i.id != id).collect();
        Self::write_rows(&self.registry_path(), &intersections)?;
        // Owned rows go with the intersection
        self.remove_partition("observations", id)?;
        self.remove_partition("aggregates", id)
    }
}

/// Groups rows by intersection so each partition file is opened once per
/// batch.
fn group_by_intersection<T: Clone>(
    rows: &[T],
    id_of: impl Fn(&T) -> u64,
) -> std::collections::BTreeMap<u64, Vec<T>> {
    let mut groups: std::collections::BTreeMap<u64, Vec<T>> = std::collections::BTreeMap::new();
    for row in rows {
        groups.entry(id_of(row)).or_default().push(row.clone());
    }
    groups
}

impl ObservationStore for CsvStore {
    fn insert_batch(&mut self, observations: &[RawObservation]) -> Result<(), ImportError> {
        for (id, rows) in group_by_intersection(observations, |o| o.intersection_id) {
            Self::append_rows(&self.partition_path("observations", id), &rows)?;
        }
        Ok(())
    }

    fn load_for_intersection(
        &self,
        intersection_id: u64,
    ) -> Result<Vec<RawObservation>, ImportError> {
        let mut rows: Vec<RawObservation> =
            Self::read_rows(&self.partition_path("observations", intersection_id))?;
        rows.sort_by_key(|o| o.timestamp);
        Ok(rows)
    }

    fn intersection_ids_with_data(&self) -> Result<Vec<u64>, ImportError> {
        self.partition_ids("observations")
    }

    fn delete_for_intersection(&mut self, intersection_id: u64) -> Result<(), ImportError> {
        self.remove_partition("observations", intersection_id)
    }
}

impl AggregateStore for CsvStore {
    fn insert_batch(&mut self, windows: &[AggregatedWindow]) -> Result<(), ImportError> {
        for (id, rows) in group_by_intersection(windows, |w| w.intersection_id) {
            Self::append_rows(&self.partition_path("aggregates", id), &rows)?;
        }
        Ok(())
    }

    fn load_for_intersection(
        &self,
        intersection_id: u64,
    ) -> Result<Vec<AggregatedWindow>, ImportError> {
        let mut rows: Vec<AggregatedWindow> =
            Self::read_rows(&self.partition_path("aggregates", intersection_id))?;
        rows.sort_by_key(|w| w.window_start);
        Ok(rows)
    }

    fn delete_for_intersection(&mut self, intersection_id: u64) -> Result<(), ImportError> {
        self.remove_partition("aggregates", intersection_id)
    }
}
