//! 15-minute window aggregation.
//!
//! Raw observations bucket into fixed windows keyed by their timestamp
//! truncated down to the nearest 15-minute boundary. Volumes sum across all
//! directions sharing a bucket, and an average-speed estimate derives from
//! the bucketed total via a three-tier step function.
//!
//! The rebuild is a pure, deterministic function of the raw observation
//! set: stale windows are deleted and rebuilt per intersection, so running
//! it twice on unchanged input produces identical output.

use chrono::{NaiveDateTime, Timelike};
use std::collections::BTreeMap;
use tracing::info;

use crate::error::ImportError;
use crate::models::{AggregatedWindow, RawObservation};
use crate::store::{AggregateStore, ObservationStore};

const BASE_SPEED: f64 = 50.0;

/// Truncates a timestamp down to its 15-minute window boundary.
pub fn window_start(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_minute(ts.minute() - ts.minute() % 15)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .expect("truncating a valid timestamp stays valid")
}

/// Derives the average-speed estimate from a window's total volume.
///
/// Base speed 50.0, scaled by 0.5 above 1000 vehicles and 0.7 above 500.
/// The comparisons are strict on purpose: exactly 1000 falls in the 0.7
/// tier and exactly 500 keeps the base speed. Historical aggregates were
/// produced with these boundaries, so they stay as-is.
pub fn speed_for_volume(total_volume: u64) -> f64 {
    let speed = if total_volume > 1000 {
        BASE_SPEED * 0.5
    } else if total_volume > 500 {
        BASE_SPEED * 0.7
    } else {
        BASE_SPEED
    };
    (speed * 100.0).round() / 100.0
}

/// Buckets observations into per-intersection 15-minute windows.
///
/// Output is sorted by (intersection, window start) so repeated runs over
/// the same input yield byte-identical rows.
pub fn aggregate_observations(observations: &[RawObservation]) -> Vec<AggregatedWindow> {
    let mut buckets: BTreeMap<(u64, NaiveDateTime), u64> = BTreeMap::new();
    for obs in observations {
        let key = (obs.intersection_id, window_start(obs.timestamp));
        *buckets.entry(key).or_insert(0) += u64::from(obs.volume);
    }

    buckets
        .into_iter()
        .map(|((intersection_id, window_start), total_volume)| AggregatedWindow {
            intersection_id,
            window_start,
            total_volume,
            average_speed: speed_for_volume(total_volume),
        })
        .collect()
}

/// Rebuilds the aggregated windows for every intersection that has raw
/// observations.
///
/// Delete-then-rebuild is scoped per intersection: a crash mid-run leaves
/// intersections not yet started untouched instead of globally wiped.
/// Each intersection's new windows go in as a single batch insert.
pub fn rebuild<S>(store: &mut S) -> Result<usize, ImportError>
where
    S: ObservationStore + AggregateStore,
{
    let ids = store.intersection_ids_with_data()?;
    info!(intersections = ids.len(), "Rebuilding aggregated windows");

    let mut total_windows = 0;
    for id in ids {
        let observations = ObservationStore::load_for_intersection(store, id)?;
        let windows = aggregate_observations(&observations);

        AggregateStore::delete_for_intersection(store, id)?;
        AggregateStore::insert_batch(store, &windows)?;

        info!(intersection_id = id, windows = windows.len(), "Intersection aggregated");
        total_windows += windows.len();
    }

    Ok(total_windows)
}
