//! Core entities of the reconciliation pipeline.
//!
//! [`Intersection`] is the canonical location entity; [`RawObservation`] is
//! one directional count read from a source sheet; [`AggregatedWindow`] is a
//! fully derived 15-minute rollup. [`Incident`] carries ticket metadata with
//! an optional weak link to a matched intersection.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical traffic flow orientation through an intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// North to south.
    NS,
    /// South to north.
    SN,
    /// East to west.
    EW,
    /// West to east.
    WE,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::NS => "NS",
            Direction::SN => "SN",
            Direction::EW => "EW",
            Direction::WE => "WE",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NS" => Ok(Direction::NS),
            "SN" => Ok(Direction::SN),
            "EW" => Ok(Direction::EW),
            "WE" => Ok(Direction::WE),
            other => Err(format!("unknown direction code: {other}")),
        }
    }
}

/// A registered road intersection.
///
/// `name` is expected to encode exactly two road names joined by a `-`
/// separator, but legacy importers did not always enforce that; the cleanup
/// pass does (see `extract::clean_intersection_name`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intersection {
    pub id: u64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Intersection {
    pub fn new(id: u64, name: &str, latitude: f64, longitude: f64) -> Self {
        let now = Utc::now();
        Intersection {
            id,
            name: name.to_string(),
            latitude,
            longitude,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One directional vehicle count read from a source file.
///
/// Rows are append-only: imports create them, nothing updates them, and they
/// are deleted only together with their intersection. Duplicate imports
/// produce duplicate rows; the pipeline does not enforce uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawObservation {
    pub intersection_id: u64,
    pub timestamp: NaiveDateTime,
    pub direction: Direction,
    pub volume: u32,
    pub is_simulated: bool,
    pub created_at: DateTime<Utc>,
}

impl RawObservation {
    pub fn new(
        intersection_id: u64,
        timestamp: NaiveDateTime,
        direction: Direction,
        volume: u32,
    ) -> Self {
        RawObservation {
            intersection_id,
            timestamp,
            direction,
            volume,
            is_simulated: false,
            created_at: Utc::now(),
        }
    }
}

/// A 15-minute rollup of all directional counts at one intersection.
///
/// Pure materialized view: the aggregation pass deletes and rebuilds these
/// wholesale from [`RawObservation`] rows, so the table has no independent
/// lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedWindow {
    pub intersection_id: u64,
    pub window_start: NaiveDateTime,
    pub total_volume: u64,
    pub average_speed: f64,
}

/// An incident ticket, optionally linked to its best-matched intersection.
///
/// The link is a weak reference: an unmatched location leaves it `None`, and
/// deleting an intersection never deletes the incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub incident_number: String,
    pub ticket_number: String,
    pub incident_type: String,
    pub incident_detail_type: String,
    pub location_name: String,
    pub district: String,
    pub managed_by: String,
    pub assigned_to: String,
    pub description: String,
    pub operator: String,
    pub status: String,
    pub registered_at: String,
    pub last_status_update: String,
    pub intersection_id: Option<u64>,
}
