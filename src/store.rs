//! In-memory station report store.

use std::collections::BTreeMap;

use tokio::sync::Mutex;

use crate::models::{Pirep, StationId, StationReport};

/// Retained pilot reports; the oldest entries are dropped once the list is
/// full, so a long-lived ingest process stays bounded.
pub const MAX_PIREPS: usize = 1000;

/// Merged station reports plus the flat pilot-report list.
///
/// Both the batch pipeline and the streaming ingestor funnel through the
/// same upsert operations, so whichever path last touched a field wins for
/// that field only. A store-wide lock covers every mutation and every
/// read-for-serialize; readers always get a point-in-time copy, never a
/// field-by-field view of a report mid-update.
///
/// Reports are keyed in a `BTreeMap` so iteration order is deterministic for
/// a fixed snapshot.
pub struct StationStore {
    reports: Mutex<BTreeMap<String, StationReport>>,
    pireps: Mutex<Vec<Pirep>>,
}

impl StationStore {
    pub fn new() -> Self {
        Self {
            reports: Mutex::new(BTreeMap::new()),
            pireps: Mutex::new(Vec::new()),
        }
    }

    /// Store the latest METAR for a station, leaving other fields untouched.
    ///
    /// `category` is the flight-category code reported alongside the
    /// bulletin; sources without one pass `"VFR"`.
    pub async fn upsert_metar(&self, id: &StationId, raw: &str, category: &str, time: &str) {
        let mut reports = self.reports.lock().await;
        let report = Self::entry(&mut reports, id);
        report.metar = raw.to_string();
        report.cond = category.to_string();
        report.time = time.to_string();
    }

    /// Store the latest TAF for a station, leaving other fields untouched.
    pub async fn upsert_taf(&self, id: &StationId, raw: &str, time: &str) {
        let mut reports = self.reports.lock().await;
        let report = Self::entry(&mut reports, id);
        report.taf = raw.to_string();
        report.time = time.to_string();
    }

    /// Store the latest upper-level winds for a station.
    pub async fn upsert_winds(&self, id: &StationId, raw: &str, time: &str) {
        let mut reports = self.reports.lock().await;
        let report = Self::entry(&mut reports, id);
        report.winds = raw.to_string();
        report.time = time.to_string();
    }

    /// Record coordinates for a station when a source supplies them.
    ///
    /// Empty values leave any previously known coordinates in place; a
    /// coordinate never degrades back to unknown.
    pub async fn set_location(&self, id: &StationId, lat: &str, lng: &str) {
        if lat.is_empty() || lng.is_empty() {
            return;
        }
        let mut reports = self.reports.lock().await;
        let report = Self::entry(&mut reports, id);
        report.lat = lat.to_string();
        report.lng = lng.to_string();
    }

    /// Append a pilot report to the flat list, keeping the most recent
    /// [`MAX_PIREPS`] entries.
    pub async fn add_pirep(&self, pirep: Pirep) {
        let mut pireps = self.pireps.lock().await;
        pireps.push(pirep);
        if pireps.len() > MAX_PIREPS {
            let excess = pireps.len() - MAX_PIREPS;
            pireps.drain(..excess);
        }
    }

    pub async fn get(&self, id: &StationId) -> Option<StationReport> {
        self.reports.lock().await.get(id.as_str()).cloned()
    }

    /// Point-in-time copy of every station report.
    pub async fn snapshot(&self) -> BTreeMap<String, StationReport> {
        self.reports.lock().await.clone()
    }

    /// Copy of the pilot-report list.
    pub async fn pireps(&self) -> Vec<Pirep> {
        self.pireps.lock().await.clone()
    }

    /// Replace the whole station map, e.g. when restoring a snapshot.
    pub async fn replace(&self, reports: BTreeMap<String, StationReport>) {
        *self.reports.lock().await = reports;
    }

    /// Replace the pilot-report list, e.g. when restoring a snapshot.
    pub async fn replace_pireps(&self, pireps: Vec<Pirep>) {
        *self.pireps.lock().await = pireps;
    }

    pub async fn len(&self) -> usize {
        self.reports.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.reports.lock().await.is_empty()
    }

    fn entry<'a>(
        reports: &'a mut BTreeMap<String, StationReport>,
        id: &StationId,
    ) -> &'a mut StationReport {
        reports
            .entry(id.as_str().to_string())
            .or_insert_with(|| StationReport {
                location: id.as_str().to_string(),
                ..StationReport::default()
            })
    }
}

impl Default for StationStore {
    fn default() -> Self {
        Self::new()
    }
}
