//! Bulk bulletin pipeline.
//!
//! Downloads the bulletin cache files, scans them into the station store
//! through the same upserts the streaming path uses, then writes the
//! snapshot and the two derived query documents. A failure in any one
//! source is logged and the remaining sources still run; the pipeline is
//! sequential and blocking to completion.

use std::path::Path;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::{
    config::{AppConfig, CoverageBounds, SourceConfig},
    errors::AvwxError,
    models::{Airport, Pirep, StationId},
    query, snapshot,
    store::StationStore,
};

/// metars.cache.csv: raw text, station id, lat, lng, flight category
const METAR_MIN_FIELDS: usize = 31;
const METAR_LAT_FIELD: usize = 3;
const METAR_LNG_FIELD: usize = 4;
const METAR_CATEGORY_FIELD: usize = 30;
/// tafs.cache.csv: raw text, station id
const TAF_MIN_FIELDS: usize = 2;
/// pireps.cache.csv: lat, lng, report text
const PIREP_MIN_FIELDS: usize = 44;
const PIREP_LAT_FIELD: usize = 9;
const PIREP_LNG_FIELD: usize = 10;
const PIREP_REPORT_FIELD: usize = 43;

/// Run the whole pipeline: reference data, cache scans, snapshot, query
/// documents.
pub async fn run(config: &AppConfig, fetch: bool) -> Result<(), AvwxError> {
    config.snapshot.validate()?;
    config.sources.validate()?;

    if fetch {
        download_caches(&config.sources).await;
    }

    let airports = read_airports(&config.sources.airports_file, &config.bounds)?;
    info!("Loaded {} reference airports", airports.len());

    let store = StationStore::new();
    let now = Utc::now().to_rfc3339();
    let data_dir = &config.sources.data_dir;

    match scan_metars(&data_dir.join("metars.csv"), &store, &now).await {
        Ok(count) => info!("Scanned {} METARs", count),
        Err(e) => error!("METAR scan failed: {}", e),
    }
    match scan_tafs(&data_dir.join("tafs.csv"), &store, &now).await {
        Ok(count) => info!("Scanned {} TAFs", count),
        Err(e) => error!("TAF scan failed: {}", e),
    }
    match scan_pireps(&data_dir.join("pireps.csv"), &store, &config.bounds).await {
        Ok(count) => info!("Scanned {} pireps", count),
        Err(e) => error!("Pirep scan failed: {}", e),
    }

    let reports = store.snapshot().await;
    snapshot::write_document(&config.snapshot.path, &reports)?;

    let records = query::station_records(&reports, &airports);
    snapshot::write_document(&config.snapshot.records_path, &records)?;

    let pireps = store.pireps().await;
    snapshot::write_document(&config.snapshot.pireps_path, &pireps)?;

    info!(
        "Wrote {} station reports, {} display records, {} pireps",
        reports.len(),
        records.len(),
        pireps.len()
    );
    Ok(())
}

/// Refresh the cache files. Each download failure leaves the previous copy
/// in place and the pipeline continues with it.
pub async fn download_caches(sources: &SourceConfig) {
    let targets = [
        (&sources.metars_url, "metars.csv"),
        (&sources.tafs_url, "tafs.csv"),
        (&sources.pireps_url, "pireps.csv"),
    ];
    for (url, name) in targets {
        let path = sources.data_dir.join(name);
        if let Err(e) = download_file(url, &path).await {
            error!("Failed to download {}: {}", name, e);
        }
    }
}

async fn download_file(url: &str, path: &Path) -> Result<(), AvwxError> {
    info!("Downloading {}", url);
    let body = reqwest::get(url).await?.error_for_status()?.bytes().await?;
    std::fs::write(path, &body)?;
    Ok(())
}

/// Read the airport reference file: identifier, lat, lng, elevation.
///
/// Rows outside the coverage bounds or with unparsable coordinates are
/// skipped. Identifiers are canonicalized.
pub fn read_airports(path: &Path, bounds: &CoverageBounds) -> Result<Vec<Airport>, AvwxError> {
    let mut reader = tolerant_reader(path)?;
    let mut airports = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.len() < 4 {
            continue;
        }
        let lat = record.get(1).unwrap_or("").trim();
        let lng = record.get(2).unwrap_or("").trim();
        let (lat_val, lng_val) = match (lat.parse::<f64>(), lng.parse::<f64>()) {
            (Ok(lat), Ok(lng)) => (lat, lng),
            _ => continue,
        };
        if lat_val < bounds.lat_min
            || lat_val > bounds.lat_max
            || lng_val < bounds.lng_min
            || lng_val > bounds.lng_max
        {
            continue;
        }
        airports.push(Airport {
            icao: StationId::canonical(record.get(0).unwrap_or("")).as_str().to_string(),
            lat: lat.to_string(),
            lng: lng.to_string(),
            alt: record.get(3).unwrap_or("").to_string(),
        });
    }
    Ok(airports)
}

/// Scan the METAR cache into the store.
pub async fn scan_metars(
    path: &Path,
    store: &StationStore,
    time: &str,
) -> Result<usize, AvwxError> {
    let mut reader = tolerant_reader(path)?;
    let mut count = 0;
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                // the caches lead with a copyright notice and row counts
                warn!("Skipping malformed row: {}", e);
                continue;
            }
        };
        if record.len() < METAR_MIN_FIELDS {
            continue;
        }
        let id = StationId::canonical(record.get(1).unwrap_or(""));
        if id.as_str().is_empty() {
            continue;
        }
        store
            .upsert_metar(
                &id,
                record.get(0).unwrap_or(""),
                record.get(METAR_CATEGORY_FIELD).unwrap_or(""),
                time,
            )
            .await;
        // the cache row carries the station's own coordinates
        store
            .set_location(
                &id,
                record.get(METAR_LAT_FIELD).unwrap_or("").trim(),
                record.get(METAR_LNG_FIELD).unwrap_or("").trim(),
            )
            .await;
        count += 1;
    }
    Ok(count)
}

/// Scan the TAF cache into the store.
pub async fn scan_tafs(path: &Path, store: &StationStore, time: &str) -> Result<usize, AvwxError> {
    let mut reader = tolerant_reader(path)?;
    let mut count = 0;
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed row: {}", e);
                continue;
            }
        };
        if record.len() < TAF_MIN_FIELDS {
            continue;
        }
        let id = StationId::canonical(record.get(1).unwrap_or(""));
        if id.as_str().is_empty() {
            continue;
        }
        store.upsert_taf(&id, record.get(0).unwrap_or(""), time).await;
        count += 1;
    }
    Ok(count)
}

/// Scan the pirep cache into the flat list, keeping reports inside the
/// coverage bounds.
pub async fn scan_pireps(
    path: &Path,
    store: &StationStore,
    bounds: &CoverageBounds,
) -> Result<usize, AvwxError> {
    let mut reader = tolerant_reader(path)?;
    let mut count = 0;
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed row: {}", e);
                continue;
            }
        };
        if record.len() < PIREP_MIN_FIELDS {
            continue;
        }
        let lat = record.get(PIREP_LAT_FIELD).unwrap_or("").trim();
        let lng = record.get(PIREP_LNG_FIELD).unwrap_or("").trim();
        let (lat_val, lng_val) = match (lat.parse::<f64>(), lng.parse::<f64>()) {
            (Ok(lat), Ok(lng)) => (lat, lng),
            _ => continue,
        };
        if lat_val < bounds.lat_min
            || lat_val > bounds.lat_max
            || lng_val < bounds.lng_min
            || lng_val > bounds.lng_max
        {
            continue;
        }
        store
            .add_pirep(Pirep {
                report: record.get(PIREP_REPORT_FIELD).unwrap_or("").to_string(),
                lng: lng.to_string(),
                lat: lat.to_string(),
            })
            .await;
        count += 1;
    }
    Ok(count)
}

fn tolerant_reader(path: &Path) -> Result<csv::Reader<std::fs::File>, AvwxError> {
    Ok(csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?)
}
