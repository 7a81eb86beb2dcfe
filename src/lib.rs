//! Aviation weather recorder.
//!
//! Collects METAR/TAF/PIREP/upper-winds bulletins from bulk cache files and
//! from a streaming update feed, merges them into per-station reports,
//! persists the merged snapshot, and answers bounding-box queries over the
//! result.

pub mod batch;
pub mod config;
pub mod errors;
pub mod feed;
pub mod ingest;
pub mod metar;
pub mod models;
pub mod query;
pub mod snapshot;
pub mod store;
