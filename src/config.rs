//! Application configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_with::serde_as;
use tracing::warn;

use crate::errors::AvwxError;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub snapshot: SnapshotConfig,
    pub sources: SourceConfig,
    pub bounds: CoverageBounds,
}

/// Streaming update feed endpoint
#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub addr: String,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotConfig {
    /// Station map document
    pub path: PathBuf,
    /// Derived station-record array for the query service
    pub records_path: PathBuf,
    /// Pilot-report array for the query service
    pub pireps_path: PathBuf,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub checkpoint_interval: Duration,
}

/// Bulk bulletin sources
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub airports_file: PathBuf,
    pub data_dir: PathBuf,
    pub metars_url: String,
    pub tafs_url: String,
    pub pireps_url: String,
}

/// Coverage area for the bulk pipeline; reference rows outside it are
/// dropped at load time.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct CoverageBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("feed.addr", "127.0.0.1:8081")?
            .set_default("snapshot.path", "data/snapshot.json")?
            .set_default("snapshot.records_path", "data/weather.json")?
            .set_default("snapshot.pireps_path", "data/pireps.json")?
            .set_default("snapshot.checkpoint_interval", 10)?
            .set_default("sources.airports_file", "airports.txt")?
            .set_default("sources.data_dir", "data")?
            .set_default(
                "sources.metars_url",
                "https://aviationweather.gov/adds/dataserver_current/current/metars.cache.csv",
            )?
            .set_default(
                "sources.tafs_url",
                "https://aviationweather.gov/adds/dataserver_current/current/tafs.cache.csv",
            )?
            .set_default(
                "sources.pireps_url",
                "https://aviationweather.gov/adds/dataserver_current/current/pireps.cache.csv",
            )?
            .set_default("bounds.lat_min", 20.0001576517236)?
            .set_default("bounds.lat_max", 55.4189882586259)?
            .set_default("bounds.lng_min", -179.0008962332189)?
            .set_default("bounds.lng_max", -53.7449437099231)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("AVWX")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl SnapshotConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), AvwxError> {
        for path in [&self.path, &self.records_path, &self.pireps_path] {
            if path.to_str().unwrap_or("").is_empty() {
                return Err(AvwxError::ConfigurationError {
                    message: "Snapshot path cannot be empty".to_string(),
                });
            }
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    ensure_directory_exists(parent)?;
                }
            }
        }
        if self.checkpoint_interval.is_zero() {
            return Err(AvwxError::ConfigurationError {
                message: "Checkpoint interval must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl SourceConfig {
    pub fn validate(&self) -> Result<(), AvwxError> {
        ensure_directory_exists(&self.data_dir)
    }
}

fn ensure_directory_exists(dir: &Path) -> Result<(), AvwxError> {
    if !dir.exists() {
        warn!("Directory {} does not exist, attempting to create it", dir.display());
        std::fs::create_dir_all(dir).map_err(|e| AvwxError::ConfigurationError {
            message: format!("Could not create directory {}: {}", dir.display(), e),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_load_config() {
        env::set_var("AVWX__FEED__ADDR", "10.0.0.5:9000");
        env::set_var("AVWX__SNAPSHOT__PATH", "/tmp/avwx/snapshot.json");
        env::set_var("AVWX__SNAPSHOT__CHECKPOINT_INTERVAL", "30");

        let config = AppConfig::load().unwrap();
        assert_eq!(config.feed.addr, "10.0.0.5:9000");
        assert_eq!(config.snapshot.path, PathBuf::from("/tmp/avwx/snapshot.json"));
        assert_eq!(config.snapshot.checkpoint_interval, Duration::from_secs(30));
        // defaults still apply to untouched sections
        assert!(config.sources.metars_url.contains("metars.cache.csv"));
        assert!(config.bounds.lat_min < config.bounds.lat_max);

        env::remove_var("AVWX__FEED__ADDR");
        env::remove_var("AVWX__SNAPSHOT__PATH");
        env::remove_var("AVWX__SNAPSHOT__CHECKPOINT_INTERVAL");
    }

    #[test]
    fn test_snapshot_config_validate_zero_interval() {
        let config = SnapshotConfig {
            path: PathBuf::from("/tmp/avwx-test/snapshot.json"),
            records_path: PathBuf::from("/tmp/avwx-test/weather.json"),
            pireps_path: PathBuf::from("/tmp/avwx-test/pireps.json"),
            checkpoint_interval: Duration::from_secs(0),
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_snapshot_config_validate_empty_path() {
        let config = SnapshotConfig {
            path: PathBuf::from(""),
            records_path: PathBuf::from("/tmp/avwx-test/weather.json"),
            pireps_path: PathBuf::from("/tmp/avwx-test/pireps.json"),
            checkpoint_interval: Duration::from_secs(10),
        };

        assert!(config.validate().is_err());
    }
}
