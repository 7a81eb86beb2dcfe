//! Streaming ingestion.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::{
    config::SnapshotConfig,
    errors::AvwxError,
    feed::FeedClient,
    models::{MessageKind, Pirep, StationId, WeatherMessage},
    snapshot,
    store::StationStore,
};

/// Applies feed messages to the station store and checkpoints the store on a
/// fixed interval.
///
/// The checkpoint is a periodic tick independent of message arrival, so
/// bursty input cannot turn into a write per message. Returning from
/// [`run`](Self::run) does not write a final checkpoint; callers that need a
/// guaranteed flush call [`checkpoint`](Self::checkpoint) before shutdown.
pub struct StreamIngestor {
    store: Arc<StationStore>,
    snapshot_path: PathBuf,
    pireps_path: PathBuf,
    checkpoint_interval: Duration,
}

impl StreamIngestor {
    pub fn new(store: Arc<StationStore>, config: &SnapshotConfig) -> Self {
        Self {
            store,
            snapshot_path: config.path.clone(),
            pireps_path: config.pireps_path.clone(),
            checkpoint_interval: config.checkpoint_interval,
        }
    }

    /// Consume the feed until it ends.
    pub async fn run(&self, mut feed: FeedClient) -> Result<(), AvwxError> {
        let mut ticker = interval(self.checkpoint_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick completes immediately; consume it so checkpoints
        // start one full interval in
        ticker.tick().await;

        loop {
            tokio::select! {
                message = feed.recv() => {
                    match message {
                        Some(message) => {
                            if let Err(e) = self.apply_message(message).await {
                                warn!("Discarding message: {}", e);
                            }
                        }
                        None => break, // Feed closed
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.checkpoint().await {
                        error!("Checkpoint failed, will retry next tick: {}", e);
                    }
                }
            }
        }

        Ok(())
    }

    /// Route one update message into the store.
    ///
    /// Unrecognized message kinds are reported as an error and otherwise
    /// ignored. Payload line breaks become explicit `<br>` markers since the
    /// merged text ends up in formatted popups.
    pub async fn apply_message(&self, message: WeatherMessage) -> Result<(), AvwxError> {
        let kind = MessageKind::parse(&message.message_type)?;
        let id = match kind {
            // these sources always send bare identifiers
            MessageKind::Pirep | MessageKind::Winds => StationId::prefixed(&message.location),
            _ => StationId::canonical(&message.location),
        };
        let data = message.data.replace('\n', "<br>");
        debug!("{} update for {}", message.message_type, id);

        match kind {
            MessageKind::Metar | MessageKind::Speci => {
                // the stream carries no flight category
                self.store
                    .upsert_metar(&id, &data, "VFR", &message.time)
                    .await;
            }
            MessageKind::Taf | MessageKind::TafAmd => {
                self.store.upsert_taf(&id, &data, &message.time).await;
            }
            MessageKind::Pirep => {
                self.store
                    .add_pirep(Pirep {
                        report: data,
                        lng: String::new(),
                        lat: String::new(),
                    })
                    .await;
            }
            MessageKind::Winds => {
                self.store.upsert_winds(&id, &data, &message.time).await;
            }
        }
        Ok(())
    }

    /// Serialize the current store state: the station map and the
    /// pilot-report list each go to their own document.
    pub async fn checkpoint(&self) -> Result<(), AvwxError> {
        let reports = self.store.snapshot().await;
        snapshot::write_document(&self.snapshot_path, &reports)?;
        let pireps = self.store.pireps().await;
        snapshot::write_document(&self.pireps_path, &pireps)?;
        info!(
            "Checkpointed {} station reports, {} pireps",
            reports.len(),
            pireps.len()
        );
        Ok(())
    }
}
