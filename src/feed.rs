//! Streaming feed client.
//!
//! Thin collaborator around the persistent update connection: newline-framed
//! JSON messages arrive on a TCP socket, get decoded and forwarded on a
//! channel. The core only ever sees decoded [`WeatherMessage`] values;
//! framing, reconnection and timeouts live here, not in the ingestor.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::{errors::AvwxError, models::WeatherMessage};

pub struct FeedClientBuilder {
    addr: String,
    tx: mpsc::Sender<WeatherMessage>,
    rx: mpsc::Receiver<WeatherMessage>,
}

pub struct FeedClient {
    rx: mpsc::Receiver<WeatherMessage>,
    _handle: Option<tokio::task::JoinHandle<()>>,
}

impl FeedClientBuilder {
    pub fn new(addr: &str) -> Self {
        let (tx, rx) = mpsc::channel(100);
        Self {
            addr: addr.to_string(),
            tx,
            rx,
        }
    }

    /// Connect to the feed and start the reader task.
    pub async fn connect(self) -> Result<FeedClient, AvwxError> {
        let stream =
            TcpStream::connect(&self.addr)
                .await
                .map_err(|e| AvwxError::FeedConnectionError {
                    addr: self.addr.clone(),
                    origin: e.to_string(),
                })?;
        info!("Connected to weather feed at {}", self.addr);

        let handle = tokio::spawn(Self::read_messages(self.tx, stream));

        Ok(FeedClient {
            rx: self.rx,
            _handle: Some(handle),
        })
    }

    /// Decode incoming lines and forward them.
    ///
    /// Undecodable lines are logged and skipped; a read error or a closed
    /// socket ends the task, which closes the channel and lets the consumer
    /// wind down.
    async fn read_messages(tx: mpsc::Sender<WeatherMessage>, stream: TcpStream) {
        let mut lines = BufReader::new(stream).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<WeatherMessage>(&line) {
                        Ok(message) => {
                            if tx.send(message).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Failed to parse feed message: {}", e);
                        }
                    }
                }
                Ok(None) => {
                    info!("Weather feed closed");
                    break;
                }
                Err(e) => {
                    error!("Feed read error: {}", e);
                    break;
                }
            }
        }
    }
}

impl FeedClient {
    /// Receive the next update message; `None` once the feed has ended.
    pub async fn recv(&mut self) -> Option<WeatherMessage> {
        self.rx.recv().await
    }

    /// Client fed from an in-process channel, for tests and tooling.
    pub fn from_channel(rx: mpsc::Receiver<WeatherMessage>) -> Self {
        Self { rx, _handle: None }
    }
}
