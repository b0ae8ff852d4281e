//! Background worker that loads the sensor log.
//!
//! Ingestion is the only operation that waits on I/O, so it runs in its own
//! Tokio task and never blocks rendering. The worker is the only writer of
//! the shared [`Store`]; after each load it tells the UI, which refreshes the
//! dashboard from the new snapshot.

use std::sync::Arc;

use time::UtcOffset;
use tokio::sync::mpsc;
use tracing::{info, warn};

use tankwatch_core::{Source, Store, ingest};

use super::messages::{Command, LoadEvent};

/// Background worker that owns sensor log loading.
pub struct LoadWorker {
    /// Receiver for commands from the UI.
    command_rx: mpsc::Receiver<Command>,
    /// Sender for events back to the UI.
    event_tx: mpsc::Sender<LoadEvent>,
    store: Arc<Store>,
    source: Source,
    local_offset: UtcOffset,
}

impl LoadWorker {
    pub fn new(
        command_rx: mpsc::Receiver<Command>,
        event_tx: mpsc::Sender<LoadEvent>,
        store: Arc<Store>,
        source: Source,
        local_offset: UtcOffset,
    ) -> Self {
        Self {
            command_rx,
            event_tx,
            store,
            source,
            local_offset,
        }
    }

    /// Run until [`Command::Shutdown`] is received or the channel closes.
    pub async fn run(mut self) {
        info!("LoadWorker started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                Command::Reload => self.handle_reload().await,
                Command::Shutdown => {
                    info!("LoadWorker received shutdown command");
                    break;
                }
            }
        }

        info!("LoadWorker stopped");
    }

    async fn handle_reload(&self) {
        self.send(LoadEvent::Loading {
            source: self.source.to_string(),
        })
        .await;

        let transport = match self.source.transport() {
            Ok(transport) => transport,
            Err(e) => {
                warn!("Cannot load {}: {}", self.source, e);
                self.send(LoadEvent::Failed {
                    error: e.to_string(),
                })
                .await;
                return;
            }
        };

        let event = match transport.fetch().await {
            Ok(text) => match ingest::parse_csv(&text, self.local_offset) {
                Ok(parsed) => {
                    let records = parsed.records.len();
                    self.store.replace(parsed.records);
                    info!(
                        "Loaded {} sensor records from {} ({} rows dropped)",
                        records, self.source, parsed.dropped
                    );
                    LoadEvent::Loaded {
                        records,
                        dropped: parsed.dropped,
                    }
                }
                Err(e) => {
                    warn!("Failed to parse sensor log from {}: {}", self.source, e);
                    LoadEvent::Failed {
                        error: e.to_string(),
                    }
                }
            },
            Err(e) => {
                warn!("Failed to load sensor data from {}: {}", self.source, e);
                LoadEvent::Failed {
                    error: e.to_string(),
                }
            }
        };
        self.send(event).await;
    }

    async fn send(&self, event: LoadEvent) {
        if self.event_tx.send(event).await.is_err() {
            warn!("UI event channel closed");
        }
    }
}
