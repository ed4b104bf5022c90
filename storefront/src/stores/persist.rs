//! Debounced write-behind persistence
//!
//! Cart mutations enqueue a snapshot; a background worker waits out a
//! quiet window, keeps only the newest snapshot and writes it once.
//! Best-effort: write failures are logged and dropped, and no flush is
//! guaranteed on shutdown.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::adapters::PersistentStore;

/// Handle to a debounced KV writer for one storage key.
pub(crate) struct DebouncedWriter<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> DebouncedWriter<T>
where
    T: Serialize + Send + 'static,
{
    /// Spawn the worker task. Snapshots sent through the handle are
    /// coalesced: a burst of mutations results in a single write of the
    /// last snapshot once `delay` elapses without new input.
    pub(crate) fn spawn(store: Arc<dyn PersistentStore>, key: &'static str, delay: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();

        tokio::spawn(async move {
            while let Some(mut snapshot) = rx.recv().await {
                // Coalesce everything that arrives inside the quiet window
                loop {
                    match tokio::time::timeout(delay, rx.recv()).await {
                        Ok(Some(newer)) => snapshot = newer,
                        // Channel closed: fall through and flush what we have
                        Ok(None) => break,
                        // Window elapsed with no newer snapshot
                        Err(_) => break,
                    }
                }

                match serde_json::to_value(&snapshot) {
                    Ok(value) => {
                        if let Err(e) = store.set_value(key, value).await {
                            tracing::warn!(key, error = %e, "Write-behind persistence failed");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(key, error = %e, "Snapshot serialization failed");
                    }
                }
            }
        });

        Self { tx }
    }

    /// Queue a snapshot for eventual persistence.
    pub(crate) fn enqueue(&self, snapshot: T) {
        // Worker gone means the runtime is shutting down; best-effort only
        let _ = self.tx.send(snapshot);
    }
}
