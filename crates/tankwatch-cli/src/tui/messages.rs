//! Message types for communication between the UI loop and the load worker.
//!
//! - [`Command`]: Messages sent from the UI to the background worker
//! - [`LoadEvent`]: Events sent from the worker back to the UI

/// Requests from the UI to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch the sensor log again and swap it into the store.
    Reload,
    /// Stop the worker.
    Shutdown,
}

/// Progress reports from the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    /// A load has started.
    Loading { source: String },
    /// The store now holds `records` records.
    Loaded { records: usize, dropped: usize },
    /// The load failed; the store keeps its previous contents.
    Failed { error: String },
}
