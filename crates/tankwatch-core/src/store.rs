//! In-memory sensor record store.
//!
//! The store holds the whole parsed sensor log, sorted by timestamp. It is
//! replaced wholesale on every ingestion: the backing slice is swapped in a
//! single step so readers see either the old or the new log, never a mix.

use std::sync::{Arc, PoisonError, RwLock};

use tankwatch_types::SensorRecord;

/// Shared, immutable snapshot of the sensor log.
pub type Snapshot = Arc<[SensorRecord]>;

/// Time-sorted sensor records.
#[derive(Debug)]
pub struct Store {
    records: RwLock<Snapshot>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Create a store from records, sorting them by timestamp.
    pub fn from_records(records: Vec<SensorRecord>) -> Self {
        let store = Self::new();
        store.replace(records);
        store
    }

    /// Replace the store contents.
    ///
    /// Records are stable-sorted by timestamp before the swap, so rows with
    /// equal timestamps keep their log order.
    pub fn replace(&self, mut records: Vec<SensorRecord>) {
        records.sort_by_key(|r| r.timestamp);
        let snapshot: Snapshot = Arc::from(records);
        *self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    /// Current contents. Cheap: clones the `Arc`, not the records.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.records.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
