//! Free list of retired records.

use super::record::Record;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Default number of retired records kept for reuse.
pub const DEFAULT_RECORD_POOL_CAPACITY: usize = 64;

/// Bounded free list of records.
///
/// The dispatcher takes records out on every request; the notification
/// consumer puts them back after a terminal state. Records retired while
/// the list is full are simply dropped.
pub struct RecordPool {
    free: Mutex<Vec<Arc<Record>>>,
    capacity: usize,
    next_id: AtomicU64,
}

impl RecordPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
            next_id: AtomicU64::new(0),
        }
    }

    /// Take a free record, allocating a new one if the list is empty.
    pub fn obtain(&self) -> Arc<Record> {
        if let Some(record) = self.free.lock().pop() {
            trace!(record = record.id(), "Reusing pooled record");
            return record;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        trace!(record = id, "Allocating record");
        Arc::new(Record::new(id))
    }

    /// Clear `record` and return it to the free list.
    ///
    /// Returns `false` if the record was already free; it is never listed
    /// twice.
    pub fn recycle(&self, record: Arc<Record>) -> bool {
        if !record.recycle() {
            return false;
        }

        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(record);
        }
        true
    }

    /// Number of records waiting for reuse.
    pub fn free_count(&self) -> usize {
        self.free.lock().len()
    }

    /// Total records ever allocated.
    pub fn allocated(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RecordPool {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_POOL_CAPACITY)
    }
}
