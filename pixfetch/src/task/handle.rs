//! Caller-side handle to a request.

use super::record::Record;
use super::state::RequestState;
use crate::decode::DecodedImage;
use std::fmt;
use std::sync::Arc;

/// Handle returned by [`Dispatcher::request`](crate::dispatcher::Dispatcher::request).
///
/// A handle pins one generation of a pooled record. Once the record is
/// recycled the handle goes stale: accessors return `None` and
/// cancellation through it is a no-op.
#[derive(Clone)]
pub struct RequestHandle {
    record: Arc<Record>,
    generation: u64,
}

impl RequestHandle {
    pub(crate) fn new(record: Arc<Record>, generation: u64) -> Self {
        Self { record, generation }
    }

    pub(crate) fn record(&self) -> &Arc<Record> {
        &self.record
    }

    /// Identifier of the underlying pooled record.
    pub fn record_id(&self) -> u64 {
        self.record.id()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the record still belongs to this request.
    pub fn is_current(&self) -> bool {
        self.record.generation() == self.generation
    }

    /// Identity requested through this handle, while it is current.
    pub fn identity(&self) -> Option<String> {
        self.record.identity_for(self.generation)
    }

    /// True if the handle is current and was issued for `identity`.
    pub fn matches(&self, identity: &str) -> bool {
        self.identity().as_deref() == Some(identity)
    }

    /// Last public state announced for this request, while current.
    pub fn state(&self) -> Option<RequestState> {
        self.record.published_for(self.generation)
    }

    /// Decoded result, while current.
    pub fn result(&self) -> Option<Arc<DecodedImage>> {
        self.record.result_for(self.generation)
    }
}

impl PartialEq for RequestHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.record, &other.record) && self.generation == other.generation
    }
}

impl Eq for RequestHandle {}

impl fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("record_id", &self.record.id())
            .field("generation", &self.generation)
            .finish()
    }
}
