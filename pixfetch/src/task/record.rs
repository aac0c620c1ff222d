//! Per-request record.

use super::handle::RequestHandle;
use super::state::{RequestState, TaskEvent, TaskPhase, TransitionError};
use crate::decode::DecodedImage;
use crate::notify::NotificationTarget;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Mutable state of one request.
///
/// Records are pooled: after a terminal state the notification consumer
/// clears the record and hands it back to the [`RecordPool`]. Every
/// recycle bumps the generation, so handles and events from an earlier
/// use can be told apart from the current one.
///
/// [`RecordPool`]: super::RecordPool
pub struct Record {
    id: u64,
    inner: Mutex<RecordInner>,
}

struct RecordInner {
    generation: u64,
    /// Sitting in the free list
    free: bool,
    identity: Option<String>,
    target_width: i32,
    target_height: i32,
    result: Option<Arc<DecodedImage>>,
    target: Option<Arc<dyn NotificationTarget>>,
    cancellation: Option<CancellationToken>,
    phase: TaskPhase,
    published: Option<RequestState>,
}

/// Outcome of applying an event to a record.
#[derive(Debug)]
pub(crate) struct Advance {
    /// Public state to announce, if it changed
    pub published: Option<RequestState>,
    pub phase: TaskPhase,
    pub identity: Option<String>,
    pub result: Option<Arc<DecodedImage>>,
}

impl Record {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            inner: Mutex::new(RecordInner {
                generation: 0,
                free: false,
                identity: None,
                target_width: 0,
                target_height: 0,
                result: None,
                target: None,
                cancellation: None,
                phase: TaskPhase::Idle,
                published: None,
            }),
        }
    }

    /// Stable identifier of this record across recycles.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current generation; increases by one on every recycle.
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Whether the record is parked in the free list.
    pub fn is_free(&self) -> bool {
        self.inner.lock().free
    }

    /// Identity of the current use, if any.
    pub fn identity(&self) -> Option<String> {
        self.inner.lock().identity.clone()
    }

    /// Decoded result of the current use, if any.
    pub fn result(&self) -> Option<Arc<DecodedImage>> {
        self.inner.lock().result.clone()
    }

    pub fn has_target(&self) -> bool {
        self.inner.lock().target.is_some()
    }

    /// Prepare the record for a new request and return a handle to it.
    pub(crate) fn initialize(
        self: &Arc<Self>,
        identity: String,
        target_width: i32,
        target_height: i32,
        target: Arc<dyn NotificationTarget>,
        cancellation: CancellationToken,
    ) -> RequestHandle {
        let mut inner = self.inner.lock();
        inner.free = false;
        inner.identity = Some(identity);
        inner.target_width = target_width;
        inner.target_height = target_height;
        inner.result = None;
        inner.target = Some(target);
        inner.cancellation = Some(cancellation);
        inner.phase = TaskPhase::Idle;
        inner.published = None;

        RequestHandle::new(Arc::clone(self), inner.generation)
    }

    /// Apply `event` if `generation` is still current.
    ///
    /// The returned [`Advance::published`] is `None` when the public
    /// projection did not change, so each public state is announced once.
    pub(crate) fn advance(
        &self,
        generation: u64,
        event: TaskEvent,
    ) -> Result<Advance, TransitionError> {
        let mut inner = self.inner.lock();
        inner.check_generation(generation)?;

        let phase = inner.phase.apply(event)?;
        inner.phase = phase;

        let state = phase.public_state();
        let published = if state != inner.published {
            inner.published = state;
            state
        } else {
            None
        };

        Ok(Advance {
            published,
            phase,
            identity: inner.identity.clone(),
            result: inner.result.clone(),
        })
    }

    /// Store the decoded result. Written at most once per use.
    pub(crate) fn set_result(&self, generation: u64, result: Arc<DecodedImage>) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation || inner.result.is_some() {
            return false;
        }
        inner.result = Some(result);
        true
    }

    pub(crate) fn identity_for(&self, generation: u64) -> Option<String> {
        let inner = self.inner.lock();
        (inner.generation == generation)
            .then(|| inner.identity.clone())
            .flatten()
    }

    pub(crate) fn result_for(&self, generation: u64) -> Option<Arc<DecodedImage>> {
        let inner = self.inner.lock();
        (inner.generation == generation)
            .then(|| inner.result.clone())
            .flatten()
    }

    pub(crate) fn target_for(&self, generation: u64) -> Option<Arc<dyn NotificationTarget>> {
        let inner = self.inner.lock();
        (inner.generation == generation)
            .then(|| inner.target.clone())
            .flatten()
    }

    pub(crate) fn cancellation_for(&self, generation: u64) -> Option<CancellationToken> {
        let inner = self.inner.lock();
        (inner.generation == generation)
            .then(|| inner.cancellation.clone())
            .flatten()
    }

    pub(crate) fn published_for(&self, generation: u64) -> Option<RequestState> {
        let inner = self.inner.lock();
        (inner.generation == generation)
            .then_some(inner.published)
            .flatten()
    }

    /// Target width and height of the current use.
    pub(crate) fn target_dimensions(&self) -> (i32, i32) {
        let inner = self.inner.lock();
        (inner.target_width, inner.target_height)
    }

    /// Clear every per-request reference and move to the next generation.
    ///
    /// Returns `false` if the record was already free.
    pub(crate) fn recycle(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.free {
            return false;
        }

        inner.free = true;
        inner.generation += 1;
        inner.identity = None;
        inner.target_width = 0;
        inner.target_height = 0;
        inner.result = None;
        inner.target = None;
        inner.cancellation = None;
        inner.phase = TaskPhase::Idle;
        inner.published = None;
        true
    }
}

impl RecordInner {
    fn check_generation(&self, generation: u64) -> Result<(), TransitionError> {
        if self.generation == generation {
            Ok(())
        } else {
            Err(TransitionError::Stale {
                event_generation: generation,
                current_generation: self.generation,
            })
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("generation", &inner.generation)
            .field("identity", &inner.identity)
            .field("phase", &inner.phase)
            .field("free", &inner.free)
            .finish()
    }
}
