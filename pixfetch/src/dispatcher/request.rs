//! Request admission and cancellation.

use super::core::Dispatcher;
use crate::executor::FetchDecodeWorker;
use crate::notify::NotificationTarget;
use crate::task::{RequestHandle, TaskEvent};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

impl Dispatcher {
    /// Request `identity` decoded to roughly `target_width` x `target_height`.
    ///
    /// A cached image is announced as a single `Complete`. Otherwise the
    /// request is announced as `Started` and queued for a worker. Never
    /// blocks on the network or the decoder.
    ///
    /// Non-positive target dimensions disable downsampling.
    pub fn request(
        &self,
        identity: impl Into<String>,
        target_width: i32,
        target_height: i32,
        target: Arc<dyn NotificationTarget>,
    ) -> RequestHandle {
        let identity = identity.into();
        let core = &self.core;
        core.stats.record_request();

        let record = core.records.obtain();
        let cancellation = CancellationToken::new();
        let handle = record.initialize(
            identity.clone(),
            target_width,
            target_height,
            target,
            cancellation.clone(),
        );

        if let Some(image) = core.cache.get(&identity) {
            debug!(identity = %identity, record = handle.record_id(), "Cache hit");
            core.stats.record_cache_hit();
            record.set_result(handle.generation(), image);
            core.handle_state(&handle, TaskEvent::CacheHit);
            return handle;
        }

        // Announced before the job is queued so the worker's own events
        // always follow it on the channel
        core.handle_state(&handle, TaskEvent::Queued);

        let worker = FetchDecodeWorker::new(Arc::clone(core), handle.clone(), cancellation);
        if self
            .pool
            .execute(handle.clone(), Box::new(move || worker.run()))
        {
            debug!(identity = %identity, record = handle.record_id(), "Dispatched");
            core.stats.record_dispatch();
        } else {
            warn!(identity = %identity, "Worker pool stopped, dropping request");
            core.retire(&handle);
        }

        handle
    }

    /// Cancel the request behind `handle` if it is still for `identity`.
    ///
    /// A request that has not reached a worker is removed from the backlog
    /// and its record retired. A running one is signalled and stops at its
    /// next cancellation check. Neither announces a terminal state.
    ///
    /// Returns `false` if the handle is stale or was issued for a
    /// different identity.
    pub fn cancel(&self, handle: &RequestHandle, identity: &str) -> bool {
        if !handle.matches(identity) {
            return false;
        }
        let Some(token) = handle.record().cancellation_for(handle.generation()) else {
            return false;
        };

        token.cancel();
        if self.pool.remove(handle) {
            debug!(identity, record = handle.record_id(), "Removed queued request");
            self.core.retire(handle);
        } else {
            debug!(identity, record = handle.record_id(), "Signalled running request");
        }
        true
    }

    /// Signal every worker that is currently running a request.
    ///
    /// Queued requests are left alone. Returns how many workers were
    /// signalled.
    pub fn cancel_all(&self) -> usize {
        let signalled = self.core.cancel_owners();
        info!(signalled, "Cancelled running requests");
        signalled
    }
}
