//! The fetch-decode job run for every dispatched request.

use crate::decode::{subsample_factor, DecodeError, DecodedImage};
use crate::dispatcher::DispatcherCore;
use crate::task::{FailureKind, RequestHandle, TaskEvent};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Niceness applied to worker threads while they run a request.
#[cfg(target_os = "linux")]
const BACKGROUND_NICENESS: i32 = 10;

/// Fetches, decodes and reports on one request.
///
/// Runs on a pool thread. Cancellation is cooperative: the token is polled
/// before the fetch and again before the decode, and a cancelled worker
/// retires its record without announcing a terminal state.
pub(crate) struct FetchDecodeWorker {
    core: Arc<DispatcherCore>,
    handle: RequestHandle,
    cancellation: CancellationToken,
}

impl FetchDecodeWorker {
    pub(crate) fn new(
        core: Arc<DispatcherCore>,
        handle: RequestHandle,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            core,
            handle,
            cancellation,
        }
    }

    pub(crate) fn run(self) {
        // Unregisters on every exit path
        let _owner = self.core.register_owner(&self.handle, self.cancellation.clone());
        lower_thread_priority();

        if self.cancellation.is_cancelled() {
            debug!(record = self.handle.record_id(), "Cancelled before fetch");
            self.core.retire(&self.handle);
            return;
        }

        if self.handle.result().is_some() {
            self.core.handle_state(&self.handle, TaskEvent::DecodeComplete);
            return;
        }

        let Some(identity) = self.handle.identity() else {
            debug!(record = self.handle.record_id(), "Record recycled before fetch");
            return;
        };

        self.core.handle_state(&self.handle, TaskEvent::DownloadStarted);
        let bytes = match self.core.transport().fetch(&identity) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(identity = %identity, error = %e, "Fetch failed");
                self.core.handle_state(&self.handle, TaskEvent::DownloadFailed);
                return;
            }
        };
        debug!(identity = %identity, bytes = bytes.len(), "Fetch complete");
        self.core.handle_state(&self.handle, TaskEvent::DownloadComplete);

        if self.cancellation.is_cancelled() {
            debug!(identity = %identity, "Cancelled before decode");
            self.core.retire(&self.handle);
            return;
        }

        match self.decode(&bytes) {
            Ok(image) => {
                self.handle
                    .record()
                    .set_result(self.handle.generation(), Arc::new(image));
                self.core.handle_state(&self.handle, TaskEvent::DecodeComplete);
            }
            Err(DecodeError::ResourceExhausted(reason)) => {
                warn!(identity = %identity, %reason, "Decode ran out of memory, clearing cache");
                self.core.cache().evict_all();
                self.core.handle_state(
                    &self.handle,
                    TaskEvent::DecodeFailed(FailureKind::ResourceExhaustion),
                );
            }
            Err(e) => {
                warn!(identity = %identity, error = %e, "Decode failed");
                self.core.handle_state(
                    &self.handle,
                    TaskEvent::DecodeFailed(FailureKind::DecodeFormatFailure),
                );
            }
        }
    }

    /// Read the bounds, pick a subsample factor, then decode at it.
    ///
    /// `DecodeStarted` covers both passes, so a failure reading the bounds
    /// still follows it.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
        self.core.handle_state(&self.handle, TaskEvent::DecodeStarted);

        let decoder = self.core.decoder();
        let bounds = decoder.bounds_of(bytes)?;

        let (target_width, target_height) = self.handle.record().target_dimensions();
        let factor = subsample_factor(bounds, target_width, target_height);
        debug!(
            source_width = bounds.width,
            source_height = bounds.height,
            target_width,
            target_height,
            factor,
            "Decoding"
        );

        let image = decoder.decode(bytes, factor)?;
        if image.is_empty() {
            return Err(DecodeError::Empty);
        }
        Ok(image)
    }
}

/// Move the calling thread to background priority.
#[cfg(target_os = "linux")]
fn lower_thread_priority() {
    // On Linux, PRIO_PROCESS with id 0 targets the calling thread only
    let current = unsafe { libc::getpriority(libc::PRIO_PROCESS, 0) };
    if current >= BACKGROUND_NICENESS {
        return;
    }
    let result = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, BACKGROUND_NICENESS) };
    if result != 0 {
        debug!("Could not lower worker thread priority");
    }
}

#[cfg(not(target_os = "linux"))]
fn lower_thread_priority() {}
