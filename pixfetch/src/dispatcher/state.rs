//! State changes, the owner table and record retirement.
//!
//! Every state change for a request goes through
//! [`DispatcherCore::handle_state`]. It validates the transition against the
//! record, stores successful results in the cache and queues the public
//! notification for the pump.

use super::core::{Dispatcher, DispatcherCore, OwnerKey};
use crate::cache::CacheError;
use crate::decode::DecodedImage;
use crate::notify::{Message, Notification};
use crate::task::{RequestHandle, RequestState, TaskEvent, TransitionError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Removes a worker from the owner table when dropped.
pub(crate) struct OwnerGuard<'a> {
    core: &'a DispatcherCore,
    key: OwnerKey,
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        self.core.owners.lock().remove(&self.key);
    }
}

impl DispatcherCore {
    /// Apply `event` to the request and announce the resulting public state.
    pub(crate) fn handle_state(&self, handle: &RequestHandle, event: TaskEvent) {
        let advance = match handle.record().advance(handle.generation(), event) {
            Ok(advance) => advance,
            Err(TransitionError::Stale { .. }) => {
                trace!(
                    record = handle.record_id(),
                    ?event,
                    "Ignoring event for recycled record"
                );
                return;
            }
            Err(e) => {
                warn!(record = handle.record_id(), error = %e, "Rejected state change");
                return;
            }
        };

        debug!(
            record = handle.record_id(),
            identity = advance.identity.as_deref().unwrap_or(""),
            ?event,
            phase = ?advance.phase,
            "State change"
        );

        if event == TaskEvent::DecodeComplete {
            self.store_result(advance.identity.as_deref(), advance.result.as_ref());
        }

        let Some(state) = advance.published else {
            return;
        };

        match state {
            RequestState::Complete => self.stats.record_completion(),
            RequestState::Failed => self.stats.record_failure(),
            _ => {}
        }

        let notification = Notification {
            handle: handle.clone(),
            state,
            result: if state == RequestState::Complete {
                advance.result
            } else {
                None
            },
            failure: advance.phase.failure(),
        };

        if self.sender.send(Message::Deliver(notification)).is_err() {
            debug!(record = handle.record_id(), "Notification pump is gone");
        }
    }

    /// Hand a cancelled request back to the pool without announcing it.
    pub(crate) fn retire(&self, handle: &RequestHandle) {
        self.stats.record_cancellation();
        if self.sender.send(Message::Retire(handle.clone())).is_err() {
            debug!(record = handle.record_id(), "Notification pump is gone");
        }
    }

    /// Register a running worker's token for the request behind `handle`.
    pub(crate) fn register_owner(
        &self,
        handle: &RequestHandle,
        token: CancellationToken,
    ) -> OwnerGuard<'_> {
        let key = (handle.record_id(), handle.generation());
        self.owners.lock().insert(key, token);
        OwnerGuard { core: self, key }
    }

    /// Cancel every running worker. Returns how many were signalled.
    pub(crate) fn cancel_owners(&self) -> usize {
        let owners = self.owners.lock();
        for token in owners.values() {
            token.cancel();
        }
        owners.len()
    }

    pub(crate) fn owner_count(&self) -> usize {
        self.owners.lock().len()
    }

    fn store_result(&self, identity: Option<&str>, result: Option<&Arc<DecodedImage>>) {
        let (Some(identity), Some(result)) = (identity, result) else {
            warn!("Decode completed without an identity or result");
            return;
        };

        match self.cache.put(identity, Arc::clone(result)) {
            Ok(()) => trace!(identity = %identity, "Cached decoded image"),
            Err(CacheError::EntryTooLarge { size, limit }) => {
                warn!(identity = %identity, size, limit, "Decoded image too large to cache");
            }
        }
    }
}

impl Dispatcher {
    /// Apply a state event to the request behind `handle`.
    ///
    /// Workers report through this path; it is public so embedders that run
    /// their own work can drive the same state machine.
    pub fn handle_state(&self, handle: &RequestHandle, event: TaskEvent) {
        self.core.handle_state(handle, event);
    }

    /// Number of workers currently running a request.
    pub fn running(&self) -> usize {
        self.core.owner_count()
    }
}
