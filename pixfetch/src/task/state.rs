//! Request state machine.
//!
//! Workers report fine-grained [`TaskEvent`]s; each record folds them into a
//! [`TaskPhase`] and projects that onto the five public [`RequestState`]s.

use std::fmt;
use thiserror::Error;

/// Externally visible state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    /// Queued or downloading.
    Started,
    /// Bytes are in hand, decode is pending.
    DownloadComplete,
    /// Decoding into the final image.
    DecodeStarted,
    /// The request failed; see [`FailureKind`] for why.
    Failed,
    /// The decoded image is available.
    Complete,
}

impl RequestState {
    /// Whether no further state follows for this request.
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestState::Failed | RequestState::Complete)
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestState::Started => "started",
            RequestState::DownloadComplete => "download complete",
            RequestState::DecodeStarted => "decode started",
            RequestState::Failed => "failed",
            RequestState::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Why a request ended in [`RequestState::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Non-success response or I/O error while fetching.
    TransportFailure,
    /// Malformed bytes or an empty decode result.
    DecodeFormatFailure,
    /// The decoder ran out of memory; the cache was cleared in response.
    ResourceExhaustion,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::TransportFailure => "transport failure",
            FailureKind::DecodeFormatFailure => "decode format failure",
            FailureKind::ResourceExhaustion => "resource exhaustion",
        };
        f.write_str(name)
    }
}

/// Low-level events reported against a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    /// Admitted on a cache miss and handed to the worker pool.
    Queued,
    /// Resolved straight from the cache.
    CacheHit,
    DownloadStarted,
    DownloadComplete,
    DownloadFailed,
    DecodeStarted,
    DecodeComplete,
    DecodeFailed(FailureKind),
}

/// Internal phase of a record within one active cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    Idle,
    Started,
    DownloadComplete,
    DownloadFailed,
    DecodeStarted,
    DecodeComplete,
    DecodeFailed(FailureKind),
    CacheHit,
}

/// Rejected state transition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition from {from:?} on {event:?}")]
    Invalid { from: TaskPhase, event: TaskEvent },

    /// The event belongs to an earlier use of a recycled record.
    #[error("Stale event for generation {event_generation}, record is at {current_generation}")]
    Stale {
        event_generation: u64,
        current_generation: u64,
    },
}

impl TaskPhase {
    /// Apply an event, returning the next phase.
    ///
    /// Phases only move forward. A repeated start is accepted because the
    /// dispatcher announces `Started` on admission and the worker reports
    /// its own download start later.
    pub fn apply(self, event: TaskEvent) -> Result<TaskPhase, TransitionError> {
        use TaskEvent as E;
        use TaskPhase as P;

        let next = match (self, event) {
            (P::Idle, E::Queued) | (P::Idle, E::DownloadStarted) => P::Started,
            (P::Idle, E::CacheHit) => P::CacheHit,
            (P::Started, E::DownloadStarted) => P::Started,
            (P::Started, E::DownloadComplete) => P::DownloadComplete,
            (P::Started, E::DownloadFailed) => P::DownloadFailed,
            // The record already carried a result when the worker picked it up
            (P::Started, E::DecodeComplete) => P::DecodeComplete,
            (P::DownloadComplete, E::DecodeStarted) => P::DecodeStarted,
            (P::DecodeStarted, E::DecodeComplete) => P::DecodeComplete,
            (P::DecodeStarted, E::DecodeFailed(kind)) => P::DecodeFailed(kind),
            (from, event) => return Err(TransitionError::Invalid { from, event }),
        };

        Ok(next)
    }

    /// Public projection of this phase. `Idle` has none.
    pub fn public_state(self) -> Option<RequestState> {
        match self {
            TaskPhase::Idle => None,
            TaskPhase::Started => Some(RequestState::Started),
            TaskPhase::DownloadComplete => Some(RequestState::DownloadComplete),
            TaskPhase::DecodeStarted => Some(RequestState::DecodeStarted),
            TaskPhase::DownloadFailed | TaskPhase::DecodeFailed(_) => Some(RequestState::Failed),
            TaskPhase::DecodeComplete | TaskPhase::CacheHit => Some(RequestState::Complete),
        }
    }

    /// Failure reason, if this is a failed phase.
    pub fn failure(self) -> Option<FailureKind> {
        match self {
            TaskPhase::DownloadFailed => Some(FailureKind::TransportFailure),
            TaskPhase::DecodeFailed(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.public_state().is_some_and(RequestState::is_terminal)
    }
}
