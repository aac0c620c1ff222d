//! Notification payload and channel messages.

use crate::decode::DecodedImage;
use crate::task::{FailureKind, RequestHandle, RequestState};
use std::sync::Arc;

/// Payload delivered to a [`NotificationTarget`](super::NotificationTarget).
#[derive(Debug, Clone)]
pub struct Notification {
    /// The request this is about.
    pub handle: RequestHandle,
    pub state: RequestState,
    /// Present only when `state` is [`RequestState::Complete`].
    pub result: Option<Arc<DecodedImage>>,
    /// Present only when `state` is [`RequestState::Failed`].
    pub failure: Option<FailureKind>,
}

impl Notification {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Messages sent from the dispatcher and workers to the consumer.
#[derive(Debug)]
pub(crate) enum Message {
    /// Announce a state change to the request's target.
    Deliver(Notification),
    /// Return a record to the pool without telling anyone (cancellation).
    Retire(RequestHandle),
}
