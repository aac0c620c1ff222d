//! Notification targets.

use super::types::Notification;
use std::sync::Weak;

/// Receiver of request notifications.
///
/// A target may go away before the request it watches finishes (a view
/// that was closed, a session that ended). The pump asks
/// [`is_still_valid`](NotificationTarget::is_still_valid) before every
/// delivery and skips invalid targets; `deliver` on an invalid target must
/// itself be a no-op, never a panic.
pub trait NotificationTarget: Send + Sync {
    /// Whether the target still wants notifications.
    fn is_still_valid(&self) -> bool {
        true
    }

    /// Receive a notification. Called on the consumer thread.
    fn deliver(&self, notification: &Notification);
}

/// Weak references are valid while the referent is alive.
impl<T: NotificationTarget> NotificationTarget for Weak<T> {
    fn is_still_valid(&self) -> bool {
        self.strong_count() > 0
    }

    fn deliver(&self, notification: &Notification) {
        if let Some(target) = self.upgrade() {
            if target.is_still_valid() {
                target.deliver(notification);
            }
        }
    }
}

/// Adapts a closure into an always-valid target.
///
/// # Example
///
/// ```
/// use pixfetch::notify::FnTarget;
///
/// let target = FnTarget::new(|notification| {
///     println!("{:?} -> {}", notification.handle, notification.state);
/// });
/// ```
pub struct FnTarget<F> {
    callback: F,
}

impl<F> FnTarget<F>
where
    F: Fn(&Notification) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> NotificationTarget for FnTarget<F>
where
    F: Fn(&Notification) + Send + Sync,
{
    fn deliver(&self, notification: &Notification) {
        (self.callback)(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Notification;
    use crate::task::{RecordPool, RequestState};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    struct Recorder {
        seen: Mutex<Vec<RequestState>>,
    }

    impl NotificationTarget for Recorder {
        fn deliver(&self, notification: &Notification) {
            self.seen.lock().push(notification.state);
        }
    }

    fn notification() -> Notification {
        let record = RecordPool::new(1).obtain();
        let handle = record.initialize(
            "a".into(),
            0,
            0,
            Arc::new(FnTarget::new(|_| {})),
            CancellationToken::new(),
        );
        Notification {
            handle,
            state: RequestState::Started,
            result: None,
            failure: None,
        }
    }

    #[test]
    fn test_weak_target_valid_while_alive() {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let weak = Arc::downgrade(&recorder);

        assert!(weak.is_still_valid());
        weak.deliver(&notification());
        assert_eq!(*recorder.seen.lock(), vec![RequestState::Started]);
    }

    #[test]
    fn test_weak_target_invalid_after_drop() {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let weak = Arc::downgrade(&recorder);
        drop(recorder);

        assert!(!weak.is_still_valid());
        // Must be a silent no-op
        weak.deliver(&notification());
    }

    #[test]
    fn test_fn_target_invokes_closure() {
        let count = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&count);
        let target = FnTarget::new(move |_| *counter.lock() += 1);

        assert!(target.is_still_valid());
        target.deliver(&notification());
        target.deliver(&notification());
        assert_eq!(*count.lock(), 2);
    }
}
