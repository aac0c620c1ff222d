//! Single consumer of the notification channel.

use super::types::{Message, Notification};
use crate::task::RecordPool;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Consumer end of the dispatcher's notification channel.
///
/// Workers never talk to targets directly; every state change is queued
/// here and delivered on whichever thread drives the pump. Order is FIFO
/// for the channel as a whole, so each request sees its own states in
/// order, while different requests may interleave arbitrarily.
///
/// After delivering a terminal state the pump clears the record and
/// returns it to the [`RecordPool`].
///
/// # Example
///
/// ```ignore
/// let (dispatcher, pump) = Dispatcher::new(config, transport, decoder)?;
/// std::thread::spawn(move || pump.run());
/// ```
pub struct NotificationPump {
    receiver: Receiver<Message>,
    records: Arc<RecordPool>,
}

impl NotificationPump {
    pub(crate) fn new(receiver: Receiver<Message>, records: Arc<RecordPool>) -> Self {
        Self { receiver, records }
    }

    /// Deliver notifications until the dispatcher and all its workers are
    /// gone.
    pub fn run(&self) {
        while let Ok(message) = self.receiver.recv() {
            self.handle(message);
        }
        debug!("Notification pump stopped: dispatcher dropped");
    }

    /// Deliver everything already queued without blocking.
    ///
    /// Returns the number of messages handled.
    pub fn process_pending(&self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.receiver.try_recv() {
            self.handle(message);
            handled += 1;
        }
        handled
    }

    /// Wait up to `timeout` for a message, then drain the queue.
    ///
    /// Returns the number of messages handled; zero on timeout or once the
    /// dispatcher is gone.
    pub fn process_for(&self, timeout: Duration) -> usize {
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => {
                self.handle(message);
                1 + self.process_pending()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    fn handle(&self, message: Message) {
        match message {
            Message::Deliver(notification) => self.deliver(notification),
            Message::Retire(handle) => {
                if handle.is_current() {
                    trace!(record = handle.record_id(), "Retiring cancelled record");
                    self.records.recycle(Arc::clone(handle.record()));
                }
            }
        }
    }

    fn deliver(&self, notification: Notification) {
        let handle = &notification.handle;
        let Some(target) = handle.record().target_for(handle.generation()) else {
            trace!(record = handle.record_id(), "Dropping notification for stale handle");
            return;
        };

        if target.is_still_valid() {
            target.deliver(&notification);
        } else {
            trace!(
                record = handle.record_id(),
                state = %notification.state,
                "Notification target no longer valid"
            );
        }

        if notification.is_terminal() {
            self.records.recycle(Arc::clone(handle.record()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{FnTarget, NotificationTarget};
    use crate::task::{RequestHandle, RequestState};
    use parking_lot::Mutex;
    use std::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    struct InvalidTarget {
        delivered: Mutex<usize>,
    }

    impl NotificationTarget for InvalidTarget {
        fn is_still_valid(&self) -> bool {
            false
        }

        fn deliver(&self, _notification: &Notification) {
            *self.delivered.lock() += 1;
        }
    }

    fn start(
        records: &RecordPool,
        target: Arc<dyn NotificationTarget>,
    ) -> RequestHandle {
        records
            .obtain()
            .initialize("a".into(), 0, 0, target, CancellationToken::new())
    }

    fn deliver(handle: &RequestHandle, state: RequestState) -> Message {
        Message::Deliver(Notification {
            handle: handle.clone(),
            state,
            result: None,
            failure: None,
        })
    }

    #[test]
    fn test_delivers_in_order_and_recycles_on_terminal() {
        let records = Arc::new(RecordPool::new(4));
        let (tx, rx) = mpsc::channel();
        let pump = NotificationPump::new(rx, Arc::clone(&records));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = start(
            &records,
            Arc::new(FnTarget::new(move |n| sink.lock().push(n.state))),
        );

        tx.send(deliver(&handle, RequestState::Started)).unwrap();
        tx.send(deliver(&handle, RequestState::Failed)).unwrap();

        assert_eq!(pump.process_pending(), 2);
        assert_eq!(
            *seen.lock(),
            vec![RequestState::Started, RequestState::Failed]
        );
        assert_eq!(records.free_count(), 1);
        assert!(!handle.is_current());
    }

    #[test]
    fn test_invalid_target_is_skipped_but_recycled() {
        let records = Arc::new(RecordPool::new(4));
        let (tx, rx) = mpsc::channel();
        let pump = NotificationPump::new(rx, Arc::clone(&records));

        let target = Arc::new(InvalidTarget {
            delivered: Mutex::new(0),
        });
        let handle = start(&records, target.clone());

        tx.send(deliver(&handle, RequestState::Complete)).unwrap();
        pump.process_pending();

        assert_eq!(*target.delivered.lock(), 0);
        assert_eq!(records.free_count(), 1);
    }

    #[test]
    fn test_retire_recycles_silently() {
        let records = Arc::new(RecordPool::new(4));
        let (tx, rx) = mpsc::channel();
        let pump = NotificationPump::new(rx, Arc::clone(&records));

        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let handle = start(&records, Arc::new(FnTarget::new(move |_| *sink.lock() += 1)));

        tx.send(Message::Retire(handle.clone())).unwrap();
        // A second retire for the same generation is ignored
        tx.send(Message::Retire(handle)).unwrap();
        pump.process_pending();

        assert_eq!(*seen.lock(), 0);
        assert_eq!(records.free_count(), 1);
    }

    #[test]
    fn test_run_returns_when_senders_drop() {
        let records = Arc::new(RecordPool::new(4));
        let (tx, rx) = mpsc::channel::<Message>();
        let pump = NotificationPump::new(rx, records);

        drop(tx);
        pump.run();
        assert_eq!(pump.process_for(Duration::from_millis(1)), 0);
    }
}
