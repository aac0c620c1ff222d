//! Integration tests for the request dispatcher.
//!
//! These tests drive the public API end to end with scripted collaborators:
//! - Cache hits and misses and the notifications each produces
//! - Transport, format and out-of-memory failures
//! - Record recycling through the notification pump
//! - Cancellation of queued and running requests
//! - Targets that go away before their request finishes

use pixfetch::config::ConfigFile;
use pixfetch::decode::{DecodeError, DecodedImage, Decoder, ImageBounds};
use pixfetch::dispatcher::{Dispatcher, DispatcherConfig};
use pixfetch::notify::{Notification, NotificationPump, NotificationTarget};
use pixfetch::provider::{Transport, TransportError};
use pixfetch::task::{FailureKind, RequestState};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Source image size reported by the scripted decoder (height x width).
const SOURCE_HEIGHT: u32 = 600;
const SOURCE_WIDTH: u32 = 800;

// =============================================================================
// Test Helpers
// =============================================================================

/// Returns the identity's own bytes; identities containing "missing" fail.
#[derive(Default)]
struct ScriptedTransport {
    calls: AtomicUsize,
}

impl Transport for ScriptedTransport {
    fn fetch(&self, identity: &str) -> Result<Vec<u8>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if identity.contains("missing") {
            return Err(TransportError::Status {
                status: 404,
                url: identity.to_string(),
            });
        }
        Ok(identity.as_bytes().to_vec())
    }
}

/// Blocks every fetch until the gate is opened.
#[derive(Default)]
struct GatedTransport {
    entered: AtomicUsize,
    open: Mutex<bool>,
    opened: Condvar,
}

impl GatedTransport {
    fn wait_entered(&self, count: usize) {
        let deadline = Instant::now() + TIMEOUT;
        while self.entered.load(Ordering::SeqCst) < count {
            assert!(Instant::now() < deadline, "fetch never started");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }
}

impl Transport for GatedTransport {
    fn fetch(&self, identity: &str) -> Result<Vec<u8>, TransportError> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.opened.wait(open).unwrap();
        }
        Ok(identity.as_bytes().to_vec())
    }
}

/// Reports a 600x800 source. Bytes containing "headerless" fail the bounds
/// pass; "corrupt" or "huge" fail the decode.
#[derive(Default)]
struct ScriptedDecoder {
    bounds_calls: AtomicUsize,
    decode_calls: AtomicUsize,
    last_factor: AtomicU32,
}

impl ScriptedDecoder {
    fn calls(&self) -> usize {
        self.bounds_calls.load(Ordering::SeqCst) + self.decode_calls.load(Ordering::SeqCst)
    }
}

impl Decoder for ScriptedDecoder {
    fn bounds_of(&self, bytes: &[u8]) -> Result<ImageBounds, DecodeError> {
        self.bounds_calls.fetch_add(1, Ordering::SeqCst);
        if String::from_utf8_lossy(bytes).contains("headerless") {
            return Err(DecodeError::Format("no image header".to_string()));
        }
        Ok(ImageBounds::new(SOURCE_HEIGHT, SOURCE_WIDTH))
    }

    fn decode(&self, bytes: &[u8], sample_size: u32) -> Result<DecodedImage, DecodeError> {
        self.decode_calls.fetch_add(1, Ordering::SeqCst);
        self.last_factor.store(sample_size, Ordering::SeqCst);

        let text = String::from_utf8_lossy(bytes);
        if text.contains("corrupt") {
            return Err(DecodeError::Format("not an image".to_string()));
        }
        if text.contains("huge") {
            return Err(DecodeError::ResourceExhausted("limit reached".to_string()));
        }

        let width = SOURCE_WIDTH / sample_size;
        let height = SOURCE_HEIGHT / sample_size;
        Ok(DecodedImage::new(
            width,
            height,
            vec![0u8; (width * height * 4) as usize],
        ))
    }
}

/// Records every notification it receives.
#[derive(Default)]
struct Recorder {
    notifications: Mutex<Vec<Notification>>,
}

impl Recorder {
    fn states(&self) -> Vec<RequestState> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.state)
            .collect()
    }

    fn terminal(&self) -> Option<Notification> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.is_terminal())
            .cloned()
    }
}

impl NotificationTarget for Recorder {
    fn deliver(&self, notification: &Notification) {
        self.notifications.lock().unwrap().push(notification.clone());
    }
}

struct Harness {
    dispatcher: Dispatcher,
    pump: NotificationPump,
    transport: Arc<ScriptedTransport>,
    decoder: Arc<ScriptedDecoder>,
}

fn harness(workers: usize) -> Harness {
    let transport = Arc::new(ScriptedTransport::default());
    let decoder = Arc::new(ScriptedDecoder::default());
    let (dispatcher, pump) = Dispatcher::new(
        DispatcherConfig::new().with_workers(workers),
        transport.clone(),
        decoder.clone(),
    )
    .unwrap();

    Harness {
        dispatcher,
        pump,
        transport,
        decoder,
    }
}

/// Drive the pump until `done` holds or the timeout expires.
fn pump_until(pump: &NotificationPump, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        pump.process_for(Duration::from_millis(10));
        if done() {
            return true;
        }
    }
    false
}

fn wait_for_terminal(pump: &NotificationPump, recorder: &Recorder) -> Notification {
    assert!(
        pump_until(pump, || recorder.terminal().is_some()),
        "request never finished, saw {:?}",
        recorder.states()
    );
    recorder.terminal().unwrap()
}

const FULL_PIPELINE: [RequestState; 4] = [
    RequestState::Started,
    RequestState::DownloadComplete,
    RequestState::DecodeStarted,
    RequestState::Complete,
];

// =============================================================================
// Cache hits and misses
// =============================================================================

#[test]
fn test_miss_runs_full_pipeline_and_populates_cache() {
    let h = harness(2);
    let recorder = Arc::new(Recorder::default());

    h.dispatcher
        .request("https://img.test/a.png", 200, 150, recorder.clone());
    let terminal = wait_for_terminal(&h.pump, &recorder);

    assert_eq!(recorder.states(), FULL_PIPELINE);
    let image = terminal.result.expect("complete carries the image");
    assert_eq!((image.width(), image.height()), (200, 150));
    assert!(terminal.failure.is_none());

    assert_eq!(h.decoder.last_factor.load(Ordering::SeqCst), 4);
    assert!(h.dispatcher.cache().contains("https://img.test/a.png"));
    assert_eq!(h.transport.calls.load(Ordering::SeqCst), 1);

    let stats = h.dispatcher.stats();
    assert_eq!(stats.requests, 1);
    assert_eq!(stats.dispatched, 1);
    assert_eq!(stats.completed, 1);
}

#[test]
fn test_hit_is_single_complete_without_collaborators() {
    let h = harness(2);
    let first = Arc::new(Recorder::default());
    h.dispatcher.request("https://img.test/a.png", 200, 150, first.clone());
    wait_for_terminal(&h.pump, &first);

    let transport_calls = h.transport.calls.load(Ordering::SeqCst);
    let decoder_calls = h.decoder.calls();

    let second = Arc::new(Recorder::default());
    h.dispatcher
        .request("https://img.test/a.png", 200, 150, second.clone());
    let terminal = wait_for_terminal(&h.pump, &second);

    assert_eq!(second.states(), vec![RequestState::Complete]);
    assert!(terminal.result.is_some());
    assert_eq!(h.transport.calls.load(Ordering::SeqCst), transport_calls);
    assert_eq!(h.decoder.calls(), decoder_calls);
    assert_eq!(h.dispatcher.stats().cache_hits, 1);
}

#[test]
fn test_non_positive_target_decodes_full_size() {
    let h = harness(1);
    let recorder = Arc::new(Recorder::default());

    h.dispatcher.request("https://img.test/full.png", 0, 0, recorder.clone());
    let terminal = wait_for_terminal(&h.pump, &recorder);

    assert_eq!(h.decoder.last_factor.load(Ordering::SeqCst), 1);
    let image = terminal.result.unwrap();
    assert_eq!((image.width(), image.height()), (SOURCE_WIDTH, SOURCE_HEIGHT));
}

#[test]
fn test_many_requests_each_see_ordered_states() {
    let h = harness(4);
    let recorders: Vec<Arc<Recorder>> = (0..20).map(|_| Arc::new(Recorder::default())).collect();

    for (i, recorder) in recorders.iter().enumerate() {
        h.dispatcher.request(
            format!("https://img.test/{i}.png"),
            200,
            150,
            recorder.clone(),
        );
    }

    assert!(pump_until(&h.pump, || recorders
        .iter()
        .all(|r| r.terminal().is_some())));
    for recorder in &recorders {
        assert_eq!(recorder.states(), FULL_PIPELINE);
    }
    assert_eq!(h.dispatcher.stats().completed, 20);
    assert_eq!(h.dispatcher.cache().entry_count(), 20);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_transport_failure() {
    let h = harness(1);
    let recorder = Arc::new(Recorder::default());

    h.dispatcher
        .request("https://img.test/missing.png", 200, 150, recorder.clone());
    let terminal = wait_for_terminal(&h.pump, &recorder);

    assert_eq!(
        recorder.states(),
        vec![RequestState::Started, RequestState::Failed]
    );
    assert_eq!(terminal.failure, Some(FailureKind::TransportFailure));
    assert!(terminal.result.is_none());
    assert_eq!(h.decoder.calls(), 0);
    assert!(!h.dispatcher.cache().contains("https://img.test/missing.png"));
    assert_eq!(h.dispatcher.stats().failed, 1);
}

#[test]
fn test_format_failure_leaves_cache_alone() {
    let h = harness(1);
    let good = Arc::new(Recorder::default());
    h.dispatcher.request("https://img.test/good.png", 200, 150, good.clone());
    wait_for_terminal(&h.pump, &good);

    let recorder = Arc::new(Recorder::default());
    h.dispatcher
        .request("https://img.test/corrupt.png", 200, 150, recorder.clone());
    let terminal = wait_for_terminal(&h.pump, &recorder);

    assert_eq!(
        recorder.states(),
        vec![
            RequestState::Started,
            RequestState::DownloadComplete,
            RequestState::DecodeStarted,
            RequestState::Failed,
        ]
    );
    assert_eq!(terminal.failure, Some(FailureKind::DecodeFormatFailure));
    assert!(h.dispatcher.cache().contains("https://img.test/good.png"));
    assert!(!h.dispatcher.cache().contains("https://img.test/corrupt.png"));
}

#[test]
fn test_bounds_failure_still_announces_decode_started() {
    let h = harness(1);

    let recorder = Arc::new(Recorder::default());
    h.dispatcher
        .request("https://img.test/headerless.png", 200, 150, recorder.clone());
    let terminal = wait_for_terminal(&h.pump, &recorder);

    assert_eq!(
        recorder.states(),
        vec![
            RequestState::Started,
            RequestState::DownloadComplete,
            RequestState::DecodeStarted,
            RequestState::Failed,
        ]
    );
    assert_eq!(terminal.failure, Some(FailureKind::DecodeFormatFailure));
    assert_eq!(h.decoder.decode_calls.load(Ordering::SeqCst), 0);
    assert!(!h.dispatcher.cache().contains("https://img.test/headerless.png"));
}

#[test]
fn test_resource_exhaustion_empties_cache() {
    let h = harness(1);
    h.dispatcher
        .cache()
        .put(
            "https://img.test/cached.png",
            Arc::new(DecodedImage::new(4, 4, vec![0u8; 64])),
        )
        .unwrap();
    assert_eq!(h.dispatcher.cache().entry_count(), 1);

    let recorder = Arc::new(Recorder::default());
    h.dispatcher
        .request("https://img.test/huge.png", 200, 150, recorder.clone());
    let terminal = wait_for_terminal(&h.pump, &recorder);

    assert_eq!(terminal.state, RequestState::Failed);
    assert_eq!(terminal.failure, Some(FailureKind::ResourceExhaustion));
    assert_eq!(h.dispatcher.cache().entry_count(), 0);
    assert_eq!(h.dispatcher.cache().size_bytes(), 0);
}

// =============================================================================
// Record recycling
// =============================================================================

#[test]
fn test_finished_record_is_recycled_and_reused() {
    let h = harness(1);
    let first = Arc::new(Recorder::default());
    let handle = h
        .dispatcher
        .request("https://img.test/a.png", 200, 150, first.clone());
    wait_for_terminal(&h.pump, &first);

    assert!(!handle.is_current());
    assert_eq!(handle.identity(), None);
    assert!(handle.result().is_none());
    assert_eq!(h.dispatcher.free_records(), 1);

    let second = Arc::new(Recorder::default());
    let next = h
        .dispatcher
        .request("https://img.test/b.png", 200, 150, second.clone());

    assert_eq!(next.record_id(), handle.record_id());
    assert_eq!(next.generation(), handle.generation() + 1);
    assert!(next.matches("https://img.test/b.png"));
    assert_ne!(next, handle);
    wait_for_terminal(&h.pump, &second);
}

#[test]
fn test_invalid_target_is_skipped_but_record_recycled() {
    let h = harness(1);
    let recorder = Arc::new(Recorder::default());
    let target: Arc<dyn NotificationTarget> = Arc::new(Arc::downgrade(&recorder));
    drop(recorder);

    h.dispatcher.request("https://img.test/a.png", 200, 150, target);

    assert!(pump_until(&h.pump, || h.dispatcher.free_records() == 1));
    assert_eq!(h.dispatcher.stats().completed, 1);
    assert!(h.dispatcher.cache().contains("https://img.test/a.png"));
}

// =============================================================================
// Cancellation
// =============================================================================

fn gated(workers: usize) -> (Dispatcher, NotificationPump, Arc<GatedTransport>, Arc<ScriptedDecoder>) {
    let transport = Arc::new(GatedTransport::default());
    let decoder = Arc::new(ScriptedDecoder::default());
    let (dispatcher, pump) = Dispatcher::new(
        DispatcherConfig::new().with_workers(workers),
        transport.clone(),
        decoder.clone(),
    )
    .unwrap();
    (dispatcher, pump, transport, decoder)
}

#[test]
fn test_cancel_all_stops_running_worker_silently() {
    let (dispatcher, pump, transport, decoder) = gated(2);
    let recorder = Arc::new(Recorder::default());

    dispatcher.request("https://img.test/slow.png", 200, 150, recorder.clone());
    transport.wait_entered(1);

    assert_eq!(dispatcher.cancel_all(), 1);
    transport.open();

    assert!(pump_until(&pump, || dispatcher.free_records() == 1));
    assert!(recorder.terminal().is_none());
    assert_eq!(
        recorder.states(),
        vec![RequestState::Started, RequestState::DownloadComplete]
    );
    assert_eq!(decoder.decode_calls.load(Ordering::SeqCst), 0);
    assert_eq!(dispatcher.stats().cancelled, 1);
    assert!(!dispatcher.cache().contains("https://img.test/slow.png"));
}

#[test]
fn test_cancel_all_ignores_queued_requests() {
    let (dispatcher, pump, transport, _decoder) = gated(1);
    let running = Arc::new(Recorder::default());
    let queued = Arc::new(Recorder::default());

    dispatcher.request("https://img.test/first.png", 200, 150, running.clone());
    transport.wait_entered(1);
    dispatcher.request("https://img.test/second.png", 200, 150, queued.clone());
    assert_eq!(dispatcher.queued_len(), 1);

    assert_eq!(dispatcher.cancel_all(), 1);
    transport.open();

    let terminal = wait_for_terminal(&pump, &queued);
    assert_eq!(terminal.state, RequestState::Complete);
    assert!(running.terminal().is_none());
}

#[test]
fn test_cancel_removes_queued_request() {
    let (dispatcher, pump, transport, _decoder) = gated(1);
    let running = Arc::new(Recorder::default());
    let queued = Arc::new(Recorder::default());

    dispatcher.request("https://img.test/first.png", 200, 150, running.clone());
    transport.wait_entered(1);
    let handle = dispatcher.request("https://img.test/second.png", 200, 150, queued.clone());
    assert_eq!(dispatcher.queued_len(), 1);

    assert!(!dispatcher.cancel(&handle, "https://img.test/other.png"));
    assert_eq!(dispatcher.queued_len(), 1);

    assert!(dispatcher.cancel(&handle, "https://img.test/second.png"));
    assert_eq!(dispatcher.queued_len(), 0);

    transport.open();
    wait_for_terminal(&pump, &running);
    assert!(pump_until(&pump, || dispatcher.free_records() == 2));

    assert_eq!(queued.states(), vec![RequestState::Started]);
    assert_eq!(transport.entered.load(Ordering::SeqCst), 1);
    assert_eq!(dispatcher.stats().cancelled, 1);
    assert!(!dispatcher.cancel(&handle, "https://img.test/second.png"));
}

#[test]
fn test_cancel_with_stale_handle_is_noop() {
    let h = harness(1);
    let recorder = Arc::new(Recorder::default());
    let handle = h
        .dispatcher
        .request("https://img.test/a.png", 200, 150, recorder.clone());
    wait_for_terminal(&h.pump, &recorder);

    assert!(!h.dispatcher.cancel(&handle, "https://img.test/a.png"));
    assert_eq!(h.dispatcher.stats().cancelled, 0);
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_from_config_uses_file_settings() {
    let mut config = ConfigFile::default();
    config.dispatcher.workers = 3;
    config.cache.memory_size = 1024 * 1024;

    let (dispatcher, _pump) = Dispatcher::from_config(&config).unwrap();

    assert_eq!(dispatcher.worker_count(), 3);
    assert_eq!(dispatcher.cache().max_size_bytes(), 1024 * 1024);
    dispatcher.shutdown();
}

#[test]
fn test_pump_stops_after_dispatcher_dropped() {
    let h = harness(1);
    let pump = h.pump;
    drop(h.dispatcher);

    let runner = std::thread::spawn(move || pump.run());
    runner.join().unwrap();
}
