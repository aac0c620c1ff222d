//! Dispatcher construction and shared state.

use super::config::DispatcherConfig;
use super::stats::{DispatcherStats, DispatcherStatsSnapshot};
use crate::cache::MemoryCache;
use crate::config::ConfigFile;
use crate::decode::{DecodedImage, Decoder, ImageDecoder};
use crate::executor::WorkerPool;
use crate::notify::{Message, NotificationPump};
use crate::provider::{HttpTransport, Transport, TransportError};
use crate::task::{RecordPool, RequestHandle};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Name prefix of worker threads.
const WORKER_THREAD_NAME: &str = "pixfetch-worker";

/// Errors creating a [`Dispatcher`].
#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error("Failed to spawn worker threads: {0}")]
    Spawn(#[from] io::Error),

    #[error("Failed to build HTTP transport: {0}")]
    Transport(#[from] TransportError),
}

/// Record id and generation of a running request.
pub(super) type OwnerKey = (u64, u64);

/// State shared between the dispatcher and its workers.
pub(crate) struct DispatcherCore {
    pub(super) cache: Arc<MemoryCache<Arc<DecodedImage>>>,
    pub(super) records: Arc<RecordPool>,
    /// Cancellation tokens of workers that are running right now, keyed by
    /// record id and generation so a reused record never shares an entry
    pub(super) owners: Mutex<HashMap<OwnerKey, CancellationToken>>,
    pub(super) sender: Sender<Message>,
    transport: Arc<dyn Transport>,
    decoder: Arc<dyn Decoder>,
    pub(super) stats: DispatcherStats,
}

impl DispatcherCore {
    pub(crate) fn cache(&self) -> &MemoryCache<Arc<DecodedImage>> {
        &self.cache
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn decoder(&self) -> &dyn Decoder {
        self.decoder.as_ref()
    }
}

/// Entry point for image requests.
///
/// Resolves requests from the memory cache when it can and otherwise
/// hands them to a fixed pool of fetch-decode workers. Progress is
/// reported through the [`NotificationPump`] returned alongside it.
///
/// # Example
///
/// ```ignore
/// use pixfetch::dispatcher::{Dispatcher, DispatcherConfig};
/// use pixfetch::notify::FnTarget;
///
/// let (dispatcher, pump) = Dispatcher::new(
///     DispatcherConfig::default(),
///     Arc::new(HttpTransport::new()?),
///     Arc::new(ImageDecoder::new()),
/// )?;
/// std::thread::spawn(move || pump.run());
///
/// let target = Arc::new(FnTarget::new(|n| println!("{}", n.state)));
/// dispatcher.request("https://example.com/a.png", 200, 150, target);
/// ```
pub struct Dispatcher {
    pub(super) core: Arc<DispatcherCore>,
    pub(super) pool: WorkerPool<RequestHandle>,
}

impl Dispatcher {
    /// Create a dispatcher and the pump that delivers its notifications.
    pub fn new(
        config: DispatcherConfig,
        transport: Arc<dyn Transport>,
        decoder: Arc<dyn Decoder>,
    ) -> Result<(Self, NotificationPump), DispatcherError> {
        let (sender, receiver) = mpsc::channel();
        let records = Arc::new(RecordPool::new(config.record_pool_capacity()));

        let core = Arc::new(DispatcherCore {
            cache: Arc::new(MemoryCache::new(config.cache_size_bytes())),
            records: Arc::clone(&records),
            owners: Mutex::new(HashMap::new()),
            sender,
            transport,
            decoder,
            stats: DispatcherStats::new(),
        });

        let pool = WorkerPool::new(config.workers(), WORKER_THREAD_NAME)?;

        info!(
            workers = config.workers(),
            cache_bytes = config.cache_size_bytes(),
            record_pool = records.capacity(),
            "Dispatcher started"
        );

        Ok((Self { core, pool }, NotificationPump::new(receiver, records)))
    }

    /// Create a dispatcher with the HTTP transport and image decoder
    /// configured from `config`.
    pub fn from_config(config: &ConfigFile) -> Result<(Self, NotificationPump), DispatcherError> {
        let transport = HttpTransport::with_options(
            config.download.timeout,
            &config.download.user_agent,
        )?;
        let decoder = ImageDecoder::with_max_alloc(config.decode.max_alloc);

        Self::new(
            DispatcherConfig::from(config),
            Arc::new(transport),
            Arc::new(decoder),
        )
    }

    /// The shared memory cache.
    pub fn cache(&self) -> &Arc<MemoryCache<Arc<DecodedImage>>> {
        &self.core.cache
    }

    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.core.stats.snapshot()
    }

    /// Requests waiting for a free worker.
    pub fn queued_len(&self) -> usize {
        self.pool.queued()
    }

    /// Records parked for reuse.
    pub fn free_records(&self) -> usize {
        self.core.records.free_count()
    }

    pub fn worker_count(&self) -> usize {
        self.pool.size()
    }

    /// Stop the workers.
    ///
    /// Requests still in the backlog are dropped without notification;
    /// running ones finish first. Dropping the dispatcher does the same.
    pub fn shutdown(mut self) {
        let discarded = self.pool.shutdown();
        let stats = self.stats();
        info!(
            requests = stats.requests,
            cache_hits = stats.cache_hits,
            completed = stats.completed,
            failed = stats.failed,
            cancelled = stats.cancelled,
            records_allocated = self.core.records.allocated(),
            discarded,
            "Dispatcher stopped"
        );
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if self.pool.size() > 0 {
            debug!("Dispatcher dropped, stopping workers");
            self.pool.shutdown();
        }
    }
}
