//! Request dispatch.
//!
//! The [`Dispatcher`] owns the memory cache, the record pool, the worker
//! pool and the sending half of the notification channel:
//!
//! ```text
//! request() ──► cache hit? ──yes──► Complete ─────────────┐
//!                   │                                     │
//!                   no                                    ▼
//!                   ├──► Started ───────────────► NotificationPump ──► target
//!                   ▼                                     ▲
//!            WorkerPool backlog ──► FetchDecodeWorker ────┘
//!                                   (DownloadComplete, DecodeStarted,
//!                                    Complete | Failed)
//! ```
//!
//! State changes from every thread go through one transition check on the
//! request's record, so each public state is announced at most once and
//! in order.

mod config;
mod core;
mod request;
mod state;
mod stats;

pub use self::config::{DispatcherConfig, DEFAULT_CACHE_SIZE_BYTES};
pub use self::core::{Dispatcher, DispatcherError};
pub use self::stats::{DispatcherStats, DispatcherStatsSnapshot};

pub(crate) use self::core::DispatcherCore;
