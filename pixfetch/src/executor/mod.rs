//! Background execution.
//!
//! ```text
//! Dispatcher ──execute(key, job)──► WorkerPool backlog (FIFO, unbounded)
//!                                        │
//!                          N threads ◄───┘
//!                              │
//!                              ▼
//!                     FetchDecodeWorker::run
//!                 fetch → bounds → decode → report
//! ```
//!
//! The pool is generic over boxed jobs; the fetch-decode worker is the only
//! job the dispatcher submits.

mod pool;
mod worker;

pub use pool::{Job, WorkerPool, DEFAULT_WORKER_COUNT};
pub(crate) use worker::FetchDecodeWorker;
