//! Fixed-size thread pool with an unbounded FIFO backlog.

use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Default number of worker threads.
pub const DEFAULT_WORKER_COUNT: usize = 8;

/// A unit of work for the pool.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

struct QueuedJob<K> {
    /// Caller-chosen key, used to pull the job back out of the backlog
    key: K,
    job: Job,
}

struct PoolState<K> {
    backlog: VecDeque<QueuedJob<K>>,
    /// Jobs currently running on a worker
    active: usize,
    shutdown: bool,
}

struct PoolShared<K> {
    state: Mutex<PoolState<K>>,
    work_available: Condvar,
}

/// Pool of N worker threads pulling from one FIFO backlog.
///
/// All threads are spawned up front and live until shutdown; the pool
/// never grows or shrinks. Jobs that have not started yet can be removed
/// by key; `K` is anything that can tell two jobs apart.
pub struct WorkerPool<K = u64> {
    shared: Arc<PoolShared<K>>,
    threads: Vec<JoinHandle<()>>,
}

impl<K> WorkerPool<K>
where
    K: PartialEq + fmt::Debug + Send + 'static,
{
    /// Spawn `size` worker threads named `{name}-{index}`.
    ///
    /// A size of zero is raised to one.
    pub fn new(size: usize, name: &str) -> io::Result<Self> {
        let size = size.max(1);
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                backlog: VecDeque::new(),
                active: 0,
                shutdown: false,
            }),
            work_available: Condvar::new(),
        });

        let mut pool = Self {
            shared,
            threads: Vec::with_capacity(size),
        };

        for index in 0..size {
            let shared = Arc::clone(&pool.shared);
            // On failure `pool` drops here and stops the threads already started
            let handle = thread::Builder::new()
                .name(format!("{}-{}", name, index))
                .spawn(move || worker_loop(shared))?;
            pool.threads.push(handle);
        }

        info!(workers = size, name, "Worker pool started");
        Ok(pool)
    }

    /// Append a job to the backlog.
    ///
    /// Returns `false` (and drops the job) if the pool is shut down.
    pub fn execute(&self, key: K, job: Job) -> bool {
        {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return false;
            }
            state.backlog.push_back(QueuedJob { key, job });
        }
        self.shared.work_available.notify_one();
        true
    }

    /// Remove a job that has not started yet.
    ///
    /// Returns `true` if a queued job with `key` was found and dropped.
    pub fn remove(&self, key: &K) -> bool {
        let mut state = self.shared.state.lock();
        match state.backlog.iter().position(|queued| queued.key == *key) {
            Some(index) => {
                state.backlog.remove(index);
                true
            }
            None => false,
        }
    }
}

impl<K> WorkerPool<K> {
    /// Number of jobs waiting in the backlog.
    pub fn queued(&self) -> usize {
        self.shared.state.lock().backlog.len()
    }

    /// Number of jobs currently running.
    pub fn active(&self) -> usize {
        self.shared.state.lock().active
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.threads.len()
    }

    /// Stop accepting work, drop the backlog and wait for running jobs.
    ///
    /// Returns the number of queued jobs that were discarded.
    pub fn shutdown(&mut self) -> usize {
        let discarded = {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            let discarded = state.backlog.len();
            state.backlog.clear();
            discarded
        };
        self.shared.work_available.notify_all();

        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                error!("Worker thread terminated abnormally");
            }
        }

        if discarded > 0 {
            debug!(discarded, "Worker pool discarded queued jobs on shutdown");
        }
        discarded
    }
}

impl<K> Drop for WorkerPool<K> {
    fn drop(&mut self) {
        if !self.threads.is_empty() {
            self.shutdown();
        }
    }
}

fn worker_loop<K: fmt::Debug>(shared: Arc<PoolShared<K>>) {
    loop {
        let QueuedJob { key, job } = {
            let mut state = shared.state.lock();
            loop {
                if state.shutdown {
                    return;
                }
                if let Some(queued) = state.backlog.pop_front() {
                    state.active += 1;
                    break queued;
                }
                shared.work_available.wait(&mut state);
            }
        };

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            error!(key = ?key, "Job panicked: {}", panic_message(&*payload));
        }

        shared.state.lock().active -= 1;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}
