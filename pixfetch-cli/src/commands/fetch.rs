//! Fetch command: resolve images through the dispatcher and report results.

use clap::Args;
use pixfetch::dispatcher::Dispatcher;
use pixfetch::notify::{FnTarget, Notification};
use pixfetch::task::RequestState;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::common::{load_config, resolve_config_path};
use crate::error::CliError;

/// Arguments for `pixfetch fetch`.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Image URLs to fetch
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Target width in pixels (0 = no downsampling)
    #[arg(long, default_value_t = 0)]
    pub width: i32,

    /// Target height in pixels (0 = no downsampling)
    #[arg(long, default_value_t = 0)]
    pub height: i32,

    /// Override the number of worker threads
    #[arg(long)]
    pub workers: Option<usize>,

    /// Print every state change, not just results
    #[arg(long, short)]
    pub verbose: bool,
}

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Consecutive empty polls with nothing running before giving up.
const MAX_IDLE_POLLS: u32 = 20;

#[derive(Default)]
struct Tally {
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl Tally {
    fn finished(&self) -> usize {
        self.completed.load(Ordering::SeqCst) + self.failed.load(Ordering::SeqCst)
    }
}

/// Run the fetch command.
pub fn run(args: FetchArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let path = resolve_config_path(config_path);
    let mut config = load_config(&path)?;
    if let Some(workers) = args.workers {
        if workers == 0 {
            return Err(CliError::Config("--workers must be at least 1".to_string()));
        }
        config.dispatcher.workers = workers;
    }

    let (dispatcher, pump) = Dispatcher::from_config(&config)?;
    let tally = Arc::new(Tally::default());
    let started = Instant::now();

    for url in &args.urls {
        let tally = Arc::clone(&tally);
        let verbose = args.verbose;
        let url_label = url.clone();
        let target = Arc::new(FnTarget::new(move |n: &Notification| {
            report(&url_label, n, verbose);
            match n.state {
                RequestState::Complete => {
                    tally.completed.fetch_add(1, Ordering::SeqCst);
                }
                RequestState::Failed => {
                    tally.failed.fetch_add(1, Ordering::SeqCst);
                }
                _ => {}
            }
        }));
        dispatcher.request(url.as_str(), args.width, args.height, target);
    }

    // Notifications are delivered on this thread
    let mut idle_polls = 0;
    while tally.finished() < args.urls.len() {
        let handled = pump.process_for(POLL_INTERVAL);
        if handled == 0 && dispatcher.running() == 0 && dispatcher.queued_len() == 0 {
            idle_polls += 1;
            if idle_polls >= MAX_IDLE_POLLS {
                warn!(
                    finished = tally.finished(),
                    total = args.urls.len(),
                    "No work left but some requests never finished"
                );
                break;
            }
        } else {
            idle_polls = 0;
        }
    }
    let unfinished = args.urls.len().saturating_sub(tally.finished());

    let stats = dispatcher.stats();
    info!(
        requests = stats.requests,
        cache_hits = stats.cache_hits,
        completed = stats.completed,
        failed = stats.failed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Fetch finished"
    );
    dispatcher.shutdown();

    let failed = tally.failed.load(Ordering::SeqCst) + unfinished;
    if failed > 0 {
        return Err(CliError::Fetch {
            failed,
            total: args.urls.len(),
        });
    }
    Ok(())
}

fn report(url: &str, notification: &Notification, verbose: bool) {
    match notification.state {
        RequestState::Complete => match &notification.result {
            Some(image) => println!(
                "OK    {}  {}x{} ({} bytes)",
                url,
                image.width(),
                image.height(),
                image.byte_count()
            ),
            None => println!("OK    {}", url),
        },
        RequestState::Failed => match notification.failure {
            Some(kind) => println!("FAIL  {}  ({})", url, kind),
            None => println!("FAIL  {}", url),
        },
        state if verbose => println!("..    {}  {}", url, state),
        _ => {}
    }
}
