//! pixfetch - Image fetch, decode and cache dispatcher
//!
//! This library resolves image requests by identity (typically a URL),
//! serving decoded pixels from a byte-bounded memory cache when it can and
//! otherwise fetching and decoding them on a fixed pool of worker threads.
//! Callers follow progress through notifications delivered on a thread of
//! their choosing.
//!
//! # High-Level API
//!
//! ```ignore
//! use pixfetch::config::ConfigFile;
//! use pixfetch::dispatcher::Dispatcher;
//! use pixfetch::notify::FnTarget;
//! use std::sync::Arc;
//!
//! let (dispatcher, pump) = Dispatcher::from_config(&ConfigFile::load()?)?;
//! std::thread::spawn(move || pump.run());
//!
//! let target = Arc::new(FnTarget::new(|n| println!("{:?} {}", n.handle, n.state)));
//! let handle = dispatcher.request("https://example.com/photo.jpg", 320, 240, target);
//! ```

pub mod cache;
pub mod config;
pub mod decode;
pub mod dispatcher;
pub mod executor;
pub mod logging;
pub mod notify;
pub mod provider;
pub mod task;

/// Version of the pixfetch library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
