//! Core types for the memory cache.

use std::sync::Arc;
use thiserror::Error;

/// A value that knows how many bytes it occupies once cached.
///
/// The memory cache bounds itself by the sum of these weights rather than
/// by entry count, so a decoded 4K image costs what it actually costs.
pub trait Weighted {
    /// Size of the value in bytes.
    fn weight(&self) -> usize;
}

impl<T: Weighted + ?Sized> Weighted for Arc<T> {
    fn weight(&self) -> usize {
        (**self).weight()
    }
}

impl Weighted for Vec<u8> {
    fn weight(&self) -> usize {
        self.len()
    }
}

/// Cache-related errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A single entry is larger than the whole cache.
    #[error("Cache entry of {size} bytes exceeds cache limit of {limit} bytes")]
    EntryTooLarge { size: usize, limit: usize },
}
