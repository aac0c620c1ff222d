//! Byte-bounded in-memory cache for decoded images.
//!
//! Entries are weighed by their decoded size and evicted least recently
//! used first whenever an insertion would push the total over the limit.

mod memory;
mod stats;
mod types;

pub use memory::MemoryCache;
pub use stats::CacheStats;
pub use types::{CacheError, Weighted};
