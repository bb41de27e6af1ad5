//! Cache Module
//!
//! Read-through caching with request coalescing and pattern invalidation.

mod codec;
mod coordinator;
mod inflight;
pub mod keys;
mod pattern;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use codec::{Codec, JsonCodec};
pub use coordinator::{CacheCoordinator, CoordinatorConfig};
pub use inflight::{Claim, Completion, FetchOutcome, FetchedValue, InFlightRegistry, SharedFetch};
pub use pattern::GlobPattern;
pub use stats::{CacheStats, StatsSnapshot};

// == Public Constants ==
/// Default maximum encoded size of a cached value in bytes
pub const DEFAULT_MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MiB
