//! Readthrough Cache - cache coordinator for hot database reads
//!
//! Serves values from a key-value backend, fetches them from their origin on
//! a miss with one fetch per key no matter how many callers miss at once,
//! and keeps serving from the origin whenever the backend is down.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use backend::{KeyValueBackend, MemoryBackend};
pub use cache::{CacheCoordinator, CoordinatorConfig, StatsSnapshot};
pub use config::Config;
pub use error::{BackendError, CacheError, FetchError};
pub use tasks::spawn_cleanup_task;
