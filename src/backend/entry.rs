//! Stored Entry Module
//!
//! A value held by the in-memory backend together with its expiry.

use std::time::{SystemTime, UNIX_EPOCH};

// == Stored Entry ==
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// Encoded value
    pub value: String,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl StoredEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl_secs` seconds from now.
    pub fn new(value: String, ttl_secs: u64) -> Self {
        Self {
            value,
            expires_at: current_timestamp_ms().saturating_add(ttl_secs.saturating_mul(1000)),
        }
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its expiration time,
    /// so a zero TTL is never readable.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }

    // == Time To Live ==
    /// Remaining lifetime in whole seconds, 0 once expired.
    pub fn ttl_remaining(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms()) / 1000
    }
}

/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
