//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::StatsSnapshot;

/// Response body for the stats endpoint (GET /cache/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    /// Same rate formatted for dashboards, e.g. "75.00%"
    pub hit_rate_percent: String,
    /// Origin fetches currently in flight
    pub pending_requests: usize,
    /// Whether the backend currently answers
    pub backend_available: bool,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a coordinator snapshot
    pub fn new(stats: StatsSnapshot, backend_available: bool) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: stats.hit_rate,
            hit_rate_percent: stats.hit_rate_percent(),
            pending_requests: stats.pending_requests,
            backend_available,
        }
    }
}

/// Response body for single-key invalidation (DELETE /cache/keys/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' invalidated", key),
            key,
        }
    }
}

/// Response body for pattern invalidation (POST /cache/invalidate)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    pub pattern: String,
    /// Number of keys removed
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn new(pattern: impl Into<String>, removed: usize) -> Self {
        let pattern = pattern.into();
        Self {
            message: format!("Invalidated {} keys matching '{}'", removed, pattern),
            pattern,
            removed,
        }
    }
}

/// Response body for flushing (DELETE /cache)
#[derive(Debug, Clone, Serialize)]
pub struct FlushResponse {
    pub message: String,
}

impl FlushResponse {
    pub fn flushed() -> Self {
        Self {
            message: "Cache flushed".to_string(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
///
/// The service stays healthy while the cache is down; it only gets slower.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status, always "healthy"
    pub status: String,
    /// "available" or "unavailable"
    pub cache: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(cache_available: bool) -> Self {
        let cache = if cache_available {
            "available"
        } else {
            "unavailable"
        };
        Self {
            status: "healthy".to_string(),
            cache: cache.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_from_snapshot() {
        let resp = StatsResponse::new(StatsSnapshot::new(80, 20, 3), true);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.hit_rate_percent, "80.00%");
        assert_eq!(resp.pending_requests, 3);
    }

    #[test]
    fn test_stats_response_zero_requests() {
        let resp = StatsResponse::new(StatsSnapshot::new(0, 0, 0), false);
        assert_eq!(resp.hit_rate, 0.0);
        assert_eq!(resp.hit_rate_percent, "0.00%");
    }

    #[test]
    fn test_invalidate_response_serialize() {
        let resp = InvalidateResponse::new("events:list*", 4);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("events:list*"));
        assert!(json.contains(r#""removed":4"#));
    }

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse::new("event:1");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("event:1"));
        assert!(json.contains("invalidated"));
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_string(&HealthResponse::healthy(false)).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("unavailable"));
        assert!(json.contains("timestamp"));
    }
}
