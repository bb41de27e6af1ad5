//! API Module
//!
//! Administrative HTTP surface over one cache coordinator.
//!
//! # Endpoints
//! - `GET /health` - Health check, reports cache availability
//! - `GET /cache/stats` - Hit/miss statistics
//! - `DELETE /cache/keys/:key` - Invalidate one key
//! - `POST /cache/invalidate` - Invalidate every key matching a pattern
//! - `DELETE /cache` - Flush everything (admin token required)

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
