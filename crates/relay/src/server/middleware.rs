//! Axum middleware layers applied to the router.
//!
//! Includes request tracing, timeout enforcement, and response compression.

use std::time::Duration;

/// Per-request timeout applied to all routes.
///
/// Sized for the worst case on `/upload`: receiving a full-size multipart
/// body, sealing every payload, and waiting on the mail relay's HTTP call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
