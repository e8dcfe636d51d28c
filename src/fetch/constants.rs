//! Constants for the fetch module (timeouts, rate limiting).

use std::time::Duration;

/// HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Total request timeout for directory-listing requests (10 seconds).
pub const LISTING_TIMEOUT_SECS: u64 = 10;

/// Total request timeout for image downloads (30 seconds).
pub const IMAGE_TIMEOUT_SECS: u64 = 30;

/// Mandatory pause between successive listing requests to the same host,
/// so crawls do not overload the source server.
pub const LISTING_PAUSE: Duration = Duration::from_millis(100);
