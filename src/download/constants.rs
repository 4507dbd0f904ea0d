//! Constants for the download module (timeouts).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout between body chunks (5 minutes).
///
/// Applied per read, not to the whole transfer, so multi-gigabyte videos
/// are not cut off.
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Extension used when the media URL path has none.
pub const DEFAULT_EXTENSION: &str = "mp4";
