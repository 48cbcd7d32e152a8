/// Application name
pub const APP_NAME: &str = "Causerie";

/// Display envelope for inline thumbnails: decoded images are aspect-fit
/// into a square bounding box of this many pixels.
pub const THUMBNAIL_EDGE: u32 = 400;

/// Byte budget for the in-memory decoded-image cache (14 MiB).
pub const MEMORY_CACHE_BYTES: usize = 14 * 1024 * 1024;

/// Base poll interval for the sync and retry loops, in milliseconds.
pub const POLL_INTERVAL_MS: u64 = 1500;

/// Extra delay added on top of the poll interval for the hydration loop, so
/// the two loops do not contend for the log permit on every tick.
pub const HYDRATION_OFFSET_MS: u64 = 600;

/// Default chat server base URL (local development).
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8008";

/// Default destination channel for outbound messages.
pub const DEFAULT_CHANNEL: &str = "1@channel";

/// Timeout applied to every HTTP call, in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 10;
