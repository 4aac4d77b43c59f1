//! Constants for the download module (timeouts, streaming).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default per-request network timeout (60 seconds) for listings and status files.
pub const NETWORK_TIMEOUT_SECS: u64 = 60;

/// Size of the write buffer between network chunks and the staging file.
pub const CHUNK_SIZE: usize = 16 * 1024;

/// Suffix appended to the target path while a download is in flight.
pub const PART_SUFFIX: &str = ".part";
