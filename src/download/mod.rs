//! HTTP transport, retry and streaming download of build artifacts.
//!
//! # Features
//!
//! - Streaming downloads through a `.part` staging file
//! - Wall-clock download budget checked between chunks
//! - Basic-auth credentials on every request
//! - Bounded retries with a fixed delay
//! - Fallback location when the primary URL is not found
//!
//! # Example
//!
//! ```no_run
//! use buildfetch_core::download::HttpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let page = client
//!     .get_listing("https://archive.mozilla.org/pub/firefox/releases/")
//!     .await?;
//! println!("{} bytes of listing", page.len());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod engine;
mod retry;

pub use client::{Credentials, HttpClient, StreamOptions, part_path};
pub use engine::{DownloadEngine, DownloadOutcome};
pub use retry::{
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY, FailureType, RetryDecision, RetryPolicy,
    classify_error,
};
