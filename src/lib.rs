//! Buildfetch Core Library
//!
//! Locates and downloads application builds (releases, release candidates,
//! nightlies, tinderbox and try builds) from an archive that is only browsable
//! through HTML directory listings.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`query`] - Validated, immutable description of the wanted build
//! - [`listing`] - Archive directory listings
//! - [`selector`] - Picking one build out of a listing
//! - [`variant`] - Per build type directory layout and file naming
//! - [`resolver`] - Query to artifact URL, computed once
//! - [`download`] - HTTP client, retry policy and streaming download engine
//! - [`checksum`] - Manifest parsing and file verification
//! - [`fetcher`] - Facade tying resolution, download and verification together

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod checksum;
pub mod download;
pub mod error;
pub mod fetcher;
pub mod listing;
pub mod query;
pub mod resolver;
pub mod revision;
pub mod selector;
pub mod variant;

mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use download::{
    Credentials, DownloadEngine, DownloadOutcome, FailureType, HttpClient, RetryDecision,
    RetryPolicy, StreamOptions, classify_error,
};
pub use error::FetchError;
pub use fetcher::{BuildFetcher, FetchOptions, FetchReport};
pub use listing::DirectoryListing;
pub use query::{Application, BuildQuery, BuildVariant, Platform, QueryOptions, VariantKind};
pub use resolver::{DEFAULT_BASE_URL, ResolvedBuild, Resolver};
pub use revision::{ArchiveRevisionLookup, RevisionLookup, StaticRevisionLookup};
pub use selector::{BuildSelection, select_build};
