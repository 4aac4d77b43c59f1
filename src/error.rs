//! Error types shared by resolution and download.
//!
//! Every fallible operation in the crate returns [`FetchError`]. Variants carry
//! the URL or path that failed so messages stay actionable without extra
//! context at the call site.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while resolving or downloading a build.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A queried resource or directory entry is absent.
    #[error("{message}: {url}")]
    NotFound {
        /// What was being looked for.
        message: String,
        /// The URL that was queried.
        url: String,
    },

    /// The requested application and build type combination is not supported.
    #[error("{message}")]
    NotSupported {
        /// Human-readable explanation.
        message: String,
    },

    /// A build type does not provide a capability other build types do.
    #[error("{capability} is not implemented for {variant} builds")]
    NotImplemented {
        /// Build type name.
        variant: &'static str,
        /// Missing capability.
        capability: &'static str,
    },

    /// The download exceeded its wall-clock budget.
    #[error("timeout downloading {url}: exceeded {limit:?}")]
    Timeout {
        /// The URL being downloaded.
        url: String,
        /// Configured budget.
        limit: Duration,
    },

    /// HTTP error response (any non-2xx status).
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Network-level error (DNS resolution, connection refused, TLS, read failure).
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// File system error while staging or committing a download.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A URL could not be parsed or joined.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// A query field has a malformed value.
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        /// Field name as exposed on the command line.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A field required by the selected build type is missing.
    #[error("the {field} has to be specified for {variant} builds")]
    MissingField {
        /// Field name.
        field: &'static str,
        /// Build type name.
        variant: &'static str,
    },

    /// A downloaded file does not match the published checksum.
    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The verified file.
        path: PathBuf,
        /// Published digest.
        expected: String,
        /// Computed digest.
        actual: String,
    },
}

impl FetchError {
    /// Creates a not-found error for a queried URL.
    pub fn not_found(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            url: url.into(),
        }
    }

    /// Creates a not-supported error.
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::NotSupported {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>, limit: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            limit,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a validation error for a malformed field.
    pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Returns the HTTP status code when this error came from an HTTP response.
    #[must_use]
    pub fn http_status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for [`FetchError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// URL or path, which the source errors do not carry.
