//! Checksum manifests and verification of downloaded builds.
//!
//! Manifests are the `SHA256SUMS` / `SHA512SUMS` style files published next
//! to builds: one `<hex digest>  <path>` pair per line.

use std::path::Path;

use sha2::{Digest, Sha256, Sha512};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, instrument};
use url::Url;

use crate::download::HttpClient;
use crate::download::constants::CHUNK_SIZE;
use crate::error::FetchError;

/// Digest algorithms recognized by the length of their hex digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    Sha256,
    Sha512,
}

impl ChecksumAlgorithm {
    /// Picks the algorithm producing a hex digest of this length.
    #[must_use]
    pub fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            64 => Some(Self::Sha256),
            128 => Some(Self::Sha512),
            _ => None,
        }
    }
}

/// Parsed checksum manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    entries: Vec<(String, String)>,
}

impl ChecksumManifest {
    /// Downloads and parses the manifest at `url`.
    ///
    /// # Errors
    ///
    /// Returns transport errors from the client.
    #[instrument(level = "debug", skip(client), fields(url = %url))]
    pub async fn fetch(client: &HttpClient, url: &Url) -> Result<Self, FetchError> {
        let text = client.get_text(url.as_str()).await?;
        let manifest = Self::parse(&text);
        debug!(entries = manifest.entries.len(), "parsed checksum manifest");
        Ok(manifest)
    }

    /// Parses manifest text. Lines that are not `<hex>  <path>` are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| {
                let (hash, path) = line.trim().split_once(char::is_whitespace)?;
                let path = path.trim_start().trim_start_matches('*');
                let valid = !path.is_empty() && hash.chars().all(|c| c.is_ascii_hexdigit());
                valid.then(|| (hash.to_ascii_lowercase(), path.to_string()))
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Digest recorded for `filename`, matched against the whole path or its
    /// last component.
    #[must_use]
    pub fn hash_for(&self, filename: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, path)| {
                path == filename || path.rsplit('/').next().is_some_and(|name| name == filename)
            })
            .map(|(hash, _)| hash.as_str())
    }
}

/// Hashes the file at `path` and compares it with `expected`.
///
/// # Errors
///
/// - [`FetchError::InvalidInput`] when `expected` is not a SHA-256/512 hex digest
/// - [`FetchError::Io`] when the file cannot be read
/// - [`FetchError::ChecksumMismatch`] when the digests differ
#[instrument(skip(expected), fields(path = %path.display()))]
pub async fn verify_file(path: &Path, expected: &str) -> Result<(), FetchError> {
    let expected = expected.trim().to_ascii_lowercase();
    let algorithm = ChecksumAlgorithm::from_hex_len(expected.len()).ok_or_else(|| {
        FetchError::invalid_input(
            "checksum",
            format!("digest of {} hex digits is neither SHA-256 nor SHA-512", expected.len()),
        )
    })?;

    let actual = match algorithm {
        ChecksumAlgorithm::Sha256 => hash_file::<Sha256>(path).await?,
        ChecksumAlgorithm::Sha512 => hash_file::<Sha512>(path).await?,
    };

    if actual != expected {
        return Err(FetchError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }
    info!(algorithm = ?algorithm, "checksum verified");
    Ok(())
}

async fn hash_file<D: Digest>(path: &Path) -> Result<String, FetchError> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| FetchError::io(path.to_path_buf(), e))?;
    let mut hasher = D::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file
            .read(&mut buffer)
            .await
            .map_err(|e| FetchError::io(path.to_path_buf(), e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
