//! HTTP client wrapper for listings, status files and build downloads.
//!
//! This module provides the `HttpClient` struct which attaches basic-auth
//! credentials, maps error statuses to [`FetchError`], and streams build
//! binaries to a staging file with a wall-clock budget.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::CACHE_CONTROL;
use reqwest::{Client, RequestBuilder};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};

use super::constants::{CHUNK_SIZE, CONNECT_TIMEOUT_SECS, NETWORK_TIMEOUT_SECS, PART_SUFFIX};
use crate::error::FetchError;
use crate::user_agent;

/// Basic HTTP credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: Option<String>,
}

impl Credentials {
    /// Creates credentials for basic authentication.
    #[must_use]
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Returns the user name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Options for a single streamed download.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamOptions {
    /// Wall-clock budget for the whole body, checked between chunks.
    pub timeout: Option<Duration>,
    /// Draw a progress bar when the content length is known.
    pub show_progress: bool,
}

/// HTTP client shared by every request of one fetch.
///
/// Created once and reused so listing requests and the final download share
/// connection pooling and credentials.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    credentials: Option<Credentials>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, NETWORK_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// `read_timeout_secs` bounds the wait for any single read, not the whole
    /// body; the download budget is [`StreamOptions::timeout`].
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            credentials: None,
        }
    }

    /// Attaches basic-auth credentials to every request.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Fetches a directory listing page, bypassing intermediate caches.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::HttpStatus`] for non-2xx responses (404 included)
    /// and [`FetchError::Network`] for transport failures.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_listing(&self, url: &str) -> Result<String, FetchError> {
        self.get_fresh_text(url).await
    }

    /// Fetches a text document that changes in place (latest-build status
    /// files), bypassing intermediate caches.
    ///
    /// # Errors
    ///
    /// Same as [`get_listing`](Self::get_listing).
    pub async fn get_fresh_text(&self, url: &str) -> Result<String, FetchError> {
        let request = self.request(url).header(CACHE_CONTROL, "max-age=0");
        let response = self.send(url, request).await?;
        response
            .text()
            .await
            .map_err(|e| FetchError::network(url, e))
    }

    /// Fetches a small text document such as a checksum manifest.
    ///
    /// # Errors
    ///
    /// Same as [`get_listing`](Self::get_listing).
    #[instrument(level = "debug", skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let request = self.request(url);
        let response = self.send(url, request).await?;
        response
            .text()
            .await
            .map_err(|e| FetchError::network(url, e))
    }

    /// Streams `url` into `<target>.part` and renames it to `target` once the
    /// whole body has been written.
    ///
    /// The staging file is removed on any failure, including an exceeded
    /// timeout or the future being dropped mid-transfer. Returns the number
    /// of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Timeout`] when the budget is exceeded,
    /// [`FetchError::HttpStatus`]/[`FetchError::Network`] for transport
    /// failures and [`FetchError::Io`] for disk failures.
    #[instrument(skip(self, options), fields(url = %url, target = %target.display()))]
    pub async fn download_to_path(
        &self,
        url: &str,
        target: &Path,
        options: StreamOptions,
    ) -> Result<u64, FetchError> {
        let started = Instant::now();
        let part_path = part_path(target);

        let response = self.send(url, self.request(url)).await?;
        let progress = progress_bar(options.show_progress, response.content_length());

        let file = File::create(&part_path)
            .await
            .map_err(|e| FetchError::io(part_path.clone(), e))?;
        let staging = StagingFile::new(part_path);

        let stream_result = stream_to_file(
            file,
            response,
            url,
            staging.path(),
            started,
            options,
            &progress,
        )
        .await;

        let bytes_written = match stream_result {
            Ok(bytes) => bytes,
            Err(error) => {
                progress.abandon();
                return Err(error);
            }
        };
        progress.finish_and_clear();

        staging.commit(target).await?;

        info!(
            path = %target.display(),
            bytes = bytes_written,
            elapsed_ms = started.elapsed().as_millis(),
            "download complete"
        );
        Ok(bytes_written)
    }

    fn request(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.credentials {
            Some(credentials) => {
                request.basic_auth(&credentials.username, credentials.password.as_ref())
            }
            None => request,
        }
    }

    async fn send(
        &self,
        url: &str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, FetchError> {
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "error status");
            return Err(FetchError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}

/// Returns the staging path used while `target` is being downloaded.
#[must_use]
pub fn part_path(target: &Path) -> PathBuf {
    let mut staged = target.as_os_str().to_os_string();
    staged.push(PART_SUFFIX);
    PathBuf::from(staged)
}

/// `<target>.part` while it is being written; removed on drop unless committed.
#[derive(Debug)]
struct StagingFile {
    path: PathBuf,
    committed: bool,
}

impl StagingFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Renames the staging file to `target`.
    async fn commit(mut self, target: &Path) -> Result<(), FetchError> {
        tokio::fs::rename(&self.path, target)
            .await
            .map_err(|e| FetchError::io(target.to_path_buf(), e))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if !self.committed {
            debug!(path = %self.path.display(), "cleaning up partial file");
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    started: Instant,
    options: StreamOptions,
    progress: &ProgressBar,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
        progress.set_position(bytes_written);

        // Checked only between chunks; a read in progress cannot be aborted.
        if let Some(limit) = options.timeout
            && started.elapsed() >= limit
        {
            return Err(FetchError::timeout(url, limit));
        }
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}

fn progress_bar(enabled: bool, content_length: Option<u64>) -> ProgressBar {
    let Some(total) = content_length.filter(|_| enabled) else {
        return ProgressBar::hidden();
    };
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template(
            "{percent:>3}% [{bar:40}] {bytes}/{total_bytes} {bytes_per_sec} ETA {eta}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[test]
    fn test_part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/tmp/firefox-21.0.tar.bz2")),
            PathBuf::from("/tmp/firefox-21.0.tar.bz2.part")
        );
    }

    #[test]
    fn test_uncommitted_staging_file_is_removed_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let staged = temp_dir.path().join("build.tar.bz2.part");
        std::fs::write(&staged, b"partial").unwrap();

        drop(StagingFile::new(staged.clone()));

        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn test_committed_staging_file_becomes_target() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("build.tar.bz2");
        let staged = part_path(&target);
        std::fs::write(&staged, b"complete").unwrap();

        StagingFile::new(staged.clone()).commit(&target).await.unwrap();

        assert!(!staged.exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"complete");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("alice", Some("hunter2".to_string()));
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_get_listing_sends_cache_control() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/pub/"))
            .and(header("cache-control", "max-age=0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let body = client
            .get_listing(&format!("{}/pub/", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html></html>");
    }

    #[tokio::test]
    async fn test_get_listing_404_is_http_status() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/missing/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let result = client
            .get_listing(&format!("{}/missing/", mock_server.uri()))
            .await;
        assert!(matches!(
            result,
            Err(FetchError::HttpStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_basic_auth_header_is_sent() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        // "user:secret" base64-encoded
        Mock::given(method("GET"))
            .and(path("/private.txt"))
            .and(header("authorization", "Basic dXNlcjpzZWNyZXQ="))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::new()
            .with_credentials(Some(Credentials::new("user", Some("secret".to_string()))));
        let body = client
            .get_text(&format!("{}/private.txt", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_download_commits_only_final_file() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/firefox.tar.bz2"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 64 * 1024]))
            .mount(&mock_server)
            .await;

        let target = temp_dir.path().join("firefox.tar.bz2");
        let client = HttpClient::new();
        let bytes = client
            .download_to_path(
                &format!("{}/firefox.tar.bz2", mock_server.uri()),
                &target,
                StreamOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(bytes, 64 * 1024);
        assert_eq!(std::fs::metadata(&target).unwrap().len(), 64 * 1024);
        assert!(!part_path(&target).exists());
    }

    #[tokio::test]
    async fn test_download_timeout_removes_partial_file() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/slow.exe"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"data".to_vec())
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&mock_server)
            .await;

        let target = temp_dir.path().join("slow.exe");
        let client = HttpClient::new();
        let result = client
            .download_to_path(
                &format!("{}/slow.exe", mock_server.uri()),
                &target,
                StreamOptions {
                    timeout: Some(Duration::from_millis(50)),
                    show_progress: false,
                },
            )
            .await;

        assert!(
            matches!(result, Err(FetchError::Timeout { .. })),
            "got {result:?}"
        );
        assert!(!target.exists());
        assert!(!part_path(&target).exists());
    }

    #[tokio::test]
    async fn test_download_http_error_leaves_no_files() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/broken.dmg"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let target = temp_dir.path().join("broken.dmg");
        let client = HttpClient::new();
        let result = client
            .download_to_path(
                &format!("{}/broken.dmg", mock_server.uri()),
                &target,
                StreamOptions::default(),
            )
            .await;

        assert!(matches!(
            result,
            Err(FetchError::HttpStatus { status: 500, .. })
        ));
        let entries: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert!(entries.is_empty(), "found leftovers: {entries:?}");
    }
}
