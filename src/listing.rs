//! Directory listings of the build archive.
//!
//! The archive serves plain HTML index pages. A [`DirectoryListing`] keeps the
//! names of the linked entries in server order; callers rely on that order
//! ("last" is assumed to be the most recent).

use regex::{Regex, RegexBuilder};
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use crate::download::HttpClient;
use crate::error::FetchError;

/// Entry names parsed from one archive index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    url: Url,
    entries: Vec<String>,
}

impl DirectoryListing {
    /// Fetches and parses the index page at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::HttpStatus`] for error statuses (404 included)
    /// and [`FetchError::Network`] for transport failures.
    #[instrument(level = "debug", skip(client), fields(url = %url))]
    pub async fn fetch(client: &HttpClient, url: &Url) -> Result<Self, FetchError> {
        let body = client.get_listing(url.as_str()).await?;
        let listing = Self::from_html(url.clone(), &body);
        debug!(entries = listing.entries.len(), "parsed directory listing");
        Ok(listing)
    }

    /// Parses an index page already in memory.
    #[must_use]
    pub fn from_html(url: Url, html: &str) -> Self {
        let document = Html::parse_document(html);
        let entries = match Selector::parse("a[href]") {
            Ok(anchors) => document
                .select(&anchors)
                .filter_map(|anchor| {
                    let href = anchor.value().attr("href")?;
                    let text: String = anchor.text().collect();
                    entry_name(href, &text)
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        Self { url, entries }
    }

    /// Builds a listing from known entries.
    #[must_use]
    pub fn from_entries(url: Url, entries: Vec<String>) -> Self {
        Self { url, entries }
    }

    /// URL the listing was fetched from.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keeps entries for which `predicate` holds, preserving order.
    #[must_use]
    pub fn filter<P>(&self, mut predicate: P) -> Self
    where
        P: FnMut(&str) -> bool,
    {
        Self {
            url: self.url.clone(),
            entries: self
                .entries
                .iter()
                .filter(|entry| predicate(entry))
                .cloned()
                .collect(),
        }
    }

    /// Keeps entries matching `pattern` from their first character,
    /// ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidInput`] when `pattern` is not a valid regex.
    pub fn filter_regex(&self, pattern: &str) -> Result<Self, FetchError> {
        let regex = anchored_regex(pattern)?;
        Ok(self.filter(|entry| regex.is_match(entry)))
    }
}

/// Compiles `pattern` anchored at the start and case-insensitive.
///
/// # Errors
///
/// Returns [`FetchError::InvalidInput`] when `pattern` is not a valid regex.
pub fn anchored_regex(pattern: &str) -> Result<Regex, FetchError> {
    RegexBuilder::new(&format!("^(?:{pattern})"))
        .case_insensitive(true)
        .build()
        .map_err(|e| FetchError::invalid_input("pattern", e.to_string()))
}

fn entry_name(href: &str, text: &str) -> Option<String> {
    let decoded = urlencoding::decode(href).ok()?;
    let path = decoded.split(['?', '#']).next().unwrap_or_default();
    let name = path.trim_end_matches('/').rsplit('/').next()?;
    if name.is_empty() {
        return None;
    }

    let text = text.trim();
    (text == name || text.trim_matches('/') == name).then(|| name.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const INDEX: &str = r#"<!DOCTYPE html>
<html><head><title>Directory Listing: /pub/firefox/releases/</title></head>
<body>
<table>
<tr><td><a href="/pub/firefox/">..</a></td></tr>
<tr><td><a href="/pub/firefox/releases/20.0/">20.0/</a></td></tr>
<tr><td><a href="/pub/firefox/releases/21.0/">21.0/</a></td></tr>
<tr><td><a href="/pub/firefox/releases/21.0/firefox%2021.0.dmg">firefox 21.0.dmg</a></td></tr>
<tr><td><a href="/pub/firefox/releases/SHA512SUMS">SHA512SUMS</a></td></tr>
<tr><td><a href="https://www.mozilla.org/">Mozilla</a></td></tr>
</table>
</body></html>"#;

    fn listing() -> DirectoryListing {
        DirectoryListing::from_html(
            Url::parse("https://archive.example/pub/firefox/releases/").unwrap(),
            INDEX,
        )
    }

    #[test]
    fn test_parses_entries_in_server_order() {
        assert_eq!(
            listing().entries(),
            ["20.0", "21.0", "firefox 21.0.dmg", "SHA512SUMS"]
        );
    }

    #[test]
    fn test_entry_name_accepts_text_with_slashes() {
        assert_eq!(entry_name("build1/", "build1/"), Some("build1".to_string()));
        assert_eq!(entry_name("build1/", "/build1/"), Some("build1".to_string()));
        assert_eq!(entry_name("build1/", "Parent"), None);
    }

    #[test]
    fn test_empty_page_is_empty_listing() {
        let listing = DirectoryListing::from_html(
            Url::parse("https://archive.example/empty/").unwrap(),
            "<html><body></body></html>",
        );
        assert!(listing.is_empty());
    }

    #[test]
    fn test_filter_regex_is_anchored_and_case_insensitive() {
        let filtered = listing().filter_regex(r"\d+\.0").unwrap();
        assert_eq!(filtered.entries(), ["20.0", "21.0"]);

        let upper = listing().filter_regex("sha512").unwrap();
        assert_eq!(upper.entries(), ["SHA512SUMS"]);

        let unanchored = listing().filter_regex("SUMS").unwrap();
        assert!(unanchored.is_empty());
    }

    #[test]
    fn test_filter_keeps_url() {
        let filtered = listing().filter(|entry| entry.ends_with(".dmg"));
        assert_eq!(filtered.entries(), ["firefox 21.0.dmg"]);
        assert_eq!(filtered.url(), listing().url());
    }

    #[test]
    fn test_invalid_regex_is_invalid_input() {
        assert!(matches!(
            listing().filter_regex("(unclosed"),
            Err(FetchError::InvalidInput { .. })
        ));
    }
}
