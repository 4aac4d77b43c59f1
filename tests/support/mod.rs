//! Helpers shared by the integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Archive-style index page linking every entry; names ending in `/` are folders.
///
/// Entries are hrefs and may be percent-encoded; the link text is decoded.
pub fn listing_html(entries: &[&str]) -> String {
    let rows: String = entries
        .iter()
        .map(|entry| {
            let text = urlencoding::decode(entry)
                .map_or_else(|_| (*entry).to_string(), |text| text.into_owned());
            format!("<tr><td><a href=\"{entry}\">{text}</a></td></tr>\n")
        })
        .collect();
    format!(
        "<!DOCTYPE html>\n<html><body><table>\n\
         <tr><td><a href=\"../\">..</a></td></tr>\n{rows}</table></body></html>"
    )
}

/// Serves an index page for `dir_path` (which must end with `/`).
pub async fn mount_listing(server: &MockServer, dir_path: &str, entries: &[&str]) {
    Mock::given(method("GET"))
        .and(path(dir_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(entries)))
        .mount(server)
        .await;
}

/// Serves `body` at `file_path`.
pub async fn mount_file(server: &MockServer, file_path: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(file_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Answers 404 for `any_path`.
pub async fn mount_missing(server: &MockServer, any_path: &str) {
    Mock::given(method("GET"))
        .and(path(any_path))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}
