//! Shared User-Agent string for every archive request.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/buildfetch";

/// Default User-Agent for listing and download requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("buildfetch/{version} (+{PROJECT_UA_URL})")
}
