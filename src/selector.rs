//! Picks one build out of an ordered, already filtered list of entries.

use tracing::info;

use crate::error::FetchError;

/// Entries that matched plus the index of the chosen one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSelection {
    entries: Vec<String>,
    index: usize,
}

impl BuildSelection {
    /// All matching entries, in listing order.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Zero-based index of the selected entry.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The selected entry.
    #[must_use]
    pub fn selected(&self) -> &str {
        &self.entries[self.index]
    }

    #[must_use]
    pub fn into_selected(mut self) -> String {
        self.entries.swap_remove(self.index)
    }
}

/// Selects the `build_number`th entry (1-based), or the last one when no
/// number is given.
///
/// The default assumes the archive lists entries in ascending order, so the
/// last one is the most recent.
///
/// # Errors
///
/// Returns [`FetchError::NotFound`] naming `queried_url` when `entries` is
/// empty or `build_number` is zero or out of range.
pub fn select_build(
    entries: Vec<String>,
    build_number: Option<u32>,
    queried_url: &str,
) -> Result<BuildSelection, FetchError> {
    if entries.is_empty() {
        return Err(FetchError::not_found("No builds have been found", queried_url));
    }

    let index = match build_number {
        None => entries.len() - 1,
        Some(number) => match usize::try_from(number) {
            Ok(n) if n >= 1 && n <= entries.len() => n - 1,
            _ => {
                return Err(FetchError::not_found(
                    format!(
                        "Build number {number} is out of range, only {} builds found",
                        entries.len()
                    ),
                    queried_url,
                ));
            }
        },
    };

    info!(
        count = entries.len(),
        selected = %entries[index],
        "found {} builds, selected build {}",
        entries.len(),
        index + 1
    );

    Ok(BuildSelection { entries, index })
}
