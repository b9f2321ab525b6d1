//! Stem-to-path index used to resolve `[[wikilinks]]`.
//!
//! The index is filled while the vault is mirrored ([`LinkIndexBuilder`]) and
//! frozen into a read-only [`LinkIndex`] before any note is rewritten.

use std::collections::HashMap;
use std::path::{Component, Path};

/// File name without its final extension.
///
/// Returns `None` when the name has no `.` or nothing precedes it, in which
/// case the file cannot be a link target.
///
/// ```
/// use quartify_core::link_index::stem;
///
/// assert_eq!(stem("Rust Safety.md"), Some("Rust Safety"));
/// assert_eq!(stem("archive.tar.gz"), Some("archive.tar"));
/// assert_eq!(stem("Makefile"), None);
/// ```
pub fn stem(file_name: &str) -> Option<&str> {
    file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|stem| !stem.is_empty())
}

/// Vault-relative path with forward slashes, whatever the host separator
pub fn to_slash_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Link destination for a vault-relative path: `</dir/file.md>`.
///
/// The angle brackets let Pandoc accept destinations containing spaces.
pub fn link_target(relative: &Path) -> String {
    format!("</{}>", to_slash_path(relative))
}

/// Mutable index, owned by the synchronizer while files are copied
#[derive(Debug, Default)]
pub struct LinkIndexBuilder {
    entries: HashMap<String, String>,
}

impl LinkIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a copied file by its vault-relative path.
    ///
    /// Returns the key it was stored under, or `None` when the file name has
    /// no usable stem. A later file with the same stem replaces the earlier one.
    pub fn record(&mut self, relative: &Path) -> Option<String> {
        let key = relative
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(stem)?
            .to_string();

        let target = link_target(relative);
        if let Some(previous) = self.entries.insert(key.clone(), target) {
            tracing::debug!("Stem '{}' already indexed at {}, replacing", key, previous);
        }
        Some(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the index; no entries can be added afterwards
    pub fn finish(self) -> LinkIndex {
        LinkIndex {
            entries: self.entries,
        }
    }
}

/// Completed, read-only index
#[derive(Debug, Default, Clone)]
pub struct LinkIndex {
    entries: HashMap<String, String>,
}

impl LinkIndex {
    /// Link target for an exact (case-sensitive) stem
    pub fn get(&self, stem: &str) -> Option<&str> {
        self.entries.get(stem).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for LinkIndex {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
