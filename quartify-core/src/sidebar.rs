//! Sidebar navigation for `_quarto.yml`.
//!
//! Serializes a directory tree into the `contents` list Quarto expects:
//!
//! ```text
//!       - section: "1 Intro"
//!         href: "1 Intro/1 Intro.md"
//!         contents:
//!         - "1 Intro/1 Intro.md"
//! ```
//!
//! Siblings are ordered by their leading number when they have one, so
//! `2 Setup` comes before `10 Deploy`.

use crate::config::ExportConfig;
use crate::link_index::to_slash_path;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extra indentation per nesting level
pub const INDENT_STEP: usize = 2;

#[derive(Error, Debug)]
pub enum SidebarError {
    #[error("The provided directory does not exist or is not a directory:\n<{}>", .0.display())]
    InvalidRoot(PathBuf),
}

#[derive(Debug)]
struct Entry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

pub struct SidebarGenerator<'a> {
    config: &'a ExportConfig,
    indent: usize,
}

impl<'a> SidebarGenerator<'a> {
    pub fn new(config: &'a ExportConfig) -> Self {
        Self {
            config,
            indent: config.sidebar_indent,
        }
    }

    /// Override the indentation of top-level entries
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Sidebar text, or the error message when `root` is not a directory
    pub fn generate(&self, root: &Path) -> String {
        self.try_generate(root).unwrap_or_else(|err| err.to_string())
    }

    pub fn try_generate(&self, root: &Path) -> Result<String, SidebarError> {
        if !root.is_dir() {
            return Err(SidebarError::InvalidRoot(root.to_path_buf()));
        }

        let mut out = String::new();
        let entries = list_entries(root);
        self.render_entries(root, &entries, self.indent, &mut out);
        Ok(out)
    }

    fn render_entries(&self, root: &Path, entries: &[Entry], indent: usize, out: &mut String) {
        for entry in entries {
            if entry.is_dir {
                if self.config.is_excluded_dir(&entry.name) {
                    continue;
                }
                self.render_section(root, entry, indent, out);
            } else if self.config.is_content_file(&entry.path) {
                push_line(out, indent, &format!("- \"{}\"", self.relative(root, &entry.path)));
            }
        }
    }

    /// The `href` is root-relative like every other entry, so Quarto can find
    /// the landing page from `_quarto.yml`.
    fn render_section(&self, root: &Path, dir: &Entry, indent: usize, out: &mut String) {
        let children = list_entries(&dir.path);

        push_line(out, indent, &format!("- section: \"{}\"", escape(&dir.name)));
        if let Some(landing) = children
            .iter()
            .find(|c| !c.is_dir && c.name.starts_with(&dir.name) && self.config.is_content_file(&c.path))
        {
            push_line(out, indent, &format!("  href: \"{}\"", self.relative(root, &landing.path)));
        }
        push_line(out, indent, "  contents:");

        self.render_entries(root, &children, indent + INDENT_STEP, out);
    }

    fn relative(&self, root: &Path, path: &Path) -> String {
        let relative = path.strip_prefix(root).unwrap_or(path);
        escape(&to_slash_path(relative))
    }
}

fn push_line(out: &mut String, indent: usize, text: &str) {
    out.extend(std::iter::repeat(' ').take(indent));
    out.push_str(text);
    out.push('\n');
}

fn escape(text: &str) -> String {
    text.replace('"', "\\\"")
}

/// Directory listing in sidebar order; unreadable directories list as empty.
///
/// Symlinks are not followed, so a link back to an ancestor cannot recurse.
fn list_entries(dir: &Path) -> Vec<Entry> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(err) => {
            tracing::warn!("Cannot list {:?}: {}", dir, err);
            return Vec::new();
        }
    };

    let mut entries: Vec<Entry> = read
        .filter_map(|e| e.ok())
        .map(|e| Entry {
            name: e.file_name().to_string_lossy().into_owned(),
            is_dir: e.file_type().is_ok_and(|t| t.is_dir()),
            path: e.path(),
        })
        .collect();
    entries.sort_by(|a, b| compare_names(&a.name, &b.name));
    entries
}

/// Leading whitespace-delimited token as an integer, if it is one
fn leading_number(name: &str) -> Option<i64> {
    name.split(char::is_whitespace).next()?.parse().ok()
}

/// Sibling order: numbered names first, by number, then everything else
/// lexicographically. Ties fall back to the full name so the order is total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    match (leading_number(a), leading_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
