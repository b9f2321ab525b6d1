//! Note rewriting, the second phase of an export.
//!
//! Each note in the mirrored tree is streamed line by line through a
//! [`LineRewriter`] into a sibling temporary file, which then replaces the
//! note. The rewriter injects front matter, passes tags blocks through,
//! expands deck templates, resolves wikilinks and converts callouts.

pub mod callouts;
pub mod wikilinks;

pub use callouts::{CalloutConverter, CalloutLine, CALLOUT_CLOSE};
pub use wikilinks::{LinkCounts, WikilinkResolver};

use crate::config::ExportConfig;
use crate::frontmatter::{date_line, format_date, FrontmatterState, DELIMITER};
use crate::link_index::LinkIndex;
use crate::progress::Notifier;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("IO error on {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to replace {path:?}: {source}")]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> TransformError + '_ {
    move |source| TransformError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// What changed in one note
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    pub links_resolved: usize,
    pub images_linked: usize,
    pub callouts_opened: usize,
    pub templates_expanded: usize,
    pub tag_blocks: usize,
}

impl RewriteStats {
    pub fn has_changes(&self) -> bool {
        *self != RewriteStats::default()
    }
}

/// Result of streaming one note through the rewriter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    Complete(RewriteStats),
    /// The note carries the ignored-file marker; the output must be discarded
    Ignored,
}

/// Per-note state, created fresh for every note
#[derive(Debug, Default)]
struct NoteState {
    frontmatter: FrontmatterState,
    callouts: CalloutConverter,
}

/// The line-level rewriting automaton
pub struct LineRewriter<'a> {
    config: &'a ExportConfig,
    links: WikilinkResolver<'a>,
    notifier: &'a dyn Notifier,
}

impl<'a> LineRewriter<'a> {
    pub fn new(config: &'a ExportConfig, index: &'a LinkIndex, notifier: &'a dyn Notifier) -> Self {
        Self {
            config,
            links: WikilinkResolver::new(index, config),
            notifier,
        }
    }

    /// Rewrite `lines` into `out`, stamping the front matter with `date`.
    ///
    /// On [`Rewrite::Ignored`] whatever was already written to `out` is
    /// meaningless and must be thrown away by the caller.
    pub fn rewrite<I, W>(&self, date: &str, lines: I, out: &mut W) -> io::Result<Rewrite>
    where
        I: IntoIterator<Item = io::Result<String>>,
        W: Write,
    {
        let markers = &self.config.markers;
        let mut lines = lines.into_iter();
        let mut state = NoteState::default();
        let mut stats = RewriteStats::default();

        writeln!(out, "{DELIMITER}")?;
        writeln!(out, "{}", date_line(date))?;

        while let Some(line) = lines.next() {
            let line = line?;
            if line == markers.ignored_file {
                return Ok(Rewrite::Ignored);
            }

            match state.frontmatter {
                FrontmatterState::Tags => {
                    if line == markers.tags_close {
                        writeln!(out, "{DELIMITER}")?;
                        state.frontmatter = FrontmatterState::Closed;
                    } else {
                        writeln!(out, "{line}")?;
                    }
                    continue;
                }
                FrontmatterState::Open => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if line == markers.tags_open {
                        // the property block's own opening delimiter
                        lines.next().transpose()?;
                        state.frontmatter = FrontmatterState::Tags;
                        stats.tag_blocks += 1;
                        self.notifier.notify("[info] found tags block");
                        continue;
                    }
                    writeln!(out, "{DELIMITER}")?;
                    state.frontmatter = FrontmatterState::Closed;
                }
                FrontmatterState::Closed => {}
            }

            if line == markers.template_trigger {
                if expand_template(&mut lines, out)? {
                    stats.templates_expanded += 1;
                    continue;
                }
                break;
            }

            let mut counts = LinkCounts::default();
            let linked = self.links.resolve(&line, &mut counts);
            stats.links_resolved += counts.resolved;
            stats.images_linked += counts.images;

            match state.callouts.convert(&linked) {
                CalloutLine::Open { closes, fence } => {
                    stats.callouts_opened += 1;
                    for _ in 0..closes {
                        writeln!(out, "{CALLOUT_CLOSE}")?;
                    }
                    writeln!(out, "{fence}")?;
                }
                CalloutLine::Body { closes, text } => {
                    for _ in 0..closes {
                        writeln!(out, "{CALLOUT_CLOSE}")?;
                    }
                    writeln!(out, "{text}")?;
                }
            }
            if !line.is_empty() {
                writeln!(out)?;
            }
        }

        if !state.frontmatter.is_closed() {
            writeln!(out, "{DELIMITER}")?;
        }
        for _ in 0..state.callouts.finish() {
            writeln!(out, "{CALLOUT_CLOSE}")?;
        }

        Ok(Rewrite::Complete(stats))
    }

    /// Rewrite an in-memory note; `Ok(None)` when it is marked as ignored
    pub fn rewrite_str(&self, date: &str, text: &str) -> io::Result<Option<String>> {
        let mut out = Vec::new();
        let lines = text.lines().map(|line| Ok(line.to_string()));
        match self.rewrite(date, lines, &mut out)? {
            Rewrite::Complete(_) => Ok(Some(String::from_utf8_lossy(&out).into_owned())),
            Rewrite::Ignored => Ok(None),
        }
    }
}

/// Replace a deck template with its heading.
///
/// The trigger is followed by two skipped lines, the heading line and one
/// more skipped line. Returns `false` if input ends before the heading.
fn expand_template<I, W>(lines: &mut I, out: &mut W) -> io::Result<bool>
where
    I: Iterator<Item = io::Result<String>>,
    W: Write,
{
    for _ in 0..2 {
        if lines.next().transpose()?.is_none() {
            return Ok(false);
        }
    }
    let Some(heading) = lines.next().transpose()? else {
        return Ok(false);
    };
    writeln!(out, "## {heading}")?;
    writeln!(out)?;
    lines.next().transpose()?;
    Ok(true)
}

/// Outcome for a single note on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Rewritten(RewriteStats),
    Ignored,
    ReadOnly,
}

/// Totals for a whole tree
#[derive(Debug, Default, Clone, Serialize)]
pub struct TransformReport {
    pub rewritten: usize,
    pub ignored: Vec<PathBuf>,
    pub read_only: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
    pub links_resolved: usize,
    pub images_linked: usize,
    pub callouts_opened: usize,
    pub templates_expanded: usize,
}

impl TransformReport {
    fn record(&mut self, stats: &RewriteStats) {
        self.rewritten += 1;
        self.links_resolved += stats.links_resolved;
        self.images_linked += stats.images_linked;
        self.callouts_opened += stats.callouts_opened;
        self.templates_expanded += stats.templates_expanded;
    }
}

/// Rewrites every note under an output root in place
pub struct MarkdownTransformer<'a> {
    config: &'a ExportConfig,
    index: &'a LinkIndex,
    notifier: &'a dyn Notifier,
}

impl<'a> MarkdownTransformer<'a> {
    pub fn new(config: &'a ExportConfig, index: &'a LinkIndex, notifier: &'a dyn Notifier) -> Self {
        Self {
            config,
            index,
            notifier,
        }
    }

    /// Rewrite all notes; a failing note is logged and skipped
    pub fn transform_tree(&self, root: &Path) -> TransformReport {
        let notes: Vec<PathBuf> = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.config.is_content_file(e.path()))
            .map(|e| e.into_path())
            .collect();

        let mut report = TransformReport::default();
        for note in notes {
            self.notifier
                .notify(&format!("[info] editing file: {}", note.display()));
            match self.transform_file(&note) {
                Ok(FileOutcome::Rewritten(stats)) => report.record(&stats),
                Ok(FileOutcome::Ignored) => report.ignored.push(note),
                Ok(FileOutcome::ReadOnly) => report.read_only.push(note),
                Err(err) => {
                    tracing::error!("Failed to rewrite {:?}: {}", note, err);
                    self.notifier.notify(&format!("[error] {err}"));
                    report.failed.push(note);
                }
            }
        }

        tracing::info!(
            "Rewrote {} notes ({} ignored, {} read-only, {} failed)",
            report.rewritten,
            report.ignored.len(),
            report.read_only.len(),
            report.failed.len()
        );
        report
    }

    /// Rewrite one note through a sibling temporary file.
    ///
    /// The note is only replaced when the rewrite completes and the note is
    /// writable; it keeps its permissions and modification time.
    pub fn transform_file(&self, path: &Path) -> Result<FileOutcome, TransformError> {
        let metadata = fs::metadata(path).map_err(io_error(path))?;
        let modified = metadata.modified().map_err(io_error(path))?;
        let date = format_date(modified);

        let reader = BufReader::new(File::open(path).map_err(io_error(path))?);
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let staged = tempfile::Builder::new()
            .prefix(".quartify-")
            .tempfile_in(dir)
            .map_err(io_error(path))?;

        let rewriter = LineRewriter::new(self.config, self.index, self.notifier);
        let mut writer = BufWriter::new(staged);
        let stats = match rewriter
            .rewrite(&date, reader.lines(), &mut writer)
            .map_err(io_error(path))?
        {
            Rewrite::Complete(stats) => stats,
            Rewrite::Ignored => {
                tracing::debug!("Ignored by marker: {:?}", path);
                self.notifier
                    .notify(&format!("[info] skipped ignored file: {}", path.display()));
                return Ok(FileOutcome::Ignored);
            }
        };
        let staged = writer
            .into_inner()
            .map_err(|err| err.into_error())
            .map_err(io_error(path))?;

        if stats.has_changes() {
            self.notifier.notify(&format!(
                "[info] {}: {} links, {} images, {} callouts, {} templates",
                path.display(),
                stats.links_resolved,
                stats.images_linked,
                stats.callouts_opened,
                stats.templates_expanded
            ));
        }

        let permissions = fs::metadata(path).map_err(io_error(path))?.permissions();
        if permissions.readonly() {
            tracing::warn!("{:?} is not writable, leaving it untouched", path);
            self.notifier
                .notify(&format!("[warning] the original file is not writable: {}", path.display()));
            return Ok(FileOutcome::ReadOnly);
        }

        fs::set_permissions(staged.path(), permissions).map_err(io_error(path))?;
        staged.persist(path).map_err(|source| TransformError::Persist {
            path: path.to_path_buf(),
            source,
        })?;
        if let Err(err) = crate::sync::set_modified(path, modified) {
            tracing::warn!("Could not restore modification time of {:?}: {}", path, err);
        }

        Ok(FileOutcome::Rewritten(stats))
    }
}
