//! Vault mirroring, the first phase of an export.
//!
//! Copies every eligible file from the vault into a freshly recreated output
//! directory and records each copied note or image in the link index.

use crate::config::ExportConfig;
use crate::link_index::{LinkIndex, LinkIndexBuilder};
use crate::progress::Notifier;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("The provided directory does not exist or is not a directory: {0:?}")]
    InvalidRoot(PathBuf),

    #[error("Failed to clear stale output {path:?}: {source}")]
    ClearOutput { path: PathBuf, source: io::Error },

    #[error("Failed to create output directory {path:?}: {source}")]
    CreateOutput { path: PathBuf, source: io::Error },

    #[error("Failed to walk {path:?}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

/// Counters for one mirroring run
#[derive(Debug, Default, Clone, Serialize)]
pub struct SyncReport {
    pub copied: usize,
    pub indexed: usize,
    pub failed: Vec<PathBuf>,
}

/// Result of phase one: the populated output tree and its completed index
#[derive(Debug)]
pub struct Synchronized {
    pub output_root: PathBuf,
    pub index: LinkIndex,
    pub report: SyncReport,
}

/// Mirrors a vault into `<vault>/<output_dir>`
pub struct TreeSynchronizer<'a> {
    config: &'a ExportConfig,
    notifier: &'a dyn Notifier,
}

impl<'a> TreeSynchronizer<'a> {
    pub fn new(config: &'a ExportConfig, notifier: &'a dyn Notifier) -> Self {
        Self { config, notifier }
    }

    /// Output directory for a vault root
    pub fn output_root(&self, source_root: &Path) -> PathBuf {
        source_root.join(&self.config.output_dir)
    }

    /// Recreate the output directory and mirror the vault into it
    pub fn synchronize(&self, source_root: &Path) -> Result<Synchronized, SyncError> {
        let output_root = self.prepare_output(source_root)?;
        self.mirror(source_root, &output_root)
    }

    /// Delete any previous output and create an empty output directory.
    ///
    /// Callers that want to carry on after a failure here can call
    /// [`TreeSynchronizer::mirror`] themselves; individual copies will then
    /// fail and be reported one by one.
    pub fn prepare_output(&self, source_root: &Path) -> Result<PathBuf, SyncError> {
        ensure_directory(source_root)?;
        self.notifier
            .notify(&format!("processing path: <{}>", source_root.display()));

        let output_root = self.output_root(source_root);
        if output_root.exists() {
            clear_directory(&output_root).map_err(|source| SyncError::ClearOutput {
                path: output_root.clone(),
                source,
            })?;
            self.notifier.notify(&format!(
                "[info] deleted old /{} directory",
                self.config.output_dir
            ));
        }

        if let Err(source) = fs::create_dir_all(&output_root) {
            self.notifier.notify(&format!(
                "[warning] /{} couldn't be created",
                self.config.output_dir
            ));
            return Err(SyncError::CreateOutput {
                path: output_root,
                source,
            });
        }
        self.notifier.notify(&format!(
            "[info] added new /{} directory at <{}>",
            self.config.output_dir,
            output_root.display()
        ));

        Ok(output_root)
    }

    /// Copy every eligible file under `source_root` into `output_root`.
    ///
    /// Returns only once the whole tree has been walked, so the index handed
    /// back is complete.
    pub fn mirror(&self, source_root: &Path, output_root: &Path) -> Result<Synchronized, SyncError> {
        ensure_directory(source_root)?;

        let mut builder = LinkIndexBuilder::new();
        let mut report = SyncReport::default();
        let output_name = self.config.output_dir.as_str();

        let walker = WalkDir::new(source_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(e.depth() > 0 && e.file_type().is_dir() && e.file_name() == output_name));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(SyncError::Walk {
                        path: source_root.to_path_buf(),
                        source: err,
                    });
                }
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(source_root) else {
                continue;
            };
            if !self.is_eligible(relative) {
                tracing::debug!("Not mirrored: {}", relative.display());
                continue;
            }

            let target = output_root.join(relative);
            match copy_with_mtime(entry.path(), &target) {
                Ok(()) => {
                    report.copied += 1;
                    if self.is_linkable(relative) && builder.record(relative).is_some() {
                        report.indexed += 1;
                    }
                    self.notifier.notify(&format!(
                        "[info] copied file from <{}> to <{}>",
                        entry.path().display(),
                        target.display()
                    ));
                }
                Err(err) => {
                    tracing::warn!("Failed to copy {:?}: {}", entry.path(), err);
                    self.notifier.notify(&format!(
                        "[warning] couldn't copy <{}>: {}",
                        entry.path().display(),
                        err
                    ));
                    report.failed.push(relative.to_path_buf());
                }
            }
        }

        let index = builder.finish();
        tracing::info!(
            "Mirrored {} files ({} link targets) into {:?}",
            report.copied,
            index.len(),
            output_root
        );
        self.notifier.notify(&format!(
            "[info] finished creating file structure: {} files copied, {} link targets",
            report.copied,
            index.len()
        ));

        Ok(Synchronized {
            output_root: output_root.to_path_buf(),
            index,
            report,
        })
    }

    /// Root-level build files plus notes and images anywhere in the vault
    fn is_eligible(&self, relative: &Path) -> bool {
        let at_root = relative
            .parent()
            .is_some_and(|parent| parent.as_os_str().is_empty());
        let root_file = at_root
            && relative
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| self.config.is_root_file(name));

        root_file || self.is_linkable(relative)
    }

    fn is_linkable(&self, relative: &Path) -> bool {
        self.config.is_content_file(relative) || self.config.is_asset_file(relative)
    }
}

fn ensure_directory(path: &Path) -> Result<(), SyncError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(SyncError::InvalidRoot(path.to_path_buf()))
    }
}

/// Remove files first, then the directories they leave empty
fn clear_directory(dir: &Path) -> io::Result<()> {
    if !dir.is_dir() {
        return fs::remove_file(dir);
    }
    for entry in WalkDir::new(dir).contents_first(true) {
        let entry = entry.map_err(io::Error::other)?;
        if entry.file_type().is_dir() {
            fs::remove_dir(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

fn copy_with_mtime(source: &Path, target: &Path) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, target)?;
    let modified = fs::metadata(source)?.modified()?;
    set_modified(target, modified)
}

/// Stamp `path` with a modification time.
///
/// Falls back to a read-only handle for files copied without write permission.
pub(crate) fn set_modified(path: &Path, modified: SystemTime) -> io::Result<()> {
    let file = match fs::File::options().write(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => fs::File::open(path)?,
        Err(err) => return Err(err),
    };
    file.set_modified(modified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::BufferNotifier;
    use std::time::Duration;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_mirrors_only_eligible_files() {
        let vault = tempdir().unwrap();
        let root = vault.path();
        write(root, "_quarto.yml", "project: book");
        write(root, "references.bib", "@book{}");
        write(root, "1 Intro/Intro.md", "# Intro");
        write(root, "1 Intro/diagram.png", "png");
        write(root, "1 Intro/notes.txt", "skip me");
        write(root, "nested/_quarto.yml", "not at root");

        let config = ExportConfig::default();
        let notifier = BufferNotifier::new();
        let result = TreeSynchronizer::new(&config, &notifier)
            .synchronize(root)
            .unwrap();

        let out = root.join("exportFiles");
        assert_eq!(result.output_root, out);
        assert!(out.join("_quarto.yml").is_file());
        assert!(out.join("references.bib").is_file());
        assert!(out.join("1 Intro/Intro.md").is_file());
        assert!(out.join("1 Intro/diagram.png").is_file());
        assert!(!out.join("1 Intro/notes.txt").exists());
        assert!(!out.join("nested").exists());

        assert_eq!(result.report.copied, 4);
        assert_eq!(result.report.indexed, 2);
        assert!(result.report.failed.is_empty());
        assert_eq!(result.index.get("Intro"), Some("</1 Intro/Intro.md>"));
        assert_eq!(result.index.get("diagram"), Some("</1 Intro/diagram.png>"));
        assert!(result.index.get("_quarto").is_none());
    }

    #[test]
    fn test_copies_are_identical_and_keep_mtime() {
        let vault = tempdir().unwrap();
        let root = vault.path();
        let source = write(root, "a/Page.md", "line one\nline two\n");
        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        set_modified(&source, stamp).unwrap();

        let config = ExportConfig::default();
        TreeSynchronizer::new(&config, &crate::progress::NullNotifier)
            .synchronize(root)
            .unwrap();

        let copy = root.join("exportFiles/a/Page.md");
        assert_eq!(fs::read(&copy).unwrap(), fs::read(&source).unwrap());
        assert_eq!(fs::metadata(&copy).unwrap().modified().unwrap(), stamp);
    }

    #[test]
    fn test_stale_output_is_removed() {
        let vault = tempdir().unwrap();
        let root = vault.path();
        write(root, "Page.md", "fresh");
        write(root, "exportFiles/old/Stale.md", "stale");

        let config = ExportConfig::default();
        let notifier = BufferNotifier::new();
        let result = TreeSynchronizer::new(&config, &notifier)
            .synchronize(root)
            .unwrap();

        assert!(!root.join("exportFiles/old").exists());
        assert!(root.join("exportFiles/Page.md").is_file());
        assert!(result.index.get("Stale").is_none());
        assert!(notifier
            .lines()
            .iter()
            .any(|l| l.contains("deleted old /exportFiles")));
    }

    #[test]
    fn test_nested_output_dirs_are_not_descended() {
        let vault = tempdir().unwrap();
        let root = vault.path();
        write(root, "sub/exportFiles/Copy.md", "self copy");
        write(root, "sub/Real.md", "real");

        let config = ExportConfig::default();
        let result = TreeSynchronizer::new(&config, &crate::progress::NullNotifier)
            .synchronize(root)
            .unwrap();

        assert!(result.index.get("Real").is_some());
        assert!(result.index.get("Copy").is_none());
    }

    #[test]
    fn test_invalid_root() {
        let vault = tempdir().unwrap();
        let missing = vault.path().join("missing");

        let config = ExportConfig::default();
        let err = TreeSynchronizer::new(&config, &crate::progress::NullNotifier)
            .synchronize(&missing)
            .unwrap_err();

        assert!(matches!(err, SyncError::InvalidRoot(path) if path == missing));
    }

    #[test]
    fn test_mirror_into_blocked_output_keeps_walking() {
        let vault = tempdir().unwrap();
        let root = vault.path();
        write(root, "A.md", "a");
        write(root, "sub/B.md", "b");
        let elsewhere = tempdir().unwrap();
        let blocked = write(elsewhere.path(), "out", "a file, not a directory");

        let config = ExportConfig::default();
        let notifier = BufferNotifier::new();
        let result = TreeSynchronizer::new(&config, &notifier)
            .mirror(root, &blocked)
            .unwrap();

        assert_eq!(result.report.copied, 0);
        assert_eq!(
            result.report.failed,
            vec![PathBuf::from("A.md"), Path::new("sub").join("B.md")]
        );
        assert!(result.index.is_empty());
        let lines = notifier.lines();
        assert_eq!(lines.iter().filter(|l| l.contains("couldn't copy")).count(), 2);
        assert!(lines
            .last()
            .unwrap()
            .contains("finished creating file structure: 0 files copied"));
    }

    #[cfg(unix)]
    #[test]
    fn test_uncreatable_output_is_reported() {
        let vault = tempdir().unwrap();
        let root = vault.path();
        write(root, "Page.md", "page");
        // a dangling link is neither removed as stale output nor a directory
        std::os::unix::fs::symlink(root.join("missing-target"), root.join("exportFiles")).unwrap();

        let config = ExportConfig::default();
        let notifier = BufferNotifier::new();
        let synchronizer = TreeSynchronizer::new(&config, &notifier);
        let err = synchronizer.prepare_output(root).unwrap_err();

        assert!(matches!(
            &err,
            SyncError::CreateOutput { path, .. } if *path == root.join("exportFiles")
        ));
        assert!(notifier
            .lines()
            .iter()
            .any(|l| l.contains("/exportFiles couldn't be created")));

        // carrying on regardless reports the copy instead of aborting
        let result = synchronizer
            .mirror(root, &synchronizer.output_root(root))
            .unwrap();
        assert_eq!(result.report.copied, 0);
        assert_eq!(result.report.failed, vec![PathBuf::from("Page.md")]);
    }

    #[test]
    fn test_reports_progress_per_copy() {
        let vault = tempdir().unwrap();
        let root = vault.path();
        write(root, "One.md", "1");
        write(root, "Two.md", "2");

        let config = ExportConfig::default();
        let notifier = BufferNotifier::new();
        TreeSynchronizer::new(&config, &notifier)
            .synchronize(root)
            .unwrap();

        let lines = notifier.lines();
        assert_eq!(lines.iter().filter(|l| l.contains("copied file")).count(), 2);
        assert!(lines
            .last()
            .unwrap()
            .contains("finished creating file structure: 2 files copied"));
    }
}
