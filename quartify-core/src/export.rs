//! Export orchestration: mirror the vault, then rewrite the mirrored notes.

use crate::{
    config::ExportConfig,
    markdown::{MarkdownTransformer, TransformReport},
    progress::Notifier,
    sync::{SyncError, SyncReport, TreeSynchronizer},
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Synchronization failed: {0}")]
    Sync(#[from] SyncError),
}

/// Summary of a full export run
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub output_root: PathBuf,
    pub sync: SyncReport,
    pub transform: TransformReport,
}

/// Runs the two export phases in order
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Regenerate `<root>/<output_dir>` from the vault at `root`.
    ///
    /// Every note is rewritten only after the whole vault has been mirrored,
    /// so links to notes that sort late in the walk still resolve.
    pub fn run(&self, root: &Path, notifier: &dyn Notifier) -> Result<ExportReport, ExportError> {
        tracing::info!("Exporting vault {:?}", root);

        let synced = TreeSynchronizer::new(&self.config, notifier).synchronize(root)?;
        let index = synced.index;

        let transform = MarkdownTransformer::new(&self.config, &index, notifier)
            .transform_tree(&synced.output_root);

        notifier.notify(&format!(
            "[info] finished editing files: {} rewritten, {} ignored, {} failed",
            transform.rewritten,
            transform.ignored.len(),
            transform.failed.len()
        ));

        Ok(ExportReport {
            output_root: synced.output_root,
            sync: synced.report,
            transform,
        })
    }
}
