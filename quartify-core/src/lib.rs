//! # quartify-core
//!
//! Core library for turning an Obsidian vault into Quarto project sources.
//!
//! An export runs in two phases: [`sync`] mirrors the vault into
//! `exportFiles/` and builds the [`LinkIndex`], then [`markdown`] rewrites
//! every mirrored note against the finished index. [`sidebar`] renders the
//! navigation tree independently of both.

pub mod config;
pub mod export;
pub mod frontmatter;
pub mod link_index;
pub mod markdown;
pub mod progress;
pub mod sidebar;
pub mod sync;

pub use config::{ConfigError, ExportConfig, MarkerConfig};
pub use export::{ExportError, ExportReport, Exporter};
pub use link_index::{LinkIndex, LinkIndexBuilder};
pub use markdown::{
    FileOutcome, LineRewriter, MarkdownTransformer, Rewrite, RewriteStats, TransformError,
    TransformReport,
};
pub use progress::{BufferNotifier, ConsoleNotifier, Notifier, NullNotifier};
pub use sidebar::{SidebarError, SidebarGenerator};
pub use sync::{SyncError, SyncReport, Synchronized, TreeSynchronizer};
