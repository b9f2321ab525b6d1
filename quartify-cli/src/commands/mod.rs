//! CLI command implementations.

pub mod export;
pub mod sidebar;

pub use export::export_vault;
pub use sidebar::print_sidebar;

use anyhow::{Context, Result};
use quartify_core::ExportConfig;
use std::path::Path;

/// Explicit config file, or the built-in defaults
fn load_config(config_path: Option<&Path>) -> Result<ExportConfig> {
    if let Some(path) = config_path {
        tracing::info!("Loading config from {:?}", path);
    }
    ExportConfig::load(config_path).context("Failed to load configuration")
}
