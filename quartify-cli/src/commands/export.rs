//! Export command implementation.

use super::load_config;
use anyhow::{Context, Result};
use quartify_core::{ConsoleNotifier, Exporter};
use std::path::Path;

/// Mirror the vault into its export directory and rewrite every note
pub fn export_vault(config_path: Option<&Path>, root: &Path, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let notifier = if json {
        ConsoleNotifier::stderr()
    } else {
        ConsoleNotifier::stdout()
    };

    let report = Exporter::new(config)
        .run(root, &notifier)
        .with_context(|| format!("Failed to export {:?}", root))?;

    if json {
        let payload = serde_json::to_string_pretty(&report)?;
        println!("{}", payload);
    } else {
        println!(
            "✓ Exported {} files to {:?} ({} notes rewritten, {} links resolved)",
            report.sync.copied,
            report.output_root,
            report.transform.rewritten,
            report.transform.links_resolved
        );
        for path in &report.sync.failed {
            println!("  ! not copied: {}", path.display());
        }
        for path in &report.transform.failed {
            println!("  ! not rewritten: {}", path.display());
        }
        for path in &report.transform.read_only {
            println!("  ! read-only, left as copied: {}", path.display());
        }
    }

    Ok(())
}
